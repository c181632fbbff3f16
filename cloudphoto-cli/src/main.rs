mod banner;
mod commands;
mod repl;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use cloudphoto_core::{AwsSession, Config, Provisioner};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cloudphoto")]
#[command(about = "Interactive client for tag-indexed photo albums in S3", long_about = None)]
struct Cli {
    /// AWS region for buckets and the function
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Custom endpoint for S3-compatible services
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// Bucket holding the albums
    #[arg(long, env = "CLOUDPHOTO_SOURCE_BUCKET")]
    source_bucket: Option<String>,

    /// Bucket written by the deployed function
    #[arg(long, env = "CLOUDPHOTO_DESTINATION_BUCKET")]
    destination_bucket: Option<String>,

    /// Tag key marking album membership
    #[arg(long, env = "CLOUDPHOTO_TAG_KEY")]
    tag_key: Option<String>,

    #[arg(long, env = "CLOUDPHOTO_ROLE")]
    role: Option<String>,

    #[arg(long, env = "CLOUDPHOTO_POLICY")]
    policy: Option<String>,

    #[arg(long, env = "CLOUDPHOTO_FUNCTION")]
    function: Option<String>,

    /// Handler reference inside the deployed artifact
    #[arg(long, env = "CLOUDPHOTO_HANDLER")]
    handler: Option<String>,

    #[arg(long, env = "CLOUDPHOTO_RUNTIME")]
    runtime: Option<String>,

    /// Function memory in MB
    #[arg(long, env = "CLOUDPHOTO_MEMORY_SIZE")]
    memory_size: Option<i32>,

    /// Function timeout in seconds
    #[arg(long, env = "CLOUDPHOTO_TIMEOUT")]
    timeout: Option<i32>,

    /// Packaged function code
    #[arg(long, env = "CLOUDPHOTO_ARTIFACT")]
    artifact: Option<PathBuf>,

    /// JSON trust policy for the role (defaults to a function-service trust)
    #[arg(long, env = "CLOUDPHOTO_TRUST_POLICY")]
    trust_policy: Option<PathBuf>,

    /// JSON permission policy attached to the role
    #[arg(long, env = "CLOUDPHOTO_PERMISSION_POLICY")]
    permission_policy: Option<PathBuf>,

    /// Bucket event that triggers the function
    #[arg(long, env = "CLOUDPHOTO_NOTIFICATION_EVENT")]
    notification_event: Option<String>,

    /// Function deployment attempts
    #[arg(long, env = "CLOUDPHOTO_RETRY_ATTEMPTS")]
    retry_attempts: Option<u32>,

    /// Seconds slept before each deployment attempt
    #[arg(long, env = "CLOUDPHOTO_RETRY_DELAY")]
    retry_delay: Option<u64>,

    /// Start the prompt without bringing up the infrastructure
    #[arg(long, env = "CLOUDPHOTO_SKIP_PROVISION")]
    skip_provision: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = Config::default();

        if let Some(region) = self.region {
            config.region = region;
        }
        config.endpoint_url = self.endpoint_url;
        if let Some(bucket) = self.source_bucket {
            config.source_bucket = bucket;
        }
        if let Some(bucket) = self.destination_bucket {
            config.destination_bucket = bucket;
        }
        if let Some(tag_key) = self.tag_key {
            config.tag_key = tag_key;
        }
        if let Some(role) = self.role {
            config.role_name = role;
        }
        if let Some(policy) = self.policy {
            config.policy_name = policy;
        }
        if let Some(function) = self.function {
            config.function_name = function;
        }
        if let Some(handler) = self.handler {
            config.handler = handler;
        }
        if let Some(runtime) = self.runtime {
            config.runtime = runtime;
        }
        if let Some(memory_size) = self.memory_size {
            config.memory_size = memory_size;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(artifact) = self.artifact {
            config.artifact_path = artifact;
        }
        config.trust_policy_path = self.trust_policy;
        config.permission_policy_path = self.permission_policy;
        if let Some(event) = self.notification_event {
            config.notification_event = event;
        }
        if let Some(attempts) = self.retry_attempts {
            config.retry.max_attempts = attempts;
        }
        if let Some(delay) = self.retry_delay {
            config.retry.delay = Duration::from_secs(delay);
        }

        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so they never mix with command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cloudphoto=info,cloudphoto_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let skip_provision = cli.skip_provision;
    let config = cli.into_config();

    let session = AwsSession::load(&config).await?;
    let store = session.store(config.source_bucket.clone());

    banner::print();

    if skip_provision {
        tracing::info!("Skipping infrastructure bring-up");
    } else {
        println!("[INFO] Infrastructure preparing...");
        let identity = session.identity();
        let functions = session.functions();

        let report = Provisioner::new(&store, &identity, &functions, &config)
            .run()
            .await
            .context("Infrastructure bring-up failed")?;
        println!("{report}");
    }

    println!("[INFO] Enter CloudPhoto commands:\n");
    repl::run(&store, &config).await
}
