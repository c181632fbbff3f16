use std::path::PathBuf;

use crate::provision::retry::{RetryPolicy, WaitPolicy};

/// Tag key marking an object as a member of an album.
pub const DEFAULT_TAG_KEY: &str = "cloudphoto";

/// Runtime settings shared by the session, the engines and provisioning.
#[derive(Debug, Clone)]
pub struct Config {
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, LocalStack).
    pub endpoint_url: Option<String>,
    pub source_bucket: String,
    pub destination_bucket: String,
    pub tag_key: String,
    pub role_name: String,
    pub policy_name: String,
    pub function_name: String,
    pub handler: String,
    pub runtime: String,
    pub memory_size: i32,
    pub timeout_secs: i32,
    /// Packaged handler uploaded as the function code.
    pub artifact_path: PathBuf,
    pub trust_policy_path: Option<PathBuf>,
    pub permission_policy_path: Option<PathBuf>,
    pub notification_event: String,
    pub retry: RetryPolicy,
    pub wait: WaitPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: "us-west-2".to_string(),
            endpoint_url: None,
            source_bucket: "cloudphoto-source".to_string(),
            destination_bucket: "cloudphoto-destination".to_string(),
            tag_key: DEFAULT_TAG_KEY.to_string(),
            role_name: "cloudphoto-role".to_string(),
            policy_name: "cloudphoto-policy".to_string(),
            function_name: "cloudphoto-handler".to_string(),
            handler: "ru.itis.Handler::handleRequest".to_string(),
            runtime: "java11".to_string(),
            memory_size: 300,
            timeout_secs: 60,
            artifact_path: PathBuf::from("S3Handler-1.0-SNAPSHOT.jar"),
            trust_policy_path: None,
            permission_policy_path: None,
            notification_event: "s3:ObjectCreated:Put".to_string(),
            retry: RetryPolicy::default(),
            wait: WaitPolicy::default(),
        }
    }
}
