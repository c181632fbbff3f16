use anyhow::Result;

use crate::config::Config;
use crate::provision::iam::IamAdmin;
use crate::provision::lambda::LambdaAdmin;
use crate::s3::S3Store;

/// Service clients built once from a single SDK configuration.
#[derive(Clone)]
pub struct AwsSession {
    s3: aws_sdk_s3::Client,
    iam: aws_sdk_iam::Client,
    lambda: aws_sdk_lambda::Client,
    region: String,
}

impl AwsSession {
    pub async fn load(config: &Config) -> Result<Self> {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        // Custom endpoint for MinIO/LocalStack/etc
        if let Some(endpoint_url) = &config.endpoint_url {
            config_loader = config_loader.endpoint_url(endpoint_url);
        }

        let sdk_config = config_loader.load().await;
        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);

        // S3-compatible services need path-style addressing
        if config.endpoint_url.is_some() {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        tracing::debug!(
            "AWS session loaded: region={}, endpoint={:?}",
            config.region,
            config.endpoint_url
        );

        Ok(Self {
            s3: aws_sdk_s3::Client::from_conf(s3_config_builder.build()),
            iam: aws_sdk_iam::Client::new(&sdk_config),
            lambda: aws_sdk_lambda::Client::new(&sdk_config),
            region: config.region.clone(),
        })
    }

    /// Object store scoped to `bucket`; also serves bucket administration.
    pub fn store(&self, bucket: impl Into<String>) -> S3Store {
        S3Store::new(self.s3.clone(), bucket.into(), self.region.clone())
    }

    pub fn identity(&self) -> IamAdmin {
        IamAdmin::new(self.iam.clone())
    }

    pub fn functions(&self) -> LambdaAdmin {
        LambdaAdmin::new(self.lambda.clone())
    }
}
