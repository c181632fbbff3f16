use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::{
    primitives::ByteStream,
    types::{
        BucketLocationConstraint, CreateBucketConfiguration, Event, LambdaFunctionConfiguration,
        NotificationConfiguration,
    },
    Client,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::store::{BucketAdmin, ObjectStore, Tag};

/// Region that rejects an explicit location constraint.
const DEFAULT_REGION: &str = "us-east-1";

#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    region: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: String, region: String) -> Self {
        Self {
            client,
            bucket,
            region,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn guess_content_type(key: &str) -> &'static str {
        let key = key.to_ascii_lowercase();
        if key.ends_with(".jpg") || key.ends_with(".jpeg") {
            "image/jpeg"
        } else if key.ends_with(".png") {
            "image/png"
        } else {
            "application/octet-stream"
        }
    }
}

/// Encode a tag set as the URL query string `PutObject` expects.
fn encode_tagging(tags: &[Tag]) -> String {
    tags.iter()
        .map(|tag| {
            format!(
                "{}={}",
                utf8_percent_encode(&tag.key, NON_ALPHANUMERIC),
                utf8_percent_encode(&tag.value, NON_ALPHANUMERIC)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_keys(&self) -> Result<Vec<String>> {
        tracing::debug!("S3 LIST: bucket={}", self.bucket);

        let objects = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .send()
            .await
            .context("Failed to list objects")?;

        Ok(objects
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect())
    }

    async fn get_tags(&self, key: &str) -> Result<Vec<Tag>> {
        let tagging = self
            .client
            .get_object_tagging()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to read tags of {key}"))?;

        Ok(tagging
            .tag_set()
            .iter()
            .map(|tag| Tag::new(tag.key(), tag.value()))
            .collect())
    }

    async fn put_object(&self, key: &str, data: Vec<u8>, tags: &[Tag]) -> Result<()> {
        tracing::debug!(
            "S3 PUT: bucket={}, key={}, size={} bytes",
            self.bucket,
            key,
            data.len()
        );

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(Self::guess_content_type(key));

        if !tags.is_empty() {
            request = request.tagging(encode_tagging(tags));
        }

        request.send().await.context("Failed to upload to S3")?;

        tracing::debug!("S3 PUT success: key={}", key);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        tracing::debug!("S3 GET: bucket={}, key={}", self.bucket, key);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("Failed to download from S3")?;

        let data = response
            .body
            .collect()
            .await
            .context("Failed to read S3 object body")?;

        let bytes = data.to_vec();
        tracing::debug!("S3 GET success: key={}, size={} bytes", key, bytes.len());
        Ok(bytes)
    }
}

#[async_trait]
impl BucketAdmin for S3Store {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .context("Failed to list buckets")?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect())
    }

    async fn create_bucket(&self, name: &str) -> Result<()> {
        tracing::debug!("S3 CREATE BUCKET: bucket={}, region={}", name, self.region);

        let mut request = self.client.create_bucket().bucket(name);

        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        request
            .send()
            .await
            .with_context(|| format!("Failed to create bucket {name}"))?;
        Ok(())
    }

    async fn bucket_exists(&self, name: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(name).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|err| err.is_not_found()) => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to check bucket {name}")),
        }
    }

    async fn notification_targets(&self, bucket: &str) -> Result<Vec<String>> {
        let current = self
            .client
            .get_bucket_notification_configuration()
            .bucket(bucket)
            .send()
            .await
            .with_context(|| format!("Failed to read notification configuration of {bucket}"))?;

        Ok(current
            .lambda_function_configurations()
            .iter()
            .map(|target| target.lambda_function_arn().to_string())
            .collect())
    }

    async fn put_notification(&self, bucket: &str, function_arn: &str, event: &str) -> Result<()> {
        tracing::debug!(
            "S3 PUT NOTIFICATION: bucket={}, function={}, event={}",
            bucket,
            function_arn,
            event
        );

        // The PUT replaces the whole configuration, so carry the existing entries over
        let current = self
            .client
            .get_bucket_notification_configuration()
            .bucket(bucket)
            .send()
            .await
            .with_context(|| format!("Failed to read notification configuration of {bucket}"))?;

        let mut functions = current.lambda_function_configurations().to_vec();
        functions.push(
            LambdaFunctionConfiguration::builder()
                .lambda_function_arn(function_arn)
                .events(Event::from(event))
                .build()
                .context("Invalid function notification")?,
        );

        let configuration = NotificationConfiguration::builder()
            .set_topic_configurations(Some(current.topic_configurations().to_vec()))
            .set_queue_configurations(Some(current.queue_configurations().to_vec()))
            .set_lambda_function_configurations(Some(functions))
            .set_event_bridge_configuration(current.event_bridge_configuration().cloned())
            .build();

        self.client
            .put_bucket_notification_configuration()
            .bucket(bucket)
            .notification_configuration(configuration)
            .send()
            .await
            .with_context(|| format!("Failed to configure notifications of {bucket}"))?;
        Ok(())
    }
}
