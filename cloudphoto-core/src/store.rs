//! Seams to the remote services. The engines only talk to these traits; the
//! AWS-backed implementations live in [`crate::s3`] and [`crate::provision`].

use anyhow::Result;
use async_trait::async_trait;

/// Key/value tag attached to a remote object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An object in the store together with the tags read for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub key: String,
    pub tags: Vec<Tag>,
}

/// Object operations against a single bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Every key in the bucket, in listing order. Single unpaginated page.
    async fn list_keys(&self) -> Result<Vec<String>>;

    async fn get_tags(&self, key: &str) -> Result<Vec<Tag>>;

    async fn put_object(&self, key: &str, data: Vec<u8>, tags: &[Tag]) -> Result<()>;

    async fn get_object(&self, key: &str) -> Result<Vec<u8>>;
}

/// Account-level bucket management used during provisioning.
#[async_trait]
pub trait BucketAdmin: Send + Sync {
    async fn list_buckets(&self) -> Result<Vec<String>>;

    async fn create_bucket(&self, name: &str) -> Result<()>;

    async fn bucket_exists(&self, name: &str) -> Result<bool>;

    /// Function ARNs currently receiving notifications from `bucket`.
    async fn notification_targets(&self, bucket: &str) -> Result<Vec<String>>;

    /// Add a function notification for `event` to the bucket's configuration.
    async fn put_notification(&self, bucket: &str, function_arn: &str, event: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleInfo {
    pub name: String,
    pub arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyInfo {
    pub name: String,
    pub arn: String,
}

#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    async fn find_role(&self, name: &str) -> Result<Option<RoleInfo>>;

    async fn create_role(&self, name: &str, trust_policy: &str) -> Result<RoleInfo>;

    async fn role_exists(&self, name: &str) -> Result<bool>;

    async fn find_policy(&self, name: &str) -> Result<Option<PolicyInfo>>;

    async fn create_policy(&self, name: &str, document: &str) -> Result<PolicyInfo>;

    async fn policy_exists(&self, arn: &str) -> Result<bool>;

    /// ARNs of the managed policies attached to `role`.
    async fn attached_policies(&self, role: &str) -> Result<Vec<String>>;

    async fn attach_role_policy(&self, role: &str, policy_arn: &str) -> Result<()>;
}

/// Everything needed to deploy the notification handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpec {
    pub name: String,
    pub role_arn: String,
    pub handler: String,
    pub runtime: String,
    pub memory_size: i32,
    pub timeout_secs: i32,
    pub code: Vec<u8>,
}

#[async_trait]
pub trait FunctionAdmin: Send + Sync {
    /// ARN of the function named `name`, if deployed.
    async fn find_function(&self, name: &str) -> Result<Option<String>>;

    /// Deploy the function and return its ARN.
    async fn create_function(&self, spec: &FunctionSpec) -> Result<String>;

    /// Allow object events from `source_bucket` to invoke the function.
    async fn add_invoke_permission(&self, function: &str, source_bucket: &str) -> Result<()>;
}
