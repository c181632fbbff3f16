#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use cloudphoto_core::provision::retry::{RetryPolicy, WaitPolicy};
use cloudphoto_core::store::{FunctionSpec, PolicyInfo, RoleInfo};
use cloudphoto_core::{BucketAdmin, Config, FunctionAdmin, IdentityAdmin, ObjectStore, Tag};

pub const TAG_KEY: &str = "cloudphoto";

struct StoredObject {
    key: String,
    data: Vec<u8>,
    tags: Vec<Tag>,
}

/// Single bucket held in memory, in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<Vec<StoredObject>>,
    rejected_keys: Vec<String>,
    broken: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every listing call fails.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    /// Uploads of `key` fail.
    pub fn rejecting(mut self, key: &str) -> Self {
        self.rejected_keys.push(key.to_string());
        self
    }

    pub fn with_object(self, key: &str, data: &[u8], tags: &[(&str, &str)]) -> Self {
        self.objects.lock().unwrap().push(StoredObject {
            key: key.to_string(),
            data: data.to_vec(),
            tags: tags.iter().map(|(k, v)| Tag::new(*k, *v)).collect(),
        });
        self
    }

    pub fn with_image(self, key: &str, album: &str) -> Self {
        let data = format!("bytes of {key}");
        self.with_object(key, data.as_bytes(), &[(TAG_KEY, album)])
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|object| object.key.clone())
            .collect()
    }

    pub fn data(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|object| object.key == key)
            .map(|object| object.data.clone())
    }

    pub fn tags(&self, key: &str) -> Option<Vec<Tag>> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|object| object.key == key)
            .map(|object| object.tags.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_keys(&self) -> Result<Vec<String>> {
        if self.broken {
            bail!("listing refused");
        }
        Ok(self.keys())
    }

    async fn get_tags(&self, key: &str) -> Result<Vec<Tag>> {
        match self.tags(key) {
            Some(tags) => Ok(tags),
            None => bail!("no such key: {key}"),
        }
    }

    async fn put_object(&self, key: &str, data: Vec<u8>, tags: &[Tag]) -> Result<()> {
        if self.rejected_keys.iter().any(|rejected| rejected == key) {
            bail!("access denied for {key}");
        }

        let mut objects = self.objects.lock().unwrap();
        objects.retain(|object| object.key != key);
        objects.push(StoredObject {
            key: key.to_string(),
            data,
            tags: tags.to_vec(),
        });
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        match self.data(key) {
            Some(data) => Ok(data),
            None => bail!("no such key: {key}"),
        }
    }
}

#[derive(Default)]
struct CloudState {
    buckets: Vec<String>,
    roles: Vec<RoleInfo>,
    policies: Vec<PolicyInfo>,
    attachments: Vec<(String, String)>,
    functions: Vec<(String, String)>,
    permissions: Vec<(String, String)>,
    notifications: Vec<(String, String, String)>,
    create_calls: u32,
    function_attempts: u32,
    function_failures_left: u32,
    deployed_code: Vec<u8>,
}

/// Bucket, identity and function services sharing one fake account.
#[derive(Default)]
pub struct FakeCloud {
    state: Mutex<CloudState>,
    buckets_never_visible: bool,
    bucket_creation_denied: bool,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first `failures` function deployments are rejected.
    pub fn failing_deployments(self, failures: u32) -> Self {
        self.state.lock().unwrap().function_failures_left = failures;
        self
    }

    pub fn buckets_never_visible(mut self) -> Self {
        self.buckets_never_visible = true;
        self
    }

    pub fn bucket_creation_denied(mut self) -> Self {
        self.bucket_creation_denied = true;
        self
    }

    pub fn with_function(self, name: &str, arn: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .functions
            .push((name.to_string(), arn.to_string()));
        self
    }

    pub fn create_calls(&self) -> u32 {
        self.state.lock().unwrap().create_calls
    }

    pub fn function_attempts(&self) -> u32 {
        self.state.lock().unwrap().function_attempts
    }

    pub fn buckets(&self) -> Vec<String> {
        self.state.lock().unwrap().buckets.clone()
    }

    pub fn attachments(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().attachments.clone()
    }

    pub fn permissions(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().permissions.clone()
    }

    pub fn notifications(&self) -> Vec<(String, String, String)> {
        self.state.lock().unwrap().notifications.clone()
    }

    pub fn deployed_code(&self) -> Vec<u8> {
        self.state.lock().unwrap().deployed_code.clone()
    }
}

#[async_trait]
impl BucketAdmin for FakeCloud {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        Ok(self.buckets())
    }

    async fn create_bucket(&self, name: &str) -> Result<()> {
        if self.bucket_creation_denied {
            bail!("bucket name {name} is taken");
        }
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        state.buckets.push(name.to_string());
        Ok(())
    }

    async fn bucket_exists(&self, name: &str) -> Result<bool> {
        Ok(!self.buckets_never_visible && self.buckets().iter().any(|bucket| bucket == name))
    }

    async fn notification_targets(&self, bucket: &str) -> Result<Vec<String>> {
        Ok(self
            .notifications()
            .into_iter()
            .filter(|(source, _, _)| source == bucket)
            .map(|(_, arn, _)| arn)
            .collect())
    }

    async fn put_notification(&self, bucket: &str, function_arn: &str, event: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        state
            .notifications
            .push((bucket.to_string(), function_arn.to_string(), event.to_string()));
        Ok(())
    }
}

#[async_trait]
impl IdentityAdmin for FakeCloud {
    async fn find_role(&self, name: &str) -> Result<Option<RoleInfo>> {
        let state = self.state.lock().unwrap();
        Ok(state.roles.iter().find(|role| role.name == name).cloned())
    }

    async fn create_role(&self, name: &str, trust_policy: &str) -> Result<RoleInfo> {
        serde_json::from_str::<serde_json::Value>(trust_policy)?;
        let role = RoleInfo {
            name: name.to_string(),
            arn: format!("arn:aws:iam::123456789012:role/{name}"),
        };
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        state.roles.push(role.clone());
        Ok(role)
    }

    async fn role_exists(&self, name: &str) -> Result<bool> {
        Ok(self.find_role(name).await?.is_some())
    }

    async fn find_policy(&self, name: &str) -> Result<Option<PolicyInfo>> {
        let state = self.state.lock().unwrap();
        Ok(state.policies.iter().find(|policy| policy.name == name).cloned())
    }

    async fn create_policy(&self, name: &str, document: &str) -> Result<PolicyInfo> {
        serde_json::from_str::<serde_json::Value>(document)?;
        let policy = PolicyInfo {
            name: name.to_string(),
            arn: format!("arn:aws:iam::123456789012:policy/{name}"),
        };
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        state.policies.push(policy.clone());
        Ok(policy)
    }

    async fn policy_exists(&self, arn: &str) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.policies.iter().any(|policy| policy.arn == arn))
    }

    async fn attached_policies(&self, role: &str) -> Result<Vec<String>> {
        Ok(self
            .attachments()
            .into_iter()
            .filter(|(attached_role, _)| attached_role == role)
            .map(|(_, arn)| arn)
            .collect())
    }

    async fn attach_role_policy(&self, role: &str, policy_arn: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        state
            .attachments
            .push((role.to_string(), policy_arn.to_string()));
        Ok(())
    }
}

#[async_trait]
impl FunctionAdmin for FakeCloud {
    async fn find_function(&self, name: &str) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .functions
            .iter()
            .find(|(function, _)| function == name)
            .map(|(_, arn)| arn.clone()))
    }

    async fn create_function(&self, spec: &FunctionSpec) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.function_attempts += 1;
        if state.function_failures_left > 0 {
            state.function_failures_left -= 1;
            bail!("The role defined for the function cannot be assumed by Lambda");
        }

        let arn = format!("arn:aws:lambda:us-west-2:123456789012:function:{}", spec.name);
        state.create_calls += 1;
        state.deployed_code = spec.code.clone();
        state.functions.push((spec.name.clone(), arn.clone()));
        Ok(arn)
    }

    async fn add_invoke_permission(&self, function: &str, source_bucket: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .permissions
            .push((function.to_string(), source_bucket.to_string()));
        Ok(())
    }
}

/// Defaults with instant retries and waits, deploying the artifact at `artifact`.
pub fn test_config(artifact: &Path) -> Config {
    Config {
        artifact_path: artifact.to_path_buf(),
        retry: RetryPolicy::new(3, Duration::ZERO),
        wait: WaitPolicy::new(3, Duration::ZERO),
        ..Config::default()
    }
}
