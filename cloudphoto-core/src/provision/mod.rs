//! Idempotent bring-up of the resources the client depends on.
//!
//! Every resource is looked up remotely before anything is created, so running
//! the sequence against a ready environment only performs reads. Order:
//! buckets, role, policy, policy attachment, function, bucket notification.

pub mod documents;
pub mod iam;
pub mod lambda;
pub mod retry;

use std::fmt;
use std::future::Future;
use std::path::PathBuf;

use anyhow::Context;
use thiserror::Error;

use crate::config::Config;
use crate::store::{BucketAdmin, FunctionAdmin, FunctionSpec, IdentityAdmin, PolicyInfo, RoleInfo};
use documents::{load_document, PolicyDocument};
use retry::RetryExhausted;

const MESSAGE_INFO: &str = "[INFO] ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Bucket,
    Role,
    Policy,
    PolicyAttachment,
    Function,
    Notification,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Bucket => "bucket",
            ResourceKind::Role => "role",
            ResourceKind::Policy => "policy",
            ResourceKind::PolicyAttachment => "policy attachment",
            ResourceKind::Function => "function",
            ResourceKind::Notification => "notification",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    AlreadyPresent,
    Created,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedResource {
    pub kind: ResourceKind,
    pub name: String,
    pub status: ResourceStatus,
}

#[derive(Debug, Clone, Default)]
pub struct ProvisionReport {
    pub resources: Vec<ProvisionedResource>,
    pub function_arn: String,
}

impl ProvisionReport {
    fn record(&mut self, kind: ResourceKind, name: impl Into<String>, status: ResourceStatus) {
        let name = name.into();
        match status {
            ResourceStatus::AlreadyPresent => tracing::debug!("{} {} already present", kind, name),
            ResourceStatus::Created => tracing::debug!("{} {} created", kind, name),
        }
        self.resources.push(ProvisionedResource { kind, name, status });
    }

    pub fn created(&self) -> usize {
        self.resources
            .iter()
            .filter(|resource| resource.status == ResourceStatus::Created)
            .count()
    }

    pub fn all_present(&self) -> bool {
        self.created() == 0
    }
}

impl fmt::Display for ProvisionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for resource in &self.resources {
            let status = match resource.status {
                ResourceStatus::AlreadyPresent => "already present",
                ResourceStatus::Created => "created",
            };
            writeln!(f, "{MESSAGE_INFO}{} {}: {status}", resource.kind, resource.name)?;
        }
        write!(f, "{MESSAGE_INFO}Infrastructure is ready")
    }
}

/// Fatal bring-up failures. Any of them ends the process.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Failed to {action} {kind} {name}: {message}")]
    Remote {
        kind: ResourceKind,
        name: String,
        action: &'static str,
        message: String,
    },

    #[error("{kind} {name} did not become visible after {attempts} checks")]
    NotConsistent {
        kind: ResourceKind,
        name: String,
        attempts: u32,
    },

    #[error("Function {name} could not be deployed, its ARN is empty: {source}")]
    FunctionUnavailable { name: String, source: RetryExhausted },

    #[error("Failed to load policy document {}: {message}", path.display())]
    Document { path: PathBuf, message: String },
}

fn remote(
    kind: ResourceKind,
    name: &str,
    action: &'static str,
) -> impl FnOnce(anyhow::Error) -> ProvisionError {
    let name = name.to_string();
    move |e| ProvisionError::Remote {
        kind,
        name,
        action,
        message: format!("{e:#}"),
    }
}

pub struct Provisioner<'a> {
    buckets: &'a dyn BucketAdmin,
    identity: &'a dyn IdentityAdmin,
    functions: &'a dyn FunctionAdmin,
    config: &'a Config,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        buckets: &'a dyn BucketAdmin,
        identity: &'a dyn IdentityAdmin,
        functions: &'a dyn FunctionAdmin,
        config: &'a Config,
    ) -> Self {
        Self {
            buckets,
            identity,
            functions,
            config,
        }
    }

    pub async fn run(&self) -> Result<ProvisionReport, ProvisionError> {
        let mut report = ProvisionReport::default();

        tracing::debug!("Infrastructure preparing");
        self.ensure_buckets(&mut report).await?;
        let role = self.ensure_role(&mut report).await?;
        let policy = self.ensure_policy(&mut report).await?;
        self.ensure_attachment(&role, &policy, &mut report).await?;
        let function_arn = self.deploy_function(&role, &mut report).await?;
        self.ensure_notification(&function_arn, &mut report).await?;

        report.function_arn = function_arn;
        Ok(report)
    }

    async fn ensure_buckets(&self, report: &mut ProvisionReport) -> Result<(), ProvisionError> {
        let existing = self.buckets.list_buckets().await.map_err(remote(
            ResourceKind::Bucket,
            &self.config.source_bucket,
            "list",
        ))?;

        for name in [&self.config.source_bucket, &self.config.destination_bucket] {
            if existing.contains(name) {
                report.record(ResourceKind::Bucket, name.as_str(), ResourceStatus::AlreadyPresent);
                continue;
            }

            self.buckets
                .create_bucket(name)
                .await
                .map_err(remote(ResourceKind::Bucket, name, "create"))?;
            self.await_visible(ResourceKind::Bucket, name, || self.buckets.bucket_exists(name))
                .await?;
            report.record(ResourceKind::Bucket, name.as_str(), ResourceStatus::Created);
        }

        Ok(())
    }

    async fn ensure_role(&self, report: &mut ProvisionReport) -> Result<RoleInfo, ProvisionError> {
        let name = &self.config.role_name;
        let found = self
            .identity
            .find_role(name)
            .await
            .map_err(remote(ResourceKind::Role, name, "look up"))?;

        if let Some(role) = found {
            report.record(ResourceKind::Role, name.as_str(), ResourceStatus::AlreadyPresent);
            return Ok(role);
        }

        let trust_policy = self.document(
            self.config.trust_policy_path.as_ref(),
            &PolicyDocument::function_trust(),
        )?;
        let role = self
            .identity
            .create_role(name, &trust_policy)
            .await
            .map_err(remote(ResourceKind::Role, name, "create"))?;
        self.await_visible(ResourceKind::Role, name, || self.identity.role_exists(name))
            .await?;

        report.record(ResourceKind::Role, name.as_str(), ResourceStatus::Created);
        Ok(role)
    }

    async fn ensure_policy(&self, report: &mut ProvisionReport) -> Result<PolicyInfo, ProvisionError> {
        let name = &self.config.policy_name;
        let found = self
            .identity
            .find_policy(name)
            .await
            .map_err(remote(ResourceKind::Policy, name, "look up"))?;

        if let Some(policy) = found {
            report.record(ResourceKind::Policy, name.as_str(), ResourceStatus::AlreadyPresent);
            return Ok(policy);
        }

        let document = self.document(
            self.config.permission_policy_path.as_ref(),
            &PolicyDocument::bucket_access(
                &self.config.source_bucket,
                &self.config.destination_bucket,
            ),
        )?;
        let policy = self
            .identity
            .create_policy(name, &document)
            .await
            .map_err(remote(ResourceKind::Policy, name, "create"))?;
        self.await_visible(ResourceKind::Policy, name, || {
            self.identity.policy_exists(&policy.arn)
        })
        .await?;

        report.record(ResourceKind::Policy, name.as_str(), ResourceStatus::Created);
        Ok(policy)
    }

    async fn ensure_attachment(
        &self,
        role: &RoleInfo,
        policy: &PolicyInfo,
        report: &mut ProvisionReport,
    ) -> Result<(), ProvisionError> {
        let label = format!("{} -> {}", policy.name, role.name);
        let attached = self
            .identity
            .attached_policies(&role.name)
            .await
            .map_err(remote(ResourceKind::PolicyAttachment, &label, "look up"))?;

        if attached.contains(&policy.arn) {
            report.record(ResourceKind::PolicyAttachment, label, ResourceStatus::AlreadyPresent);
            return Ok(());
        }

        self.identity
            .attach_role_policy(&role.name, &policy.arn)
            .await
            .map_err(remote(ResourceKind::PolicyAttachment, &label, "create"))?;
        report.record(ResourceKind::PolicyAttachment, label, ResourceStatus::Created);
        Ok(())
    }

    /// Reuse the deployed function or create it under the retry policy.
    /// A new function is immediately granted invocation from the source bucket.
    async fn deploy_function(
        &self,
        role: &RoleInfo,
        report: &mut ProvisionReport,
    ) -> Result<String, ProvisionError> {
        let name = &self.config.function_name;
        let found = self
            .functions
            .find_function(name)
            .await
            .map_err(remote(ResourceKind::Function, name, "look up"))?;

        if let Some(arn) = found.filter(|arn| !arn.is_empty()) {
            report.record(ResourceKind::Function, name.as_str(), ResourceStatus::AlreadyPresent);
            return Ok(arn);
        }

        let artifact = &self.config.artifact_path;
        let arn = self
            .config
            .retry
            .run(|attempt| async move {
                tracing::info!("Deploying function {} (attempt {})", name, attempt);

                let code = tokio::fs::read(artifact)
                    .await
                    .with_context(|| format!("Failed to read {}", artifact.display()))?;
                let spec = FunctionSpec {
                    name: name.clone(),
                    role_arn: role.arn.clone(),
                    handler: self.config.handler.clone(),
                    runtime: self.config.runtime.clone(),
                    memory_size: self.config.memory_size,
                    timeout_secs: self.config.timeout_secs,
                    code,
                };

                let arn = self.functions.create_function(&spec).await?;
                anyhow::ensure!(!arn.is_empty(), "function {name} was created without an ARN");
                Ok(arn)
            })
            .await
            .map_err(|source| ProvisionError::FunctionUnavailable {
                name: name.clone(),
                source,
            })?;

        self.functions
            .add_invoke_permission(name, &self.config.source_bucket)
            .await
            .map_err(remote(ResourceKind::Function, name, "grant invocation of"))?;

        report.record(ResourceKind::Function, name.as_str(), ResourceStatus::Created);
        Ok(arn)
    }

    async fn ensure_notification(
        &self,
        function_arn: &str,
        report: &mut ProvisionReport,
    ) -> Result<(), ProvisionError> {
        let bucket = &self.config.source_bucket;
        let label = format!("{bucket} -> {}", self.config.function_name);
        let targets = self
            .buckets
            .notification_targets(bucket)
            .await
            .map_err(remote(ResourceKind::Notification, &label, "look up"))?;

        if targets.iter().any(|target| target == function_arn) {
            report.record(ResourceKind::Notification, label, ResourceStatus::AlreadyPresent);
            return Ok(());
        }

        self.buckets
            .put_notification(bucket, function_arn, &self.config.notification_event)
            .await
            .map_err(remote(ResourceKind::Notification, &label, "create"))?;
        self.await_visible(ResourceKind::Notification, &label, || async move {
            let targets = self.buckets.notification_targets(bucket).await?;
            Ok(targets.iter().any(|target| target == function_arn))
        })
        .await?;

        report.record(ResourceKind::Notification, label, ResourceStatus::Created);
        Ok(())
    }

    fn document(
        &self,
        path: Option<&PathBuf>,
        fallback: &PolicyDocument,
    ) -> Result<String, ProvisionError> {
        load_document(path.map(PathBuf::as_path), fallback).map_err(|e| ProvisionError::Document {
            path: path.cloned().unwrap_or_default(),
            message: format!("{e:#}"),
        })
    }

    async fn await_visible<F, Fut>(
        &self,
        kind: ResourceKind,
        name: &str,
        probe: F,
    ) -> Result<(), ProvisionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<bool>>,
    {
        tracing::debug!("Waiting for {} {} to become visible", kind, name);

        match self.config.wait.until(probe).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ProvisionError::NotConsistent {
                kind,
                name: name.to_string(),
                attempts: self.config.wait.attempts,
            }),
            Err(e) => Err(remote(kind, name, "confirm")(e)),
        }
    }
}
