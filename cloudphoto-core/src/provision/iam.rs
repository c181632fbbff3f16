use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_iam::{types::PolicyScopeType, Client};

use crate::store::{IdentityAdmin, PolicyInfo, RoleInfo};

#[derive(Clone)]
pub struct IamAdmin {
    client: Client,
}

impl IamAdmin {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityAdmin for IamAdmin {
    async fn find_role(&self, name: &str) -> Result<Option<RoleInfo>> {
        let mut marker: Option<String> = None;

        loop {
            let page = self
                .client
                .list_roles()
                .set_marker(marker.take())
                .send()
                .await
                .context("Failed to list roles")?;

            if let Some(role) = page.roles().iter().find(|role| role.role_name() == name) {
                return Ok(Some(RoleInfo {
                    name: role.role_name().to_string(),
                    arn: role.arn().to_string(),
                }));
            }

            match page.marker() {
                Some(next) if page.is_truncated() => marker = Some(next.to_string()),
                _ => return Ok(None),
            }
        }
    }

    async fn create_role(&self, name: &str, trust_policy: &str) -> Result<RoleInfo> {
        tracing::debug!("IAM CREATE ROLE: role={}", name);

        let output = self
            .client
            .create_role()
            .role_name(name)
            .assume_role_policy_document(trust_policy)
            .send()
            .await
            .with_context(|| format!("Failed to create role {name}"))?;

        let role = output
            .role()
            .with_context(|| format!("Role {name} missing from create response"))?;

        Ok(RoleInfo {
            name: role.role_name().to_string(),
            arn: role.arn().to_string(),
        })
    }

    async fn role_exists(&self, name: &str) -> Result<bool> {
        match self.client.get_role().role_name(name).send().await {
            Ok(_) => Ok(true),
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|err| err.is_no_such_entity_exception()) =>
            {
                Ok(false)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read role {name}")),
        }
    }

    async fn find_policy(&self, name: &str) -> Result<Option<PolicyInfo>> {
        let mut marker: Option<String> = None;

        loop {
            // Customer managed policies only; the AWS managed set is large
            let page = self
                .client
                .list_policies()
                .scope(PolicyScopeType::Local)
                .set_marker(marker.take())
                .send()
                .await
                .context("Failed to list policies")?;

            let found = page
                .policies()
                .iter()
                .find(|policy| policy.policy_name() == Some(name));

            if let Some(policy) = found {
                return Ok(Some(PolicyInfo {
                    name: name.to_string(),
                    arn: policy
                        .arn()
                        .with_context(|| format!("Policy {name} has no ARN"))?
                        .to_string(),
                }));
            }

            match page.marker() {
                Some(next) if page.is_truncated() => marker = Some(next.to_string()),
                _ => return Ok(None),
            }
        }
    }

    async fn create_policy(&self, name: &str, document: &str) -> Result<PolicyInfo> {
        tracing::debug!("IAM CREATE POLICY: policy={}", name);

        let output = self
            .client
            .create_policy()
            .policy_name(name)
            .policy_document(document)
            .send()
            .await
            .with_context(|| format!("Failed to create policy {name}"))?;

        let arn = output
            .policy()
            .and_then(|policy| policy.arn())
            .with_context(|| format!("Policy {name} missing from create response"))?;

        Ok(PolicyInfo {
            name: name.to_string(),
            arn: arn.to_string(),
        })
    }

    async fn policy_exists(&self, arn: &str) -> Result<bool> {
        match self.client.get_policy().policy_arn(arn).send().await {
            Ok(_) => Ok(true),
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|err| err.is_no_such_entity_exception()) =>
            {
                Ok(false)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read policy {arn}")),
        }
    }

    async fn attached_policies(&self, role: &str) -> Result<Vec<String>> {
        let mut arns = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let page = self
                .client
                .list_attached_role_policies()
                .role_name(role)
                .set_marker(marker.take())
                .send()
                .await
                .with_context(|| format!("Failed to list policies attached to {role}"))?;

            arns.extend(
                page.attached_policies()
                    .iter()
                    .filter_map(|policy| policy.policy_arn().map(str::to_string)),
            );

            match page.marker() {
                Some(next) if page.is_truncated() => marker = Some(next.to_string()),
                _ => return Ok(arns),
            }
        }
    }

    async fn attach_role_policy(&self, role: &str, policy_arn: &str) -> Result<()> {
        tracing::debug!("IAM ATTACH: role={}, policy={}", role, policy_arn);

        self.client
            .attach_role_policy()
            .role_name(role)
            .policy_arn(policy_arn)
            .send()
            .await
            .with_context(|| format!("Failed to attach {policy_arn} to {role}"))?;
        Ok(())
    }
}
