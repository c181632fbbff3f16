use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_lambda::{
    primitives::Blob,
    types::{FunctionCode, Runtime},
    Client,
};

use crate::store::{FunctionAdmin, FunctionSpec};

const INVOKE_STATEMENT_ID: &str = "s3invoke";
const INVOKE_ACTION: &str = "lambda:InvokeFunction";
const STORAGE_PRINCIPAL: &str = "s3.amazonaws.com";

#[derive(Clone)]
pub struct LambdaAdmin {
    client: Client,
}

impl LambdaAdmin {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FunctionAdmin for LambdaAdmin {
    async fn find_function(&self, name: &str) -> Result<Option<String>> {
        let mut marker: Option<String> = None;

        loop {
            let page = self
                .client
                .list_functions()
                .set_marker(marker.take())
                .send()
                .await
                .context("Failed to list functions")?;

            let found = page
                .functions()
                .iter()
                .find(|function| function.function_name() == Some(name));

            if let Some(function) = found {
                return Ok(function.function_arn().map(str::to_string));
            }

            match page.next_marker() {
                Some(next) => marker = Some(next.to_string()),
                None => return Ok(None),
            }
        }
    }

    async fn create_function(&self, spec: &FunctionSpec) -> Result<String> {
        tracing::debug!(
            "LAMBDA CREATE: function={}, runtime={}, size={} bytes",
            spec.name,
            spec.runtime,
            spec.code.len()
        );

        let output = self
            .client
            .create_function()
            .function_name(&spec.name)
            .description("CloudPhoto upload handler")
            .role(&spec.role_arn)
            .handler(&spec.handler)
            .runtime(Runtime::from(spec.runtime.as_str()))
            .memory_size(spec.memory_size)
            .timeout(spec.timeout_secs)
            .code(
                FunctionCode::builder()
                    .zip_file(Blob::new(spec.code.clone()))
                    .build(),
            )
            .send()
            .await
            .with_context(|| format!("Failed to create function {}", spec.name))?;

        let arn = output
            .function_arn()
            .with_context(|| format!("Function {} missing from create response", spec.name))?;
        Ok(arn.to_string())
    }

    async fn add_invoke_permission(&self, function: &str, source_bucket: &str) -> Result<()> {
        tracing::debug!(
            "LAMBDA ADD PERMISSION: function={}, source_bucket={}",
            function,
            source_bucket
        );

        self.client
            .add_permission()
            .function_name(function)
            .statement_id(INVOKE_STATEMENT_ID)
            .action(INVOKE_ACTION)
            .principal(STORAGE_PRINCIPAL)
            .source_arn(format!("arn:aws:s3:::{source_bucket}"))
            .send()
            .await
            .with_context(|| format!("Failed to grant {source_bucket} access to {function}"))?;
        Ok(())
    }
}
