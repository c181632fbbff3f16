use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

const POLICY_VERSION: &str = "2012-10-17";
const FUNCTION_SERVICE: &str = "lambda.amazonaws.com";

/// IAM policy document in its JSON wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub effect: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    pub action: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(rename = "Service")]
    pub service: String,
}

impl PolicyDocument {
    /// Trust policy letting the function service assume the role.
    pub fn function_trust() -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![Statement {
                effect: "Allow".to_string(),
                principal: Some(Principal {
                    service: FUNCTION_SERVICE.to_string(),
                }),
                action: vec!["sts:AssumeRole".to_string()],
                resource: None,
            }],
        }
    }

    /// Object read/write on both buckets plus log delivery.
    pub fn bucket_access(source_bucket: &str, destination_bucket: &str) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![
                Statement {
                    effect: "Allow".to_string(),
                    principal: None,
                    action: vec![
                        "s3:GetObject".to_string(),
                        "s3:GetObjectTagging".to_string(),
                        "s3:PutObject".to_string(),
                        "s3:PutObjectTagging".to_string(),
                    ],
                    resource: Some(vec![
                        format!("arn:aws:s3:::{source_bucket}/*"),
                        format!("arn:aws:s3:::{destination_bucket}/*"),
                    ]),
                },
                Statement {
                    effect: "Allow".to_string(),
                    principal: None,
                    action: vec![
                        "logs:CreateLogGroup".to_string(),
                        "logs:CreateLogStream".to_string(),
                        "logs:PutLogEvents".to_string(),
                    ],
                    resource: Some(vec!["arn:aws:logs:*:*:*".to_string()]),
                },
            ],
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The document stored at `path`, or `fallback` rendered to JSON.
/// Override files are passed through verbatim once they parse as JSON.
pub fn load_document(path: Option<&Path>, fallback: &PolicyDocument) -> anyhow::Result<String> {
    let Some(path) = path else {
        return fallback.to_json();
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str::<serde_json::Value>(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn trust_policy_wire_shape() {
        let rendered: Value =
            serde_json::from_str(&PolicyDocument::function_trust().to_json().unwrap()).unwrap();

        assert_eq!(
            rendered,
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": { "Service": "lambda.amazonaws.com" },
                    "Action": ["sts:AssumeRole"]
                }]
            })
        );
    }

    #[test]
    fn access_policy_covers_both_buckets() {
        let document = PolicyDocument::bucket_access("src", "dst");
        let resources = document.statement[0].resource.as_ref().unwrap();

        assert_eq!(resources, &vec!["arn:aws:s3:::src/*".to_string(), "arn:aws:s3:::dst/*".to_string()]);
        assert!(document.statement.iter().all(|s| s.principal.is_none()));
    }

    #[test]
    fn override_file_is_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        let raw = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Deny","Action":"*","Resource":"*"}]}"#;
        std::fs::write(&path, raw).unwrap();

        let loaded = load_document(Some(&path), &PolicyDocument::function_trust()).unwrap();
        assert_eq!(loaded, raw);
    }

    #[test]
    fn override_file_must_be_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(load_document(Some(&path), &PolicyDocument::function_trust()).is_err());
        assert!(load_document(Some(&dir.path().join("missing.json")), &PolicyDocument::function_trust()).is_err());
    }
}
