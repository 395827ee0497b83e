//! Core data types used throughout tfinputs.
//!
//! This module defines the fundamental data structures for representing:
//! - Module sources (local, Git, HTTP, S3)
//! - Per-file warnings and errors collected during a parse
//! - The parse result handed back to callers
//! - Report formats

use crate::git::{redact, ProviderType};
use crate::model::TerraformVariable;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt::Display;
use std::path::PathBuf;

/// Represents the classified source of a Terraform module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModuleSource {
    /// Directory on the local filesystem
    Local {
        /// Absolute path to the module
        path: PathBuf,
    },

    /// Git repository source
    Git {
        /// Clone URL, without credentials
        url: String,
        /// Hosting provider, used to pick the auth token
        provider: ProviderType,
        /// Git ref (branch, tag, or commit) embedded in the source string
        #[serde(rename = "ref")]
        ref_: Option<String>,
        /// Subdirectory within the repository embedded in the source string
        subdir: Option<String>,
    },

    /// HTTP/HTTPS URL to a fetchable artifact
    Http {
        /// Artifact URL
        url: String,
    },

    /// S3 bucket object
    S3 {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
        /// AWS region, when given in the source string
        region: Option<String>,
    },
}

impl ModuleSource {
    /// Short name of the source kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::Git { .. } => "git",
            Self::Http { .. } => "http",
            Self::S3 { .. } => "s3",
        }
    }

    /// Whether resolving this source needs a temporary directory.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::Local { .. })
    }
}

impl Display for ModuleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local { path } => write!(f, "{}", path.display()),
            Self::Git { url, ref_, subdir, .. } => {
                write!(f, "git::{}", redact(url, None))?;
                if let Some(r) = ref_ {
                    write!(f, "?ref={r}")?;
                }
                if let Some(s) = subdir {
                    write!(f, "//{s}")?;
                }
                Ok(())
            }
            Self::Http { url } => f.write_str(&redact(url, None)),
            Self::S3 { bucket, key, .. } => write!(f, "s3://{bucket}/{key}"),
        }
    }
}

/// A non-fatal problem recorded while parsing a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleWarning {
    /// File (relative to the module root) or module the warning refers to
    pub module_path: String,
    /// Human-readable message
    pub message: String,
}

impl ModuleWarning {
    #[must_use]
    pub fn new(module_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            module_path: module_path.into(),
            message: message.into(),
        }
    }
}

impl Display for ModuleWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.module_path, self.message)
    }
}

/// An unexpected failure recorded for one file. Parsing continued past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleError {
    /// File (relative to the module root) the error refers to
    pub module_path: String,
    /// Error summary
    pub error: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ModuleError {
    #[must_use]
    pub fn new(module_path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            module_path: module_path.into(),
            error: error.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl Display for ModuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.module_path, self.error)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

/// Result of parsing one module.
///
/// Variables, warnings and errors always come back together. An empty
/// variable map with only warnings means the module declares no inputs;
/// an empty map with errors means the parse went wrong.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedModule {
    /// Source string as given by the caller
    pub source: String,

    /// Requested git ref
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Requested subfolder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subfolder: Option<String>,

    /// Variables keyed by name, in file processing order
    pub variables: IndexMap<String, TerraformVariable>,

    /// Non-fatal problems
    pub warnings: Vec<ModuleWarning>,

    /// Unexpected per-file failures
    pub errors: Vec<ModuleError>,

    /// Files that were processed, relative to the module root
    pub files: Vec<PathBuf>,
}

impl ParsedModule {
    /// Create an empty result for a source.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            reference: None,
            subfolder: None,
            variables: IndexMap::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Splits the result into `(variables, warnings, errors)`.
    #[must_use]
    pub fn into_parts(
        self,
    ) -> (IndexMap<String, TerraformVariable>, Vec<ModuleWarning>, Vec<ModuleError>) {
        (self.variables, self.warnings, self.errors)
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Variables without a default.
    pub fn required_variables(&self) -> impl Iterator<Item = &TerraformVariable> {
        self.variables.values().filter(|v| v.required())
    }

    /// JSON Schema (draft 2020-12) describing the module's inputs.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .variables
            .iter()
            .map(|(name, var)| {
                let mut schema = var.var_type.to_json_schema();
                if let Value::Object(fields) = &mut schema {
                    if let Some(description) = &var.description {
                        fields.insert("description".to_string(), json!(description));
                    }
                    if let Some(default) = &var.default {
                        fields.insert("default".to_string(), default.clone());
                    }
                    if var.sensitive {
                        fields.insert("writeOnly".to_string(), json!(true));
                    }
                }
                (name.clone(), schema)
            })
            .collect();
        let required: Vec<&str> = self.required_variables().map(|v| v.name.as_str()).collect();

        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "title": self.source,
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum ReportFormat {
    /// Plain text tables
    #[default]
    Text,
    /// Full parse result as JSON
    Json,
    /// JSON Schema of the module inputs
    Schema,
    /// Variables flattened to argument descriptions
    Args,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TerraformType;

    fn sample() -> ParsedModule {
        let mut parsed = ParsedModule::new("./modules/vpc");
        let mut region = TerraformVariable::new("region", TerraformType::string(), Some(json!("us-east-1")));
        region.description = Some("AWS region".to_string());
        parsed.variables.insert("region".to_string(), region);
        parsed.variables.insert(
            "tags".to_string(),
            TerraformVariable::new("tags", TerraformType::map(Some(TerraformType::string())), None),
        );
        parsed
    }

    #[test]
    fn test_module_schema() {
        let schema = sample().to_json_schema();
        assert_eq!(schema["required"], json!(["tags"]));
        assert_eq!(schema["properties"]["region"]["default"], json!("us-east-1"));
        assert_eq!(schema["properties"]["region"]["description"], json!("AWS region"));
        assert_eq!(schema["properties"]["tags"]["type"], json!("object"));
    }

    #[test]
    fn test_module_schema_accepts_examples() {
        let parsed = sample();
        let schema = parsed.to_json_schema();
        let instance: Map<String, Value> = parsed
            .variables
            .iter()
            .map(|(name, var)| (name.clone(), var.var_type.generate_example()))
            .collect();
        assert!(jsonschema::is_valid(&schema, &Value::Object(instance)));
        assert!(!jsonschema::is_valid(&schema, &json!({ "region": "eu-west-1" })));
    }

    #[test]
    fn test_into_parts() {
        let mut parsed = sample();
        parsed.warnings.push(ModuleWarning::new("main.tf", "oops"));
        let (variables, warnings, errors) = parsed.into_parts();
        assert_eq!(variables.len(), 2);
        assert_eq!(warnings.len(), 1);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_source_display() {
        let source = ModuleSource::Git {
            url: "https://github.com/org/repo.git".to_string(),
            provider: ProviderType::GitHub,
            ref_: Some("v1.0.0".to_string()),
            subdir: Some("modules/vpc".to_string()),
        };
        assert_eq!(source.to_string(), "git::https://github.com/org/repo.git?ref=v1.0.0//modules/vpc");
        assert!(source.is_remote());
        assert_eq!(source.kind(), "git");
    }

    #[test]
    fn test_error_display() {
        let err = ModuleError::new("main.tf", "converter crashed").with_details("exit status 139");
        assert_eq!(err.to_string(), "main.tf: converter crashed (exit status 139)");
    }
}
