//! JSON report generator.

use crate::config::Config;
use crate::error::Result;
use crate::model::TerraformVariable;
use crate::reporter::{to_json, ReportGenerator};
use crate::types::{ModuleError, ModuleWarning, ParsedModule};
use serde::Serialize;
use serde_json::Value;

/// JSON report generator.
pub struct JsonReporter {
    /// Whether to pretty-print the output
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            pretty: config.output.pretty,
        }
    }
}

impl ReportGenerator for JsonReporter {
    fn generate(&self, parsed: &ParsedModule) -> Result<String> {
        to_json(&JsonReport::from(parsed), self.pretty, "JSON report")
    }
}

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    /// Report metadata
    pub metadata: ReportMetadata<'a>,
    /// Summary counts
    pub summary: ReportSummary,
    /// Variables in declaration order
    pub variables: Vec<JsonVariable<'a>>,
    /// Non-fatal problems
    pub warnings: &'a [ModuleWarning],
    /// Unexpected per-file failures
    pub errors: &'a [ModuleError],
}

impl<'a> From<&'a ParsedModule> for JsonReport<'a> {
    fn from(parsed: &'a ParsedModule) -> Self {
        Self {
            metadata: ReportMetadata {
                version: env!("CARGO_PKG_VERSION"),
                timestamp: chrono::Utc::now().to_rfc3339(),
                source: &parsed.source,
                reference: parsed.reference.as_deref(),
                subfolder: parsed.subfolder.as_deref(),
                files: parsed.files.iter().map(|f| f.display().to_string()).collect(),
            },
            summary: ReportSummary {
                total_variables: parsed.variables.len(),
                required_variables: parsed.required_variables().count(),
                total_warnings: parsed.warnings.len(),
                total_errors: parsed.errors.len(),
            },
            variables: parsed.variables.values().map(JsonVariable::from).collect(),
            warnings: &parsed.warnings,
            errors: &parsed.errors,
        }
    }
}

/// Report metadata.
#[derive(Debug, Serialize)]
pub struct ReportMetadata<'a> {
    /// tfinputs version
    pub version: &'static str,
    /// Report generation timestamp
    pub timestamp: String,
    /// Module source as given
    pub source: &'a str,
    /// Requested git ref
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<&'a str>,
    /// Requested subfolder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subfolder: Option<&'a str>,
    /// Files processed, relative to the module root
    pub files: Vec<String>,
}

/// Report summary.
#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub total_variables: usize,
    pub required_variables: usize,
    pub total_warnings: usize,
    pub total_errors: usize,
}

/// JSON representation of a variable.
#[derive(Debug, Serialize)]
pub struct JsonVariable<'a> {
    #[serde(flatten)]
    pub variable: &'a TerraformVariable,
    /// How a caller should format the value
    pub input_format: String,
    /// Example value for the type
    pub example: Value,
}

impl<'a> From<&'a TerraformVariable> for JsonVariable<'a> {
    fn from(variable: &'a TerraformVariable) -> Self {
        Self {
            variable,
            input_format: variable.get_input_format(),
            example: variable.var_type.generate_example(),
        }
    }
}
