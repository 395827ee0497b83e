//! Report generation module.
//!
//! Renders a [`ParsedModule`] in one of several formats:
//! - Text: human-readable CLI output
//! - JSON: the full parse result with metadata
//! - Schema: JSON Schema of the module inputs
//! - Args: variables flattened to tool argument descriptions
//!
//! # Example
//!
//! ```rust,no_run
//! use tfinputs::reporter::Reporter;
//! use tfinputs::types::{ParsedModule, ReportFormat};
//! use tfinputs::Config;
//!
//! let config = Config::default();
//! let reporter = Reporter::new(&config);
//! let parsed = ParsedModule::new("./modules/vpc");
//!
//! let schema = reporter.generate(&parsed, ReportFormat::Schema).unwrap();
//! println!("{schema}");
//! ```

mod args;
mod json;
mod schema;
mod text;

use crate::config::Config;
use crate::error::Result;
use crate::types::{ParsedModule, ReportFormat};

pub use args::ArgsReporter;
pub use json::JsonReporter;
pub use schema::SchemaReporter;
pub use text::TextReporter;

/// Report generator that supports multiple output formats.
pub struct Reporter {
    config: Config,
}

impl Reporter {
    /// Create a new reporter with the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Generate a report in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if report generation fails.
    pub fn generate(&self, parsed: &ParsedModule, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => TextReporter::new(&self.config).generate(parsed),
            ReportFormat::Json => JsonReporter::new(&self.config).generate(parsed),
            ReportFormat::Schema => SchemaReporter::new(&self.config).generate(parsed),
            ReportFormat::Args => ArgsReporter::new(&self.config).generate(parsed),
        }
    }
}

/// Trait for report generators.
pub trait ReportGenerator {
    /// Generate a report from a parse result.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails.
    fn generate(&self, parsed: &ParsedModule) -> Result<String>;
}

/// Serialize `value` as JSON, pretty-printed when asked.
pub(crate) fn to_json<T: serde::Serialize>(value: &T, pretty: bool, what: &str) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };

    json.map_err(|e| {
        crate::err!(ReportGeneration {
            message: format!("Failed to serialize {what}: {e}"),
        })
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::model::{TerraformType, TerraformVariable};
    use crate::types::{ModuleWarning, ParsedModule};
    use serde_json::json;
    use std::path::PathBuf;

    pub fn sample_module() -> ParsedModule {
        let mut parsed = ParsedModule::new("./modules/vpc");
        parsed.files = vec![PathBuf::from("variables.tf")];

        let mut region = TerraformVariable::new("region", TerraformType::string(), Some(json!("us-east-1")));
        region.description = Some("AWS region".to_string());
        parsed.variables.insert("region".to_string(), region);

        let mut tags = TerraformVariable::new("tags", TerraformType::map(Some(TerraformType::string())), None);
        tags.description = Some("Tags to apply".to_string());
        parsed.variables.insert("tags".to_string(), tags);

        let mut password = TerraformVariable::new("db_password", TerraformType::string(), None);
        password.sensitive = true;
        parsed.variables.insert("db_password".to_string(), password);

        parsed
            .warnings
            .push(ModuleWarning::new("broken.tf", "Failed to parse file: unexpected token"));
        parsed
    }
}
