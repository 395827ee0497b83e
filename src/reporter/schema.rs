//! JSON Schema report generator.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::{to_json, ReportGenerator};
use crate::types::ParsedModule;

/// Emits the module's input schema.
pub struct SchemaReporter {
    pretty: bool,
}

impl SchemaReporter {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            pretty: config.output.pretty,
        }
    }
}

impl ReportGenerator for SchemaReporter {
    fn generate(&self, parsed: &ParsedModule) -> Result<String> {
        to_json(&parsed.to_json_schema(), self.pretty, "JSON schema")
    }
}
