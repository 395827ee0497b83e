//! Argument list report generator.
//!
//! Flattens each variable into the `{name, description, required, default}`
//! shape consumed by tool wrappers around a module.

use crate::config::Config;
use crate::error::Result;
use crate::model::VariableArgument;
use crate::reporter::{to_json, ReportGenerator};
use crate::types::ParsedModule;

pub struct ArgsReporter {
    pretty: bool,
}

impl ArgsReporter {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            pretty: config.output.pretty,
        }
    }
}

impl ReportGenerator for ArgsReporter {
    fn generate(&self, parsed: &ParsedModule) -> Result<String> {
        let arguments: Vec<VariableArgument> = parsed
            .variables
            .values()
            .map(|v| v.to_argument())
            .collect();
        to_json(&arguments, self.pretty, "argument list")
    }
}
