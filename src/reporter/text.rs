//! Plain text report generator.

use crate::config::Config;
use crate::error::Result;
use crate::model::TerraformVariable;
use crate::reporter::ReportGenerator;
use crate::types::ParsedModule;
use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};

/// Text report generator for CLI output.
pub struct TextReporter {
    /// Whether to use colors
    use_colors: bool,
}

impl TextReporter {
    /// Create a new text reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            use_colors: config.output.colored,
        }
    }
}

impl ReportGenerator for TextReporter {
    fn generate(&self, parsed: &ParsedModule) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header(parsed));
        output.push('\n');

        output.push_str(&self.format_summary(parsed));
        output.push('\n');

        if !parsed.variables.is_empty() {
            output.push_str(&self.format_variables(parsed));
            output.push('\n');
        }

        if parsed.has_warnings() {
            output.push_str(&self.format_warnings(parsed));
            output.push('\n');
        }

        if parsed.has_errors() {
            output.push_str(&self.format_errors(parsed));
            output.push('\n');
        }

        Ok(output)
    }
}

impl TextReporter {
    fn section_title(&self, title: &str) -> String {
        let title = if self.use_colors {
            title.bright_cyan().bold().to_string()
        } else {
            title.to_string()
        };
        format!("\n{title}\n{}\n", "-".repeat(80))
    }

    /// Format the report header.
    fn format_header(&self, parsed: &ParsedModule) -> String {
        let title = "tfinputs";
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        let mut source = parsed.source.clone();
        if let Some(reference) = &parsed.reference {
            source.push_str(&format!(" @ {reference}"));
        }
        if let Some(subfolder) = &parsed.subfolder {
            source.push_str(&format!(" // {subfolder}"));
        }

        if self.use_colors {
            format!(
                "\n{} {} {}\n{}\n",
                title.bright_white().bold(),
                version.dimmed(),
                source.bright_white(),
                "=".repeat(80).bright_blue(),
            )
        } else {
            format!("\n{title} {version} {source}\n{}\n", "=".repeat(80))
        }
    }

    /// Format the summary section.
    fn format_summary(&self, parsed: &ParsedModule) -> String {
        let mut output = self.section_title("Summary");

        let total = parsed.variables.len();
        let required = parsed.required_variables().count();
        let warnings = parsed.warnings.len();
        let errors = parsed.errors.len();
        let plural = |n: usize, one: &'static str, many: &'static str| if n == 1 { one } else { many };

        if self.use_colors {
            output.push_str(&format!(
                "  {} {} ({} required) | {} {} | {} {}\n",
                total.to_string().bold(),
                plural(total, "Variable", "Variables"),
                required.to_string().bold(),
                warnings.to_string().yellow().bold(),
                plural(warnings, "Warning", "Warnings"),
                errors.to_string().red().bold(),
                plural(errors, "Error", "Errors"),
            ));
        } else {
            output.push_str(&format!(
                "  {total} {} ({required} required) | {warnings} {} | {errors} {}\n",
                plural(total, "Variable", "Variables"),
                plural(warnings, "Warning", "Warnings"),
                plural(errors, "Error", "Errors"),
            ));
        }
        output.push_str(&format!("  {} files\n", parsed.files.len()));
        output
    }

    /// Format the variables table.
    fn format_variables(&self, parsed: &ParsedModule) -> String {
        let mut output = self.section_title("Variables");

        let mut table = Table::new();
        table
            .load_preset(comfy_table::presets::UTF8_BORDERS_ONLY)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Name", "Type", "Required", "Default", "Description"]);

        for variable in parsed.variables.values() {
            self.add_variable_row(&mut table, variable);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    fn add_variable_row(&self, table: &mut Table, variable: &TerraformVariable) {
        let required = if variable.required() { "yes" } else { "no" };
        let required_cell = match (self.use_colors, variable.required()) {
            (true, true) => Cell::new(required).fg(Color::Yellow),
            (true, false) => Cell::new(required).fg(Color::Green),
            (false, _) => Cell::new(required),
        };

        let default = match &variable.default {
            _ if variable.sensitive && variable.default.is_some() => "(sensitive)".to_string(),
            Some(value) => truncate(&value.to_string(), 30),
            None => "-".to_string(),
        };

        table.add_row(vec![
            Cell::new(&variable.name),
            Cell::new(truncate(&variable.var_type.to_string(), 40)),
            required_cell,
            Cell::new(default),
            Cell::new(variable.description.as_deref().unwrap_or("")),
        ]);
    }

    /// Format the warnings section.
    fn format_warnings(&self, parsed: &ParsedModule) -> String {
        let mut output = self.section_title("Warnings");
        let label = if self.use_colors {
            "WARNING".yellow().to_string()
        } else {
            "WARNING".to_string()
        };
        for warning in &parsed.warnings {
            output.push_str(&format!("  [{label}] {warning}\n"));
        }
        output
    }

    /// Format the errors section.
    fn format_errors(&self, parsed: &ParsedModule) -> String {
        let mut output = self.section_title("Errors");
        let label = if self.use_colors {
            "ERROR".red().bold().to_string()
        } else {
            "ERROR".to_string()
        };
        for error in &parsed.errors {
            output.push_str(&format!("  [{label}] {}: {}\n", error.module_path, error.error));
            if let Some(details) = &error.details {
                let details = format!("    {details}");
                if self.use_colors {
                    output.push_str(&details.dimmed().to_string());
                } else {
                    output.push_str(&details);
                }
                output.push('\n');
            }
        }
        output
    }
}

/// Truncate a string to `max` characters, appending `...` when cut.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
