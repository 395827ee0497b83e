//! Module variable parsing.
//!
//! [`ModuleParser`] ties the pieces together:
//!
//! 1. classify the source string ([`classify_source`])
//! 2. make sure the HCL converter can run
//! 3. materialize the source as a local directory ([`SourceResolver`])
//! 4. convert every `.tf` / `.tf.json` file and extract its `variable` blocks
//!
//! Only classification, converter setup and source resolution abort a
//! parse. Per-file and per-variable problems are recorded on the
//! [`ParsedModule`] and parsing moves on.
//!
//! # Example
//!
//! ```rust,no_run
//! use tfinputs::parser::ModuleParser;
//! use tfinputs::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let parsed = ModuleParser::new("https://github.com/org/terraform-aws-vpc", &config)
//!         .with_ref("v5.0.0")
//!         .get_variables()
//!         .await?;
//!
//!     for variable in parsed.variables.values() {
//!         println!("{}: {}", variable.name, variable.var_type);
//!     }
//!     Ok(())
//! }
//! ```

mod resolver;
mod source;
mod variable;

pub use resolver::{ResolvedSource, SourceResolver};
pub use source::classify_source;
pub use variable::extract_variables;

use crate::config::Config;
use crate::converter::{self, HclConverter};
use crate::error::Result;
use crate::git::redact;
use crate::types::{ModuleError, ModuleWarning, ParsedModule};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// File extensions to scan for Terraform files.
pub const TERRAFORM_EXTENSIONS: &[&str] = &[".tf", ".tf.json"];

/// Directories never descended into.
pub const SKIP_FILES: &[&str] = &[".terraform", ".terragrunt-cache"];

/// Parses the input variables of one Terraform module.
pub struct ModuleParser {
    source: String,
    reference: Option<String>,
    subfolder: Option<String>,
    config: Config,
    converter: Arc<dyn HclConverter>,
}

impl ModuleParser {
    /// Create a parser for `source` using the converter selected in `config`.
    #[must_use]
    pub fn new(source: impl Into<String>, config: &Config) -> Self {
        Self {
            source: source.into(),
            reference: None,
            subfolder: None,
            config: config.clone(),
            converter: converter::from_config(&config.converter),
        }
    }

    /// Git branch, tag or commit to check out.
    #[must_use]
    pub fn with_ref(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Directory inside the source to treat as the module root.
    #[must_use]
    pub fn with_subfolder(mut self, subfolder: impl Into<String>) -> Self {
        self.subfolder = Some(subfolder.into());
        self
    }

    /// Replace the configured converter.
    #[must_use]
    pub fn with_converter(mut self, converter: Arc<dyn HclConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Parse the module and collect its variables.
    ///
    /// Files are processed in sorted walk order; when a variable is declared
    /// more than once, the last declaration wins and a warning names the
    /// file it replaced.
    ///
    /// # Errors
    ///
    /// - `UnsupportedSource` if the source string cannot be classified
    /// - `ConverterSetup` if the converter is unavailable
    /// - `GitSource`, `Fetch` or `DirectoryNotFound` if the source cannot
    ///   be materialized
    pub async fn get_variables(&self) -> Result<ParsedModule> {
        let source = classify_source(&self.source)?;
        self.converter.ensure_available().await?;

        let resolved = SourceResolver::new(&self.config)
            .resolve(&source, self.reference.as_deref(), self.subfolder.as_deref())
            .await?;
        let root = resolved.root();

        tracing::info!(
            source = %source,
            kind = source.kind(),
            converter = self.converter.name(),
            root = %root.display(),
            "Parsing module"
        );

        // Reports and warnings carry the source without URL credentials
        let shown_source = redact(&self.source, None);
        let mut parsed = ParsedModule::new(shown_source.clone());
        parsed.reference = self.reference.clone();
        parsed.subfolder = self.subfolder.clone();

        let files = self.collect_files(root, &mut parsed.warnings);

        let converter = &self.converter;
        let converted: Vec<_> = stream::iter(files)
            .map(|path| async move {
                let result = converter.convert(&path).await;
                (path, result)
            })
            .buffered(self.config.scan.concurrency.max(1))
            .collect()
            .await;

        let mut origins: HashMap<String, String> = HashMap::new();
        let mut critical = false;

        for (path, result) in converted {
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            let module_path = relative.display().to_string();
            parsed.files.push(relative);

            let document = match result {
                Ok(document) => document,
                Err(e) if !e.is_fatal() => {
                    tracing::warn!(file = %module_path, error = %e, "Skipping file that failed to parse");
                    parsed
                        .warnings
                        .push(ModuleWarning::new(&module_path, format!("Failed to parse file: {e}")));
                    continue;
                }
                Err(e) => {
                    tracing::error!(file = %module_path, error = %e, "Unexpected error while processing file");
                    critical = true;
                    parsed.errors.push(
                        ModuleError::new(&module_path, "Unexpected error while processing file")
                            .with_details(e.to_string()),
                    );
                    continue;
                }
            };

            tracing::debug!(file = %module_path, "Converted file");

            for (name, variable) in extract_variables(&document) {
                match variable {
                    Ok(variable) => {
                        if let Some(previous) = origins.insert(name.clone(), module_path.clone()) {
                            tracing::warn!(variable = %name, file = %module_path, previous = %previous, "Duplicate variable");
                            parsed.warnings.push(ModuleWarning::new(
                                &module_path,
                                format!("Variable '{name}' overrides definition from {previous}"),
                            ));
                        }
                        parsed.variables.insert(name, variable);
                    }
                    Err(e) => {
                        tracing::warn!(variable = %name, file = %module_path, error = %e, "Skipping variable");
                        parsed
                            .warnings
                            .push(ModuleWarning::new(&module_path, format!("Skipping variable '{name}': {e}")));
                    }
                }
            }
        }

        if parsed.variables.is_empty() {
            parsed
                .warnings
                .push(ModuleWarning::new(shown_source, "No variables found in module"));
        }

        if critical {
            tracing::error!(
                variables = parsed.variables.len(),
                files = parsed.files.len(),
                warnings = parsed.warnings.len(),
                errors = parsed.errors.len(),
                "Parsing finished with errors"
            );
        } else {
            tracing::info!(
                variables = parsed.variables.len(),
                files = parsed.files.len(),
                warnings = parsed.warnings.len(),
                "Parsing complete"
            );
        }

        Ok(parsed)
    }

    /// Terraform files under `root` in sorted walk order.
    fn collect_files(&self, root: &Path, warnings: &mut Vec<ModuleWarning>) -> Vec<PathBuf> {
        let patterns: Vec<glob::Pattern> = self
            .config
            .scan
            .exclude_patterns
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!(pattern = %p, error = %e, "Ignoring invalid exclude pattern");
                    None
                }
            })
            .collect();

        let mut files = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(true)
            .max_depth(self.config.scan.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !should_skip(e.path(), e.path().strip_prefix(root).unwrap_or(e.path()), &patterns)
            })
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read directory entry");
                    let location = e
                        .path()
                        .map(|p| p.strip_prefix(root).unwrap_or(p).display().to_string())
                        .unwrap_or_default();
                    warnings.push(ModuleWarning::new(location, format!("Failed to read directory entry: {e}")));
                    continue;
                }
            };

            if entry.file_type().is_file() && is_terraform_file(entry.path()) {
                files.push(entry.into_path());
            }
        }

        tracing::debug!(count = files.len(), root = %root.display(), "Collected Terraform files");
        files
    }
}

/// Check if a path should be skipped during the walk.
pub(crate) fn should_skip(path: &Path, relative: &Path, patterns: &[glob::Pattern]) -> bool {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    if file_name.starts_with('.') {
        tracing::debug!(path = %path.display(), reason = "hidden file/directory", "Skipping path");
        return true;
    }

    if SKIP_FILES.contains(&file_name) {
        tracing::debug!(path = %path.display(), reason = "known skip directory", "Skipping path");
        return true;
    }

    if patterns
        .iter()
        .any(|p| p.matches(file_name) || p.matches_path(relative))
    {
        tracing::debug!(path = %path.display(), reason = "matches exclude pattern", "Skipping path");
        return true;
    }

    false
}

/// Check if a file is a Terraform file.
pub(crate) fn is_terraform_file(path: &Path) -> bool {
    let name = path.to_string_lossy();
    TERRAFORM_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}
