//! # tfinputs
//!
//! Terraform module input variable inspector.
//!
//! tfinputs resolves a Terraform module from a local directory, a Git
//! repository, an HTTP URL or an S3 object, parses every `variable` block
//! it declares and infers a structured type for each input.
//!
//! ## Features
//!
//! - **Source resolution**: local paths, GitHub/GitLab URLs, `git::`,
//!   `git://`, `git@host:path`, `s3://` and plain HTTP(S) artifacts, with
//!   `GH_TOKEN` / `GL_TOKEN` for private repositories
//! - **HCL conversion**: in-process `hcl-rs` parsing, or the `hcl2json`
//!   binary downloaded on first use
//! - **Type inference**: `list`, `set`, `map`, `object` with `optional`
//!   attributes, nested to any reasonable depth
//! - **Best-effort parsing**: broken files and malformed blocks become
//!   warnings instead of aborting the whole module
//! - **Multiple output formats**: text tables, JSON, JSON Schema and
//!   argument lists
//!
//! ## Example
//!
//! ```rust,no_run
//! use tfinputs::{inspect_module, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let parsed = inspect_module("./modules/vpc", None, None, &config).await?;
//!
//!     for variable in parsed.required_variables() {
//!         println!("{} ({})", variable.name, variable.get_input_format());
//!     }
//!     for warning in &parsed.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all, clippy::pedantic, rust_2018_idioms)]

pub mod cli;
pub mod config;
pub mod converter;
pub mod error;
pub mod fetch;
pub mod git;
pub mod model;
pub mod parser;
pub mod reporter;
pub mod types;

// Re-export commonly used types at crate root
pub use config::Config;
pub use error::{Result, TfInputsError};
pub use model::{BaseType, TerraformType, TerraformVariable, VariableArgument};
pub use parser::ModuleParser;
pub use types::{ModuleError, ModuleSource, ModuleWarning, ParsedModule, ReportFormat};

/// Parse the input variables of the module at `source`.
///
/// Shorthand for building a [`ModuleParser`] and calling
/// [`ModuleParser::get_variables`].
///
/// # Errors
///
/// Returns an error if the source cannot be classified or resolved, or if
/// the HCL converter is unavailable. Per-file problems are reported on the
/// returned [`ParsedModule`] instead.
pub async fn inspect_module(
    source: &str,
    reference: Option<&str>,
    subfolder: Option<&str>,
    config: &Config,
) -> Result<ParsedModule> {
    let mut parser = ModuleParser::new(source, config);
    if let Some(reference) = reference {
        parser = parser.with_ref(reference);
    }
    if let Some(subfolder) = subfolder {
        parser = parser.with_subfolder(subfolder);
    }
    parser.get_variables().await
}
