//! HCL to JSON conversion.
//!
//! Module files are turned into hcl2json-shaped JSON documents before
//! variable extraction. Two implementations exist:
//!
//! - [`NativeConverter`]: in-process `hcl-rs` parser (default)
//! - [`ExternalConverter`]: the `hcl2json` binary run once per file,
//!   downloaded on first use when it is not installed
//!
//! Non-literal expressions such as `map(string)` come back as interpolated
//! strings (`"${map(string)}"`) from both.

mod external;
mod native;

pub use external::ExternalConverter;
pub use native::NativeConverter;

use crate::config::{ConverterMode, ConverterOptions};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Converts one Terraform file into a JSON document.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HclConverter: Send + Sync {
    /// Converter name for logs.
    fn name(&self) -> &'static str;

    /// Makes sure the converter can run. Called once before any conversion.
    ///
    /// # Errors
    ///
    /// Returns `ConverterSetup` when the converter is missing and cannot be
    /// installed.
    async fn ensure_available(&self) -> Result<()>;

    /// Converts a `.tf` or `.tf.json` file.
    ///
    /// # Errors
    ///
    /// Returns `HclParse` for syntax errors, converter crashes, timeouts and
    /// invalid JSON output. Other variants signal unexpected failures.
    async fn convert(&self, path: &Path) -> Result<Value>;
}

/// Builds the converter selected by the configuration.
#[must_use]
pub fn from_config(options: &ConverterOptions) -> Arc<dyn HclConverter> {
    match options.mode {
        ConverterMode::Native => Arc::new(NativeConverter::new()),
        ConverterMode::External => Arc::new(ExternalConverter::new(options)),
    }
}
