//! In-process HCL converter built on `hcl-rs`.

use super::HclConverter;
use crate::error::{Result, TfInputsError};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

/// Parses `.tf` files with `hcl-rs` and `.tf.json` files with `serde_json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeConverter;

impl NativeConverter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Converts file content that has already been read.
    ///
    /// # Errors
    ///
    /// Returns `HclParse` if the content is not valid HCL or JSON.
    pub fn convert_str(&self, content: &str, path: &Path) -> Result<Value> {
        let is_json = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".tf.json"));

        if is_json {
            serde_json::from_str(content).map_err(|e| {
                TfInputsError::hcl_parse(path, format!("invalid JSON: {e}"), file!(), line!())
            })
        } else {
            hcl::from_str::<Value>(content)
                .map_err(|e| TfInputsError::hcl_parse(path, e.to_string(), file!(), line!()))
        }
    }
}

#[async_trait]
impl HclConverter for NativeConverter {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn ensure_available(&self) -> Result<()> {
        Ok(())
    }

    async fn convert(&self, path: &Path) -> Result<Value> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| TfInputsError::io(path, e, file!(), line!()))?;
        self.convert_str(&content, path)
    }
}
