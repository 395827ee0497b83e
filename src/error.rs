//! Error types for tfinputs.
//!
//! This module defines the error hierarchy using `thiserror`. Every variant
//! records the source location where it was raised so failures deep inside
//! the resolver or converter can be traced back without a backtrace.
//!
//! # Error Categories
//!
//! - **Source errors**: unsupported source strings, git clone/checkout/subfolder
//!   failures, HTTP/S3 fetch failures. Fatal for the whole parse.
//! - **Setup errors**: the external HCL converter cannot be found or installed.
//!   Fatal, raised at most once per parse.
//! - **Parsing errors**: a single file cannot be converted. Downgraded to a
//!   warning by the module parser.
//! - **Construction errors**: a single variable block is malformed. Downgraded
//!   to a warning by the module parser.
//!
//! # Example
//!
//! ```rust
//! use tfinputs::error::{TfInputsError, Result};
//!
//! fn read_module_file(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .map_err(|e| TfInputsError::io(path, e, file!(), line!()))
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Macro to create errors with automatic source location tracking.
///
/// Usage:
/// ```ignore
/// return Err(err!(ConverterSetup { message: "download failed".to_string() }));
/// ```
///
/// Field-init shorthand works as in a struct literal: `err!(ConverterSetup { message })`.
#[macro_export]
macro_rules! err {
    ($variant:ident { $($field:ident $(: $value:expr)?),* $(,)? }) => {
        $crate::error::TfInputsError::$variant {
            $($field $(: $value)?,)*
            src_path: file!(),
            src_line: line!(),
        }
    };
}

/// A specialized Result type for tfinputs operations.
pub type Result<T> = std::result::Result<T, TfInputsError>;

/// The main error type for tfinputs.
#[derive(Error, Debug)]
pub enum TfInputsError {
    // =========================================================================
    // I/O and File System Errors
    // =========================================================================
    /// I/O error with path context.
    #[error("I/O error at '{path}' ({src_path}:{src_line}): {source}")]
    Io {
        /// The path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Directory not found.
    #[error("Directory not found: {path} ({src_path}:{src_line})")]
    DirectoryNotFound {
        /// The missing directory path
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Source Errors
    // =========================================================================
    /// The module source string could not be classified.
    #[error("Unsupported or invalid source '{source_url}' ({src_path}:{src_line}): {message}")]
    UnsupportedSource {
        /// The source string as given by the caller
        source_url: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Git clone, checkout or subfolder resolution failed.
    #[error("Git source error for '{url}' ({src_path}:{src_line}): {message}")]
    GitSource {
        /// The repository URL, without credentials
        url: String,
        /// Error message (redacted git stderr)
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Fetching an HTTP or S3 artifact failed.
    #[error("Failed to fetch '{url}' ({src_path}:{src_line}): {message}")]
    Fetch {
        /// The artifact URL
        url: String,
        /// Error message
        message: String,
        /// HTTP status code (if available)
        status_code: Option<u16>,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Converter Errors
    // =========================================================================
    /// The HCL converter is missing and could not be installed.
    #[error("HCL converter setup failed ({src_path}:{src_line}): {message}")]
    ConverterSetup {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// A single file could not be converted from HCL to JSON.
    #[error("Failed to parse HCL in '{file}' ({src_path}:{src_line}): {message}")]
    HclParse {
        /// The file being parsed
        file: PathBuf,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// A variable block could not be turned into a `TerraformVariable`.
    #[error("Invalid definition for variable '{name}' ({src_path}:{src_line}): {message}")]
    VariableDefinition {
        /// The variable name
        name: String,
        /// Description of the structural issue
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration parsing error.
    #[error("Failed to parse configuration ({src_path}:{src_line}): {message}")]
    ConfigParse {
        /// Error message
        message: String,
        /// The underlying error (if any)
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}' ({src_path}:{src_line}): {message}")]
    ConfigValue {
        /// The configuration key
        key: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Report Errors
    // =========================================================================
    /// Report generation error.
    #[error("Failed to generate report ({src_path}:{src_line}): {message}")]
    ReportGeneration {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Internal error (should not happen in normal operation).
    #[error("Internal error ({src_path}:{src_line}): {message}")]
    Internal {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },
}

impl TfInputsError {
    /// Creates an `Io` error.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error, src_path: &'static str, src_line: u32) -> Self {
        Self::Io { path: path.into(), source, src_path, src_line }
    }

    /// Creates an `HclParse` error.
    #[must_use]
    pub fn hcl_parse(file: impl Into<PathBuf>, message: String, src_path: &'static str, src_line: u32) -> Self {
        Self::HclParse { file: file.into(), message, src_path, src_line }
    }

    /// Creates a `ConfigParse` error.
    #[must_use]
    pub fn config_parse(message: String, source: Option<Box<dyn std::error::Error + Send + Sync>>, src_path: &'static str, src_line: u32) -> Self {
        Self::ConfigParse { message, source, src_path, src_line }
    }

    /// Creates an `Internal` error.
    #[must_use]
    pub fn internal(message: String, src_path: &'static str, src_line: u32) -> Self {
        Self::Internal { message, src_path, src_line }
    }

    /// Whether the error aborts a whole module parse.
    ///
    /// Parsing and construction errors are scoped to one file or one variable
    /// and are downgraded to warnings by the module parser.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::HclParse { .. } | Self::VariableDefinition { .. })
    }

    /// Whether the error comes from classifying or materializing the source.
    #[must_use]
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedSource { .. }
                | Self::GitSource { .. }
                | Self::Fetch { .. }
                | Self::DirectoryNotFound { .. }
        )
    }

    /// Returns the appropriate exit code for the error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied => 13,
            Self::DirectoryNotFound { .. } => 15,
            Self::UnsupportedSource { .. } => 16,
            Self::GitSource { .. } => 17,
            Self::ConfigParse { .. } => 18,
            Self::ConfigValue { .. } => 19,
            Self::Fetch { .. } => 20,
            Self::ConverterSetup { .. } => 21,
            _ => 1, // Generic unhandled error
        }
    }
}

impl From<std::io::Error> for TfInputsError {
    fn from(source: std::io::Error) -> Self {
        // Prefer TfInputsError::io(path, ..) wherever the path is known
        Self::Io {
            path: PathBuf::new(),
            source,
            src_path: file!(),
            src_line: line!(),
        }
    }
}

impl From<serde_json::Error> for TfInputsError {
    fn from(source: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("JSON serialization/deserialization error: {}", source),
            src_path: file!(),
            src_line: line!(),
        }
    }
}
