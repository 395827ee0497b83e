//! Configuration module for tfinputs.
//!
//! This module handles loading and validating configuration from:
//! - YAML configuration files (`tfinputs.yaml`)
//! - Environment variables (`GH_TOKEN`, `GL_TOKEN`, `${VAR}` expansion)
//! - CLI arguments
//!
//! # Configuration File Format
//!
//! ```yaml
//! # tfinputs.yaml
//!
//! scan:
//!   exclude_patterns:
//!     - "*.auto.tf"
//!   max_depth: 100
//!   concurrency: 4
//!
//! converter:
//!   mode: native          # or "external" to shell out to hcl2json
//!   binary: hcl2json
//!   install_dir: /usr/local/bin
//!   version: "0.6.4"
//!   timeout_secs: 30
//!
//! git:
//!   binary: git
//!   github_token: ${MY_GITHUB_TOKEN}   # GH_TOKEN is used when unset
//!   timeout_secs: 300
//!   shallow: true
//!
//! fetch:
//!   timeout_secs: 60
//!
//! output:
//!   colored: true
//!   pretty: true
//! ```

use crate::error::{Result, TfInputsError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Config file names looked up in the working directory, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["tfinputs.yaml", "tfinputs.yml", ".tfinputs.yaml"];

static BRACED_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid regex"));
static BARE_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("Invalid regex"));

/// Scanning options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Glob patterns matched against file names and relative paths to skip.
    pub exclude_patterns: Vec<String>,

    /// Maximum depth for recursive directory scanning.
    pub max_depth: usize,

    /// Number of files converted concurrently.
    pub concurrency: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude_patterns: Vec::new(),
            max_depth: 100,
            concurrency: 4,
        }
    }
}

/// Which HCL converter to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConverterMode {
    /// In-process hcl-rs parser
    #[default]
    Native,
    /// External hcl2json binary
    External,
}

/// HCL converter options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterOptions {
    pub mode: ConverterMode,

    /// Binary name or path of the external converter.
    pub binary: String,

    /// Directory the converter is installed into when missing.
    pub install_dir: PathBuf,

    /// Pinned converter release.
    pub version: String,

    /// Overrides the release URL derived from `version`.
    pub download_url: Option<String>,

    /// Per-file conversion timeout.
    pub timeout_secs: u64,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            mode: ConverterMode::Native,
            binary: "hcl2json".to_string(),
            install_dir: PathBuf::from("/usr/local/bin"),
            version: "0.6.4".to_string(),
            download_url: None,
            timeout_secs: 30,
        }
    }
}

impl ConverterOptions {
    /// Release artifact URL for this platform.
    #[must_use]
    pub fn release_url(&self) -> String {
        if let Some(url) = &self.download_url {
            return url.clone();
        }
        let arch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            other => other,
        };
        format!(
            "https://github.com/tmccombs/hcl2json/releases/download/v{version}/hcl2json_{os}_{arch}",
            version = self.version,
            os = std::env::consts::OS,
        )
    }
}

/// Git options.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitOptions {
    /// Git executable.
    pub binary: PathBuf,

    /// GitHub token. Falls back to `GH_TOKEN`.
    #[serde(skip_serializing)]
    pub github_token: Option<String>,

    /// GitLab token. Falls back to `GL_TOKEN`.
    #[serde(skip_serializing)]
    pub gitlab_token: Option<String>,

    /// Self-hosted GitLab instances that also receive the GitLab token.
    pub gitlab_hosts: Vec<String>,

    /// Timeout for each git invocation.
    pub timeout_secs: u64,

    /// Clone with `--depth 1` when no ref is requested.
    pub shallow: bool,
}

impl Default for GitOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("git"),
            github_token: None,
            gitlab_token: None,
            gitlab_hosts: Vec::new(),
            timeout_secs: 300,
            shallow: true,
        }
    }
}

impl std::fmt::Debug for GitOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |token: &Option<String>| token.as_ref().map(|_| "***");
        f.debug_struct("GitOptions")
            .field("binary", &self.binary)
            .field("github_token", &mask(&self.github_token))
            .field("gitlab_token", &mask(&self.gitlab_token))
            .field("gitlab_hosts", &self.gitlab_hosts)
            .field("timeout_secs", &self.timeout_secs)
            .field("shallow", &self.shallow)
            .finish()
    }
}

impl GitOptions {
    /// Load tokens from environment variables, updating config values if not set
    pub fn load_from_env(&mut self) {
        let get_non_empty_env = |var: &str| std::env::var(var).ok().filter(|s| !s.is_empty());

        if self.github_token.is_none() {
            if let Some(token) = get_non_empty_env("GH_TOKEN") {
                tracing::debug!("Loaded GitHub token from GH_TOKEN environment variable");
                self.github_token = Some(token);
            }
        }

        if self.gitlab_token.is_none() {
            if let Some(token) = get_non_empty_env("GL_TOKEN") {
                tracing::debug!("Loaded GitLab token from GL_TOKEN environment variable");
                self.gitlab_token = Some(token);
            }
        }
    }
}

/// HTTP and S3 fetch options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    pub timeout_secs: u64,

    /// Path-style endpoint used instead of `<bucket>.s3.amazonaws.com`.
    pub s3_endpoint: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            s3_endpoint: None,
        }
    }
}

/// Output options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Use colored output.
    pub colored: bool,

    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            colored: true,
            pretty: true,
        }
    }
}

/// Main configuration structure with nested sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scanning options
    pub scan: ScanOptions,

    /// HCL converter options
    pub converter: ConverterOptions,

    /// Git options
    pub git: GitOptions,

    /// HTTP/S3 fetch options
    pub fetch: FetchOptions,

    /// Output options
    pub output: OutputOptions,
}

impl Config {
    /// Load configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or a value is out of range.
    pub fn from_yaml(content: &str) -> Result<Self> {
        tracing::debug!("Parsing configuration from YAML");
        let expanded = expand_env_vars(content);

        let config: Config = serde_yaml::from_str(&expanded).map_err(|e| {
            TfInputsError::config_parse(e.to_string(), Some(Box::new(e)), file!(), line!())
        })?;
        config.validate()?;

        tracing::debug!(
            exclude_patterns = config.scan.exclude_patterns.len(),
            converter = ?config.converter.mode,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TfInputsError::io(path, e, file!(), line!()))?;
        Self::from_yaml(&content)
    }

    /// Find the configuration file to use, if any.
    ///
    /// An explicit path wins, then the working directory, then the
    /// per-user config directory.
    #[must_use]
    pub fn discover(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        CONFIG_FILE_NAMES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
            .or_else(|| {
                dirs::config_dir()
                    .map(|dir| dir.join("tfinputs").join("config.yaml"))
                    .filter(|p| p.is_file())
            })
    }

    /// Discover and load the configuration, falling back to defaults.
    ///
    /// Tokens are always filled from the environment afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if a discovered file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::discover(explicit) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading configuration file");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.load_tokens_from_env();
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.scan.concurrency == 0 {
            return Err(crate::err!(ConfigValue {
                key: "scan.concurrency".to_string(),
                message: "must be at least 1".to_string(),
            }));
        }
        if self.converter.timeout_secs == 0 {
            return Err(crate::err!(ConfigValue {
                key: "converter.timeout_secs".to_string(),
                message: "must be at least 1".to_string(),
            }));
        }
        if self.git.timeout_secs == 0 {
            return Err(crate::err!(ConfigValue {
                key: "git.timeout_secs".to_string(),
                message: "must be at least 1".to_string(),
            }));
        }
        for pattern in &self.scan.exclude_patterns {
            glob::Pattern::new(pattern).map_err(|e| {
                crate::err!(ConfigValue {
                    key: "scan.exclude_patterns".to_string(),
                    message: format!("invalid glob '{pattern}': {e}"),
                })
            })?;
        }
        Ok(())
    }

    /// Generate an example YAML configuration.
    #[must_use]
    pub fn example_yaml() -> String {
        r#"# tfinputs configuration file

# Scanning options
scan:
  # Glob patterns for files to skip (matched against name and relative path)
  exclude_patterns: []
  #  - "*.auto.tf"
  #  - "examples/**"

  # Maximum depth for recursive directory scanning
  max_depth: 100

  # Number of files converted concurrently
  concurrency: 4

# HCL to JSON conversion
converter:
  # native: built-in parser; external: hcl2json subprocess
  mode: native

  # Settings below only apply to the external converter
  binary: hcl2json
  install_dir: /usr/local/bin
  version: "0.6.4"
  # download_url: https://mirror.example.com/hcl2json
  timeout_secs: 30

# Git options (for remote module sources)
git:
  binary: git

  # Tokens default to the GH_TOKEN / GL_TOKEN environment variables
  # github_token: ${MY_GITHUB_TOKEN}
  # gitlab_token: ${MY_GITLAB_TOKEN}

  # Self-hosted GitLab hosts that should also receive the GitLab token
  gitlab_hosts: []
  #  - gitlab.example.com

  timeout_secs: 300

  # Shallow clone when no ref is requested
  shallow: true

# HTTP(S) and S3 artifact downloads
fetch:
  timeout_secs: 60
  # s3_endpoint: http://localhost:9000

# Output options
output:
  # Use colored output in terminal
  colored: true

  # Pretty-print JSON output
  pretty: true
"#
        .to_string()
    }

    /// Merge CLI arguments into the configuration.
    pub fn merge_cli_args(&mut self, args: &crate::cli::InspectArgs) {
        if !args.exclude_patterns.is_empty() {
            self.scan
                .exclude_patterns
                .extend(args.exclude_patterns.iter().cloned());
        }
        if let Some(mode) = args.converter {
            self.converter.mode = mode;
        }
        if let Some(concurrency) = args.concurrency {
            self.scan.concurrency = concurrency.max(1);
        }
        if args.no_color {
            self.output.colored = false;
        }
    }

    /// Load VCS tokens from environment variables
    /// This should be called after loading config to populate token fields
    pub fn load_tokens_from_env(&mut self) {
        self.git.load_from_env();
        tracing::debug!(
            github_token_set = self.git.github_token.is_some(),
            gitlab_token_set = self.git.gitlab_token.is_some(),
            "Token loading complete"
        );
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. Unset variables are left as is.
fn expand_env_vars(content: &str) -> String {
    let lookup = |caps: &regex::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    };
    let braced = BRACED_VAR.replace_all(content, lookup);
    BARE_VAR.replace_all(&braced, lookup).into_owned()
}
