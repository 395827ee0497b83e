//! `hcl2json` subprocess converter.
//!
//! The binary is looked up on `PATH` and in the install directory. When it
//! is missing, the pinned release is downloaded into the install directory
//! and marked executable. Setup happens at most once per converter.

use super::HclConverter;
use crate::config::ConverterOptions;
use crate::err;
use crate::error::{Result, TfInputsError};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Timeout for the `--version` probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs the external `hcl2json` binary once per file.
pub struct ExternalConverter {
    options: ConverterOptions,
    binary: OnceCell<PathBuf>,
}

impl ExternalConverter {
    #[must_use]
    pub fn new(options: &ConverterOptions) -> Self {
        Self {
            options: options.clone(),
            binary: OnceCell::new(),
        }
    }

    fn install_path(&self) -> PathBuf {
        let file_name = Path::new(&self.options.binary)
            .file_name()
            .map_or_else(|| "hcl2json".into(), ToOwned::to_owned);
        self.options.install_dir.join(file_name)
    }

    async fn locate(&self) -> Option<PathBuf> {
        let candidates = [which::which(&self.options.binary).ok(), Some(self.install_path())];
        for candidate in candidates.into_iter().flatten() {
            if probe(&candidate).await {
                tracing::debug!(binary = %candidate.display(), "Found HCL converter");
                return Some(candidate);
            }
        }
        None
    }

    async fn install(&self) -> Result<PathBuf> {
        let url = self.options.release_url();
        let target = self.install_path();
        let setup_error = |message: String| err!(ConverterSetup { message });

        tracing::info!(url = %url, target = %target.display(), "Downloading HCL converter");

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| setup_error(format!("failed to build HTTP client: {e}")))?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| setup_error(format!("download from {url} failed: {e}")))?;
        if !response.status().is_success() {
            return Err(setup_error(format!(
                "download from {url} failed with status {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| setup_error(format!("download from {url} failed: {e}")))?;

        tokio::fs::create_dir_all(&self.options.install_dir)
            .await
            .map_err(|e| setup_error(format!("cannot create {}: {e}", self.options.install_dir.display())))?;
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|e| setup_error(format!("cannot write {}: {e}", target.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755))
                .await
                .map_err(|e| setup_error(format!("cannot mark {} executable: {e}", target.display())))?;
        }

        if !probe(&target).await {
            return Err(setup_error(format!(
                "installed converter at {} does not run",
                target.display()
            )));
        }

        tracing::info!(binary = %target.display(), "HCL converter installed");
        Ok(target)
    }

    async fn binary(&self) -> Result<&PathBuf> {
        self.binary
            .get_or_try_init(|| async {
                match self.locate().await {
                    Some(path) => Ok(path),
                    None => self.install().await,
                }
            })
            .await
    }
}

/// Whether `binary --version` exits successfully.
async fn probe(binary: &Path) -> bool {
    let status = tokio::process::Command::new(binary)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status();
    matches!(tokio::time::timeout(PROBE_TIMEOUT, status).await, Ok(Ok(s)) if s.success())
}

#[async_trait]
impl HclConverter for ExternalConverter {
    fn name(&self) -> &'static str {
        "hcl2json"
    }

    async fn ensure_available(&self) -> Result<()> {
        self.binary().await.map(|_| ())
    }

    async fn convert(&self, path: &Path) -> Result<Value> {
        let binary = self.binary().await?;
        let parse_error = |message: String| TfInputsError::hcl_parse(path, message, file!(), line!());

        let output = tokio::process::Command::new(binary)
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let limit = Duration::from_secs(self.options.timeout_secs);
        let output = match tokio::time::timeout(limit, output).await {
            Ok(result) => result.map_err(|e| TfInputsError::io(binary, e, file!(), line!()))?,
            Err(_) => {
                return Err(parse_error(format!(
                    "converter timed out after {}s",
                    self.options.timeout_secs
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(parse_error(format!(
                "converter exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| parse_error(format!("converter produced invalid JSON: {e}")))
    }
}
