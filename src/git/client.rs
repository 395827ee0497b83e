//! Git client implementation.
//!
//! Clones repositories through the `git` binary so no libgit2 build is
//! required. Every invocation runs under the configured timeout with
//! terminal prompts disabled, and the child is killed if the future is
//! dropped.

use crate::config::GitOptions;
use crate::err;
use crate::error::Result;
use crate::git::providers::{GenericProvider, GitHubProvider, GitLabProvider, GitProvider};
use crate::git::redact;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

/// Git client for cloning module repositories.
pub struct GitClient {
    options: GitOptions,
    providers: Vec<Arc<dyn GitProvider>>,
}

impl GitClient {
    /// Create a new Git client with the given options.
    #[must_use]
    pub fn new(options: &GitOptions) -> Self {
        let providers: Vec<Arc<dyn GitProvider>> = vec![
            Arc::new(GitHubProvider::new()),
            Arc::new(GitLabProvider::new().with_hosts(&options.gitlab_hosts)),
        ];

        Self {
            options: options.clone(),
            providers,
        }
    }

    fn find_provider(&self, url: &str) -> Arc<dyn GitProvider> {
        self.providers
            .iter()
            .find(|p| p.can_handle(url))
            .cloned()
            .unwrap_or_else(|| Arc::new(GenericProvider))
    }

    /// Clone `url` into `target` and optionally check out `reference`.
    ///
    /// `target` must not exist or be empty. The clone is shallow unless a
    /// ref is requested, since arbitrary commits may not be reachable from
    /// a depth-1 history.
    ///
    /// # Errors
    ///
    /// Returns `GitSource` if the clone or checkout fails or times out. The
    /// message carries git's stderr with credentials removed.
    pub async fn clone_into(&self, url: &str, reference: Option<&str>, target: &Path) -> Result<()> {
        let provider = self.find_provider(url);
        let token = provider.token(&self.options);
        let clone_url = match token {
            Some(token) => provider.authenticated_url(url, token)?,
            None => url.to_string(),
        };

        tracing::info!(
            url = %redact(url, token),
            provider = provider.name(),
            reference = ?reference,
            has_token = token.is_some(),
            "Cloning repository"
        );

        let mut args: Vec<OsString> = vec!["clone".into(), "--quiet".into()];
        if self.options.shallow && reference.is_none() {
            args.extend(["--depth".into(), "1".into()]);
        }
        args.extend(["--".into(), clone_url.into(), target.as_os_str().to_owned()]);
        self.run_git(args, url, token, "clone").await?;

        if let Some(reference) = reference {
            tracing::info!(reference = %reference, "Checking out ref");
            let args: Vec<OsString> = vec![
                "-C".into(),
                target.as_os_str().to_owned(),
                "checkout".into(),
                "--quiet".into(),
                reference.into(),
            ];
            self.run_git(args, url, token, "checkout").await?;
        }

        tracing::debug!(path = %target.display(), "Repository ready");
        Ok(())
    }

    async fn run_git(&self, args: Vec<OsString>, url: &str, token: Option<&str>, action: &str) -> Result<()> {
        let git_error = |message: String| {
            err!(GitSource {
                url: redact(url, token),
                message: redact(&message, token),
            })
        };

        let mut command = tokio::process::Command::new(&self.options.binary);
        command
            .args(&args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let limit = Duration::from_secs(self.options.timeout_secs);
        let output = match tokio::time::timeout(limit, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(git_error(format!(
                    "failed to run '{}': {e}",
                    self.options.binary.display()
                )));
            }
            Err(_) => {
                tracing::warn!(action = %action, timeout_secs = self.options.timeout_secs, "git timed out");
                return Err(git_error(format!(
                    "git {action} timed out after {}s",
                    self.options.timeout_secs
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(git_error(format!(
                "git {action} failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}
