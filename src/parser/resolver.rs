//! Materializes a classified source as a local directory.

use crate::config::Config;
use crate::err;
use crate::error::{Result, TfInputsError};
use crate::fetch::Fetcher;
use crate::git::GitClient;
use crate::types::ModuleSource;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A module directory ready to be walked.
///
/// Remote sources own a temporary directory that is removed when this
/// value is dropped.
#[derive(Debug)]
pub struct ResolvedSource {
    root: PathBuf,
    temp: Option<TempDir>,
}

impl ResolvedSource {
    /// Module root to walk.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the directory is temporary.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }
}

/// Turns a [`ModuleSource`] into a [`ResolvedSource`].
pub struct SourceResolver {
    git: GitClient,
    config: Config,
}

impl SourceResolver {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            git: GitClient::new(&config.git),
            config: config.clone(),
        }
    }

    /// Resolve `source`, applying `reference` and `subfolder`.
    ///
    /// Explicit `reference`/`subfolder` arguments take precedence over the
    /// ones embedded in a git URL.
    ///
    /// # Errors
    ///
    /// - `GitSource` if cloning, checkout or the subfolder lookup fails for
    ///   a git source
    /// - `Fetch` if an HTTP or S3 download fails
    /// - `DirectoryNotFound` if the subfolder of a local or fetched source
    ///   is missing
    pub async fn resolve(
        &self,
        source: &ModuleSource,
        reference: Option<&str>,
        subfolder: Option<&str>,
    ) -> Result<ResolvedSource> {
        match source {
            ModuleSource::Local { path } => {
                if !path.is_dir() {
                    return Err(err!(DirectoryNotFound { path: path.clone() }));
                }
                let root = match subfolder {
                    Some(sub) => locate_subfolder(path, sub).ok_or_else(|| {
                        err!(DirectoryNotFound { path: path.join(sub) })
                    })?,
                    None => path.clone(),
                };
                Ok(ResolvedSource { root, temp: None })
            }

            ModuleSource::Git { url, ref_, subdir, .. } => {
                let temp = make_temp_dir()?;
                let checkout = temp.path().join("repo");
                let reference = reference.or(ref_.as_deref());
                self.git.clone_into(url, reference, &checkout).await?;

                let root = match subfolder.or(subdir.as_deref()) {
                    Some(sub) => locate_subfolder(&checkout, sub).ok_or_else(|| {
                        err!(GitSource {
                            url: crate::git::redact(url, None),
                            message: format!("subfolder '{sub}' not found in repository"),
                        })
                    })?,
                    None => checkout,
                };
                Ok(ResolvedSource { root, temp: Some(temp) })
            }

            ModuleSource::Http { url } => self.fetch(url, subfolder).await,

            ModuleSource::S3 { bucket, key, region } => {
                let fetcher = Fetcher::new(&self.config.fetch)?;
                let url = fetcher.s3_url(bucket, key, region.as_deref());
                self.fetch(&url, subfolder).await
            }
        }
    }

    async fn fetch(&self, url: &str, subfolder: Option<&str>) -> Result<ResolvedSource> {
        let temp = make_temp_dir()?;
        Fetcher::new(&self.config.fetch)?
            .fetch_into(url, temp.path())
            .await?;

        let root = match subfolder {
            Some(sub) => locate_subfolder(temp.path(), sub)
                .ok_or_else(|| err!(DirectoryNotFound { path: PathBuf::from(sub) }))?,
            None => temp.path().to_path_buf(),
        };
        Ok(ResolvedSource { root, temp: Some(temp) })
    }
}

fn make_temp_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("tfinputs-")
        .tempdir()
        .map_err(|e| TfInputsError::io(std::env::temp_dir(), e, file!(), line!()))
}

/// `root/sub` if it is a directory that stays inside `root`.
fn locate_subfolder(root: &Path, sub: &str) -> Option<PathBuf> {
    let root = root.canonicalize().ok()?;
    let candidate = root.join(sub.trim_matches('/')).canonicalize().ok()?;
    (candidate.starts_with(&root) && candidate.is_dir()).then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::ProviderType;

    #[tokio::test]
    async fn test_local_source_used_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let source = ModuleSource::Local {
            path: dir.path().to_path_buf(),
        };

        let resolved = SourceResolver::new(&Config::default())
            .resolve(&source, None, None)
            .await
            .unwrap();
        assert_eq!(resolved.root(), dir.path());
        assert!(!resolved.is_temporary());
    }

    #[tokio::test]
    async fn test_local_subfolder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("modules/vpc")).unwrap();
        let source = ModuleSource::Local {
            path: dir.path().to_path_buf(),
        };
        let resolver = SourceResolver::new(&Config::default());

        let resolved = resolver.resolve(&source, None, Some("modules/vpc")).await.unwrap();
        assert!(resolved.root().ends_with("modules/vpc"));

        let err = resolver.resolve(&source, None, Some("modules/db")).await.unwrap_err();
        assert!(matches!(err, TfInputsError::DirectoryNotFound { .. }));

        // Escaping the module root is treated as missing
        let err = resolver.resolve(&source, None, Some("../")).await.unwrap_err();
        assert!(matches!(err, TfInputsError::DirectoryNotFound { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_git_temp_dir_removed_on_failure_and_drop() {
        use std::os::unix::fs::PermissionsExt;

        let scratch = tempfile::tempdir().unwrap();
        let git = scratch.path().join("fake-git");
        let log = scratch.path().join("targets.log");
        // Record the clone target, create it, then succeed
        let script = format!(
            "#!/bin/sh\nfor last; do :; done\necho \"$last\" >> '{}'\nmkdir -p \"$last/modules/vpc\"\nexit 0\n",
            log.display()
        );
        std::fs::write(&git, script).unwrap();
        std::fs::set_permissions(&git, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = Config::default();
        config.git.binary = git;
        let resolver = SourceResolver::new(&config);
        let source = ModuleSource::Git {
            url: "https://example.com/repo.git".to_string(),
            provider: ProviderType::Generic,
            ref_: None,
            subdir: None,
        };

        let resolved = resolver.resolve(&source, None, Some("modules/vpc")).await.unwrap();
        assert!(resolved.is_temporary());
        let root = resolved.root().to_path_buf();
        assert!(root.is_dir());
        drop(resolved);
        assert!(!root.exists());

        let err = resolver.resolve(&source, None, Some("modules/missing")).await.unwrap_err();
        assert!(matches!(err, TfInputsError::GitSource { .. }));
        assert!(err.to_string().contains("modules/missing"));

        let targets = std::fs::read_to_string(&log).unwrap();
        for target in targets.lines() {
            assert!(!Path::new(target).exists(), "{target} was not cleaned up");
        }
    }
}
