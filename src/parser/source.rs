//! Module source classification.
//!
//! Turns the source string handed to the parser into a structured
//! [`ModuleSource`].
//!
//! # Supported Source Types
//!
//! - **Git**: `https://github.com/...`, `https://gitlab.com/...`,
//!   `git::<url>`, `git://...`, `git@host:path`
//! - **Registry shorthand**: `terraform-aws-modules/<name>/<provider>`
//! - **HTTP**: any other `http(s)://` URL
//! - **S3**: `s3://bucket/key` or `s3::https://s3-<region>.amazonaws.com/bucket/key`
//! - **Local**: an existing path on disk
//!
//! Git URLs may carry `?ref=<ref>` and `//<subdir>` the way Terraform
//! module sources do.

use crate::err;
use crate::error::Result;
use crate::git::{redact, ProviderType};
use crate::types::ModuleSource;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static GIT_HOST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // http(s) URLs hosted on GitHub or GitLab
    Regex::new(r"^https?://(?:[^/@]+@)?(?:www\.)?(?:github\.com|gitlab\.com)/").expect("Invalid regex")
});

static GIT_SSH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // git@host:path
    Regex::new(r"^[A-Za-z0-9._-]+@[A-Za-z0-9.-]+:[^/].*$").expect("Invalid regex")
});

static S3_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Capture groups: 1=region, 2=bucket, 3=key (s3::) or 4=bucket, 5=key (s3://)
    Regex::new(r"^s3::https://s3(?:[-.]([a-z0-9-]+))?\.amazonaws\.com/([^/]+)/(.+)$|^s3://([^/]+)/(.+)$")
        .expect("Invalid regex")
});

static AWS_MODULES_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // terraform-aws-modules/<name>/<provider>
    Regex::new(r"^terraform-aws-modules/([a-z0-9_-]+)/([a-z0-9_-]+)$").expect("Invalid regex")
});

/// Classify a module source string.
///
/// # Examples
///
/// ```rust
/// use tfinputs::parser::classify_source;
/// use tfinputs::types::ModuleSource;
///
/// let source = classify_source("https://github.com/org/repo?ref=v1.0.0").unwrap();
/// assert!(matches!(source, ModuleSource::Git { .. }));
///
/// let source = classify_source("s3://bucket/modules/vpc.zip").unwrap();
/// assert!(matches!(source, ModuleSource::S3 { .. }));
///
/// assert!(classify_source("ftp://example.com/module").is_err());
/// ```
///
/// # Errors
///
/// Returns `UnsupportedSource` if the string matches no known shape and is
/// not an existing path.
pub fn classify_source(source: &str) -> Result<ModuleSource> {
    let source = source.trim();
    if source.is_empty() {
        return Err(unsupported(source, "source is empty"));
    }

    let classified = if GIT_HOST_PATTERN.is_match(source) {
        Some(git_source(source))
    } else if source.starts_with("http://") || source.starts_with("https://") {
        Some(ModuleSource::Http {
            url: source.to_string(),
        })
    } else if let Some(s3) = try_parse_s3_source(source) {
        Some(s3)
    } else if let Some(url) = source.strip_prefix("git::") {
        Some(git_source(url))
    } else if source.starts_with("git://") || GIT_SSH_PATTERN.is_match(source) {
        Some(git_source(source))
    } else if let Some(caps) = AWS_MODULES_PATTERN.captures(source) {
        let url = format!(
            "https://github.com/terraform-aws-modules/terraform-{}-{}",
            &caps[2], &caps[1]
        );
        Some(git_source(&url))
    } else {
        None
    };

    if let Some(classified) = classified {
        tracing::debug!(source = %classified, kind = classified.kind(), "Classified module source");
        return Ok(classified);
    }

    let path = Path::new(source);
    if path.exists() {
        let path = path
            .canonicalize()
            .map_err(|e| crate::error::TfInputsError::io(path, e, file!(), line!()))?;
        tracing::debug!(path = %path.display(), "Classified module source as local");
        return Ok(ModuleSource::Local { path });
    }

    Err(unsupported(
        source,
        "expected a GitHub/GitLab URL, git::, git://, s3://, http(s):// or an existing path",
    ))
}

fn unsupported(source: &str, message: &str) -> crate::error::TfInputsError {
    err!(UnsupportedSource {
        source_url: redact(source, None),
        message: message.to_string(),
    })
}

/// Build a git source, splitting off `?ref=` and `//subdir`.
fn git_source(raw: &str) -> ModuleSource {
    let (base, query) = match raw.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (raw, None),
    };

    let mut ref_ = None;
    let mut subdir = None;
    if let Some(query) = query {
        for pair in query.split('&') {
            if let Some(value) = pair.strip_prefix("ref=") {
                // `?ref=v1//modules/vpc` ordering
                let (value, rest) = match value.split_once("//") {
                    Some((value, rest)) => (value, Some(rest)),
                    None => (value, None),
                };
                ref_ = Some(value.to_string()).filter(|v| !v.is_empty());
                subdir = rest.map(str::to_string);
            }
        }
    }

    let scheme_end = base.find("://").map_or(0, |i| i + 3);
    let url = match base[scheme_end..].find("//") {
        Some(i) => {
            let split = scheme_end + i;
            subdir = Some(base[split + 2..].to_string());
            &base[..split]
        }
        None => base,
    };
    let subdir = subdir
        .map(|s| s.trim_matches('/').to_string())
        .filter(|s| !s.is_empty());

    ModuleSource::Git {
        url: url.to_string(),
        provider: ProviderType::from_url(url),
        ref_,
        subdir,
    }
}

fn try_parse_s3_source(source: &str) -> Option<ModuleSource> {
    let caps = S3_PATTERN.captures(source)?;
    if let (Some(bucket), Some(key)) = (caps.get(2), caps.get(3)) {
        return Some(ModuleSource::S3 {
            bucket: bucket.as_str().to_string(),
            key: key.as_str().to_string(),
            region: caps.get(1).map(|m| m.as_str().to_string()),
        });
    }
    let (bucket, key) = (caps.get(4)?, caps.get(5)?);
    Some(ModuleSource::S3 {
        bucket: bucket.as_str().to_string(),
        key: key.as_str().to_string(),
        region: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TfInputsError;

    fn git_parts(source: &str) -> (String, ProviderType, Option<String>, Option<String>) {
        match classify_source(source).unwrap() {
            ModuleSource::Git { url, provider, ref_, subdir } => (url, provider, ref_, subdir),
            other => panic!("Expected Git source, got {other:?}"),
        }
    }

    #[test]
    fn test_github_and_gitlab_urls() {
        let (url, provider, ref_, subdir) = git_parts("https://github.com/org/repo");
        assert_eq!(url, "https://github.com/org/repo");
        assert_eq!(provider, ProviderType::GitHub);
        assert!(ref_.is_none());
        assert!(subdir.is_none());

        let (url, provider, ..) = git_parts("https://gitlab.com/group/sub/repo.git");
        assert_eq!(url, "https://gitlab.com/group/sub/repo.git");
        assert_eq!(provider, ProviderType::GitLab);
    }

    #[test]
    fn test_inline_ref_and_subdir() {
        let (url, _, ref_, subdir) = git_parts("https://github.com/org/repo.git//modules/vpc?ref=v1.2.0");
        assert_eq!(url, "https://github.com/org/repo.git");
        assert_eq!(ref_.as_deref(), Some("v1.2.0"));
        assert_eq!(subdir.as_deref(), Some("modules/vpc"));

        let (url, _, ref_, subdir) = git_parts("git::https://example.com/repo.git?ref=main//modules/db");
        assert_eq!(url, "https://example.com/repo.git");
        assert_eq!(ref_.as_deref(), Some("main"));
        assert_eq!(subdir.as_deref(), Some("modules/db"));
    }

    #[test]
    fn test_git_scheme_and_ssh() {
        let (url, provider, ..) = git_parts("git://example.com/repo.git");
        assert_eq!(url, "git://example.com/repo.git");
        assert_eq!(provider, ProviderType::Generic);

        let (url, provider, _, subdir) = git_parts("git@github.com:org/repo.git//modules/x");
        assert_eq!(url, "git@github.com:org/repo.git");
        assert_eq!(provider, ProviderType::GitHub);
        assert_eq!(subdir.as_deref(), Some("modules/x"));
    }

    #[test]
    fn test_registry_shorthand() {
        let (url, provider, ..) = git_parts("terraform-aws-modules/vpc/aws");
        assert_eq!(url, "https://github.com/terraform-aws-modules/terraform-aws-vpc");
        assert_eq!(provider, ProviderType::GitHub);
    }

    #[test]
    fn test_http_source() {
        let source = classify_source("https://example.com/modules/vpc.zip").unwrap();
        assert_eq!(
            source,
            ModuleSource::Http {
                url: "https://example.com/modules/vpc.zip".to_string()
            }
        );
    }

    #[test]
    fn test_s3_sources() {
        let source = classify_source("s3://my-bucket/modules/vpc.tf").unwrap();
        assert_eq!(
            source,
            ModuleSource::S3 {
                bucket: "my-bucket".to_string(),
                key: "modules/vpc.tf".to_string(),
                region: None,
            }
        );

        let source = classify_source("s3::https://s3-eu-west-1.amazonaws.com/bucket/vpc.zip").unwrap();
        assert_eq!(
            source,
            ModuleSource::S3 {
                bucket: "bucket".to_string(),
                key: "vpc.zip".to_string(),
                region: Some("eu-west-1".to_string()),
            }
        );
    }

    #[test]
    fn test_local_source_is_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let source = classify_source(dir.path().to_str().unwrap()).unwrap();
        match source {
            ModuleSource::Local { path } => {
                assert!(path.is_absolute());
                assert_eq!(path, dir.path().canonicalize().unwrap());
            }
            other => panic!("Expected Local source, got {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_sources() {
        for source in ["", "ftp://example.com/module", "./definitely/not/here", "hashicorp/consul/aws"] {
            let err = classify_source(source).unwrap_err();
            assert!(
                matches!(err, TfInputsError::UnsupportedSource { .. }),
                "{source}: {err}"
            );
            assert!(err.is_fatal());
        }
    }
}
