//! Repository acquisition boundary
//!
//! Cloning is an external collaborator's job; the engine only needs a local
//! path it can build from. `WorkspaceCheckout` maps a repository URL onto an
//! existing checkout under a workspace root.

use crate::error::{Result, StampedeError};
use std::future::Future;
use std::path::PathBuf;

/// Resolves a repository URL to a local checkout.
pub trait RepoProvider: Send + Sync {
    fn acquire(&self, repo_url: &str) -> impl Future<Output = Result<PathBuf>> + Send;
}

/// `RepoProvider` over a directory of already-acquired checkouts, keyed by
/// the last path segment of the URL (with any `.git` suffix stripped).
#[derive(Debug, Clone)]
pub struct WorkspaceCheckout {
    root: PathBuf,
}

impl WorkspaceCheckout {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn repo_name(repo_url: &str) -> Option<&str> {
        let name = repo_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()?
            .trim_end_matches(".git");
        if name.is_empty() { None } else { Some(name) }
    }
}

impl RepoProvider for WorkspaceCheckout {
    async fn acquire(&self, repo_url: &str) -> Result<PathBuf> {
        let name = Self::repo_name(repo_url).ok_or_else(|| StampedeError::RepoAcquisition {
            url: repo_url.to_string(),
            reason: "URL has no repository name".to_string(),
        })?;

        let path = self.root.join(name);
        if !path.is_dir() {
            return Err(StampedeError::RepoAcquisition {
                url: repo_url.to_string(),
                reason: format!("no checkout at {}", path.display()),
            });
        }

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_name_strips_git_suffix_and_trailing_slash() {
        assert_eq!(
            WorkspaceCheckout::repo_name("https://github.com/acme/demo-api.git"),
            Some("demo-api")
        );
        assert_eq!(
            WorkspaceCheckout::repo_name("https://github.com/acme/demo-api/"),
            Some("demo-api")
        );
        assert_eq!(WorkspaceCheckout::repo_name(""), None);
    }
}
