//! # Git Workspace Control
//!
//! The incremental update engine drives two repositories: the API corpus it
//! reads commit history from, and the language repository it writes,
//! commits and publishes. All of that goes through the [`GitWorkspace`]
//! trait so the engine can be tested with a scripted implementation instead
//! of real repositories.
//!
//! [`SystemGit`] is the production implementation. It shells out to the
//! system `git` binary (see [`crate::git`]) and opens pull requests through
//! the GitHub REST API (see [`crate::github`]).

use std::path::Path;

use crate::error::Result;
use crate::git::{self, Commit, CommitOutcome};
use crate::github::{self, PullRequest, RepoId};

/// Trait for git operations - allows mocking in tests
pub trait GitWorkspace {
    /// Commits touching `path` since `since`, newest first. An empty `since`
    /// means the whole history.
    fn commits_since(&self, repo: &Path, path: &str, since: &str) -> Result<Vec<Commit>>;

    fn is_clean(&self, repo: &Path) -> Result<bool>;

    fn head_hash(&self, repo: &Path) -> Result<String>;

    /// Stage and commit every modification.
    fn commit_all(&self, repo: &Path, message: &str) -> Result<CommitOutcome>;

    fn reset_hard(&self, repo: &Path) -> Result<()>;

    /// Push `HEAD` to `branch` on the repository's `origin`.
    fn push(&self, repo: &Path, branch: &str, token: &str) -> Result<()>;

    /// Open a review request for an already pushed branch, returning its URL.
    fn open_review_request(&self, repo: &Path, request: &PullRequest, token: &str)
        -> Result<String>;
}

/// The default implementation of [`GitWorkspace`], backed by the `git`
/// command and the GitHub API.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemGit;

impl GitWorkspace for SystemGit {
    fn commits_since(&self, repo: &Path, path: &str, since: &str) -> Result<Vec<Commit>> {
        git::commits_since(repo, path, since)
    }

    fn is_clean(&self, repo: &Path) -> Result<bool> {
        git::is_clean(repo)
    }

    fn head_hash(&self, repo: &Path) -> Result<String> {
        git::head_hash(repo)
    }

    fn commit_all(&self, repo: &Path, message: &str) -> Result<CommitOutcome> {
        git::commit_all(repo, message)
    }

    fn reset_hard(&self, repo: &Path) -> Result<()> {
        git::reset_hard(repo)
    }

    fn push(&self, repo: &Path, branch: &str, token: &str) -> Result<()> {
        git::push_branch(repo, branch, token)
    }

    fn open_review_request(
        &self,
        repo: &Path,
        request: &PullRequest,
        token: &str,
    ) -> Result<String> {
        let id = RepoId::from_remote(&git::origin_url(repo)?)?;
        github::create_pull_request(&id, request, token)
    }
}
