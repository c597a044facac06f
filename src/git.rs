//! Git operations backed by the system `git` command.
//!
//! Using the system binary means authentication (SSH keys, credential
//! helpers, tokens configured in `~/.gitconfig`) works exactly as it does on
//! the command line.

use std::fs;
use std::path::Path;
use std::process::Command;

use log::{debug, info};

use crate::error::{Error, Result};

/// A commit touching an API, as reported by `git log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub message: String,
}

/// Result of committing all changes in a working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A commit was created with the given hash.
    Committed(String),
    /// The working tree had no modifications.
    NothingToCommit,
}

const FIELD_SEPARATOR: char = '\u{1f}';
const RECORD_SEPARATOR: char = '\u{1e}';

/// Run `git` in `repo` and return its standard output.
fn git(repo: &Path, args: &[&str]) -> Result<String> {
    debug!("git {} (in {})", args.join(" "), repo.display());
    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .map_err(|e| Error::GitCommand {
            command: args.join(" "),
            repo: repo.display().to_string(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::GitCommand {
            command: args.join(" "),
            repo: repo.display().to_string(),
            stderr: stderr.trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Clone `url` into `target_dir` with full history.
///
/// This uses the system git command, which automatically handles:
/// - SSH keys from ~/.ssh/
/// - Git credential helpers
/// - Personal access tokens
/// - Any authentication configured in ~/.gitconfig
pub fn clone(url: &str, target_dir: &Path) -> Result<()> {
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }
    info!("Cloning {} into {}", url, target_dir.display());
    let parent = target_dir.parent().unwrap_or_else(|| Path::new("."));
    let target = target_dir.to_string_lossy();
    git(parent, &["clone", url, &target])?;
    Ok(())
}

/// Commits that touched `path` after `since`, newest first.
///
/// An empty `since` returns the whole history of `path`.
pub fn commits_since(repo: &Path, path: &str, since: &str) -> Result<Vec<Commit>> {
    let range = if since.is_empty() {
        "HEAD".to_string()
    } else {
        format!("{}..HEAD", since)
    };
    let stdout = git(
        repo,
        &["log", "--format=%H%x1f%B%x1e", &range, "--", path],
    )?;
    Ok(parse_log(&stdout))
}

/// Parse `git log --format=%H%x1f%B%x1e` output.
pub fn parse_log(stdout: &str) -> Vec<Commit> {
    stdout
        .split(RECORD_SEPARATOR)
        .filter_map(|record| {
            let record = record.trim_start_matches('\n');
            let (hash, message) = record.split_once(FIELD_SEPARATOR)?;
            Some(Commit {
                hash: hash.trim().to_string(),
                message: message.trim_end_matches('\n').to_string(),
            })
        })
        .collect()
}

/// Whether the working tree has no modifications, including untracked files.
pub fn is_clean(repo: &Path) -> Result<bool> {
    Ok(git(repo, &["status", "--porcelain"])?.trim().is_empty())
}

pub fn head_hash(repo: &Path) -> Result<String> {
    Ok(git(repo, &["rev-parse", "HEAD"])?.trim().to_string())
}

/// Stage every change and commit it with `message`.
pub fn commit_all(repo: &Path, message: &str) -> Result<CommitOutcome> {
    git(repo, &["add", "-A"])?;
    if is_clean(repo)? {
        return Ok(CommitOutcome::NothingToCommit);
    }
    let status = git(repo, &["status", "--short"])?;
    debug!("Committing:\n{}", status);
    git(repo, &["commit", "-q", "-m", message])?;
    Ok(CommitOutcome::Committed(head_hash(repo)?))
}

/// Discard all modifications to tracked files.
pub fn reset_hard(repo: &Path) -> Result<()> {
    git(repo, &["reset", "--hard", "-q"])?;
    Ok(())
}

/// URL of the `origin` remote
pub fn origin_url(repo: &Path) -> Result<String> {
    Ok(git(repo, &["remote", "get-url", "origin"])?.trim().to_string())
}

/// Embed an access token in an HTTPS remote URL.
///
/// SSH remotes are returned unchanged since they authenticate with keys.
pub fn authenticated_url(remote: &str, token: &str) -> Result<String> {
    if !remote.starts_with("https://") {
        return Ok(remote.to_string());
    }
    let mut url = url::Url::parse(remote)?;
    let invalid = |_| Error::GitCommand {
        command: "push".to_string(),
        repo: remote.to_string(),
        stderr: "remote URL cannot carry credentials".to_string(),
    };
    url.set_username("x-access-token").map_err(invalid)?;
    url.set_password(Some(token)).map_err(invalid)?;
    Ok(url.to_string())
}

/// Push `HEAD` to a new branch on `origin`.
pub fn push_branch(repo: &Path, branch: &str, token: &str) -> Result<()> {
    let remote = authenticated_url(&origin_url(repo)?, token)?;
    let refspec = format!("HEAD:refs/heads/{}", branch);
    git(repo, &["push", "-q", &remote, &refspec]).map_err(|e| match e {
        // Never echo the token back.
        Error::GitCommand { stderr, repo, .. } => Error::GitCommand {
            command: format!("push origin {}", refspec),
            repo,
            stderr: stderr.replace(token, "***"),
        },
        other => other,
    })?;
    info!("Pushed branch {}", branch);
    Ok(())
}
