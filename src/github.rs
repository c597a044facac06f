//! Opening pull requests on GitHub.

use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const API_ROOT: &str = "https://api.github.com";

/// Owner and name of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    /// Parse an `origin` URL in HTTPS (`https://github.com/o/r.git`) or SCP
    /// (`git@github.com:o/r.git`) form.
    pub fn from_remote(remote: &str) -> Result<Self> {
        let path = if let Some(rest) = remote.strip_prefix("git@github.com:") {
            rest.to_string()
        } else {
            let url = url::Url::parse(remote)?;
            if url.host_str() != Some("github.com") {
                return Err(not_github(remote));
            }
            url.path().trim_start_matches('/').to_string()
        };
        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        match path.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(not_github(remote)),
        }
    }
}

fn not_github(remote: &str) -> Error {
    Error::Config {
        message: format!("remote {:?} is not a GitHub repository", remote),
    }
}

/// A pull request to open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    pub title: String,
    pub body: String,
    /// Branch holding the changes.
    pub head: String,
    /// Branch the changes are merged into.
    pub base: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPullRequest {
    html_url: String,
}

/// Create `request` on `repo`, returning the URL of the new pull request.
pub fn create_pull_request(repo: &RepoId, request: &PullRequest, token: &str) -> Result<String> {
    let url = format!("{}/repos/{}/{}/pulls", API_ROOT, repo.owner, repo.name);
    let network = |e: reqwest::Error| Error::Network {
        url: url.clone(),
        message: e.to_string(),
    };
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("clientgen/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(network)?;
    let response = client
        .post(&url)
        .bearer_auth(token)
        .header("Accept", "application/vnd.github+json")
        .json(request)
        .send()
        .map_err(network)?
        .error_for_status()
        .map_err(network)?;
    let created: CreatedPullRequest = response.json().map_err(network)?;
    info!("Opened pull request {}", created.html_url);
    Ok(created.html_url)
}
