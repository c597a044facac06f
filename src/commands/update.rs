//! Update command implementation
//!
//! Regenerates the APIs of a language repository whose upstream definitions
//! changed since the commit recorded in its pipeline state, commits each one
//! and optionally pushes a branch and opens a pull request.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use log::info;

use clientgen::defaults::{BRANCH_PREFIX, GOOGLEAPIS_URL};
use clientgen::git;
use clientgen::output::{marker, Marker, OutputConfig};
use clientgen::repository::SystemGit;
use clientgen::state::JsonStateStore;
use clientgen::suggestions;
use clientgen::update::{
    run_timestamp, ApiOutcome, UpdateEngine, UpdateRequest, WorkspaceApiGenerator,
};

/// Arguments for the update command
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Root of the language repository to update
    #[arg(long, value_name = "DIR")]
    pub repo_root: PathBuf,

    /// Existing checkout of the API definitions. Cloned into the work root
    /// when omitted.
    #[arg(long, value_name = "DIR")]
    pub api_root: Option<PathBuf>,

    /// Directory receiving generated trees (defaults to <work-root>/output)
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Scratch directory (defaults to a fresh directory under the system
    /// temp directory)
    #[arg(long, value_name = "DIR")]
    pub work_root: Option<PathBuf>,

    /// Only update this API, e.g. google/cloud/secretmanager/v1
    #[arg(long, value_name = "ID")]
    pub api_path: Option<String>,

    /// Push the changes to a new branch and open a pull request
    #[arg(long)]
    pub push: bool,

    /// Token used to push and to open the pull request
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

/// Execute the update command
pub fn execute(args: UpdateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let start = Utc::now();

    let has_token = args.github_token.as_deref().is_some_and(|t| !t.is_empty());
    if args.push && !has_token {
        return Err(suggestions::missing_token());
    }

    let generator = WorkspaceApiGenerator::for_repo(&args.repo_root).with_context(|| {
        format!(
            "failed to load the workspace configuration of {}",
            args.repo_root.display()
        )
    })?;
    let base_branch = generator
        .config()
        .release
        .as_ref()
        .map(|release| release.branch.clone())
        .filter(|branch| !branch.is_empty())
        .unwrap_or_else(|| "main".to_string());

    let work_root = match args.work_root {
        Some(dir) => dir,
        None => create_work_root(&std::env::temp_dir(), &run_timestamp(&start))?,
    };
    info!("Work root: {}", work_root.display());

    let api_root = match args.api_root {
        Some(dir) => dir,
        None => {
            let target = work_root.join("googleapis");
            git::clone(GOOGLEAPIS_URL, &target)?;
            target
        }
    };
    let output_root = args.output.unwrap_or_else(|| work_root.join("output"));

    let request = UpdateRequest {
        repo_root: args.repo_root.clone(),
        api_root,
        output_root,
        api_path: args.api_path,
        push: args.push,
        github_token: args.github_token,
        base_branch,
        start,
    };

    println!(
        "{} Updating {}",
        marker(&out, Marker::Scan),
        request.repo_root.display()
    );
    let mut engine = UpdateEngine::new(
        Box::new(SystemGit),
        Box::new(generator),
        Box::new(JsonStateStore::for_repo(&request.repo_root)),
    );
    let report = match engine.run(&request) {
        Ok(report) => report,
        Err(e) => {
            println!("{} Update failed", marker(&out, Marker::Error));
            return Err(e.into());
        }
    };

    for (id, outcome) in &report.apis {
        match outcome {
            ApiOutcome::UpToDate => println!("{} {} is up to date", marker(&out, Marker::Ok), id),
            ApiOutcome::Blocked => println!("{} {} is blocked", marker(&out, Marker::Skip), id),
            ApiOutcome::Regenerated { commit } => println!(
                "{} {} regenerated at {}",
                marker(&out, Marker::Ok),
                id,
                commit
            ),
        }
    }
    if let Some(branch) = &report.pushed_branch {
        println!("{} Pushed {}", marker(&out, Marker::Publish), branch);
    }
    if let Some(url) = &report.review_url {
        println!("{} Opened {}", marker(&out, Marker::Publish), url);
    }
    Ok(())
}

/// Create `<parent>/clientgen-<timestamp>`, which must not exist yet.
fn create_work_root(parent: &Path, timestamp: &str) -> Result<PathBuf> {
    let dir = parent.join(format!("{}-{}", BRANCH_PREFIX, timestamp));
    if dir.exists() {
        anyhow::bail!("temporary work root {} already exists", dir.display());
    }
    fs::create_dir_all(&dir)?;
    Ok(dir)
}
