//! # Incremental Update
//!
//! An update run walks the APIs recorded in a language repository's
//! pipeline state and regenerates the ones whose upstream definitions
//! changed since they were last generated.
//!
//! For every pending API the engine generates into a scratch directory,
//! cleans the API's files in the repository, copies the new tree over it,
//! records the newest upstream commit, commits, and finally builds. A build
//! that leaves the working tree dirty is a consistency violation. The first
//! failure aborts the run; commits that were already created are kept.
//!
//! When requested, the resulting commits are pushed to a fresh branch and a
//! review request is opened for them.
//!
//! All repository access goes through [`GitWorkspace`] and all generation
//! through [`ApiGenerator`], so the engine is tested with scripted
//! implementations of both.

pub mod commit_message;
pub mod copy;
pub mod generator;

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::{info, warn};

pub use crate::cancel::CancelToken;
pub use commit_message::create_commit_message;
pub use copy::copy_tree;
pub use generator::{ApiGenerator, WorkspaceApiGenerator};

use crate::defaults::BRANCH_PREFIX;
use crate::error::{Error, Result};
use crate::git::CommitOutcome;
use crate::github::PullRequest;
use crate::repository::GitWorkspace;
use crate::state::{ApiGenerationState, PipelineState, StateStore};

/// Step of a per-API update, reported alongside failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    History,
    Generate,
    Clean,
    Copy,
    SaveState,
    Commit,
    Build,
    Verify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::History => "reading upstream history",
            Stage::Generate => "generating",
            Stage::Clean => "cleaning",
            Stage::Copy => "copying output",
            Stage::SaveState => "saving state",
            Stage::Commit => "committing",
            Stage::Build => "building",
            Stage::Verify => "verifying the build",
        };
        f.write_str(name)
    }
}

/// Format a run start time as used in branch names and titles.
pub fn run_timestamp(start: &DateTime<Utc>) -> String {
    start.format("%Y%m%dT%H%M%S").to_string()
}

/// Everything an update run needs, fixed before any work starts.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    /// The language repository being updated.
    pub repo_root: PathBuf,
    /// Checkout of the API corpus.
    pub api_root: PathBuf,
    /// Scratch directory receiving generated trees.
    pub output_root: PathBuf,
    /// Only update this API.
    pub api_path: Option<String>,
    pub push: bool,
    pub github_token: Option<String>,
    /// Branch review requests target.
    pub base_branch: String,
    pub start: DateTime<Utc>,
}

impl UpdateRequest {
    fn token(&self) -> Option<&str> {
        self.github_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// What happened to one API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiOutcome {
    UpToDate,
    Blocked,
    /// Regenerated from upstream commits up to `commit`.
    Regenerated { commit: String },
}

/// Outcome of an update run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Every visited API with its outcome, in state order.
    pub apis: Vec<(String, ApiOutcome)>,
    /// Branch the changes were pushed to.
    pub pushed_branch: Option<String>,
    /// URL of the opened review request.
    pub review_url: Option<String>,
}

impl UpdateReport {
    pub fn regenerated(&self) -> impl Iterator<Item = &str> {
        self.apis.iter().filter_map(|(id, outcome)| match outcome {
            ApiOutcome::Regenerated { .. } => Some(id.as_str()),
            _ => None,
        })
    }
}

/// Drives an update run.
pub struct UpdateEngine {
    git: Box<dyn GitWorkspace>,
    generator: Box<dyn ApiGenerator>,
    store: Box<dyn StateStore>,
    cancel: CancelToken,
}

impl UpdateEngine {
    pub fn new(
        git: Box<dyn GitWorkspace>,
        generator: Box<dyn ApiGenerator>,
        store: Box<dyn StateStore>,
    ) -> Self {
        Self {
            git,
            generator,
            store,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute an update run.
    pub fn run(&mut self, request: &UpdateRequest) -> Result<UpdateReport> {
        if request.push && request.token().is_none() {
            return Err(Error::MissingToken);
        }

        let api_was_clean = self.git.is_clean(&request.api_root)?;
        if !api_was_clean {
            warn!(
                "API repository {} is dirty; it will not be reset after the run",
                request.api_root.display()
            );
        }
        if !self.git.is_clean(&request.repo_root)? {
            return Err(Error::DirtyRepository {
                path: request.repo_root.display().to_string(),
            });
        }

        let state = self.store.load()?;
        let head_before = self.git.head_hash(&request.repo_root)?;

        let mut report = UpdateReport::default();
        let updated = self.update_all(request, &state, &mut report);

        // The corpus is restored whether or not every API succeeded.
        if api_was_clean {
            let reset = self.git.reset_hard(&request.api_root);
            updated?;
            reset?;
        } else {
            updated?;
        }

        if !request.push {
            return Ok(report);
        }
        let token = request.token().ok_or(Error::MissingToken)?;
        if self.git.head_hash(&request.repo_root)? == head_before {
            info!("No changes to push");
            return Ok(report);
        }

        let timestamp = run_timestamp(&request.start);
        let branch = format!("{}-{}", BRANCH_PREFIX, timestamp);
        self.cancel.check()?;
        self.git.push(&request.repo_root, &branch, token)?;
        report.pushed_branch = Some(branch.clone());

        let review = PullRequest {
            title: format!("feat: API regeneration: {}", timestamp),
            body: review_body(&report),
            head: branch,
            base: request.base_branch.clone(),
        };
        self.cancel.check()?;
        let url = self
            .git
            .open_review_request(&request.repo_root, &review, token)?;
        report.review_url = Some(url);
        Ok(report)
    }

    fn update_all(
        &mut self,
        request: &UpdateRequest,
        state: &PipelineState,
        report: &mut UpdateReport,
    ) -> Result<()> {
        for record in &state.api_generation_states {
            if let Some(only) = &request.api_path {
                if &record.id != only {
                    continue;
                }
            }
            let outcome = if record.is_blocked() {
                info!("Skipping blocked API {}", record.id);
                ApiOutcome::Blocked
            } else {
                self.update_api(request, record)?
            };
            report.apis.push((record.id.clone(), outcome));
        }
        Ok(())
    }

    fn update_api(
        &mut self,
        request: &UpdateRequest,
        record: &ApiGenerationState,
    ) -> Result<ApiOutcome> {
        let id = record.id.as_str();
        let commits = self
            .git
            .commits_since(&request.api_root, id, &record.last_generated_commit)
            .map_err(|e| e.at_stage(id, Stage::History))?;
        let newest = match commits.first() {
            Some(commit) => commit.hash.clone(),
            None => {
                info!("{}: no changes", id);
                return Ok(ApiOutcome::UpToDate);
            }
        };
        info!("{}: {} new upstream commits", id, commits.len());

        let output = request.output_root.join(id);
        self.cancel.check()?;
        self.generator
            .generate(&request.api_root, id, &output)
            .map_err(|e| e.at_stage(id, Stage::Generate))?;

        self.cancel.check()?;
        self.generator
            .clean(&request.repo_root, id)
            .map_err(|e| e.at_stage(id, Stage::Clean))?;
        copy_tree(&output, &request.repo_root).map_err(|e| e.at_stage(id, Stage::Copy))?;

        let updated = ApiGenerationState {
            last_generated_commit: newest.clone(),
            ..record.clone()
        };
        self.store
            .save_one(&updated)
            .map_err(|e| e.at_stage(id, Stage::SaveState))?;

        self.cancel.check()?;
        let message = create_commit_message(&commits);
        let outcome = self
            .git
            .commit_all(&request.repo_root, &message)
            .map_err(|e| e.at_stage(id, Stage::Commit))?;
        if outcome == CommitOutcome::NothingToCommit {
            info!("{}: regeneration produced no modifications", id);
        }

        self.cancel.check()?;
        self.generator
            .build(&request.repo_root, id)
            .map_err(|e| e.at_stage(id, Stage::Build))?;
        let clean = self
            .git
            .is_clean(&request.repo_root)
            .map_err(|e| e.at_stage(id, Stage::Verify))?;
        if !clean {
            return Err(Error::BuildCreatedChanges { api: id.to_string() });
        }

        Ok(ApiOutcome::Regenerated { commit: newest })
    }
}

fn review_body(report: &UpdateReport) -> String {
    let mut body = String::from("Regenerated APIs:\n\n");
    for id in report.regenerated() {
        body.push_str(&format!("- {}\n", id));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::Commit;
    use crate::state::AutomationLevel;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Shared view of everything the mocks did
    #[derive(Default)]
    struct World {
        events: Vec<String>,
        commits: HashMap<String, Vec<Commit>>,
        dirty: HashMap<PathBuf, bool>,
        head: usize,
        dirty_after_build: bool,
        fail_generate: bool,
        fail_history: bool,
        state: PipelineState,
    }

    type Shared = Arc<Mutex<World>>;

    struct MockGit(Shared);

    impl GitWorkspace for MockGit {
        fn commits_since(&self, _repo: &Path, path: &str, since: &str) -> Result<Vec<Commit>> {
            let world = self.0.lock().unwrap();
            if world.fail_history {
                return Err(Error::GitCommand {
                    command: "git log".to_string(),
                    repo: "googleapis".to_string(),
                    stderr: "fatal: bad revision".to_string(),
                });
            }
            let all = world.commits.get(path).cloned().unwrap_or_default();
            Ok(all.into_iter().take_while(|c| c.hash != since).collect())
        }

        fn is_clean(&self, repo: &Path) -> Result<bool> {
            Ok(!self.0.lock().unwrap().dirty.get(repo).copied().unwrap_or(false))
        }

        fn head_hash(&self, _repo: &Path) -> Result<String> {
            Ok(format!("head-{}", self.0.lock().unwrap().head))
        }

        fn commit_all(&self, _repo: &Path, message: &str) -> Result<CommitOutcome> {
            let mut world = self.0.lock().unwrap();
            world.head += 1;
            world.events.push(format!("commit {}", message.lines().next().unwrap_or("")));
            Ok(CommitOutcome::Committed(format!("head-{}", world.head)))
        }

        fn reset_hard(&self, repo: &Path) -> Result<()> {
            self.0
                .lock()
                .unwrap()
                .events
                .push(format!("reset {}", repo.display()));
            Ok(())
        }

        fn push(&self, _repo: &Path, branch: &str, token: &str) -> Result<()> {
            self.0
                .lock()
                .unwrap()
                .events
                .push(format!("push {} {}", branch, token));
            Ok(())
        }

        fn open_review_request(
            &self,
            _repo: &Path,
            request: &PullRequest,
            _token: &str,
        ) -> Result<String> {
            self.0
                .lock()
                .unwrap()
                .events
                .push(format!("review {}", request.title));
            Ok("https://github.com/o/r/pull/1".to_string())
        }
    }

    struct MockGenerator(Shared);

    impl ApiGenerator for MockGenerator {
        fn generate(&self, _api_root: &Path, api_id: &str, output: &Path) -> Result<()> {
            let mut world = self.0.lock().unwrap();
            world.events.push(format!("generate {}", api_id));
            if world.fail_generate {
                return Err(Error::Tool {
                    tool: "generator".to_string(),
                    message: "boom".to_string(),
                });
            }
            fs::create_dir_all(output)?;
            fs::write(output.join("README.md"), api_id)?;
            Ok(())
        }

        fn clean(&self, _repo_root: &Path, api_id: &str) -> Result<()> {
            self.0.lock().unwrap().events.push(format!("clean {}", api_id));
            Ok(())
        }

        fn build(&self, repo_root: &Path, api_id: &str) -> Result<()> {
            let mut world = self.0.lock().unwrap();
            world.events.push(format!("build {}", api_id));
            if world.dirty_after_build {
                world.dirty.insert(repo_root.to_path_buf(), true);
            }
            Ok(())
        }
    }

    struct MemoryStore(Shared);

    impl StateStore for MemoryStore {
        fn load(&self) -> Result<PipelineState> {
            Ok(self.0.lock().unwrap().state.clone())
        }

        fn save_one(&mut self, record: &ApiGenerationState) -> Result<()> {
            let mut world = self.0.lock().unwrap();
            world
                .events
                .push(format!("save {} {}", record.id, record.last_generated_commit));
            world.state.upsert(record.clone());
            Ok(())
        }
    }

    fn commit(hash: &str) -> Commit {
        Commit {
            hash: hash.to_string(),
            message: format!("feat: change {}\nPiperOrigin-RevId: {}", hash, hash),
        }
    }

    fn api(id: &str, last: &str) -> ApiGenerationState {
        ApiGenerationState {
            id: id.to_string(),
            automation_level: AutomationLevel::Automatic,
            last_generated_commit: last.to_string(),
        }
    }

    struct Harness {
        _temp: TempDir,
        world: Shared,
        request: UpdateRequest,
    }

    impl Harness {
        fn new(states: Vec<ApiGenerationState>) -> Self {
            let temp = TempDir::new().unwrap();
            let world = Arc::new(Mutex::new(World {
                state: PipelineState {
                    image_tag: String::new(),
                    api_generation_states: states,
                },
                ..Default::default()
            }));
            let request = UpdateRequest {
                repo_root: temp.path().join("repo"),
                api_root: temp.path().join("googleapis"),
                output_root: temp.path().join("output"),
                api_path: None,
                push: false,
                github_token: None,
                base_branch: "main".to_string(),
                start: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            };
            fs::create_dir_all(&request.repo_root).unwrap();
            Self {
                _temp: temp,
                world,
                request,
            }
        }

        fn engine(&self) -> UpdateEngine {
            UpdateEngine::new(
                Box::new(MockGit(Arc::clone(&self.world))),
                Box::new(MockGenerator(Arc::clone(&self.world))),
                Box::new(MemoryStore(Arc::clone(&self.world))),
            )
        }

        fn run(&self) -> Result<UpdateReport> {
            self.engine().run(&self.request)
        }

        fn events(&self) -> Vec<String> {
            self.world.lock().unwrap().events.clone()
        }

        fn last_commit(&self, id: &str) -> String {
            self.world
                .lock()
                .unwrap()
                .state
                .get(id)
                .unwrap()
                .last_generated_commit
                .clone()
        }
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Build.to_string(), "building");
        assert_eq!(Stage::Copy.to_string(), "copying output");
    }

    #[test]
    fn test_run_timestamp() {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(run_timestamp(&start), "20240102T030405");
    }

    #[test]
    fn test_no_new_commits_is_a_no_op() {
        let harness = Harness::new(vec![api("google/cloud/kms/v1", "c1")]);
        harness
            .world
            .lock()
            .unwrap()
            .commits
            .insert("google/cloud/kms/v1".to_string(), vec![commit("c1")]);

        let report = harness.run().unwrap();
        assert_eq!(
            report.apis,
            vec![("google/cloud/kms/v1".to_string(), ApiOutcome::UpToDate)]
        );
        let events = harness.events();
        assert!(events.iter().all(|e| !e.starts_with("generate")
            && !e.starts_with("commit")
            && !e.starts_with("save")));
        assert_eq!(harness.last_commit("google/cloud/kms/v1"), "c1");
    }

    #[test]
    fn test_regenerates_and_persists_newest_commit() {
        let harness = Harness::new(vec![api("google/cloud/kms/v1", "c1")]);
        harness.world.lock().unwrap().commits.insert(
            "google/cloud/kms/v1".to_string(),
            vec![commit("c3"), commit("c2"), commit("c1")],
        );

        let report = harness.run().unwrap();
        assert_eq!(
            report.apis,
            vec![(
                "google/cloud/kms/v1".to_string(),
                ApiOutcome::Regenerated {
                    commit: "c3".to_string()
                }
            )]
        );
        assert_eq!(harness.last_commit("google/cloud/kms/v1"), "c3");
        let reset = format!("reset {}", harness.request.api_root.display());
        // Oldest pending commit comes first in the message.
        assert_eq!(
            harness.events(),
            vec![
                "generate google/cloud/kms/v1",
                "clean google/cloud/kms/v1",
                "save google/cloud/kms/v1 c3",
                "commit feat: change c2",
                "build google/cloud/kms/v1",
                reset.as_str(),
            ]
        );
        // The generated tree was copied over the repository.
        assert_eq!(
            fs::read_to_string(harness.request.repo_root.join("README.md")).unwrap(),
            "google/cloud/kms/v1"
        );
    }

    #[test]
    fn test_blocked_and_filtered_apis_are_skipped() {
        let mut blocked = api("google/cloud/kms/v1", "");
        blocked.automation_level = AutomationLevel::Blocked;
        let mut harness = Harness::new(vec![
            blocked,
            api("google/cloud/secretmanager/v1", ""),
            api("google/cloud/language/v2", ""),
        ]);
        {
            let mut world = harness.world.lock().unwrap();
            for id in [
                "google/cloud/kms/v1",
                "google/cloud/secretmanager/v1",
                "google/cloud/language/v2",
            ] {
                world.commits.insert(id.to_string(), vec![commit("x")]);
            }
        }
        harness.request.api_path = Some("google/cloud/secretmanager/v1".to_string());
        let report = harness.run().unwrap();
        assert_eq!(report.apis.len(), 1);
        assert_eq!(report.apis[0].0, "google/cloud/secretmanager/v1");

        harness.request.api_path = None;
        harness.world.lock().unwrap().events.clear();
        let report = harness.run().unwrap();
        assert_eq!(report.apis[0].1, ApiOutcome::Blocked);
        assert!(!harness
            .events()
            .contains(&"generate google/cloud/kms/v1".to_string()));
    }

    #[test]
    fn test_build_changes_abort_without_push() {
        let mut harness = Harness::new(vec![
            api("google/cloud/kms/v1", ""),
            api("google/cloud/secretmanager/v1", ""),
        ]);
        {
            let mut world = harness.world.lock().unwrap();
            world.dirty_after_build = true;
            world
                .commits
                .insert("google/cloud/kms/v1".to_string(), vec![commit("k1")]);
            world
                .commits
                .insert("google/cloud/secretmanager/v1".to_string(), vec![commit("s1")]);
        }
        harness.request.push = true;
        harness.request.github_token = Some("token".to_string());

        let err = harness.run().unwrap_err();
        assert!(matches!(err, Error::BuildCreatedChanges { ref api } if api == "google/cloud/kms/v1"));
        assert!(err.to_string().contains("building"));
        let events = harness.events();
        assert!(events.iter().all(|e| !e.starts_with("push")));
        // Fail-fast: the second API is never attempted.
        assert!(!events.contains(&"generate google/cloud/secretmanager/v1".to_string()));
    }

    #[test]
    fn test_generate_failure_names_api_and_stage() {
        let harness = Harness::new(vec![api("google/cloud/kms/v1", "")]);
        {
            let mut world = harness.world.lock().unwrap();
            world.fail_generate = true;
            world
                .commits
                .insert("google/cloud/kms/v1".to_string(), vec![commit("k1")]);
        }
        let err = harness.run().unwrap_err();
        match err {
            Error::Stage { api, stage, .. } => {
                assert_eq!(api, "google/cloud/kms/v1");
                assert_eq!(stage, Stage::Generate);
            }
            other => panic!("unexpected error {:?}", other),
        }
        // State is not advanced when generation fails.
        assert_eq!(harness.last_commit("google/cloud/kms/v1"), "");
    }

    #[test]
    fn test_clean_corpus_reset_after_failed_run() {
        let harness = Harness::new(vec![api("google/cloud/kms/v1", "")]);
        {
            let mut world = harness.world.lock().unwrap();
            world.fail_generate = true;
            world
                .commits
                .insert("google/cloud/kms/v1".to_string(), vec![commit("k1")]);
        }
        assert!(matches!(harness.run(), Err(Error::Stage { .. })));

        let reset = format!("reset {}", harness.request.api_root.display());
        assert_eq!(harness.events().last(), Some(&reset));
    }

    #[test]
    fn test_dirty_corpus_not_reset_after_failed_run() {
        let harness = Harness::new(vec![api("google/cloud/kms/v1", "")]);
        {
            let mut world = harness.world.lock().unwrap();
            world.fail_generate = true;
            let api_root = harness.request.api_root.clone();
            world.dirty.insert(api_root, true);
            world
                .commits
                .insert("google/cloud/kms/v1".to_string(), vec![commit("k1")]);
        }
        assert!(harness.run().is_err());
        assert!(!harness.events().iter().any(|e| e.starts_with("reset")));
    }

    #[test]
    fn test_history_failure_names_api_and_stage() {
        let harness = Harness::new(vec![api("google/cloud/kms/v1", "")]);
        harness.world.lock().unwrap().fail_history = true;
        let err = harness.run().unwrap_err();
        match &err {
            Error::Stage { api, stage, .. } => {
                assert_eq!(api, "google/cloud/kms/v1");
                assert_eq!(*stage, Stage::History);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.to_string().contains("reading upstream history"));
        // The corpus is still restored.
        assert!(harness.events().iter().any(|e| e.starts_with("reset")));
    }

    #[test]
    fn test_push_requires_token_before_any_work() {
        let mut harness = Harness::new(vec![api("google/cloud/kms/v1", "")]);
        harness.request.push = true;
        harness.request.github_token = Some(String::new());
        assert!(matches!(harness.run(), Err(Error::MissingToken)));
        assert!(harness.events().is_empty());
    }

    #[test]
    fn test_dirty_language_repo_is_rejected() {
        let harness = Harness::new(vec![api("google/cloud/kms/v1", "")]);
        let repo = harness.request.repo_root.clone();
        harness.world.lock().unwrap().dirty.insert(repo, true);
        assert!(matches!(
            harness.run(),
            Err(Error::DirtyRepository { .. })
        ));
    }

    #[test]
    fn test_dirty_api_repo_is_not_reset() {
        let harness = Harness::new(vec![]);
        let api_root = harness.request.api_root.clone();
        harness.world.lock().unwrap().dirty.insert(api_root, true);
        harness.run().unwrap();
        assert!(harness.events().iter().all(|e| !e.starts_with("reset")));
    }

    #[test]
    fn test_push_opens_review_request() {
        let mut harness = Harness::new(vec![api("google/cloud/kms/v1", "")]);
        harness
            .world
            .lock()
            .unwrap()
            .commits
            .insert("google/cloud/kms/v1".to_string(), vec![commit("k1")]);
        harness.request.push = true;
        harness.request.github_token = Some("token".to_string());

        let report = harness.run().unwrap();
        assert_eq!(
            report.pushed_branch.as_deref(),
            Some("clientgen-20240102T030405")
        );
        assert_eq!(
            report.review_url.as_deref(),
            Some("https://github.com/o/r/pull/1")
        );
        let events = harness.events();
        assert!(events.contains(&"push clientgen-20240102T030405 token".to_string()));
        assert!(events.contains(&"review feat: API regeneration: 20240102T030405".to_string()));
    }

    #[test]
    fn test_push_without_changes_does_nothing() {
        let mut harness = Harness::new(vec![api("google/cloud/kms/v1", "k1")]);
        harness
            .world
            .lock()
            .unwrap()
            .commits
            .insert("google/cloud/kms/v1".to_string(), vec![commit("k1")]);
        harness.request.push = true;
        harness.request.github_token = Some("token".to_string());

        let report = harness.run().unwrap();
        assert!(report.pushed_branch.is_none());
        assert!(harness.events().iter().all(|e| !e.starts_with("push")));
    }

    #[test]
    fn test_cancelled_before_generation() {
        let harness = Harness::new(vec![api("google/cloud/kms/v1", "")]);
        harness
            .world
            .lock()
            .unwrap()
            .commits
            .insert("google/cloud/kms/v1".to_string(), vec![commit("k1")]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = harness
            .engine()
            .with_cancel(cancel)
            .run(&harness.request)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(harness.events().is_empty());
    }
}
