//! # Pipeline State
//!
//! The incremental update engine remembers, per API, the last upstream
//! commit it generated from. The state lives in the language repository at
//! `generator-input/pipeline-state.json` so that it is committed together
//! with the generated code.
//!
//! Persistence goes through the [`StateStore`] trait. The engine calls
//! [`StateStore::save_one`] right after each API is regenerated, so a crash
//! midway through a run loses at most the API in flight.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Location of the state file relative to the repository root.
pub const STATE_FILE: &str = "generator-input/pipeline-state.json";

/// Whether an API participates in automatic regeneration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutomationLevel {
    #[default]
    #[serde(rename = "AUTOMATION_LEVEL_AUTOMATIC")]
    Automatic,
    #[serde(rename = "AUTOMATION_LEVEL_BLOCKED")]
    Blocked,
}

/// Generation state of a single API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGenerationState {
    /// API path, e.g. `google/cloud/secretmanager/v1`.
    pub id: String,
    #[serde(default)]
    pub automation_level: AutomationLevel,
    /// Newest upstream commit the API was last generated from.
    #[serde(default)]
    pub last_generated_commit: String,
}

impl ApiGenerationState {
    pub fn is_blocked(&self) -> bool {
        self.automation_level == AutomationLevel::Blocked
    }
}

/// The persisted pipeline state of a language repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineState {
    /// Container image the generator runs in.
    #[serde(default)]
    pub image_tag: String,
    #[serde(default)]
    pub api_generation_states: Vec<ApiGenerationState>,
}

impl PipelineState {
    pub fn get(&self, id: &str) -> Option<&ApiGenerationState> {
        self.api_generation_states.iter().find(|s| s.id == id)
    }

    /// Replace the record with the same id, or append a new one.
    pub fn upsert(&mut self, record: ApiGenerationState) {
        match self
            .api_generation_states
            .iter_mut()
            .find(|s| s.id == record.id)
        {
            Some(existing) => *existing = record,
            None => self.api_generation_states.push(record),
        }
    }
}

/// Load and persist pipeline state
pub trait StateStore {
    fn load(&self) -> Result<PipelineState>;

    /// Persist `record`, replacing the stored record with the same id.
    fn save_one(&mut self, record: &ApiGenerationState) -> Result<()>;
}

/// Stores state as pretty-printed JSON in a file.
///
/// Each save rewrites the whole file atomically through a temporary file in
/// the same directory.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store for the state file of the repository at `repo_root`.
    pub fn for_repo(repo_root: &Path) -> Self {
        Self::new(repo_root.join(STATE_FILE))
    }

    fn write(&self, state: &PipelineState) -> Result<()> {
        let dir = self.path.parent().ok_or_else(|| Error::Config {
            message: format!("invalid state path {}", self.path.display()),
        })?;
        fs::create_dir_all(dir)?;
        let mut json = serde_json::to_string_pretty(state)?;
        json.push('\n');
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        debug!("Saved pipeline state to {}", self.path.display());
        Ok(())
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> Result<PipelineState> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save_one(&mut self, record: &ApiGenerationState) -> Result<()> {
        let mut state = match self.load() {
            Ok(state) => state,
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                PipelineState::default()
            }
            Err(e) => return Err(e),
        };
        state.upsert(record.clone());
        self.write(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
  "imageTag": "gcr.io/generator:1.2.3",
  "apiGenerationStates": [
    {
      "id": "google/cloud/secretmanager/v1",
      "automationLevel": "AUTOMATION_LEVEL_AUTOMATIC",
      "lastGeneratedCommit": "abc"
    },
    {
      "id": "google/cloud/kms/v1",
      "automationLevel": "AUTOMATION_LEVEL_BLOCKED",
      "lastGeneratedCommit": "def"
    },
    {
      "id": "google/cloud/language/v2"
    }
  ]
}"#;

    #[test]
    fn test_parse_state() {
        let state: PipelineState = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(state.image_tag, "gcr.io/generator:1.2.3");
        assert_eq!(state.api_generation_states.len(), 3);
        assert!(!state.api_generation_states[0].is_blocked());
        assert!(state.api_generation_states[1].is_blocked());
        // Missing automation level means automatic.
        let language = state.get("google/cloud/language/v2").unwrap();
        assert_eq!(language.automation_level, AutomationLevel::Automatic);
        assert!(language.last_generated_commit.is_empty());
    }

    #[test]
    fn test_save_one_round_trip() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join(STATE_FILE);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, SAMPLE).unwrap();
        let mut store = JsonStateStore::for_repo(temp.path());
        let before = store.load().unwrap();

        let mut record = before.get("google/cloud/secretmanager/v1").unwrap().clone();
        record.last_generated_commit = "newest".to_string();
        store.save_one(&record).unwrap();

        let after = store.load().unwrap();
        assert_eq!(after.image_tag, before.image_tag);
        assert_eq!(
            after
                .get("google/cloud/secretmanager/v1")
                .unwrap()
                .last_generated_commit,
            "newest"
        );
        // Other records and their order are untouched.
        assert_eq!(after.api_generation_states[1], before.api_generation_states[1]);
        assert_eq!(after.api_generation_states.len(), 3);

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"lastGeneratedCommit\": \"newest\""));
        assert!(written.contains("AUTOMATION_LEVEL_BLOCKED"));
    }

    #[test]
    fn test_save_one_creates_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut store = JsonStateStore::for_repo(temp.path());
        store
            .save_one(&ApiGenerationState {
                id: "google/cloud/kms/v1".to_string(),
                ..Default::default()
            })
            .unwrap();
        let state = store.load().unwrap();
        assert_eq!(state.api_generation_states.len(), 1);
    }

    #[test]
    fn test_load_invalid_json() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonStateStore::new(path).load(),
            Err(Error::Json(_))
        ));
    }
}
