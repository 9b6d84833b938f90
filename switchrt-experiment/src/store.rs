//! Persistence collaborator: participants, sessions and their trials.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use switchrt_core::{SessionSummary, Trial};
use tracing::{debug, info};

use crate::error::StoreError;

pub type SessionId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub id: u64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// One persisted run joined with its participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub id: SessionId,
    pub participant: ParticipantRecord,
    pub created_at: DateTime<Utc>,
    pub summary: SessionSummary,
    pub trials: Vec<Trial>,
}

pub trait ResultStore {
    /// Persists a finished run for `email`, creating the participant on first use.
    fn submit(
        &mut self,
        email: &str,
        summary: &SessionSummary,
        trials: &[Trial],
    ) -> Result<SessionId, StoreError>;

    /// Every persisted run, newest first.
    fn sessions(&self) -> Result<Vec<StoredSession>, StoreError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRun {
    id: SessionId,
    participant_id: u64,
    created_at: DateTime<Utc>,
    summary: SessionSummary,
    trials: Vec<Trial>,
}

/// Document shared by both store implementations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    participants: Vec<ParticipantRecord>,
    runs: Vec<StoredRun>,
}

impl StoreData {
    fn participant_id(&mut self, email: &str, now: DateTime<Utc>) -> u64 {
        if let Some(p) = self.participants.iter().find(|p| p.email == email) {
            return p.id;
        }
        let id = self.participants.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        self.participants.push(ParticipantRecord {
            id,
            email: email.to_string(),
            created_at: now,
        });
        debug!(participant = id, email, "participant created");
        id
    }

    fn insert(&mut self, email: &str, summary: &SessionSummary, trials: &[Trial]) -> SessionId {
        let now = Utc::now();
        let participant_id = self.participant_id(email, now);
        let id = self.runs.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        self.runs.push(StoredRun {
            id,
            participant_id,
            created_at: now,
            summary: summary.clone(),
            trials: trials.to_vec(),
        });
        id
    }

    fn joined(&self) -> Vec<StoredSession> {
        let mut sessions: Vec<StoredSession> = self
            .runs
            .iter()
            .filter_map(|run| {
                let participant = self
                    .participants
                    .iter()
                    .find(|p| p.id == run.participant_id)?;
                Some(StoredSession {
                    id: run.id,
                    participant: participant.clone(),
                    created_at: run.created_at,
                    summary: run.summary.clone(),
                    trials: run.trials.clone(),
                })
            })
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        sessions
    }
}

/// Volatile store; `set_available(false)` simulates an outage.
#[derive(Debug)]
pub struct InMemoryStore {
    data: StoreData,
    available: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            data: StoreData::default(),
            available: true,
        }
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn participants(&self) -> &[ParticipantRecord] {
        &self.data.participants
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultStore for InMemoryStore {
    fn submit(
        &mut self,
        email: &str,
        summary: &SessionSummary,
        trials: &[Trial],
    ) -> Result<SessionId, StoreError> {
        if !self.available {
            return Err(StoreError::Unavailable("in-memory store is offline".into()));
        }
        Ok(self.data.insert(email, summary, trials))
    }

    fn sessions(&self) -> Result<Vec<StoredSession>, StoreError> {
        Ok(self.data.joined())
    }
}

/// Pretty-printed JSON document on disk, rewritten on every submission.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StoreData, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StoreData::default()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes to a sibling temp file and renames it over the target.
    fn save(&self, data: &StoreData) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl ResultStore for JsonFileStore {
    fn submit(
        &mut self,
        email: &str,
        summary: &SessionSummary,
        trials: &[Trial],
    ) -> Result<SessionId, StoreError> {
        let mut data = self.load()?;
        let id = data.insert(email, summary, trials);
        self.save(&data)?;
        info!(
            session = id,
            trials = trials.len(),
            path = %self.path.display(),
            "results saved"
        );
        Ok(id)
    }

    fn sessions(&self) -> Result<Vec<StoredSession>, StoreError> {
        Ok(self.load()?.joined())
    }
}
