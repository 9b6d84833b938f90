pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod recorder;
pub mod route;
pub mod scorer;
pub mod session;
pub mod state;
pub mod store;

pub use auth::{AuthService, AuthStatus, MemoryAuth, SessionToken};
pub use config::{ExperimentConfig, MAX_INTERVAL_MS, TimeoutPolicy};
pub use error::{AuthError, ConfigError, EngineError, StoreError};
pub use export::export_csv;
pub use recorder::SessionRecorder;
pub use route::Route;
pub use session::SessionState;
pub use state::{ExperimentEvent, ExperimentStateMachine, IgnoreReason, KeyOutcome, NextStep};
pub use store::{InMemoryStore, JsonFileStore, ParticipantRecord, ResultStore, SessionId, StoredSession};
