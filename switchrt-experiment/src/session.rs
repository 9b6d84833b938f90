use switchrt_core::{SessionKind, SessionSummary};

use crate::recorder::SessionRecorder;

/// Everything one run mutates. Owned by the state machine and replaced
/// wholesale when a route is entered again.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub kind: SessionKind,
    pub total_iterations: usize,
    /// 1-based iteration on screen; 0 before the first stimulus.
    pub current_iteration: usize,
    pub recorder: SessionRecorder,
    /// Reaction-time reference, reset whenever a stimulus is drawn.
    pub shown_at_ns: u64,
    pub summary: Option<SessionSummary>,
}

impl SessionState {
    pub fn new(kind: SessionKind, total_iterations: usize) -> Self {
        Self {
            kind,
            total_iterations,
            current_iteration: 0,
            recorder: SessionRecorder::new(total_iterations),
            shown_at_ns: 0,
            summary: None,
        }
    }
}
