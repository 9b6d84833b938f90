use serde::{Deserialize, Serialize};

/// Defines experiment phases and behavior
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    /// Whether trial responses are accepted in this phase.
    fn allows_input(&self) -> bool;
    fn next(&self) -> Option<Self>;

    fn is_countdown(&self) -> bool {
        false
    }
    fn is_playing(&self) -> bool {
        false
    }
    fn is_stats(&self) -> bool {
        false
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPhase {
    #[default]
    Countdown,
    Playing,
    Stats,
}

impl Phase for TaskPhase {
    fn allows_input(&self) -> bool {
        matches!(self, Self::Playing)
    }

    fn next(&self) -> Option<Self> {
        use TaskPhase::*;
        Some(match self {
            Countdown => Playing,
            Playing => Stats,
            Stats => return None,
        })
    }

    fn is_countdown(&self) -> bool {
        matches!(self, TaskPhase::Countdown)
    }

    fn is_playing(&self) -> bool {
        matches!(self, TaskPhase::Playing)
    }

    fn is_stats(&self) -> bool {
        matches!(self, TaskPhase::Stats)
    }
}

impl std::fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskPhase::Countdown => "countdown",
            TaskPhase::Playing => "playing",
            TaskPhase::Stats => "stats",
        };
        f.write_str(name)
    }
}
