use serde::{Deserialize, Serialize};

use crate::stimulus::{ColorCategory, NO_RESPONSE, ResponseKey};

/// Which variant of the task a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    /// Practice run reached from the instructions.
    #[serde(rename = "trial")]
    Short,
    /// The recorded test.
    #[serde(rename = "full")]
    Long,
}

impl SessionKind {
    pub const fn default_iterations(self) -> usize {
        match self {
            SessionKind::Short => 10,
            SessionKind::Long => 160,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SessionKind::Short => "trial",
            SessionKind::Long => "full",
        }
    }

    pub const fn results_title(self) -> &'static str {
        match self {
            SessionKind::Short => "TRIAL RESULTS",
            SessionKind::Long => "TEST RESULTS",
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Recorded result per trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    pub iteration: usize,
    pub value: u8,
    pub category: ColorCategory,
    #[serde(with = "key_or_na")]
    pub key: Option<ResponseKey>,
    pub reaction_time_ms: u64,
    pub correct: bool,
}

impl Trial {
    pub fn key_label(&self) -> &'static str {
        self.key.map_or(NO_RESPONSE, ResponseKey::as_str)
    }

    pub fn timed_out(&self) -> bool {
        self.key.is_none()
    }
}

/// Aggregates reported on the stats screen and persisted with the trials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub kind: SessionKind,
    pub total_iterations: usize,
    pub correct_count: usize,
    pub average_reaction_time_ms: u64,
    pub accuracy_percent: u32,
}

impl SessionSummary {
    /// `round(correct / total * 100)`, rounding halves up. Zero when `total` is zero.
    pub fn accuracy(correct: usize, total: usize) -> u32 {
        if total == 0 {
            return 0;
        }
        ((correct as u64 * 200 + total as u64) / (total as u64 * 2)) as u32
    }
}

mod key_or_na {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::stimulus::{NO_RESPONSE, ResponseKey};

    pub fn serialize<S: Serializer>(key: &Option<ResponseKey>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(key.map_or(NO_RESPONSE, ResponseKey::as_str))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ResponseKey>, D::Error> {
        let raw = String::deserialize(d)?;
        if raw == NO_RESPONSE {
            return Ok(None);
        }
        let mut chars = raw.chars();
        match (chars.next().and_then(ResponseKey::from_char), chars.next()) {
            (Some(key), None) => Ok(Some(key)),
            _ => Err(serde::de::Error::custom(format!("unknown response key {raw:?}"))),
        }
    }
}
