use serde::{Deserialize, Serialize};

/// Label persisted for a trial that received no key.
pub const NO_RESPONSE: &str = "N/A";

/// White panel shown outside of trials.
pub const NEUTRAL_RGBA: [u8; 4] = [255, 255, 255, 255];

/// Background colour of a stimulus; selects which rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorCategory {
    /// Magnitude rule: lower or higher than five.
    Blue,
    /// Parity rule: odd or even.
    Pink,
}

impl ColorCategory {
    pub const fn rgba(self) -> [u8; 4] {
        match self {
            ColorCategory::Blue => [103, 165, 255, 255],
            ColorCategory::Pink => [216, 103, 255, 255],
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ColorCategory::Blue => "Blue",
            ColorCategory::Pink => "Pink",
        }
    }
}

/// The four accepted response keys. Z/X answer the blue rule, N/M the pink one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseKey {
    Z,
    X,
    N,
    M,
}

impl ResponseKey {
    /// Maps a typed character to a response key, case-insensitively.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'Z' => Some(ResponseKey::Z),
            'X' => Some(ResponseKey::X),
            'N' => Some(ResponseKey::N),
            'M' => Some(ResponseKey::M),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ResponseKey::Z => "Z",
            ResponseKey::X => "X",
            ResponseKey::N => "N",
            ResponseKey::M => "M",
        }
    }
}

impl std::fmt::Display for ResponseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A number shown on a coloured panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stimulus {
    pub value: u8,
    pub category: ColorCategory,
}
