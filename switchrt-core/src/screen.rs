use crate::stimulus::{NEUTRAL_RGBA, Stimulus};
use crate::trial::SessionKind;

/// What the participant currently sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// No route entered yet, or the run was left.
    Idle,
    /// Countdown tick; `None` is the blank beat before the first stimulus.
    Countdown { label: Option<u8> },
    Stimulus(Stimulus),
    Stats {
        kind: SessionKind,
        correct_count: usize,
        average_reaction_time_ms: u64,
        /// The last submission attempt failed and can be retried.
        submit_failed: bool,
    },
    /// Results were accepted by the store.
    Complete,
}

impl Screen {
    pub fn background(&self) -> [u8; 4] {
        match self {
            Screen::Stimulus(stimulus) => stimulus.category.rgba(),
            _ => NEUTRAL_RGBA,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stimulus::ColorCategory;

    #[test]
    fn stimulus_screen_uses_category_colour() {
        let screen = Screen::Stimulus(Stimulus {
            value: 4,
            category: ColorCategory::Blue,
        });
        assert_eq!(screen.background(), ColorCategory::Blue.rgba());
        assert_eq!(Screen::Countdown { label: Some(3) }.background(), NEUTRAL_RGBA);
    }

    #[test]
    fn failed_submission_is_a_distinct_screen() {
        let stats = |submit_failed| Screen::Stats {
            kind: SessionKind::Long,
            correct_count: 3,
            average_reaction_time_ms: 900,
            submit_failed,
        };
        assert_ne!(stats(false), stats(true));
        assert_eq!(stats(true).background(), NEUTRAL_RGBA);
    }
}
