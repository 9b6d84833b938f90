use switchrt_core::{ColorCategory, ResponseKey, SessionKind, SessionSummary, Stimulus, Trial};

use crate::config::TimeoutPolicy;
use crate::generator::NO_PREVIOUS;

/// Per-session trial log.
///
/// Sequences are index-aligned and keyed by `iteration - 1`. Stimuli are
/// appended as they are shown; response slots are pre-sized to the session
/// length and written in place.
#[derive(Debug, Clone)]
pub struct SessionRecorder {
    total: usize,
    values: Vec<u8>,
    categories: Vec<ColorCategory>,
    keys: Vec<Option<ResponseKey>>,
    reaction_times: Vec<Option<u64>>,
    correct: Vec<bool>,
}

impl SessionRecorder {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            values: Vec::with_capacity(total),
            categories: Vec::with_capacity(total),
            keys: vec![None; total],
            reaction_times: vec![None; total],
            correct: vec![false; total],
        }
    }

    /// Value of the most recent stimulus, or [`NO_PREVIOUS`] before the first.
    pub fn last_value(&self) -> u8 {
        self.values.last().copied().unwrap_or(NO_PREVIOUS)
    }

    /// Appends a shown stimulus and returns its 1-based iteration, or `None`
    /// once every slot is taken.
    pub fn record_stimulus(&mut self, stimulus: Stimulus) -> Option<usize> {
        if self.values.len() >= self.total {
            return None;
        }
        self.values.push(stimulus.value);
        self.categories.push(stimulus.category);
        Some(self.values.len())
    }

    pub fn stimulus(&self, iteration: usize) -> Option<Stimulus> {
        let index = iteration.checked_sub(1)?;
        Some(Stimulus {
            value: *self.values.get(index)?,
            category: *self.categories.get(index)?,
        })
    }

    /// Writes the response slot for `iteration`. Returns false when that
    /// iteration has not been shown.
    pub fn record_response(
        &mut self,
        iteration: usize,
        key: ResponseKey,
        reaction_time_ms: u64,
        correct: bool,
    ) -> bool {
        let Some(index) = iteration.checked_sub(1) else {
            return false;
        };
        if index >= self.values.len() {
            return false;
        }
        self.keys[index] = Some(key);
        self.reaction_times[index] = Some(reaction_time_ms);
        self.correct[index] = correct;
        true
    }

    /// Marks every unanswered slot as a slowest-possible incorrect timeout.
    /// Returns how many slots were filled.
    pub fn backfill(&mut self, timeout_ms: u64) -> usize {
        let mut filled = 0;
        for index in 0..self.total {
            if self.keys[index].is_none() {
                self.reaction_times[index] = Some(timeout_ms);
                self.correct[index] = false;
                filled += 1;
            }
        }
        filled
    }

    pub fn correct_count(&self) -> usize {
        self.correct.iter().filter(|c| **c).count()
    }

    /// Trials for every shown stimulus, ordered by iteration.
    pub fn trials(&self) -> Vec<Trial> {
        (0..self.values.len())
            .map(|index| Trial {
                iteration: index + 1,
                value: self.values[index],
                category: self.categories[index],
                key: self.keys[index],
                reaction_time_ms: self.reaction_times[index].unwrap_or(0),
                correct: self.correct[index],
            })
            .collect()
    }

    /// Rounded mean reaction time over the recorded slots admitted by `policy`.
    pub fn average_reaction_time_ms(&self, policy: TimeoutPolicy) -> u64 {
        let times: Vec<u64> = self
            .reaction_times
            .iter()
            .zip(&self.keys)
            .filter_map(|(rt, key)| match policy {
                TimeoutPolicy::Include => *rt,
                TimeoutPolicy::Exclude => key.and(*rt),
            })
            .collect();
        if times.is_empty() {
            return 0;
        }
        let n = times.len() as u64;
        (times.iter().sum::<u64>() + n / 2) / n
    }

    pub fn summarize(&self, kind: SessionKind, policy: TimeoutPolicy) -> SessionSummary {
        let correct_count = self.correct_count();
        SessionSummary {
            kind,
            total_iterations: self.total,
            correct_count,
            average_reaction_time_ms: self.average_reaction_time_ms(policy),
            accuracy_percent: SessionSummary::accuracy(correct_count, self.total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stim(value: u8, category: ColorCategory) -> Stimulus {
        Stimulus { value, category }
    }

    fn filled(total: usize) -> SessionRecorder {
        let mut rec = SessionRecorder::new(total);
        for i in 0..total {
            let value = if i % 2 == 0 { 3 } else { 8 };
            rec.record_stimulus(stim(value, ColorCategory::Blue));
        }
        rec
    }

    #[test]
    fn first_previous_value_is_zero() {
        let mut rec = SessionRecorder::new(3);
        assert_eq!(rec.last_value(), NO_PREVIOUS);
        rec.record_stimulus(stim(7, ColorCategory::Pink));
        assert_eq!(rec.last_value(), 7);
    }

    #[test]
    fn stimuli_beyond_total_are_refused() {
        let mut rec = filled(2);
        assert_eq!(rec.record_stimulus(stim(4, ColorCategory::Blue)), None);
        assert_eq!(rec.trials().len(), 2);
        assert_eq!(rec.stimulus(3), None);
    }

    #[test]
    fn stimulus_lookup_is_one_based() {
        let mut rec = SessionRecorder::new(3);
        rec.record_stimulus(stim(6, ColorCategory::Pink));
        assert_eq!(rec.stimulus(0), None);
        assert_eq!(rec.stimulus(1), Some(stim(6, ColorCategory::Pink)));
        assert_eq!(rec.stimulus(2), None);
    }

    #[test]
    fn response_writes_only_its_slot() {
        let mut rec = filled(3);
        assert!(rec.record_response(2, ResponseKey::X, 420, true));
        let trials = rec.trials();
        assert_eq!(trials[1].key, Some(ResponseKey::X));
        assert_eq!(trials[1].reaction_time_ms, 420);
        assert!(trials[1].correct);
        assert_eq!(trials[0].key, None);
        assert_eq!(trials[2].key, None);
    }

    #[test]
    fn response_to_unshown_iteration_is_rejected() {
        let mut rec = SessionRecorder::new(3);
        rec.record_stimulus(stim(2, ColorCategory::Pink));
        assert!(!rec.record_response(0, ResponseKey::M, 300, true));
        assert!(!rec.record_response(2, ResponseKey::M, 300, true));
        assert!(rec.record_response(1, ResponseKey::M, 300, true));
    }

    #[test]
    fn backfill_marks_timeouts() {
        let mut rec = filled(4);
        rec.record_response(1, ResponseKey::Z, 500, true);
        rec.record_response(3, ResponseKey::X, 700, false);
        assert_eq!(rec.backfill(1500), 2);

        let trials = rec.trials();
        assert_eq!(trials.len(), 4);
        for trial in [&trials[1], &trials[3]] {
            assert_eq!(trial.key, None);
            assert_eq!(trial.reaction_time_ms, 1500);
            assert!(!trial.correct);
        }
        let iterations: Vec<usize> = trials.iter().map(|t| t.iteration).collect();
        assert_eq!(iterations, vec![1, 2, 3, 4]);
    }

    #[test]
    fn mean_includes_timeouts_by_default() {
        let mut rec = filled(4);
        rec.record_response(1, ResponseKey::Z, 500, true);
        rec.record_response(2, ResponseKey::X, 701, true);
        rec.backfill(1500);

        // (500 + 701 + 1500 + 1500) / 4 = 1050.25
        assert_eq!(rec.average_reaction_time_ms(TimeoutPolicy::Include), 1050);
        // (500 + 701) / 2 = 600.5
        assert_eq!(rec.average_reaction_time_ms(TimeoutPolicy::Exclude), 601);
    }

    #[test]
    fn summary_counts_correct_trials() {
        let mut rec = filled(10);
        rec.record_response(1, ResponseKey::Z, 400, true);
        rec.record_response(2, ResponseKey::X, 400, true);
        rec.record_response(3, ResponseKey::X, 400, false);
        rec.backfill(1500);

        let summary = rec.summarize(SessionKind::Short, TimeoutPolicy::Include);
        assert_eq!(summary.total_iterations, 10);
        assert_eq!(summary.correct_count, 2);
        assert_eq!(summary.accuracy_percent, 20);
        assert_eq!(
            summary.correct_count,
            rec.trials().iter().filter(|t| t.correct).count()
        );
    }

    #[test]
    fn empty_mean_is_zero() {
        let rec = SessionRecorder::new(5);
        assert_eq!(rec.average_reaction_time_ms(TimeoutPolicy::Include), 0);
        assert_eq!(rec.average_reaction_time_ms(TimeoutPolicy::Exclude), 0);
    }
}
