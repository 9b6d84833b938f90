//! Property-based tests for stimulus generation, scoring and session bookkeeping.

mod common;

use common::{Harness, key_char, right_key, wrong_key};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use switchrt_core::{Phase, ResponseKey, SessionKind, SessionSummary};
use switchrt_experiment::generator::{NO_PREVIOUS, next_stimulus};
use switchrt_experiment::scorer::{expected_key, score};
use switchrt_experiment::{ExperimentConfig, SessionRecorder, TimeoutPolicy};

/// What the participant does with one stimulus.
#[derive(Debug, Clone, Copy)]
enum Response {
    Right(u64),
    Wrong(u64),
    Timeout,
}

fn response_strategy() -> impl Strategy<Value = Response> {
    prop_oneof![
        (0..1500u64).prop_map(Response::Right),
        (0..1500u64).prop_map(Response::Wrong),
        Just(Response::Timeout),
    ]
}

proptest! {
    #[test]
    fn stimuli_never_repeat_or_hit_the_pivot(seed in any::<u64>(), len in 1..400usize) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut previous = NO_PREVIOUS;
        for _ in 0..len {
            let stimulus = next_stimulus(&mut rng, previous);
            prop_assert!((1..=9).contains(&stimulus.value));
            prop_assert_ne!(stimulus.value, 5);
            prop_assert_ne!(stimulus.value, previous);
            previous = stimulus.value;
        }
    }

    #[test]
    fn exactly_one_key_scores_correct(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let stimulus = next_stimulus(&mut rng, NO_PREVIOUS);
        prop_assert!(expected_key(stimulus.category, stimulus.value).is_some());
        let hits = [ResponseKey::Z, ResponseKey::X, ResponseKey::N, ResponseKey::M]
            .into_iter()
            .filter(|k| score(stimulus.category, stimulus.value, *k))
            .count();
        prop_assert_eq!(hits, 1);
    }

    #[test]
    fn accuracy_stays_in_percent_range(total in 1..500usize, frac in 0.0..=1.0f64) {
        let correct = ((total as f64) * frac).floor() as usize;
        let accuracy = SessionSummary::accuracy(correct, total);
        prop_assert!(accuracy <= 100);
        prop_assert_eq!(accuracy == 100, correct * 200 >= total * 199);
    }

    #[test]
    fn back_fill_completes_every_slot(total in 1..64usize, answered in 0..64usize) {
        let answered = answered.min(total);
        let mut recorder = SessionRecorder::new(total);
        let mut rng = StdRng::seed_from_u64(total as u64);
        for iteration in 1..=total {
            let stimulus = next_stimulus(&mut rng, recorder.last_value());
            recorder.record_stimulus(stimulus);
            if iteration <= answered {
                let key = right_key(stimulus);
                recorder.record_response(iteration, key, 100, true);
            }
        }
        prop_assert_eq!(recorder.backfill(1500), total - answered);
        let trials = recorder.trials();
        prop_assert_eq!(trials.len(), total);
        prop_assert_eq!(recorder.correct_count(), answered);
        prop_assert!(trials.iter().skip(answered).all(|t| t.timed_out() && !t.correct));
        let summary = recorder.summarize(SessionKind::Short, TimeoutPolicy::Include);
        let sum = answered as u64 * 100 + (total - answered) as u64 * 1500;
        let expected = (sum + total as u64 / 2) / total as u64;
        prop_assert_eq!(summary.average_reaction_time_ms, expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn session_bookkeeping_is_consistent(
        seed in any::<u64>(),
        responses in prop::collection::vec(response_strategy(), 10),
    ) {
        let mut h = Harness::with_config(ExperimentConfig::default(), seed);
        h.start(SessionKind::Short);

        for response in &responses {
            let stimulus = h.stimulus();
            match *response {
                Response::Right(ms) => {
                    h.clock.advance_ms(ms);
                    h.sm.handle_key(key_char(right_key(stimulus)));
                }
                Response::Wrong(ms) => {
                    h.clock.advance_ms(ms);
                    h.sm.handle_key(key_char(wrong_key(stimulus)));
                }
                Response::Timeout => {
                    h.wait_ms(1500);
                }
            }
        }

        prop_assert!(h.sm.current_phase().is_stats());
        let trials = h.sm.trials();
        let summary = h.sm.summary().unwrap();
        prop_assert_eq!(trials.len(), 10);
        for (index, trial) in trials.iter().enumerate() {
            prop_assert_eq!(trial.iteration, index + 1);
            prop_assert!(trial.reaction_time_ms <= 1500);
        }

        let expected_correct = responses
            .iter()
            .filter(|r| matches!(r, Response::Right(_)))
            .count();
        prop_assert_eq!(summary.correct_count, expected_correct);
        prop_assert_eq!(trials.iter().filter(|t| t.correct).count(), expected_correct);
        prop_assert_eq!(
            summary.accuracy_percent,
            SessionSummary::accuracy(expected_correct, 10)
        );

        let timeouts = responses
            .iter()
            .filter(|r| matches!(r, Response::Timeout))
            .count();
        prop_assert_eq!(trials.iter().filter(|t| t.timed_out()).count(), timeouts);

        let min = trials.iter().map(|t| t.reaction_time_ms).min().unwrap();
        let max = trials.iter().map(|t| t.reaction_time_ms).max().unwrap();
        prop_assert!((min..=max).contains(&summary.average_reaction_time_ms));
    }
}
