#![allow(dead_code)]

use rand::SeedableRng;
use rand::rngs::StdRng;
use switchrt_core::{ResponseKey, SessionKind, Stimulus};
use switchrt_experiment::scorer::expected_key;
use switchrt_experiment::{ExperimentConfig, ExperimentStateMachine};
use switchrt_timing::ManualTimer;

pub type Machine = ExperimentStateMachine<ManualTimer, StdRng>;

/// A state machine plus the handle that drives its clock.
pub struct Harness {
    pub sm: Machine,
    pub clock: ManualTimer,
}

impl Harness {
    pub fn new(seed: u64) -> Self {
        Self::with_config(ExperimentConfig::default(), seed)
    }

    pub fn with_config(config: ExperimentConfig, seed: u64) -> Self {
        let clock = ManualTimer::new();
        let sm = ExperimentStateMachine::new(config, clock.clone(), StdRng::seed_from_u64(seed));
        Self { sm, clock }
    }

    /// Advances the clock by `ms` and applies every tick that became due.
    pub fn wait_ms(&mut self, ms: u64) -> usize {
        self.clock.advance_ms(ms);
        self.sm.pump()
    }

    /// Lets `n` response windows run out, one tick per pump as a host loop
    /// polling every frame would see them. Returns how many events applied.
    pub fn wait_intervals(&mut self, n: usize) -> usize {
        let interval_ms = self.sm.config.trial_interval_ms;
        (0..n).map(|_| self.wait_ms(interval_ms)).sum()
    }

    /// Runs the countdown tick by tick, up to the first stimulus.
    pub fn count_down(&mut self) {
        let ticks = self.sm.config.countdown_ticks + 1;
        let tick_ms = self.sm.config.countdown_tick_ms;
        for _ in 0..ticks {
            self.wait_ms(tick_ms);
        }
        assert_eq!(self.sm.current_iteration(), 1, "countdown did not finish");
    }

    /// Enters `kind` and waits out the countdown.
    pub fn start(&mut self, kind: SessionKind) {
        self.sm.enter(kind);
        self.count_down();
    }

    pub fn stimulus(&self) -> Stimulus {
        self.sm
            .current_stimulus()
            .expect("a stimulus should be on screen")
    }
}

pub fn right_key(stimulus: Stimulus) -> ResponseKey {
    expected_key(stimulus.category, stimulus.value).expect("stimulus is never 0 or 5")
}

/// A mapped key that scores as incorrect for `stimulus`.
pub fn wrong_key(stimulus: Stimulus) -> ResponseKey {
    let right = right_key(stimulus);
    [ResponseKey::Z, ResponseKey::X, ResponseKey::N, ResponseKey::M]
        .into_iter()
        .find(|k| *k != right)
        .expect("four keys")
}

pub fn key_char(key: ResponseKey) -> char {
    key.as_str().chars().next().expect("single letter")
}
