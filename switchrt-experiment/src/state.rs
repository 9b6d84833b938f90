use rand::Rng;
use switchrt_core::{
    Phase, ResponseKey, Screen, SessionKind, SessionSummary, Stimulus, TaskPhase, Trial,
};
use switchrt_timing::{IntervalTimer, Timer, TimerId, TimerIds};
use tracing::{debug, info, trace};

use crate::auth::{AuthService, SessionToken};
use crate::config::ExperimentConfig;
use crate::error::EngineError;
use crate::generator::next_stimulus;
use crate::route::Route;
use crate::scorer::score;
use crate::session::SessionState;
use crate::store::{ResultStore, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentEvent {
    CountdownTick(TimerId),
    TrialTick(TimerId),
    KeyPressed(char),
}

/// Why a key did not count as a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotPlaying,
    NoActiveTrial,
    UnmappedKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored(IgnoreReason),
    Recorded {
        iteration: usize,
        key: ResponseKey,
        reaction_time_ms: u64,
        correct: bool,
    },
}

/// What the stats screen's continue action leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Not on the stats screen.
    Wait,
    Navigate(Route),
    Submit,
}

/// Phase controller for one participant.
///
/// The host loop calls [`update`](Self::update) to turn due timers into
/// events and feeds those, plus key presses, to
/// [`handle_event`](Self::handle_event). Each call runs to completion, so a
/// response always lands before the next tick is considered.
pub struct ExperimentStateMachine<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub config: ExperimentConfig,
    timer: T,
    rng: R,
    phase: TaskPhase,
    session: Option<SessionState>,
    countdown: Option<IntervalTimer>,
    countdown_step: u32,
    countdown_label: Option<u8>,
    trial_clock: Option<IntervalTimer>,
    timer_ids: TimerIds,
    submitted: Option<SessionId>,
    submit_failed: bool,
}

impl<T, R> ExperimentStateMachine<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub fn new(config: ExperimentConfig, timer: T, rng: R) -> Self {
        Self {
            config,
            timer,
            rng,
            phase: TaskPhase::default(),
            session: None,
            countdown: None,
            countdown_step: 0,
            countdown_label: None,
            trial_clock: None,
            timer_ids: TimerIds::default(),
            submitted: None,
            submit_failed: false,
        }
    }

    /// Enters `route` for an authenticated participant.
    pub fn enter_route(
        &mut self,
        route: Route,
        auth: &dyn AuthService,
        token: &SessionToken,
    ) -> Result<(), EngineError> {
        if !auth.status(token).authenticated {
            return Err(EngineError::AuthRequired);
        }
        self.enter(route.session_kind());
        Ok(())
    }

    /// Starts a fresh session at countdown, dropping whatever ran before.
    pub fn enter(&mut self, kind: SessionKind) {
        self.disarm();
        let total = self.config.iterations_for(kind);
        self.session = Some(SessionState::new(kind, total));
        self.submitted = None;
        self.submit_failed = false;
        self.phase = TaskPhase::Countdown;
        self.countdown_step = 0;
        self.countdown_label = None;
        let id = self.timer_ids.next_id();
        self.countdown = Some(IntervalTimer::arm(
            id,
            "countdown",
            self.timer.now(),
            self.config.countdown_tick(),
        ));
        info!(kind = %kind, total, "session entered");
    }

    /// Abandons the current run. No timer outlives this call.
    pub fn leave(&mut self) {
        self.disarm();
        if self.session.take().is_some() {
            info!("session left");
        }
        self.phase = TaskPhase::default();
    }

    fn disarm(&mut self) {
        self.countdown = None;
        self.trial_clock = None;
    }

    fn next_phase(&mut self) {
        if let Some(next) = self.phase.next() {
            debug!(from = %self.phase, to = %next, "phase changed");
            self.phase = next;
        }
    }

    /// Collects ticks that are due now.
    pub fn update(&mut self) -> Vec<ExperimentEvent> {
        let mut events = Vec::new();
        let now = self.timer.now();
        if let Some(countdown) = &mut self.countdown {
            if countdown.poll(now) {
                events.push(ExperimentEvent::CountdownTick(countdown.id()));
            }
        }
        if let Some(clock) = &mut self.trial_clock {
            if clock.poll(now) {
                events.push(ExperimentEvent::TrialTick(clock.id()));
            }
        }
        events
    }

    /// Applies one event. Returns false when it was stale or not applicable.
    pub fn handle_event(&mut self, event: ExperimentEvent) -> bool {
        match event {
            ExperimentEvent::CountdownTick(id)
                if self.phase.is_countdown() && armed(&self.countdown, id) =>
            {
                self.countdown_tick();
                true
            }
            ExperimentEvent::TrialTick(id)
                if self.phase.is_playing() && armed(&self.trial_clock, id) =>
            {
                self.advance();
                true
            }
            ExperimentEvent::KeyPressed(c) => {
                matches!(self.handle_key(c), KeyOutcome::Recorded { .. })
            }
            _ => {
                trace!(?event, "stale or out-of-phase event dropped");
                false
            }
        }
    }

    /// Runs [`update`](Self::update) and handles every resulting event until
    /// nothing is due. Returns how many events were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let events = self.update();
            if events.is_empty() {
                return applied;
            }
            for event in events {
                if self.handle_event(event) {
                    applied += 1;
                }
            }
        }
    }

    fn countdown_tick(&mut self) {
        self.countdown_step += 1;
        let ticks = self.config.countdown_ticks;
        if self.countdown_step > ticks {
            self.start_playing();
            return;
        }
        let remaining = ticks - self.countdown_step;
        self.countdown_label = (remaining > 0).then(|| remaining.min(u32::from(u8::MAX)) as u8);
        trace!(label = ?self.countdown_label, "countdown");
    }

    fn start_playing(&mut self) {
        self.countdown = None;
        self.countdown_label = None;
        self.next_phase();
        if let Some(session) = &mut self.session {
            session.current_iteration = 0;
        }
        info!("playing");
        self.advance();
        if self.phase.is_playing() {
            self.arm_trial_clock();
        }
    }

    fn arm_trial_clock(&mut self) {
        let id = self.timer_ids.next_id();
        self.trial_clock = Some(IntervalTimer::arm(
            id,
            "trial",
            self.timer.now(),
            self.config.trial_interval(),
        ));
    }

    /// Shows the next stimulus, or finishes once every iteration was shown.
    fn advance(&mut self) {
        let now = self.timer.now();
        let Some(session) = &mut self.session else {
            return;
        };
        session.shown_at_ns = now;
        let next = session.current_iteration + 1;
        if next > session.total_iterations {
            self.finish();
            return;
        }
        let stimulus = next_stimulus(&mut self.rng, session.recorder.last_value());
        session.recorder.record_stimulus(stimulus);
        session.current_iteration = next;
        debug!(
            iteration = next,
            value = stimulus.value,
            category = stimulus.category.name(),
            "stimulus shown"
        );
    }

    fn finish(&mut self) {
        self.trial_clock = None;
        let interval_ms = self.config.trial_interval_ms;
        let policy = self.config.timeout_policy;
        let Some(session) = &mut self.session else {
            return;
        };
        let timeouts = session.recorder.backfill(interval_ms);
        let summary = session.recorder.summarize(session.kind, policy);
        info!(
            kind = %session.kind,
            correct = summary.correct_count,
            total = summary.total_iterations,
            timeouts,
            mean_rt_ms = summary.average_reaction_time_ms,
            "session finished"
        );
        session.summary = Some(summary);
        self.next_phase();
    }

    /// Scores a key press against the stimulus on screen and moves straight on
    /// to the next one with a fresh response window.
    pub fn handle_key(&mut self, c: char) -> KeyOutcome {
        if !self.phase.allows_input() {
            return KeyOutcome::Ignored(IgnoreReason::NotPlaying);
        }
        let Some(session) = &mut self.session else {
            return KeyOutcome::Ignored(IgnoreReason::NoActiveTrial);
        };
        if session.current_iteration == 0 {
            return KeyOutcome::Ignored(IgnoreReason::NoActiveTrial);
        }
        let Some(key) = ResponseKey::from_char(c) else {
            return KeyOutcome::Ignored(IgnoreReason::UnmappedKey);
        };
        let Some(stimulus) = session.recorder.stimulus(session.current_iteration) else {
            return KeyOutcome::Ignored(IgnoreReason::NoActiveTrial);
        };

        let reaction_time_ms = ns_to_ms(self.timer.now().saturating_sub(session.shown_at_ns));
        let correct = score(stimulus.category, stimulus.value, key);
        let iteration = session.current_iteration;
        session
            .recorder
            .record_response(iteration, key, reaction_time_ms, correct);
        debug!(iteration, %key, reaction_time_ms, correct, "response recorded");

        self.arm_trial_clock();
        self.advance();

        KeyOutcome::Recorded {
            iteration,
            key,
            reaction_time_ms,
            correct,
        }
    }

    pub fn continue_action(&self) -> NextStep {
        match &self.session {
            Some(session) if self.phase.is_stats() => match session.kind {
                SessionKind::Short => NextStep::Navigate(Route::Game),
                SessionKind::Long => NextStep::Submit,
            },
            _ => NextStep::Wait,
        }
    }

    /// Hands the finished long session to `store`. On failure the recorded
    /// trials stay in place, the stats screen reports the failure and the
    /// call can be repeated.
    pub fn submit(
        &mut self,
        auth: &dyn AuthService,
        token: &SessionToken,
        store: &mut dyn ResultStore,
    ) -> Result<SessionId, EngineError> {
        if let Some(id) = self.submitted {
            return Err(EngineError::AlreadySubmitted(id));
        }
        if self.continue_action() != NextStep::Submit {
            return Err(EngineError::NotReadyToSubmit { phase: self.phase });
        }
        let status = auth.status(token);
        let email = match status.email {
            Some(email) if status.authenticated => email,
            _ => return Err(EngineError::AuthRequired),
        };
        let (summary, trials) = match &self.session {
            Some(SessionState {
                summary: Some(summary),
                recorder,
                ..
            }) => (summary.clone(), recorder.trials()),
            _ => return Err(EngineError::NotReadyToSubmit { phase: self.phase }),
        };

        let id = match store.submit(&email, &summary, &trials) {
            Ok(id) => id,
            Err(e) => {
                self.submit_failed = true;
                return Err(EngineError::SubmissionFailed(e));
            }
        };
        info!(session = id, email = %email, "results submitted");
        self.submitted = Some(id);
        self.submit_failed = false;
        self.session = None;
        Ok(id)
    }

    pub fn screen(&self) -> Screen {
        if self.submitted.is_some() {
            return Screen::Complete;
        }
        let Some(session) = &self.session else {
            return Screen::Idle;
        };
        match self.phase {
            TaskPhase::Countdown => Screen::Countdown {
                label: self.countdown_label,
            },
            TaskPhase::Playing => match session.recorder.stimulus(session.current_iteration) {
                Some(stimulus) => Screen::Stimulus(stimulus),
                None => Screen::Countdown { label: None },
            },
            TaskPhase::Stats => {
                let (correct_count, average_reaction_time_ms) = session
                    .summary
                    .as_ref()
                    .map_or((0, 0), |s| (s.correct_count, s.average_reaction_time_ms));
                Screen::Stats {
                    kind: session.kind,
                    correct_count,
                    average_reaction_time_ms,
                    submit_failed: self.submit_failed,
                }
            }
        }
    }

    pub fn current_phase(&self) -> &TaskPhase {
        &self.phase
    }

    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    pub fn session_kind(&self) -> Option<SessionKind> {
        self.session.as_ref().map(|s| s.kind)
    }

    pub fn current_stimulus(&self) -> Option<Stimulus> {
        let session = self.session.as_ref()?;
        if !self.phase.is_playing() {
            return None;
        }
        session.recorder.stimulus(session.current_iteration)
    }

    pub fn current_iteration(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.current_iteration)
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.session.as_ref().and_then(|s| s.summary.as_ref())
    }

    pub fn trials(&self) -> Vec<Trial> {
        self.session
            .as_ref()
            .map(|s| s.recorder.trials())
            .unwrap_or_default()
    }

    pub fn trial_progress(&self) -> Option<(usize, usize)> {
        let session = self.session.as_ref()?;
        self.phase
            .is_playing()
            .then_some((session.current_iteration, session.total_iterations))
    }

    pub fn submitted(&self) -> Option<SessionId> {
        self.submitted
    }

    /// Number of timers currently armed; at most one outside of transitions.
    pub fn armed_timers(&self) -> usize {
        usize::from(self.countdown.is_some()) + usize::from(self.trial_clock.is_some())
    }

    /// Earliest pending deadline, for hosts that sleep between ticks.
    pub fn next_deadline_ns(&self) -> Option<u64> {
        [&self.countdown, &self.trial_clock]
            .into_iter()
            .flatten()
            .map(IntervalTimer::next_due_ns)
            .min()
    }
}

fn armed(slot: &Option<IntervalTimer>, id: TimerId) -> bool {
    slot.as_ref().is_some_and(|t| t.id() == id)
}

fn ns_to_ms(ns: u64) -> u64 {
    (ns + 500_000) / 1_000_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryAuth;
    use crate::store::InMemoryStore;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use switchrt_timing::ManualTimer;

    type Machine = ExperimentStateMachine<ManualTimer, StdRng>;

    fn machine() -> (Machine, ManualTimer) {
        let clock = ManualTimer::new();
        let sm = ExperimentStateMachine::new(
            ExperimentConfig::default(),
            clock.clone(),
            StdRng::seed_from_u64(42),
        );
        (sm, clock)
    }

    fn step(sm: &mut Machine, clock: &ManualTimer, ms: u64) -> usize {
        clock.advance_ms(ms);
        sm.pump()
    }

    /// Runs the default countdown one tick at a time, up to the first stimulus.
    fn count_down(sm: &mut Machine, clock: &ManualTimer) {
        for _ in 0..5 {
            step(sm, clock, 1000);
        }
        assert_eq!(sm.current_iteration(), 1);
    }

    fn correct_key(stimulus: Stimulus) -> char {
        crate::scorer::expected_key(stimulus.category, stimulus.value)
            .unwrap()
            .as_str()
            .chars()
            .next()
            .unwrap()
    }

    #[test]
    fn countdown_shows_three_two_one_blank_then_plays() {
        let (mut sm, clock) = machine();
        sm.enter(SessionKind::Short);
        assert_eq!(sm.screen(), Screen::Countdown { label: None });

        let mut labels = Vec::new();
        for _ in 0..4 {
            step(&mut sm, &clock, 1000);
            match sm.screen() {
                Screen::Countdown { label } => labels.push(label),
                other => panic!("unexpected screen {other:?}"),
            }
        }
        assert_eq!(labels, vec![Some(3), Some(2), Some(1), None]);

        assert_eq!(sm.trial_progress(), None);
        step(&mut sm, &clock, 1000);
        assert!(sm.current_phase().is_playing());
        assert_eq!(sm.trial_progress(), Some((1, 10)));
        assert!(matches!(sm.screen(), Screen::Stimulus(_)));
        assert_eq!(sm.armed_timers(), 1);
    }

    #[test]
    fn keys_are_ignored_outside_playing() {
        let (mut sm, clock) = machine();
        assert_eq!(sm.handle_key('z'), KeyOutcome::Ignored(IgnoreReason::NotPlaying));
        sm.enter(SessionKind::Short);
        step(&mut sm, &clock, 2000);
        assert_eq!(sm.handle_key('z'), KeyOutcome::Ignored(IgnoreReason::NotPlaying));
    }

    #[test]
    fn unmapped_key_leaves_clock_alone() {
        let (mut sm, clock) = machine();
        sm.enter(SessionKind::Short);
        count_down(&mut sm, &clock);
        let deadline = sm.next_deadline_ns();

        clock.advance_ms(300);
        assert_eq!(sm.handle_key('q'), KeyOutcome::Ignored(IgnoreReason::UnmappedKey));
        assert_eq!(sm.next_deadline_ns(), deadline);
        assert_eq!(sm.current_iteration(), 1);
    }

    #[test]
    fn response_scores_and_advances_immediately() {
        let (mut sm, clock) = machine();
        sm.enter(SessionKind::Short);
        count_down(&mut sm, &clock);
        let stimulus = sm.current_stimulus().unwrap();

        clock.advance_ms(640);
        let outcome = sm.handle_key(correct_key(stimulus));
        assert_eq!(
            outcome,
            KeyOutcome::Recorded {
                iteration: 1,
                key: ResponseKey::from_char(correct_key(stimulus)).unwrap(),
                reaction_time_ms: 640,
                correct: true,
            }
        );
        assert_eq!(sm.current_iteration(), 2);
        assert_ne!(sm.current_stimulus().unwrap().value, stimulus.value);

        // The window restarted at the key press: nothing due 1499 ms later.
        assert_eq!(step(&mut sm, &clock, 1499), 0);
        assert_eq!(step(&mut sm, &clock, 1), 1);
        assert_eq!(sm.current_iteration(), 3);
    }

    #[test]
    fn stale_tick_is_dropped() {
        let (mut sm, clock) = machine();
        sm.enter(SessionKind::Short);
        count_down(&mut sm, &clock);

        clock.advance_ms(1500);
        let events = sm.update();
        assert_eq!(events.len(), 1);
        sm.handle_key('m');
        let iteration = sm.current_iteration();
        for event in events {
            assert!(!sm.handle_event(event));
        }
        assert_eq!(sm.current_iteration(), iteration);
    }

    #[test]
    fn session_ends_after_last_interval() {
        let (mut sm, clock) = machine();
        sm.enter(SessionKind::Short);
        count_down(&mut sm, &clock);
        for _ in 0..10 {
            step(&mut sm, &clock, 1500);
        }
        assert!(sm.current_phase().is_stats());
        assert_eq!(sm.armed_timers(), 0);
        let summary = sm.summary().unwrap();
        assert_eq!(summary.correct_count, 0);
        assert_eq!(summary.average_reaction_time_ms, 1500);
        assert_eq!(sm.continue_action(), NextStep::Navigate(Route::Game));
        assert_eq!(
            sm.screen(),
            Screen::Stats {
                kind: SessionKind::Short,
                correct_count: 0,
                average_reaction_time_ms: 1500,
                submit_failed: false,
            }
        );
    }

    #[test]
    fn stalled_loop_advances_a_single_trial() {
        let (mut sm, clock) = machine();
        sm.enter(SessionKind::Long);
        count_down(&mut sm, &clock);

        assert_eq!(step(&mut sm, &clock, 6000), 1);
        assert_eq!(sm.current_iteration(), 2);
        assert_eq!(sm.trials().len(), 2);

        // Ticks keep their grid: the next one lands 7500 ms after the first stimulus.
        assert_eq!(step(&mut sm, &clock, 1499), 0);
        assert_eq!(step(&mut sm, &clock, 1), 1);
        assert_eq!(sm.current_iteration(), 3);
    }

    #[test]
    fn stalled_countdown_keeps_every_label() {
        let (mut sm, clock) = machine();
        sm.enter(SessionKind::Short);
        assert_eq!(step(&mut sm, &clock, 3500), 1);
        assert_eq!(sm.screen(), Screen::Countdown { label: Some(3) });
        step(&mut sm, &clock, 500);
        assert_eq!(sm.screen(), Screen::Countdown { label: Some(2) });
    }

    #[test]
    fn failed_submission_shows_until_retried() {
        let clock = ManualTimer::new();
        let config = ExperimentConfig {
            long_iterations: 2,
            ..ExperimentConfig::default()
        };
        let mut sm = ExperimentStateMachine::new(config, clock.clone(), StdRng::seed_from_u64(7));
        let mut auth = MemoryAuth::new();
        let token = auth.login("ada@example.org").unwrap();
        let mut store = InMemoryStore::new();

        sm.enter(SessionKind::Long);
        count_down(&mut sm, &clock);
        step(&mut sm, &clock, 1500);
        step(&mut sm, &clock, 1500);
        assert!(matches!(
            sm.screen(),
            Screen::Stats {
                submit_failed: false,
                ..
            }
        ));

        store.set_available(false);
        assert!(sm.submit(&auth, &token, &mut store).unwrap_err().is_retryable());
        assert!(matches!(
            sm.screen(),
            Screen::Stats {
                submit_failed: true,
                ..
            }
        ));

        store.set_available(true);
        sm.submit(&auth, &token, &mut store).unwrap();
        assert_eq!(sm.screen(), Screen::Complete);

        sm.enter(SessionKind::Long);
        assert_eq!(sm.screen(), Screen::Countdown { label: None });
    }

    #[test]
    fn enter_route_requires_login() {
        let (mut sm, _clock) = machine();
        let mut auth = MemoryAuth::new();
        let token = auth.login("ada@example.org").unwrap();
        auth.logout(&token);
        assert!(matches!(
            sm.enter_route(Route::Game, &auth, &token),
            Err(EngineError::AuthRequired)
        ));
        assert_eq!(sm.screen(), Screen::Idle);

        let token = auth.login("ada@example.org").unwrap();
        sm.enter_route(Route::Game, &auth, &token).unwrap();
        assert_eq!(sm.session_kind(), Some(SessionKind::Long));
    }

    #[test]
    fn submit_before_stats_is_refused() {
        let (mut sm, _clock) = machine();
        let mut auth = MemoryAuth::new();
        let token = auth.login("ada@example.org").unwrap();
        let mut store = InMemoryStore::new();
        sm.enter(SessionKind::Long);
        assert!(matches!(
            sm.submit(&auth, &token, &mut store),
            Err(EngineError::NotReadyToSubmit {
                phase: TaskPhase::Countdown
            })
        ));
    }

    #[test]
    fn leave_disarms_everything() {
        let (mut sm, clock) = machine();
        sm.enter(SessionKind::Long);
        count_down(&mut sm, &clock);
        assert_eq!(sm.armed_timers(), 1);
        sm.leave();
        assert_eq!(sm.armed_timers(), 0);
        assert_eq!(step(&mut sm, &clock, 10_000), 0);
        assert_eq!(sm.screen(), Screen::Idle);
    }

    #[test]
    fn rounds_reaction_time_to_nearest_ms() {
        assert_eq!(ns_to_ms(0), 0);
        assert_eq!(ns_to_ms(499_999), 0);
        assert_eq!(ns_to_ms(500_000), 1);
        assert_eq!(ns_to_ms(1_500_000_000), 1500);
    }
}
