//! Focus session state machine.
//!
//! The session is a wall-clock-based countdown. It has no internal thread:
//! the caller ticks it (once a second while running) and pokes it with
//! [`FocusSession::reconcile_at`] whenever the process becomes observable
//! again after a suspension gap. Progress is measured against the absolute
//! `end_time`, never by counting ticks, so a suspended countdown settles to
//! the true remaining time on the first reconcile.
//!
//! ## State transitions
//!
//! ```text
//! Idle -> Running -> (Paused <-> Running) -> Expired
//!   ^        |                                  |
//!   +------ end() ------------------------------+
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No session loaded.
    Idle,
    /// Counting down toward `end_time`.
    Running,
    /// Frozen with `time_left_secs` remaining.
    Paused,
    /// Countdown reached zero and nobody has acted yet.
    Expired,
}

/// A single countdown session, optionally linked to one task.
///
/// Exactly one of these exists per process; it serializes whole into the
/// `focus_session` blob. Invariant: running implies `end_time` is set, and
/// any other state implies it is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSession {
    /// Weak reference: deleting the task does not touch the session.
    active_task_id: Option<i64>,
    duration_mins: u32,
    /// Derived cache of the remaining seconds; recomputed from `end_time`
    /// on every tick and reconcile while running.
    time_left_secs: u64,
    state: SessionState,
    end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
}

impl FocusSession {
    pub fn idle() -> Self {
        Self {
            active_task_id: None,
            duration_mins: 0,
            time_left_secs: 0,
            state: SessionState::Idle,
            end_time: None,
            started_at: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn active_task_id(&self) -> Option<i64> {
        self.active_task_id
    }

    pub fn duration_mins(&self) -> u32 {
        self.duration_mins
    }

    pub fn time_left_secs(&self) -> u64 {
        self.time_left_secs
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        self.snapshot_at(Utc::now())
    }

    pub fn snapshot_at(&self, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            state: self.state,
            active_task_id: self.active_task_id,
            duration_mins: self.duration_mins,
            time_left_secs: self.time_left_secs,
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────
    //
    // Each command takes the current instant so callers (and tests) can
    // drive a simulated clock; the suffix-less wrappers use `Utc::now()`.

    /// Begin a session of `duration_mins`, replacing whatever was loaded.
    pub fn start(&mut self, task_id: Option<i64>, duration_mins: u32) -> Event {
        self.start_at(task_id, duration_mins, Utc::now())
    }

    pub fn start_at(
        &mut self,
        task_id: Option<i64>,
        duration_mins: u32,
        now: DateTime<Utc>,
    ) -> Event {
        let duration_secs = u64::from(duration_mins) * 60;
        self.active_task_id = task_id;
        self.duration_mins = duration_mins;
        self.time_left_secs = duration_secs;
        self.end_time = Some(now + Duration::seconds(duration_secs as i64));
        self.started_at = Some(now);
        self.state = SessionState::Running;
        Event::TimerStarted {
            task_id,
            duration_secs,
            at: now,
        }
    }

    /// Freeze a running countdown, retaining the remaining seconds.
    pub fn stop(&mut self) -> Option<Event> {
        self.stop_at(Utc::now())
    }

    pub fn stop_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != SessionState::Running {
            return None;
        }
        self.time_left_secs = self.remaining_at(now);
        self.end_time = None;
        self.state = SessionState::Paused;
        Some(Event::TimerPaused {
            remaining_secs: self.time_left_secs,
            at: now,
        })
    }

    /// Continue a paused countdown from its frozen remaining time.
    pub fn resume(&mut self) -> Option<Event> {
        self.resume_at(Utc::now())
    }

    pub fn resume_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != SessionState::Paused {
            return None;
        }
        self.end_time = Some(now + Duration::seconds(self.time_left_secs as i64));
        self.state = SessionState::Running;
        Some(Event::TimerResumed {
            remaining_secs: self.time_left_secs,
            at: now,
        })
    }

    /// Call once a second while running. Returns the expiry event when the
    /// countdown reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        self.tick_at(Utc::now())
    }

    pub fn tick_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.settle(now)
    }

    /// Re-derive the remaining time from `end_time` after a suspension gap.
    ///
    /// Idempotent: repeated calls at the same instant observe the same
    /// state. A session whose end time has already passed expires here
    /// immediately rather than waiting for the next tick.
    pub fn reconcile(&mut self) -> Option<Event> {
        self.reconcile_at(Utc::now())
    }

    pub fn reconcile_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.settle(now)
    }

    /// Discard the session entirely.
    pub fn end(&mut self) -> Event {
        self.end_at(Utc::now())
    }

    pub fn end_at(&mut self, now: DateTime<Utc>) -> Event {
        self.active_task_id = None;
        self.time_left_secs = 0;
        self.end_time = None;
        self.started_at = None;
        self.state = SessionState::Idle;
        Event::TimerEnded { at: now }
    }

    /// Rewind to the full configured duration, paused, without starting.
    /// No-op when idle (there is no duration to rewind to).
    pub fn reset(&mut self) -> Option<Event> {
        self.reset_at(Utc::now())
    }

    pub fn reset_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state == SessionState::Idle {
            return None;
        }
        self.time_left_secs = u64::from(self.duration_mins) * 60;
        self.end_time = None;
        self.state = SessionState::Paused;
        Some(Event::TimerReset { at: now })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn settle(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != SessionState::Running {
            return None;
        }
        self.time_left_secs = self.remaining_at(now);
        if self.time_left_secs == 0 {
            self.end_time = None;
            self.state = SessionState::Expired;
            return Some(Event::TimerExpired {
                task_id: self.active_task_id,
                at: now,
            });
        }
        None
    }

    /// Whole seconds until `end_time`, rounded up; zero once `now` has
    /// reached it. Falls back to the frozen value when not counting down.
    fn remaining_at(&self, now: DateTime<Utc>) -> u64 {
        match self.end_time {
            Some(end) => {
                let ms = (end - now).num_milliseconds();
                if ms <= 0 {
                    0
                } else {
                    ((ms + 999) / 1000) as u64
                }
            }
            None => self.time_left_secs,
        }
    }
}

impl Default for FocusSession {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        "2026-08-06T10:00:00Z".parse().unwrap()
    }

    #[test]
    fn start_pause_resume() {
        let mut session = FocusSession::idle();
        assert_eq!(session.state(), SessionState::Idle);

        session.start_at(Some(7), 25, t0());
        assert_eq!(session.state(), SessionState::Running);
        assert!(session.is_active());
        assert_eq!(session.time_left_secs(), 25 * 60);
        assert_eq!(session.active_task_id(), Some(7));

        assert!(session.stop_at(t0() + Duration::seconds(60)).is_some());
        assert_eq!(session.state(), SessionState::Paused);
        assert_eq!(session.time_left_secs(), 24 * 60);
        assert!(session.end_time().is_none());

        assert!(session
            .resume_at(t0() + Duration::seconds(300))
            .is_some());
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(
            session.end_time(),
            Some(t0() + Duration::seconds(300) + Duration::seconds(24 * 60))
        );
    }

    #[test]
    fn paused_time_does_not_drain() {
        let mut session = FocusSession::idle();
        session.start_at(None, 10, t0());
        session.stop_at(t0() + Duration::seconds(30));
        let frozen = session.time_left_secs();

        // Hours pass while paused; nothing moves.
        assert!(session.tick_at(t0() + Duration::hours(5)).is_none());
        assert_eq!(session.time_left_secs(), frozen);
        assert_eq!(session.state(), SessionState::Paused);
    }

    #[test]
    fn reconcile_is_idempotent_at_a_fixed_instant() {
        let mut session = FocusSession::idle();
        session.start_at(None, 25, t0());

        let later = t0() + Duration::seconds(100);
        session.reconcile_at(later);
        let first = session.time_left_secs();
        session.reconcile_at(later);
        let second = session.time_left_secs();

        assert_eq!(first, second);
        assert_eq!(first, 25 * 60 - 100);
        assert_eq!(session.state(), SessionState::Running);
    }

    #[test]
    fn expiry_is_wall_clock_correct() {
        let mut session = FocusSession::idle();
        session.start_at(Some(3), 1, t0());

        // 61 seconds pass with no ticks at all.
        let event = session.reconcile_at(t0() + Duration::seconds(61));
        match event {
            Some(Event::TimerExpired { task_id, .. }) => assert_eq!(task_id, Some(3)),
            other => panic!("expected TimerExpired, got {other:?}"),
        }
        assert_eq!(session.time_left_secs(), 0);
        assert!(!session.is_active());
        assert_eq!(session.state(), SessionState::Expired);
        assert!(session.end_time().is_none());
    }

    #[test]
    fn expires_exactly_at_the_end_instant() {
        let mut session = FocusSession::idle();
        session.start_at(None, 1, t0());
        let event = session.tick_at(t0() + Duration::seconds(60));
        assert!(matches!(event, Some(Event::TimerExpired { .. })));
    }

    #[test]
    fn partial_seconds_round_up() {
        let mut session = FocusSession::idle();
        session.start_at(None, 1, t0());
        session.tick_at(t0() + Duration::milliseconds(59_500));
        assert_eq!(session.time_left_secs(), 1);
        assert!(session.is_active());
    }

    #[test]
    fn reset_returns_to_paused_at_full_duration() {
        let mut session = FocusSession::idle();
        session.start_at(Some(9), 25, t0());
        session.tick_at(t0() + Duration::seconds(600));

        assert!(session.reset_at(t0() + Duration::seconds(601)).is_some());
        assert_eq!(session.state(), SessionState::Paused);
        assert!(!session.is_active());
        assert_eq!(session.time_left_secs(), 25 * 60);
        assert!(session.end_time().is_none());
        // The task link survives a reset.
        assert_eq!(session.active_task_id(), Some(9));
    }

    #[test]
    fn reset_while_idle_is_a_noop() {
        let mut session = FocusSession::idle();
        assert!(session.reset_at(t0()).is_none());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn end_discards_everything() {
        let mut session = FocusSession::idle();
        session.start_at(Some(11), 25, t0());
        session.end_at(t0() + Duration::seconds(10));

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.active_task_id(), None);
        assert_eq!(session.time_left_secs(), 0);
        assert!(session.end_time().is_none());
        assert!(session.started_at().is_none());
    }

    #[test]
    fn degenerate_resume_expires_on_next_tick() {
        let mut session = FocusSession::idle();
        session.start_at(None, 0, t0());
        session.stop_at(t0());
        assert_eq!(session.time_left_secs(), 0);

        session.resume_at(t0() + Duration::seconds(5));
        let event = session.tick_at(t0() + Duration::seconds(5));
        assert!(matches!(event, Some(Event::TimerExpired { .. })));
    }

    #[test]
    fn stop_outside_running_is_a_noop() {
        let mut session = FocusSession::idle();
        assert!(session.stop_at(t0()).is_none());

        session.start_at(None, 1, t0());
        session.reconcile_at(t0() + Duration::seconds(61));
        assert_eq!(session.state(), SessionState::Expired);
        assert!(session.stop_at(t0() + Duration::seconds(62)).is_none());
        assert_eq!(session.state(), SessionState::Expired);
    }

    #[test]
    fn serialized_session_roundtrips_and_tolerates_old_blobs() {
        let mut session = FocusSession::idle();
        session.start_at(Some(5), 25, t0());
        let json = serde_json::to_string(&session).unwrap();
        let decoded: FocusSession = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, session);

        // Blobs written before `started_at` existed still load.
        let old = r#"{
            "active_task_id": 5,
            "duration_mins": 25,
            "time_left_secs": 1500,
            "state": "running",
            "end_time": "2026-08-06T10:25:00Z"
        }"#;
        let decoded: FocusSession = serde_json::from_str(old).unwrap();
        assert_eq!(decoded.state(), SessionState::Running);
        assert!(decoded.started_at().is_none());
    }

    proptest! {
        // Running implies an end time; every other state implies none.
        #[test]
        fn end_time_tracks_the_running_state(ops in proptest::collection::vec(0u8..6, 1..40)) {
            let mut session = FocusSession::idle();
            let mut now = t0();
            for op in ops {
                now += Duration::seconds(13);
                match op {
                    0 => {
                        session.start_at(Some(1), 1, now);
                    }
                    1 => {
                        session.stop_at(now);
                    }
                    2 => {
                        session.resume_at(now);
                    }
                    3 => {
                        session.tick_at(now);
                    }
                    4 => {
                        session.reset_at(now);
                    }
                    _ => {
                        session.end_at(now);
                    }
                }
                prop_assert_eq!(
                    session.end_time().is_some(),
                    session.state() == SessionState::Running
                );
                if session.state() == SessionState::Expired {
                    prop_assert_eq!(session.time_left_secs(), 0);
                }
            }
        }
    }
}
