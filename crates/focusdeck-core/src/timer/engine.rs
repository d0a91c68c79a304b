//! Persisted front end over the focus session.
//!
//! [`FocusTimer`] owns the process-wide [`FocusSession`] and keeps the
//! `focus_session` blob in the store current: every state transition is
//! written back best-effort, and `load` rehydrates and reconciles the
//! session before anything else sees it. A session left running when the
//! process died resumes seamlessly, or reports its expiry as the load
//! result.

use chrono::{DateTime, Utc};

use crate::events::Event;
use crate::storage::database::SESSION_KEY;
use crate::storage::Database;

use super::session::{FocusSession, SessionState};

/// The single persisted focus timer.
#[derive(Debug, Default)]
pub struct FocusTimer {
    session: FocusSession,
}

impl FocusTimer {
    /// Rehydrate the persisted session and reconcile it against the clock.
    ///
    /// Returns the timer plus the expiry event when the stored session ran
    /// out while the process was away. Missing or malformed blobs degrade
    /// to an idle timer.
    pub fn load(db: &Database) -> (Self, Option<Event>) {
        Self::load_at(db, Utc::now())
    }

    pub fn load_at(db: &Database, now: DateTime<Utc>) -> (Self, Option<Event>) {
        let session = match db.kv_get(SESSION_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|_| FocusSession::idle()),
            _ => FocusSession::idle(),
        };
        let mut timer = Self { session };
        let expired = timer.session.reconcile_at(now);
        if expired.is_some() {
            timer.persist(db);
        }
        (timer, expired)
    }

    pub fn session(&self) -> &FocusSession {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn time_left_secs(&self) -> u64 {
        self.session.time_left_secs()
    }

    pub fn active_task_id(&self) -> Option<i64> {
        self.session.active_task_id()
    }

    pub fn duration_mins(&self) -> u32 {
        self.session.duration_mins()
    }

    pub fn snapshot(&self) -> Event {
        self.session.snapshot()
    }

    /// Start a session and persist it immediately.
    pub fn start(&mut self, db: &Database, task_id: Option<i64>, duration_mins: u32) -> Event {
        self.start_at(db, task_id, duration_mins, Utc::now())
    }

    pub fn start_at(
        &mut self,
        db: &Database,
        task_id: Option<i64>,
        duration_mins: u32,
        now: DateTime<Utc>,
    ) -> Event {
        let event = self.session.start_at(task_id, duration_mins, now);
        self.persist(db);
        event
    }

    pub fn stop(&mut self, db: &Database) -> Option<Event> {
        self.stop_at(db, Utc::now())
    }

    pub fn stop_at(&mut self, db: &Database, now: DateTime<Utc>) -> Option<Event> {
        let event = self.session.stop_at(now);
        if event.is_some() {
            self.persist(db);
        }
        event
    }

    pub fn resume(&mut self, db: &Database) -> Option<Event> {
        self.resume_at(db, Utc::now())
    }

    pub fn resume_at(&mut self, db: &Database, now: DateTime<Utc>) -> Option<Event> {
        let event = self.session.resume_at(now);
        if event.is_some() {
            self.persist(db);
        }
        event
    }

    /// Drive the 1-second cadence. Only an expiry changes durable state:
    /// plain ticks move the derived remaining-seconds cache, which is
    /// recomputed from the stored end time on the next load anyway.
    pub fn tick(&mut self, db: &Database) -> Option<Event> {
        self.tick_at(db, Utc::now())
    }

    pub fn tick_at(&mut self, db: &Database, now: DateTime<Utc>) -> Option<Event> {
        let event = self.session.tick_at(now);
        if event.is_some() {
            self.persist(db);
        }
        event
    }

    /// Foreground/lifecycle reconciliation point. Idempotent.
    pub fn reconcile(&mut self, db: &Database) -> Option<Event> {
        self.reconcile_at(db, Utc::now())
    }

    pub fn reconcile_at(&mut self, db: &Database, now: DateTime<Utc>) -> Option<Event> {
        let event = self.session.reconcile_at(now);
        if event.is_some() {
            self.persist(db);
        }
        event
    }

    pub fn end(&mut self, db: &Database) -> Event {
        self.end_at(db, Utc::now())
    }

    pub fn end_at(&mut self, db: &Database, now: DateTime<Utc>) -> Event {
        let event = self.session.end_at(now);
        self.persist(db);
        event
    }

    pub fn reset(&mut self, db: &Database) -> Option<Event> {
        self.reset_at(db, Utc::now())
    }

    pub fn reset_at(&mut self, db: &Database, now: DateTime<Utc>) -> Option<Event> {
        let event = self.session.reset_at(now);
        if event.is_some() {
            self.persist(db);
        }
        event
    }

    fn persist(&self, db: &Database) {
        // Best-effort: the in-memory session stays authoritative if this fails.
        if let Ok(json) = serde_json::to_string(&self.session) {
            let _ = db.kv_set(SESSION_KEY, &json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        "2026-08-06T09:00:00Z".parse().unwrap()
    }

    #[test]
    fn running_session_survives_a_reload() {
        let db = Database::open_memory().unwrap();
        let mut timer = FocusTimer::default();
        timer.start_at(&db, Some(4), 25, t0());
        drop(timer);

        let (timer, event) = FocusTimer::load_at(&db, t0() + Duration::seconds(120));
        assert!(event.is_none());
        assert!(timer.is_active());
        assert_eq!(timer.active_task_id(), Some(4));
        assert_eq!(timer.time_left_secs(), 25 * 60 - 120);
    }

    #[test]
    fn stale_running_session_reports_expiry_on_load() {
        let db = Database::open_memory().unwrap();
        let mut timer = FocusTimer::default();
        timer.start_at(&db, Some(8), 1, t0());
        drop(timer);

        let (timer, event) = FocusTimer::load_at(&db, t0() + Duration::hours(2));
        assert!(matches!(event, Some(Event::TimerExpired { task_id: Some(8), .. })));
        assert_eq!(timer.state(), SessionState::Expired);
        assert_eq!(timer.time_left_secs(), 0);

        // Rehydrating again is idempotent: the expiry was already recorded.
        let (timer, event) = FocusTimer::load_at(&db, t0() + Duration::hours(3));
        assert!(event.is_none());
        assert_eq!(timer.state(), SessionState::Expired);
    }

    #[test]
    fn paused_session_reloads_frozen() {
        let db = Database::open_memory().unwrap();
        let mut timer = FocusTimer::default();
        timer.start_at(&db, None, 10, t0());
        timer.stop_at(&db, t0() + Duration::seconds(90));

        let (timer, event) = FocusTimer::load_at(&db, t0() + Duration::days(3));
        assert!(event.is_none());
        assert_eq!(timer.state(), SessionState::Paused);
        assert_eq!(timer.time_left_secs(), 10 * 60 - 90);
    }

    #[test]
    fn missing_or_corrupt_blob_loads_idle() {
        let db = Database::open_memory().unwrap();
        let (timer, event) = FocusTimer::load_at(&db, t0());
        assert!(event.is_none());
        assert_eq!(timer.state(), SessionState::Idle);

        db.kv_set(SESSION_KEY, "][ nonsense").unwrap();
        let (timer, event) = FocusTimer::load_at(&db, t0());
        assert!(event.is_none());
        assert_eq!(timer.state(), SessionState::Idle);
    }

    #[test]
    fn end_persists_the_idle_state() {
        let db = Database::open_memory().unwrap();
        let mut timer = FocusTimer::default();
        timer.start_at(&db, Some(2), 25, t0());
        timer.end_at(&db, t0() + Duration::seconds(10));

        let (timer, _) = FocusTimer::load_at(&db, t0() + Duration::seconds(20));
        assert_eq!(timer.state(), SessionState::Idle);
        assert_eq!(timer.active_task_id(), None);
    }

    #[test]
    fn reconcile_twice_observes_identical_state() {
        let db = Database::open_memory().unwrap();
        let mut timer = FocusTimer::default();
        timer.start_at(&db, None, 25, t0());

        let later = t0() + Duration::seconds(77);
        timer.reconcile_at(&db, later);
        let first = timer.time_left_secs();
        timer.reconcile_at(&db, later);
        assert_eq!(timer.time_left_secs(), first);
    }
}
