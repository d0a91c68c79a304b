//! Daily completion log and streak computation.
//!
//! The log keeps one record per local calendar day: how many tasks were due
//! and how many of those got completed. Today's record is upserted whenever
//! the task list changes; past days are never rewritten. The streak is a
//! pure derivation over the log, recomputed on demand; the persisted map is
//! a cache of history, not independently mutable state.

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::storage::database::STREAK_LOG_KEY;
use crate::storage::Database;
use crate::task::Task;

/// Upper bound on the backward walk over sparse history.
pub const MAX_LOOKBACK_DAYS: u32 = 365;

/// Completion tally for one calendar day. `completed <= total` always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub total: u32,
    pub completed: u32,
}

impl DayRecord {
    /// A day counts toward the streak when it had tasks and all were done.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }
}

/// Per-day completion history, keyed by local calendar day.
///
/// Serializes to a JSON object whose keys are `YYYY-MM-DD` strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreakLog {
    days: BTreeMap<NaiveDate, DayRecord>,
}

impl StreakLog {
    /// Load the persisted log; missing or malformed data yields an empty one.
    pub fn load(db: &Database) -> Self {
        match db.kv_get(STREAK_LOG_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.days.get(&date)
    }

    /// All records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &DayRecord> {
        self.days.values()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Recompute today's record from the task list. Call whenever the task
    /// list changes.
    pub fn record_today(&mut self, db: &Database, tasks: &[Task]) -> bool {
        self.record_day(db, Local::now().date_naive(), tasks)
    }

    /// Recompute the record for `day` from the task list and upsert it,
    /// persisting only when the tally actually changed. Days with no due
    /// tasks are left unrecorded. Returns whether anything changed.
    pub fn record_day(&mut self, db: &Database, day: NaiveDate, tasks: &[Task]) -> bool {
        let due: Vec<&Task> = tasks.iter().filter(|t| t.due_day_local() == day).collect();
        if due.is_empty() {
            return false;
        }
        let record = DayRecord {
            date: day,
            total: due.len() as u32,
            completed: due.iter().filter(|t| t.is_completed()).count() as u32,
        };
        if self.days.get(&day) == Some(&record) {
            return false;
        }
        self.days.insert(day, record);
        self.persist(db);
        true
    }

    /// Consecutive fully-completed days ending yesterday, plus one when
    /// today is already fully complete.
    pub fn current_streak(&self) -> u32 {
        self.current_streak_on(Local::now().date_naive())
    }

    /// Streak as of `today`, with the default lookback bound.
    pub fn current_streak_on(&self, today: NaiveDate) -> u32 {
        self.streak_with_lookback(today, MAX_LOOKBACK_DAYS)
    }

    /// The backward walk starts at yesterday: today is not over, so an
    /// unfinished today never breaks an existing streak. A fully-completed
    /// day extends the streak; a day with due tasks left undone breaks it.
    /// A recorded day with zero due tasks is skipped. A day with no record
    /// at all is skipped only at the first step; any later gap ends the
    /// walk. Finally, a fully-completed today adds one on top.
    pub fn streak_with_lookback(&self, today: NaiveDate, lookback_days: u32) -> u32 {
        let mut streak = 0;
        let mut cursor = match today.checked_sub_days(Days::new(1)) {
            Some(d) => d,
            None => return 0,
        };

        for i in 0..lookback_days {
            match self.days.get(&cursor) {
                Some(record) if record.is_complete() => streak += 1,
                Some(record) if record.total > 0 => break,
                Some(_) => {}
                None if i == 0 => {}
                None => break,
            }
            cursor = match cursor.checked_sub_days(Days::new(1)) {
                Some(d) => d,
                None => break,
            };
        }

        if self.days.get(&today).is_some_and(|r| r.is_complete()) {
            streak += 1;
        }
        streak
    }

    fn persist(&self, db: &Database) {
        // Best-effort: the in-memory log stays authoritative if this fails.
        if let Ok(json) = serde_json::to_string(self) {
            let _ = db.kv_set(STREAK_LOG_KEY, &json);
        }
    }
}
