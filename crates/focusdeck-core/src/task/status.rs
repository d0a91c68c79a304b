//! Task status state machine.
//!
//! Statuses form a pipeline: to-do -> in-progress -> completed. Advancing a
//! completed task wraps back to to-do with a due date of tomorrow 09:00 local
//! time. That wrap is the recurring-task semantic, not an accident: a task
//! checked off today reappears on tomorrow's list.

use chrono::{DateTime, Days, Local, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline position of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "to-do")]
    Todo,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

/// Total order used for "advance" transitions.
pub const STATUS_ORDER: [TaskStatus; 3] = [
    TaskStatus::Todo,
    TaskStatus::InProgress,
    TaskStatus::Completed,
];

impl TaskStatus {
    /// The next status in the pipeline, saturating at `Completed`.
    /// Cycling past `Completed` is [`advance_from`]'s job, because it also
    /// reschedules the due date.
    pub fn next(self) -> TaskStatus {
        match self {
            TaskStatus::Todo => TaskStatus::InProgress,
            TaskStatus::InProgress | TaskStatus::Completed => TaskStatus::Completed,
        }
    }

    /// The immediately preceding status, or `None` at `Todo`.
    pub fn prev(self) -> Option<TaskStatus> {
        match self {
            TaskStatus::Todo => None,
            TaskStatus::InProgress => Some(TaskStatus::Todo),
            TaskStatus::Completed => Some(TaskStatus::InProgress),
        }
    }

    pub fn is_completed(self) -> bool {
        self == TaskStatus::Completed
    }

    /// Wire/display name, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "to-do",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an "advance" transition: the new status, and a new due date
/// when the transition reschedules the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
}

/// Compute the advance transition from `current`.
///
/// to-do -> in-progress and in-progress -> completed leave the due date
/// alone; completed wraps to to-do due tomorrow at 09:00 local. `now` is the
/// caller's local wall clock so the wrap can be tested at a fixed instant.
pub fn advance_from(current: TaskStatus, now: DateTime<Local>) -> StatusTransition {
    match current {
        TaskStatus::Completed => StatusTransition {
            status: TaskStatus::Todo,
            due_date: Some(tomorrow_at_nine(now)),
        },
        other => StatusTransition {
            status: other.next(),
            due_date: None,
        },
    }
}

/// 09:00 local time on the calendar day after `now`, as a UTC instant.
pub fn tomorrow_at_nine(now: DateTime<Local>) -> DateTime<Utc> {
    let tomorrow = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap_or_else(|| now.date_naive());
    let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN);
    let naive = tomorrow.and_time(nine);
    // A DST jump can make 09:00 invalid or ambiguous in the local zone.
    match Local.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    }
}
