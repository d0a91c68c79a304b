use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::status::TaskStatus;
use crate::timer::SessionState;

/// Every state change in the core produces an Event.
/// The UI layer polls for events; it never inspects engine internals directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        task_id: Option<i64>,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// The countdown reached zero. Task auto-completion is the consumer's
    /// job (typically `TaskRepository::set_status` with `Completed`).
    TimerExpired {
        task_id: Option<i64>,
        at: DateTime<Utc>,
    },
    /// Session returned to paused-at-full-duration.
    TimerReset {
        at: DateTime<Utc>,
    },
    /// Session fully discarded.
    TimerEnded {
        at: DateTime<Utc>,
    },
    TaskStatusChanged {
        id: i64,
        from: TaskStatus,
        to: TaskStatus,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: SessionState,
        active_task_id: Option<i64>,
        duration_mins: u32,
        time_left_secs: u64,
        at: DateTime<Utc>,
    },
}
