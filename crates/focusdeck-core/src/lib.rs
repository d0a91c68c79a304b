//! # Focusdeck Core Library
//!
//! This library provides the core business logic for Focusdeck: a task
//! pipeline with a persisted focus timer and a daily completion streak.
//! The mobile shell and widgets are thin layers over this crate: they
//! render state and forward user actions, plus two platform signals (the
//! 1-second tick and the app-foreground notification).
//!
//! ## Architecture
//!
//! - **Task pipeline**: tasks move to-do → in-progress → completed;
//!   advancing a completed task wraps it to tomorrow (recurring-task
//!   semantic). Completion is derived from status, never stored twice.
//! - **Focus timer**: a wall-clock-based state machine that persists an
//!   absolute end time. The caller ticks it while running and reconciles it
//!   on foreground, so a suspended countdown settles to true elapsed time.
//! - **Streak log**: a per-day completion tally derived from the task list,
//!   with a backward walk producing the consecutive-day streak.
//! - **Storage**: SQLite-backed key-value blobs plus a finished-session
//!   history, and TOML-based configuration. All reads fail soft and all
//!   writes are best-effort; in-memory state is authoritative per process.
//!
//! ## Key Components
//!
//! - [`TaskRepository`]: task CRUD and status transitions
//! - [`FocusTimer`]: the persisted countdown session
//! - [`StreakLog`]: daily completion records and the current streak
//! - [`Database`]: blob and session-history persistence
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod storage;
pub mod streak;
pub mod task;
pub mod timer;

pub use error::{ConfigError, CoreError, StorageError};
pub use events::Event;
pub use storage::{Config, Database, FinishedSession, Stats};
pub use streak::{DayRecord, StreakLog};
pub use task::{NewTask, Priority, Task, TaskRepository, TaskStatus, STATUS_ORDER};
pub use timer::{FocusSession, FocusTimer, SessionState};
