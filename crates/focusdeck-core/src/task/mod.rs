//! Task records and the repository that owns them.
//!
//! A task is a plain data record; all lifecycle rules live in
//! [`status`] (the pure state machine) and [`repository`] (CRUD plus
//! persistence). Completion is not stored twice: `is_completed()` is derived
//! from the status, so the two can never disagree.

pub mod repository;
pub mod status;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use repository::TaskRepository;
pub use status::{TaskStatus, STATUS_ORDER};

/// Importance bucket used for list ordering and badge color in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// A single task record.
///
/// `id` is the creation instant in epoch milliseconds; the repository
/// guarantees uniqueness by bumping on same-millisecond collisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Whether the task is done. Derived from `status`, never stored.
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// The local calendar day the task is due; the day the streak log files
    /// it under.
    pub fn due_day_local(&self) -> NaiveDate {
        self.due_date.with_timezone(&Local).date_naive()
    }

    /// Append a tag unless an identical one is already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }
}

/// Input for [`TaskRepository::create`]. Status is not part of the input:
/// every task starts at to-do.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: DateTime<Utc>,
    pub tags: Vec<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, due_date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: Priority::default(),
            due_date,
            tags: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Drop duplicate tags, keeping first occurrences in order.
pub(crate) fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        if !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task(status: TaskStatus) -> Task {
        let now = Utc::now();
        Task {
            id: 1,
            title: "Write report".to_string(),
            description: String::new(),
            status,
            priority: Priority::High,
            due_date: now,
            tags: vec!["work".to_string()],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn completion_is_derived_from_status() {
        assert!(!sample_task(TaskStatus::Todo).is_completed());
        assert!(!sample_task(TaskStatus::InProgress).is_completed());
        assert!(sample_task(TaskStatus::Completed).is_completed());
    }

    #[test]
    fn add_tag_suppresses_duplicates() {
        let mut task = sample_task(TaskStatus::Todo);
        task.add_tag("work");
        task.add_tag("deep");
        task.add_tag("deep");
        assert_eq!(task.tags, vec!["work", "deep"]);
    }

    #[test]
    fn dedup_tags_keeps_first_occurrence_order() {
        let tags = vec!["a", "b", "a", "c", "b"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(dedup_tags(tags), vec!["a", "b", "c"]);
    }

    #[test]
    fn task_serialization_roundtrip() {
        let task = sample_task(TaskStatus::InProgress);
        let json = serde_json::to_string(&task).unwrap();
        let decoded: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.id, task.id);
        assert_eq!(decoded.status, TaskStatus::InProgress);
        assert_eq!(decoded.due_date, task.due_date);
        assert_eq!(decoded.created_at, task.created_at);
    }

    #[test]
    fn serialized_task_has_no_stored_completion_flag() {
        let json = serde_json::to_value(sample_task(TaskStatus::Completed)).unwrap();
        assert!(json.get("isCompleted").is_none());
        assert!(json.get("is_completed").is_none());
        assert_eq!(json["status"], "completed");
    }
}
