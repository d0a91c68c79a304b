//! Task collection with fail-soft persistence.
//!
//! The in-memory list is the source of truth for the process lifetime.
//! Every mutation updates the list first, then writes the whole serialized
//! list back to the store best-effort; a failed write is swallowed and the
//! caller keeps seeing the updated list. A failed or malformed read at load
//! time degrades to an empty list, never an error.

use chrono::{DateTime, Local, Utc};

use crate::events::Event;
use crate::storage::database::TASKS_KEY;
use crate::storage::Database;

use super::status::{self, TaskStatus};
use super::{dedup_tags, NewTask, Task};

/// Ordered collection of tasks, newest first.
#[derive(Debug, Default)]
pub struct TaskRepository {
    tasks: Vec<Task>,
}

impl TaskRepository {
    /// An empty repository, not yet backed by stored data.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load all tasks from the store, sorted by creation time descending.
    ///
    /// Missing or malformed data yields an empty repository.
    pub fn load(db: &Database) -> Self {
        let mut tasks: Vec<Task> = match db.kv_get(TASKS_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_default(),
            _ => Vec::new(),
        };
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Create a task from `input` and persist the list.
    ///
    /// The id is the creation instant in epoch milliseconds; tasks created
    /// within the same millisecond get consecutive ids. New tasks start at
    /// to-do and are prepended, preserving newest-first order.
    pub fn create(&mut self, db: &Database, input: NewTask) -> &Task {
        let now = Utc::now();
        let task = Task {
            id: self.allocate_id(now.timestamp_millis()),
            title: input.title,
            description: input.description,
            status: TaskStatus::Todo,
            priority: input.priority,
            due_date: input.due_date,
            tags: dedup_tags(input.tags),
            created_at: now,
            updated_at: now,
        };
        self.tasks.insert(0, task);
        self.persist(db);
        &self.tasks[0]
    }

    /// Remove the task with `id` and persist. Silently does nothing when the
    /// id is absent.
    pub fn delete(&mut self, db: &Database, id: i64) {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() != before {
            self.persist(db);
        }
    }

    /// Set the status of the task with `id`, optionally overwriting its due
    /// date, and persist. Silently does nothing when the id is absent.
    pub fn set_status(
        &mut self,
        db: &Database,
        id: i64,
        new_status: TaskStatus,
        new_due_date: Option<DateTime<Utc>>,
    ) -> Option<Event> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        let from = task.status;
        let now = Utc::now();
        task.status = new_status;
        if let Some(due) = new_due_date {
            task.due_date = due;
        }
        task.updated_at = now;
        self.persist(db);
        Some(Event::TaskStatusChanged {
            id,
            from,
            to: new_status,
            at: now,
        })
    }

    /// Advance the task one step along the pipeline (wrapping a completed
    /// task back to to-do, due tomorrow 09:00 local).
    pub fn advance_status(&mut self, db: &Database, id: i64) -> Option<Event> {
        let current = self.get(id)?.status;
        let transition = status::advance_from(current, Local::now());
        self.set_status(db, id, transition.status, transition.due_date)
    }

    /// Move the task back one step. No-op when already at to-do.
    pub fn revert_status(&mut self, db: &Database, id: i64) -> Option<Event> {
        let current = self.get(id)?.status;
        let prev = current.prev()?;
        self.set_status(db, id, prev, None)
    }

    pub fn todo_count(&self) -> usize {
        self.count_with(TaskStatus::Todo)
    }

    pub fn in_progress_count(&self) -> usize {
        self.count_with(TaskStatus::InProgress)
    }

    pub fn completed_count(&self) -> usize {
        self.count_with(TaskStatus::Completed)
    }

    fn count_with(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    fn allocate_id(&self, candidate: i64) -> i64 {
        let mut id = candidate;
        while self.tasks.iter().any(|t| t.id == id) {
            id += 1;
        }
        id
    }

    fn persist(&self, db: &Database) {
        // Best-effort: the in-memory list stays authoritative if this fails.
        if let Ok(json) = serde_json::to_string(&self.tasks) {
            let _ = db.kv_set(TASKS_KEY, &json);
        }
    }
}
