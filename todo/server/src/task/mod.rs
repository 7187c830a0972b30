use crate::clock::{Clock, SystemClock};
use crate::entities::*;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use sea_orm::sea_query::{NullOrdering, Order};
use sea_orm::*;
use std::sync::Arc;

pub mod categorize;
pub mod filter;
pub mod form;
pub mod notice;
pub mod transition;
pub mod web;

pub use crate::entities::sea_orm_active_enums::{TaskPriority, TaskStatus};
use categorize::TaskBuckets;
use filter::TaskFilter;
use form::FieldErrors;
use notice::Notice;

/// Upper bound on the length of a task name, in characters.
pub const NAME_MAX_LENGTH: usize = 255;

#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub struct Task {
    id: u32,
    name: String,
    status: TaskStatus,
    priority: TaskPriority,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        id: u32,
        name: String,
        status: TaskStatus,
        priority: TaskPriority,
        due_date: Option<NaiveDate>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            status,
            priority,
            due_date,
            created_at,
            updated_at,
        }
    }

    /// Returns the ID of the task.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the name of the task.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the due date, or `None` for an undated task.
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether the task is pending and past its due date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        categorize::is_overdue(self, today)
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Task::new(
            model.id as u32,
            model.name,
            model.status,
            model.priority,
            model.due_date,
            model.created_at,
            model.updated_at,
        )
    }
}

/// Writable task fields.
///
/// On create, a missing `status` or `priority` falls back to the default. On update,
/// `name` and `due_date` are always replaced while `status` and `priority` are only
/// changed when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFields {
    pub name: String,
    pub due_date: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl TaskFields {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn due_on(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Checks the field values the store accepts.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Err(message) = form::check_name(&self.name) {
            errors.add("name", message);
        }
        errors.into_result(())
    }
}

/// Result of a successful write: the affected task and the notice to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub task: Task,
    pub notice: Notice,
}

impl Outcome {
    fn new(task: Task, notice: Notice) -> Self {
        Self { task, notice }
    }
}

/// Tasks matching a search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub query: String,
    pub tasks: Vec<Task>,
    pub count: usize,
}

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// Represents invalid field values; nothing was written.
    #[error("Invalid task fields: {0}")]
    Validation(FieldErrors),
    /// Represents a task not found error.
    #[error("Task with ID {0} not found")]
    TaskNotFound(u32),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

pub struct TaskService<'a> {
    db: &'a sea_orm::DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl<'a> TaskService<'a> {
    pub fn new(db: &'a sea_orm::DatabaseConnection) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    pub fn with_clock(db: &'a sea_orm::DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Current calendar date according to the service clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Creates a new task.
    ///
    /// # Arguments
    ///
    /// * `fields` - The values of the new task. Status defaults to pending and priority to medium.
    ///
    /// # Returns
    ///
    /// The created task with its assigned ID, or a validation or database error.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, fields: TaskFields) -> Result<Outcome, TaskServiceError> {
        fields.validate().map_err(TaskServiceError::Validation)?;

        let now = self.clock.now();
        let active_model = task::ActiveModel {
            name_key: ActiveValue::Set(filter::search_key(&fields.name)),
            name: ActiveValue::Set(fields.name),
            status: ActiveValue::Set(fields.status.unwrap_or_default()),
            priority: ActiveValue::Set(fields.priority.unwrap_or_default()),
            due_date: ActiveValue::Set(fields.due_date),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        let created_model = active_model.insert(self.db).await?;
        tracing::info!("Created task {}", created_model.id);
        Ok(Outcome::new(Task::from(created_model), Notice::Created))
    }

    /// Retrieves a task by its ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_task_by_id(&self, id: u32) -> Result<Task, TaskServiceError> {
        self.find_model(id).await.map(Task::from)
    }

    /// Edits a task by its ID and refreshes its `updated_at` timestamp.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the task to edit.
    /// * `fields` - The new values; see [`TaskFields`] for which ones are optional.
    ///
    /// # Returns
    ///
    /// The updated task, or an error if the ID is unknown or a value is invalid.
    #[tracing::instrument(skip(self))]
    pub async fn edit_task_by_id(
        &self,
        id: u32,
        fields: TaskFields,
    ) -> Result<Outcome, TaskServiceError> {
        let task_to_update = self.find_model(id).await?;
        fields.validate().map_err(TaskServiceError::Validation)?;

        let updated_at = self.next_updated_at(&task_to_update);
        let mut active_model: task::ActiveModel = task_to_update.into();
        active_model.name_key = ActiveValue::Set(filter::search_key(&fields.name));
        active_model.name = ActiveValue::Set(fields.name);
        active_model.due_date = ActiveValue::Set(fields.due_date);
        if let Some(status) = fields.status {
            active_model.status = ActiveValue::Set(status);
        }
        if let Some(priority) = fields.priority {
            active_model.priority = ActiveValue::Set(priority);
        }
        active_model.updated_at = ActiveValue::Set(updated_at);
        let updated_model = active_model.update(self.db).await?;

        Ok(Outcome::new(Task::from(updated_model), Notice::Updated))
    }

    /// Deletes a task by its ID. Deleting the same ID twice fails the second time.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task_by_id(&self, id: u32) -> Result<Outcome, TaskServiceError> {
        let task_to_delete = self.find_model(id).await?;

        let task_copy = Task::from(task_to_delete.clone());
        let result = task::Entity::delete_by_id(task_to_delete.id)
            .exec(self.db)
            .await?;
        if result.rows_affected == 0 {
            tracing::warn!("Task {} vanished before it could be deleted", id);
            return Err(TaskServiceError::TaskNotFound(id));
        }
        tracing::info!("Deleted task {}", id);
        Ok(Outcome::new(task_copy, Notice::Deleted))
    }

    /// Retrieves all tasks in display order: by due date with undated tasks last,
    /// newest first among equal dates.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_tasks(&self) -> Result<Vec<Task>, TaskServiceError> {
        self.filter_tasks(&TaskFilter::new()).await
    }

    /// Retrieves the tasks matching `filter`, in display order.
    #[tracing::instrument(skip(self))]
    pub async fn filter_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, TaskServiceError> {
        let tasks = in_display_order(task::Entity::find().filter(filter.condition()))
            .all(self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    /// Searches task names for a case-insensitive substring.
    ///
    /// An empty or missing query returns every task.
    #[tracing::instrument(skip(self))]
    pub async fn search_tasks(&self, query: Option<&str>) -> Result<SearchResults, TaskServiceError> {
        let query = query.unwrap_or_default();
        let tasks = if query.is_empty() {
            self.get_all_tasks().await?
        } else {
            self.filter_tasks(&TaskFilter::new().name_contains(query))
                .await?
        };
        Ok(SearchResults {
            query: query.to_string(),
            count: tasks.len(),
            tasks,
        })
    }

    /// Loads every task and sorts it into the date buckets relative to `today`.
    #[tracing::instrument(skip(self))]
    pub async fn categorized_tasks(&self, today: NaiveDate) -> Result<TaskBuckets, TaskServiceError> {
        let tasks = self.get_all_tasks().await?;
        Ok(TaskBuckets::categorize(tasks, today))
    }

    async fn find_model(&self, id: u32) -> Result<task::Model, TaskServiceError> {
        let Ok(key) = i32::try_from(id) else {
            return Err(TaskServiceError::TaskNotFound(id));
        };
        task::Entity::find_by_id(key)
            .one(self.db)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Task {} not found", id);
                TaskServiceError::TaskNotFound(id)
            })
    }

    /// Timestamp for a mutation of `model`: strictly after its current `updated_at`,
    /// even when the clock reads an earlier time or the same microsecond.
    fn next_updated_at(&self, model: &task::Model) -> DateTime<Utc> {
        let earliest = model.created_at.max(model.updated_at) + TimeDelta::microseconds(1);
        self.clock.now().max(earliest)
    }
}

fn in_display_order(select: Select<task::Entity>) -> Select<task::Entity> {
    select
        .order_by_with_nulls(task::Column::DueDate, Order::Asc, NullOrdering::Last)
        .order_by_desc(task::Column::CreatedAt)
        .order_by_desc(task::Column::Id)
}
