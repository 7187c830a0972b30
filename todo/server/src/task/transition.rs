//! Status changes on a single task.
//!
//! Every status can move to every other status; the three operations only differ
//! in their target. Each one is a read-modify-write of one row.

use sea_orm::{ActiveModelTrait, ActiveValue};

use super::notice::Notice;
use super::{Outcome, Task, TaskService, TaskServiceError, TaskStatus};
use crate::entities::task;

impl TaskService<'_> {
    /// Marks a task as done.
    #[tracing::instrument(skip(self))]
    pub async fn mark_done(&self, id: u32) -> Result<Outcome, TaskServiceError> {
        self.set_status(id, TaskStatus::Done).await
    }

    /// Marks a task as skipped.
    #[tracing::instrument(skip(self))]
    pub async fn mark_skipped(&self, id: u32) -> Result<Outcome, TaskServiceError> {
        self.set_status(id, TaskStatus::Skipped).await
    }

    /// Moves a task back to pending.
    #[tracing::instrument(skip(self))]
    pub async fn mark_pending(&self, id: u32) -> Result<Outcome, TaskServiceError> {
        self.set_status(id, TaskStatus::Pending).await
    }

    async fn set_status(&self, id: u32, status: TaskStatus) -> Result<Outcome, TaskServiceError> {
        let model = self.find_model(id).await?;
        let updated_at = self.next_updated_at(&model);

        let mut active_model: task::ActiveModel = model.into();
        active_model.status = ActiveValue::Set(status);
        active_model.updated_at = ActiveValue::Set(updated_at);
        let updated_model = active_model.update(self.db).await?;

        tracing::info!("Task {} is now {}", id, status.as_str());
        Ok(Outcome::new(Task::from(updated_model), Notice::for_status(status)))
    }
}
