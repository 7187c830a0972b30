use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::task::categorize::TaskBuckets;
use crate::task::form::{DATE_FORMAT, FieldErrors, QuickAddInput, TaskFormInput};
use crate::task::notice::Notice;
use crate::task::{Task, TaskService, TaskServiceError, TaskStatus};
use crate::web::{ErrorPageTemplate, found};
use sea_orm::Iterable;

#[derive(Clone, Debug)]
pub struct TaskState {
    pub db: Arc<sea_orm::DatabaseConnection>,
    pub clock: Arc<dyn Clock>,
}

impl TaskState {
    pub fn new(db: Arc<sea_orm::DatabaseConnection>) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    pub fn with_clock(db: Arc<sea_orm::DatabaseConnection>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    fn service(&self) -> TaskService<'_> {
        TaskService::with_clock(&self.db, self.clock.clone())
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    notice: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: Option<String>,
}

/// Custom error type for task handler operations.
#[derive(Debug, thiserror::Error)]
enum TaskError {
    /// Represents an error during template rendering.
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
    /// Represents a task service error.
    #[error("Task service error: {0}")]
    Service(#[from] TaskServiceError),
}

impl IntoResponse for TaskError {
    fn into_response(self) -> Response {
        let (status_code, title, user_facing_error_message) = match &self {
            TaskError::Service(TaskServiceError::TaskNotFound(id)) => (
                StatusCode::NOT_FOUND,
                "Not Found",
                format!("Task {} does not exist.", id),
            ),
            TaskError::Service(TaskServiceError::Validation(errors)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid Task",
                errors.to_string(),
            ),
            _ => {
                tracing::error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "An unexpected error occurred while processing your request. Please try again later."
                        .to_string(),
                )
            }
        };

        let error_template = ErrorPageTemplate::new(title, user_facing_error_message);
        let Ok(rendered) = error_template.render() else {
            return status_code.into_response();
        };
        (status_code, Html(rendered)).into_response()
    }
}

/// A task as shown in lists.
struct TaskRow {
    id: u32,
    name: String,
    status: &'static str,
    status_label: &'static str,
    due_date: String,
    is_overdue: bool,
    is_pending: bool,
}

impl TaskRow {
    fn new(task: &Task, today: NaiveDate) -> Self {
        Self {
            id: task.id(),
            name: task.name().to_string(),
            status: task.status().as_str(),
            status_label: task.status().label(),
            due_date: task
                .due_date()
                .map(|date| date.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            is_overdue: task.is_overdue(today),
            is_pending: task.status() == TaskStatus::Pending,
        }
    }

    fn from_tasks(tasks: &[Task], today: NaiveDate) -> Vec<Self> {
        tasks.iter().map(|task| Self::new(task, today)).collect()
    }
}

struct BucketSection {
    key: &'static str,
    title: &'static str,
    rows: Vec<TaskRow>,
}

/// Per-field error messages for the templates.
#[derive(Default)]
struct FormErrors {
    name: Vec<String>,
    due_date: Vec<String>,
    status: Vec<String>,
}

impl From<&FieldErrors> for FormErrors {
    fn from(errors: &FieldErrors) -> Self {
        Self {
            name: errors.messages("name").to_vec(),
            due_date: errors.messages("due_date").to_vec(),
            status: errors.messages("status").to_vec(),
        }
    }
}

struct StatusOption {
    value: &'static str,
    label: &'static str,
    selected: bool,
}

/// Status choices with `selected` marked; pending when nothing is selected.
fn status_options(selected: Option<&str>) -> Vec<StatusOption> {
    let selected = selected.unwrap_or(TaskStatus::Pending.as_str());
    TaskStatus::iter()
        .map(|status| StatusOption {
            value: status.as_str(),
            label: status.label(),
            selected: status.as_str() == selected,
        })
        .collect()
}

#[derive(Template)]
#[template(path = "tasks/list.html")]
struct TaskListTemplate {
    today: String,
    notice: Option<&'static str>,
    sections: Vec<BucketSection>,
    total: usize,
    form: QuickAddInput,
    errors: FormErrors,
}

impl TaskListTemplate {
    pub fn new(
        today: NaiveDate,
        buckets: TaskBuckets,
        notice: Option<Notice>,
        form: QuickAddInput,
        errors: FormErrors,
    ) -> Self {
        let total = buckets.len();
        let sections = buckets
            .into_parts()
            .into_iter()
            .map(|(bucket, tasks)| BucketSection {
                key: bucket.key(),
                title: bucket.title(),
                rows: TaskRow::from_tasks(&tasks, today),
            })
            .collect();
        Self {
            today: today.format(DATE_FORMAT).to_string(),
            notice: notice.map(Notice::message),
            sections,
            total,
            form,
            errors,
        }
    }
}

#[derive(Template)]
#[template(path = "tasks/form.html")]
struct TaskFormTemplate {
    heading: &'static str,
    action: String,
    submit_label: &'static str,
    form: TaskFormInput,
    errors: FormErrors,
    status_options: Vec<StatusOption>,
}

impl TaskFormTemplate {
    pub fn for_create(form: TaskFormInput, errors: FormErrors) -> Self {
        Self::new("New task", "/create".to_string(), "Create", form, errors)
    }

    pub fn for_edit(id: u32, form: TaskFormInput, errors: FormErrors) -> Self {
        Self::new("Edit task", format!("/edit/{}", id), "Save", form, errors)
    }

    fn new(
        heading: &'static str,
        action: String,
        submit_label: &'static str,
        form: TaskFormInput,
        errors: FormErrors,
    ) -> Self {
        let status_options = status_options(form.status.as_deref());
        Self {
            heading,
            action,
            submit_label,
            form,
            errors,
            status_options,
        }
    }
}

#[derive(Template)]
#[template(path = "tasks/confirm_delete.html")]
struct ConfirmDeleteTemplate {
    task: TaskRow,
}

#[derive(Template)]
#[template(path = "tasks/search.html")]
struct SearchTemplate {
    query: String,
    count: usize,
    rows: Vec<TaskRow>,
}

/// Renders the bucketed task list with the quick-add form.
#[tracing::instrument(skip(service, errors))]
async fn render_task_list(
    service: &TaskService<'_>,
    notice: Option<Notice>,
    form: QuickAddInput,
    errors: &FieldErrors,
) -> Result<Html<String>, TaskError> {
    let today = service.today();
    let buckets = service.categorized_tasks(today).await?;
    let template = TaskListTemplate::new(today, buckets, notice, form, FormErrors::from(errors));
    template.render().map(Html).map_err(TaskError::from)
}

fn redirect_with_notice(notice: Notice) -> Response {
    found(&format!("/?notice={}", notice.code()))
}

/// Handler for GET / that displays the tasks grouped by due date.
#[tracing::instrument(skip(state))]
async fn list_handler(
    State(state): State<Arc<TaskState>>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, TaskError> {
    let notice = query.notice.as_deref().and_then(Notice::parse);
    render_task_list(
        &state.service(),
        notice,
        QuickAddInput::default(),
        &FieldErrors::new(),
    )
    .await
}

/// Handler for POST / that adds a task from the quick-add form.
#[tracing::instrument(skip(state))]
async fn quick_add_handler(
    State(state): State<Arc<TaskState>>,
    Form(form): Form<QuickAddInput>,
) -> Result<Response, TaskError> {
    let service = state.service();
    let errors = match form.validate() {
        Ok(fields) => match service.create_task(fields).await {
            Ok(outcome) => return Ok(redirect_with_notice(outcome.notice)),
            Err(TaskServiceError::Validation(errors)) => errors,
            Err(err) => return Err(TaskError::Service(err)),
        },
        Err(errors) => errors,
    };
    let page = render_task_list(&service, None, form, &errors).await?;
    Ok(page.into_response())
}

/// Handler for GET /create that serves an empty task form.
#[tracing::instrument]
async fn create_form_handler() -> Result<Html<String>, TaskError> {
    let template = TaskFormTemplate::for_create(TaskFormInput::default(), FormErrors::default());
    template.render().map(Html).map_err(TaskError::from)
}

/// Handler for POST /create that creates a task from the full form.
#[tracing::instrument(skip(state))]
async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    Form(form): Form<TaskFormInput>,
) -> Result<Response, TaskError> {
    let errors = match form.validate() {
        Ok(fields) => match state.service().create_task(fields).await {
            Ok(outcome) => return Ok(redirect_with_notice(outcome.notice)),
            Err(TaskServiceError::Validation(errors)) => errors,
            Err(err) => return Err(TaskError::Service(err)),
        },
        Err(errors) => errors,
    };
    let template = TaskFormTemplate::for_create(form, FormErrors::from(&errors));
    let html = template.render()?;
    Ok(Html(html).into_response())
}

/// Handler for GET /edit/{id} that serves the task form pre-filled.
#[tracing::instrument(skip(state))]
async fn edit_form_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<u32>,
) -> Result<Html<String>, TaskError> {
    let task = state.service().get_task_by_id(id).await?;
    let template =
        TaskFormTemplate::for_edit(id, TaskFormInput::from_task(&task), FormErrors::default());
    template.render().map(Html).map_err(TaskError::from)
}

/// Handler for POST /edit/{id} that saves the full form.
#[tracing::instrument(skip(state))]
async fn edit_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<u32>,
    Form(form): Form<TaskFormInput>,
) -> Result<Response, TaskError> {
    let service = state.service();
    // Unknown ids are a 404 even when the submission is invalid.
    service.get_task_by_id(id).await?;

    let errors = match form.validate() {
        Ok(fields) => match service.edit_task_by_id(id, fields).await {
            Ok(outcome) => return Ok(redirect_with_notice(outcome.notice)),
            Err(TaskServiceError::Validation(errors)) => errors,
            Err(err) => return Err(TaskError::Service(err)),
        },
        Err(errors) => errors,
    };
    let template = TaskFormTemplate::for_edit(id, form, FormErrors::from(&errors));
    let html = template.render()?;
    Ok(Html(html).into_response())
}

/// Handler for GET /delete/{id} that asks for confirmation.
#[tracing::instrument(skip(state))]
async fn delete_confirm_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<u32>,
) -> Result<Html<String>, TaskError> {
    let service = state.service();
    let task = service.get_task_by_id(id).await?;
    let template = ConfirmDeleteTemplate {
        task: TaskRow::new(&task, service.today()),
    };
    template.render().map(Html).map_err(TaskError::from)
}

/// Handler for POST /delete/{id} that deletes the task.
#[tracing::instrument(skip(state))]
async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<u32>,
) -> Result<Response, TaskError> {
    let outcome = state.service().delete_task_by_id(id).await?;
    Ok(redirect_with_notice(outcome.notice))
}

/// Handler for GET /done/{id}.
#[tracing::instrument(skip(state))]
async fn mark_done_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<u32>,
) -> Result<Response, TaskError> {
    let outcome = state.service().mark_done(id).await?;
    Ok(redirect_with_notice(outcome.notice))
}

/// Handler for GET /skip/{id}.
#[tracing::instrument(skip(state))]
async fn mark_skipped_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<u32>,
) -> Result<Response, TaskError> {
    let outcome = state.service().mark_skipped(id).await?;
    Ok(redirect_with_notice(outcome.notice))
}

/// Handler for GET /undo/{id}.
#[tracing::instrument(skip(state))]
async fn mark_pending_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<u32>,
) -> Result<Response, TaskError> {
    let outcome = state.service().mark_pending(id).await?;
    Ok(redirect_with_notice(outcome.notice))
}

/// Handler for GET /search?q= that lists tasks whose name contains the query.
#[tracing::instrument(skip(state))]
async fn search_handler(
    State(state): State<Arc<TaskState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Html<String>, TaskError> {
    let service = state.service();
    let results = service.search_tasks(query.q.as_deref()).await?;
    let template = SearchTemplate {
        rows: TaskRow::from_tasks(&results.tasks, service.today()),
        query: results.query,
        count: results.count,
    };
    template.render().map(Html).map_err(TaskError::from)
}

/// Creates and returns the task router with all task-related routes.
pub fn create_task_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/", get(list_handler).post(quick_add_handler))
        .route("/create", get(create_form_handler).post(create_task_handler))
        .route("/edit/{id}", get(edit_form_handler).post(edit_task_handler))
        .route(
            "/delete/{id}",
            get(delete_confirm_handler).post(delete_task_handler),
        )
        .route("/done/{id}", get(mark_done_handler))
        .route("/skip/{id}", get(mark_skipped_handler))
        .route("/undo/{id}", get(mark_pending_handler))
        .route("/search", get(search_handler))
        .with_state(state)
}
