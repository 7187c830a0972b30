use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{ColumnTrait, Condition};

use super::{Task, TaskStatus};
use crate::entities::task;

/// Character used to escape `LIKE` wildcards in substring queries.
const LIKE_ESCAPE: char = '\\';

/// A single predicate on a task's due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DueDateFilter {
    /// `due_date == date`
    On(NaiveDate),
    /// `due_date < date`
    Before(NaiveDate),
    /// `due_date > date`
    After(NaiveDate),
    /// `due_date IS NULL`
    Unset,
}

impl DueDateFilter {
    fn condition(self) -> Condition {
        let column = task::Column::DueDate;
        let condition = Condition::all();
        match self {
            DueDateFilter::On(date) => condition.add(column.eq(date)),
            DueDateFilter::Before(date) => condition.add(column.lt(date)),
            DueDateFilter::After(date) => condition.add(column.gt(date)),
            DueDateFilter::Unset => condition.add(column.is_null()),
        }
    }

    fn matches(self, due_date: Option<NaiveDate>) -> bool {
        match (self, due_date) {
            (DueDateFilter::On(date), Some(due)) => due == date,
            (DueDateFilter::Before(date), Some(due)) => due < date,
            (DueDateFilter::After(date), Some(due)) => due > date,
            (DueDateFilter::Unset, None) => true,
            _ => false,
        }
    }
}

/// Conjunction of task predicates.
///
/// A filter can either be turned into a database condition with [`TaskFilter::condition`]
/// or evaluated against an already loaded task with [`TaskFilter::matches`]. Name
/// matching compares [`search_key`]s on both sides, and the stored `name_key`
/// column holds the search key of the name, so the two agree on every backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    due_date: Vec<DueDateFilter>,
    status: Option<TaskStatus>,
    name_contains: Option<String>,
}

impl TaskFilter {
    /// Creates a filter that matches every task.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn due_on(mut self, date: NaiveDate) -> Self {
        self.due_date.push(DueDateFilter::On(date));
        self
    }

    pub fn due_before(mut self, date: NaiveDate) -> Self {
        self.due_date.push(DueDateFilter::Before(date));
        self
    }

    pub fn due_after(mut self, date: NaiveDate) -> Self {
        self.due_date.push(DueDateFilter::After(date));
        self
    }

    pub fn without_due_date(mut self) -> Self {
        self.due_date.push(DueDateFilter::Unset);
        self
    }

    /// Restricts the filter to tasks with exactly this status.
    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts the filter to tasks whose name contains `query`, ignoring case.
    pub fn name_contains(mut self, query: impl Into<String>) -> Self {
        self.name_contains = Some(query.into());
        self
    }

    /// Builds the `WHERE` condition for this filter.
    pub fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        for due_date in &self.due_date {
            condition = condition.add(due_date.condition());
        }
        if let Some(status) = self.status {
            condition = condition.add(task::Column::Status.eq(status));
        }
        if let Some(query) = &self.name_contains {
            condition = condition.add(
                Expr::col(task::Column::NameKey)
                    .like(LikeExpr::new(like_pattern(query)).escape(LIKE_ESCAPE)),
            );
        }
        condition
    }

    /// Evaluates the filter against a task already in memory.
    pub fn matches(&self, task: &Task) -> bool {
        self.due_date
            .iter()
            .all(|due_date| due_date.matches(task.due_date()))
            && self.status.is_none_or(|status| task.status() == status)
            && self
                .name_contains
                .as_ref()
                .is_none_or(|query| search_key(task.name()).contains(&search_key(query)))
    }
}

/// Case-folded form of a name used for substring search.
///
/// Folding happens in Rust rather than with SQL `LOWER`, which SQLite applies to
/// ASCII letters only.
pub fn search_key(name: &str) -> String {
    name.to_lowercase()
}

/// Turns a literal substring into a `LIKE` pattern over search keys, escaping wildcards.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in search_key(query).chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
