//! Date buckets for the task list.
//!
//! Buckets are computed against a caller-supplied `today` so the result does not
//! depend on when it is evaluated. Only the overdue bucket looks at status: a
//! `done` or `skipped` task due before `today` lands in no bucket at all.

use chrono::NaiveDate;

use super::filter::TaskFilter;
use super::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Overdue,
    Today,
    Future,
    NoDate,
}

impl Bucket {
    /// All buckets in display order.
    pub const ALL: [Bucket; 4] = [
        Bucket::Overdue,
        Bucket::Today,
        Bucket::Future,
        Bucket::NoDate,
    ];

    /// Returns the bucket a task belongs to, if any.
    ///
    /// Uses the same predicates as [`Bucket::filter`], so a bucket loaded from the
    /// store and a bucket computed in memory hold the same tasks.
    pub fn for_task(task: &Task, today: NaiveDate) -> Option<Bucket> {
        Bucket::ALL
            .into_iter()
            .find(|bucket| bucket.filter(today).matches(task))
    }

    /// The store query selecting exactly the tasks of this bucket.
    pub fn filter(self, today: NaiveDate) -> TaskFilter {
        match self {
            Bucket::Overdue => TaskFilter::new()
                .due_before(today)
                .status(TaskStatus::Pending),
            Bucket::Today => TaskFilter::new().due_on(today),
            Bucket::Future => TaskFilter::new().due_after(today),
            Bucket::NoDate => TaskFilter::new().without_due_date(),
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Bucket::Overdue => "overdue",
            Bucket::Today => "today",
            Bucket::Future => "future",
            Bucket::NoDate => "no_date",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Bucket::Overdue => "Overdue",
            Bucket::Today => "Today",
            Bucket::Future => "Upcoming",
            Bucket::NoDate => "No date",
        }
    }
}

/// True iff the task is pending and its due date is strictly before `today`.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    task.status() == TaskStatus::Pending && task.due_date().is_some_and(|due| due < today)
}

/// Tasks partitioned into the four date buckets, each keeping the input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskBuckets {
    overdue: Vec<Task>,
    today: Vec<Task>,
    future: Vec<Task>,
    no_date: Vec<Task>,
}

impl TaskBuckets {
    pub fn categorize(tasks: impl IntoIterator<Item = Task>, today: NaiveDate) -> Self {
        let mut buckets = Self::default();
        for task in tasks {
            match Bucket::for_task(&task, today) {
                Some(Bucket::Overdue) => buckets.overdue.push(task),
                Some(Bucket::Today) => buckets.today.push(task),
                Some(Bucket::Future) => buckets.future.push(task),
                Some(Bucket::NoDate) => buckets.no_date.push(task),
                None => {}
            }
        }
        buckets
    }

    pub fn get(&self, bucket: Bucket) -> &[Task] {
        match bucket {
            Bucket::Overdue => &self.overdue,
            Bucket::Today => &self.today,
            Bucket::Future => &self.future,
            Bucket::NoDate => &self.no_date,
        }
    }

    pub fn overdue(&self) -> &[Task] {
        &self.overdue
    }

    pub fn today(&self) -> &[Task] {
        &self.today
    }

    pub fn future(&self) -> &[Task] {
        &self.future
    }

    pub fn no_date(&self) -> &[Task] {
        &self.no_date
    }

    /// Number of tasks across all buckets.
    pub fn len(&self) -> usize {
        Bucket::ALL.iter().map(|bucket| self.get(*bucket).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_parts(self) -> [(Bucket, Vec<Task>); 4] {
        [
            (Bucket::Overdue, self.overdue),
            (Bucket::Today, self.today),
            (Bucket::Future, self.future),
            (Bucket::NoDate, self.no_date),
        ]
    }
}
