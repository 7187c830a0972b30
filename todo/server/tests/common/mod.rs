#![allow(dead_code)]

use axum::body::Body;
use axum::http::{HeaderMap, Response};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use todo_server::clock::Clock;
use todo_server::task::TaskService;

/// Test context shared by service and endpoint tests.
pub struct TestContext {
    pub db: DatabaseConnection,
    pub clock: Arc<SteppingClock>,
}

impl TestContext {
    pub fn service(&self) -> TaskService<'_> {
        TaskService::with_clock(&self.db, self.clock.clone())
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}

/// Connects to a fresh in-memory SQLite database and applies all migrations.
pub async fn setup_db() -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // Every pooled connection would get its own in-memory database.
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Sets up a database and a clock that starts on 2025-06-15.
pub async fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let db = setup_db().await?;
    Ok(TestContext {
        db,
        clock: Arc::new(SteppingClock::on(reference_day())),
    })
}

pub fn reference_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

/// Clock that moves one second forward every time it is read.
#[derive(Debug)]
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
}

impl SteppingClock {
    /// Starts at 09:00 UTC on `date`.
    pub fn on(date: NaiveDate) -> Self {
        let start = date.and_hms_opt(9, 0, 0).unwrap().and_utc();
        Self {
            next: Mutex::new(start),
        }
    }
}

impl SteppingClock {
    /// Moves the clock back, as a corrected system clock would.
    pub fn rewind(&self, by: Duration) {
        let mut next = self.next.lock().unwrap();
        *next -= by;
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().unwrap();
        let now = *next;
        *next = now + Duration::seconds(1);
        now
    }
}

/// HTTP response snapshot for testing endpoints.
#[derive(Debug, Serialize)]
pub struct HttpResponseSnapshot {
    test_context: String,
    status: u16,
    headers: BTreeMap<String, String>,
    html_body: Vec<String>,
}

impl HttpResponseSnapshot {
    /// Reads the whole response into a snapshot.
    pub async fn capture(response: Response<Body>, test_context: &str) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body_text = std::str::from_utf8(&body).unwrap();
        Self {
            test_context: test_context.to_string(),
            status: status.as_u16(),
            headers: filter_variable_headers(&headers),
            html_body: normalize_html_for_snapshot(body_text),
        }
    }
}

/// One entry per non-blank line, with template indentation stripped.
fn normalize_html_for_snapshot(html: &str) -> Vec<String> {
    html.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Filter out variable headers from response headers for snapshot testing.
fn filter_variable_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let variable_headers = ["date", "server", "content-length"];

    headers
        .iter()
        .filter_map(|(name, value)| {
            let name_str = name.as_str().to_lowercase();
            if variable_headers.contains(&name_str.as_str()) {
                None
            } else {
                value.to_str().ok().map(|v| (name_str, v.to_string()))
            }
        })
        .collect()
}
