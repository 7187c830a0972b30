//! Input contracts for the full task form and the quick-add form.
//!
//! Both validators only shape raw form strings; the rules on field values live
//! with [`TaskFields::validate`] so the store enforces the same rules on every write.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Deserialize;

use super::{NAME_MAX_LENGTH, Task, TaskFields, TaskStatus};

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_DATE_MESSAGE: &str = "Enter a valid date.";

/// Date format used by `<input type="date">`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Error messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages for one field, empty when the field is valid.
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    /// Returns `value` when no errors were recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Checks a task name against the length bounds.
pub(crate) fn check_name(name: &str) -> Result<(), String> {
    let length = name.chars().count();
    if name.trim().is_empty() {
        Err(REQUIRED_MESSAGE.to_string())
    } else if length > NAME_MAX_LENGTH {
        Err(format!(
            "Ensure this value has at most {NAME_MAX_LENGTH} characters (it has {length})."
        ))
    } else {
        Ok(())
    }
}

fn parse_due_date(raw: &str) -> Result<Option<NaiveDate>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(Some)
        .map_err(|_| INVALID_DATE_MESSAGE.to_string())
}

fn parse_status(raw: &str) -> Result<TaskStatus, String> {
    if raw.is_empty() {
        return Err(REQUIRED_MESSAGE.to_string());
    }
    TaskStatus::parse(raw).ok_or_else(|| {
        format!("Select a valid choice. {raw} is not one of the available choices.")
    })
}

/// Collects name and due date errors shared by both forms.
fn shape_common(name: &str, due_date: &str, errors: &mut FieldErrors) -> TaskFields {
    let name = name.trim().to_string();
    if let Err(message) = check_name(&name) {
        errors.add("name", message);
    }
    let due_date = match parse_due_date(due_date) {
        Ok(due_date) => due_date,
        Err(message) => {
            errors.add("due_date", message);
            None
        }
    };
    TaskFields {
        name,
        due_date,
        ..TaskFields::default()
    }
}

/// Raw submission of the full create/edit form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFormInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl TaskFormInput {
    /// Form values pre-filled from an existing task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            name: task.name().to_string(),
            due_date: task
                .due_date()
                .map(|date| date.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            status: Some(task.status().as_str().to_string()),
        }
    }

    pub fn validate(&self) -> Result<TaskFields, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut fields = shape_common(&self.name, &self.due_date, &mut errors);
        if let Some(raw) = &self.status {
            match parse_status(raw) {
                Ok(status) => fields.status = Some(status),
                Err(message) => errors.add("status", message),
            }
        }
        errors.into_result(fields)
    }
}

/// Raw submission of the quick-add form. Any submitted status is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuickAddInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub due_date: String,
}

impl QuickAddInput {
    pub fn validate(&self) -> Result<TaskFields, FieldErrors> {
        let mut errors = FieldErrors::new();
        let fields = shape_common(&self.name, &self.due_date, &mut errors);
        errors.into_result(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(name: &str, due_date: &str, status: Option<&str>) -> TaskFormInput {
        TaskFormInput {
            name: name.to_string(),
            due_date: due_date.to_string(),
            status: status.map(str::to_string),
        }
    }

    #[test]
    fn can_accept_valid_full_form() {
        let fields = full("Test Task", "2025-05-01", Some("pending"))
            .validate()
            .expect("form should be valid");
        assert_eq!(fields.name, "Test Task");
        assert_eq!(fields.due_date, NaiveDate::from_ymd_opt(2025, 5, 1));
        assert_eq!(fields.status, Some(TaskStatus::Pending));
    }

    #[test]
    fn can_reject_full_form_without_name() {
        let errors = full("", "2025-05-01", Some("pending"))
            .validate()
            .unwrap_err();
        assert!(errors.contains("name"));
        assert_eq!(errors.messages("name"), [REQUIRED_MESSAGE.to_string()]);
    }

    #[test]
    fn can_reject_blank_name() {
        let errors = full("   ", "", None).validate().unwrap_err();
        assert!(errors.contains("name"));
    }

    #[test]
    fn can_accept_full_form_without_due_date() {
        let fields = full("Test Task", "", Some("pending")).validate().unwrap();
        assert_eq!(fields.due_date, None);
    }

    #[test]
    fn can_accept_full_form_without_status() {
        let fields = full("Test Task", "", None).validate().unwrap();
        assert_eq!(fields.status, None);
    }

    #[test]
    fn can_reject_invalid_status() {
        let errors = full("Test Task", "", Some("invalid_status"))
            .validate()
            .unwrap_err();
        assert_eq!(
            errors.messages("status"),
            ["Select a valid choice. invalid_status is not one of the available choices."
                .to_string()]
        );
        assert!(!errors.contains("name"));
    }

    #[test]
    fn can_reject_invalid_date() {
        let errors = full("Test Task", "31/12/2025", None).validate().unwrap_err();
        assert_eq!(errors.messages("due_date"), [INVALID_DATE_MESSAGE.to_string()]);
    }

    #[test]
    fn can_reject_overlong_name() {
        let name = "x".repeat(NAME_MAX_LENGTH + 1);
        let errors = full(&name, "", None).validate().unwrap_err();
        assert_eq!(
            errors.messages("name"),
            ["Ensure this value has at most 255 characters (it has 256).".to_string()]
        );

        let name = "é".repeat(NAME_MAX_LENGTH);
        assert!(full(&name, "", None).validate().is_ok());
    }

    #[test]
    fn can_trim_name() {
        let fields = full("  Buy milk  ", "", None).validate().unwrap();
        assert_eq!(fields.name, "Buy milk");
    }

    #[test]
    fn can_collect_errors_for_several_fields() {
        let errors = full("", "not-a-date", Some("nope")).validate().unwrap_err();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["due_date", "name", "status"]);
    }

    #[test]
    fn can_accept_quick_add_with_and_without_date() {
        let with_date = QuickAddInput {
            name: "Quick Task".to_string(),
            due_date: "2025-05-01".to_string(),
        };
        let fields = with_date.validate().unwrap();
        assert_eq!(fields.due_date, NaiveDate::from_ymd_opt(2025, 5, 1));
        assert_eq!(fields.status, None);

        let without_date = QuickAddInput {
            name: "Quick Task".to_string(),
            due_date: String::new(),
        };
        assert_eq!(without_date.validate().unwrap().due_date, None);
    }

    #[test]
    fn can_reject_quick_add_without_name() {
        let errors = QuickAddInput::default().validate().unwrap_err();
        assert!(errors.contains("name"));
    }

    #[test]
    fn can_format_errors_for_display() {
        let mut errors = FieldErrors::new();
        errors.add("name", REQUIRED_MESSAGE);
        errors.add("due_date", INVALID_DATE_MESSAGE);
        assert_eq!(
            errors.to_string(),
            "due_date: Enter a valid date.; name: This field is required."
        );
    }
}
