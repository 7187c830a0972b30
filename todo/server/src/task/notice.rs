use super::TaskStatus;

/// Confirmation produced by a successful write, displayed on the next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    Created,
    Updated,
    Deleted,
    MarkedDone,
    MarkedSkipped,
    MarkedPending,
}

impl Notice {
    const ALL: [Notice; 6] = [
        Notice::Created,
        Notice::Updated,
        Notice::Deleted,
        Notice::MarkedDone,
        Notice::MarkedSkipped,
        Notice::MarkedPending,
    ];

    /// Notice for a status change to `status`.
    pub fn for_status(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Pending => Notice::MarkedPending,
            TaskStatus::Done => Notice::MarkedDone,
            TaskStatus::Skipped => Notice::MarkedSkipped,
        }
    }

    /// Short code carried in the redirect URL.
    pub fn code(self) -> &'static str {
        match self {
            Notice::Created => "created",
            Notice::Updated => "updated",
            Notice::Deleted => "deleted",
            Notice::MarkedDone => "marked_done",
            Notice::MarkedSkipped => "marked_skipped",
            Notice::MarkedPending => "marked_pending",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|notice| notice.code() == code)
    }

    pub fn message(self) -> &'static str {
        match self {
            Notice::Created => "Task created.",
            Notice::Updated => "Task updated.",
            Notice::Deleted => "Task deleted.",
            Notice::MarkedDone => "Task marked as done.",
            Notice::MarkedSkipped => "Task skipped.",
            Notice::MarkedPending => "Task moved back to pending.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_parse_codes_back() {
        for notice in Notice::ALL {
            assert_eq!(Notice::parse(notice.code()), Some(notice));
        }
        assert_eq!(Notice::parse("launched"), None);
    }
}
