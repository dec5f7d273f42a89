//! Test utilities for `delve_core` (compiled only during testing).

use std::collections::HashMap;
use std::sync::Mutex;

use crate::query::{LogQuery, SearchTarget};
use crate::search::{HistorySource, SourceError};

/// In-memory history keyed by pattern text.
#[derive(Debug, Default)]
pub struct FakeSource {
    pub message_logs: HashMap<String, String>,
    pub range_message_logs: HashMap<(String, String), String>,
    pub diff_logs: HashMap<String, String>,
    pub shows: HashMap<String, String>,
    pub staged: String,
    pub failing_ranges: Vec<String>,
    pub queries: Mutex<Vec<Vec<String>>>,
}

impl FakeSource {
    pub fn with_message(mut self, pattern: &str, raw: &str) -> Self {
        self.message_logs.insert(pattern.into(), raw.into());
        self
    }

    pub fn with_range_message(mut self, range: &str, pattern: &str, raw: &str) -> Self {
        self.range_message_logs.insert((range.into(), pattern.into()), raw.into());
        self
    }

    pub fn with_diff(mut self, pattern: &str, raw: &str) -> Self {
        self.diff_logs.insert(pattern.into(), raw.into());
        self
    }

    pub fn with_show(mut self, sha: &str, raw: &str) -> Self {
        self.shows.insert(sha.into(), raw.into());
        self
    }

    pub fn with_staged(mut self, raw: &str) -> Self {
        self.staged = raw.into();
        self
    }

    pub fn failing_on(mut self, range: &str) -> Self {
        self.failing_ranges.push(range.into());
        self
    }
}

impl HistorySource for FakeSource {
    fn log(&self, query: &LogQuery<'_>) -> Result<String, SourceError> {
        self.queries.lock().unwrap().push(query.args());

        if self.failing_ranges.iter().any(|r| r == query.range.as_arg()) {
            return Err(SourceError::Failed {
                command: query.args().join(" "),
                status: "exit status: 128".into(),
                stderr: "fatal: bad revision".into(),
            });
        }

        if query.target == SearchTarget::Message {
            let key = (query.range.as_arg().to_string(), query.pattern.to_string());
            if let Some(raw) = self.range_message_logs.get(&key) {
                return Ok(raw.clone());
            }
        }

        let logs = match query.target {
            SearchTarget::Message => &self.message_logs,
            SearchTarget::Diff => &self.diff_logs,
        };
        Ok(logs.get(query.pattern).cloned().unwrap_or_default())
    }

    fn show(&self, sha: &str) -> Result<String, SourceError> {
        self.shows.get(sha).cloned().ok_or_else(|| SourceError::Failed {
            command: format!("git show {sha}"),
            status: "exit status: 128".into(),
            stderr: "fatal: bad object".into(),
        })
    }

    fn staged_diff(&self) -> Result<String, SourceError> {
        Ok(self.staged.clone())
    }
}

pub fn log_line(sha: &str, email: &str, message: Option<&str>) -> String {
    let mut line = format!("COMMIT: {sha} AUTHORDATE: Mon, 2 Nov 2015 12:00:00 -0500 AUTHORNAME: Tester AUTHOREMAIL: {email}");
    if let Some(message) = message {
        line.push_str(" LOG: ");
        line.push_str(message);
    }
    line.push('\n');
    line
}
