//! Parsing of the labelled one-line log records requested by
//! [`crate::query`].

use thiserror::Error;

use crate::finding::CommitMatch;
use crate::text::split_at_line_markers;

/// Marker that begins every record.
pub const COMMIT_LABEL: &str = "COMMIT: ";
const DATE_LABEL: &str = " AUTHORDATE: ";
const NAME_LABEL: &str = " AUTHORNAME: ";
const EMAIL_LABEL: &str = " AUTHOREMAIL: ";
const MESSAGE_LABEL: &str = " LOG: ";

/// A log record did not contain the labels its format string promises.
///
/// This indicates a mismatch between the query format and the parser, not
/// bad user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogParseError {
    /// A required label was not found.
    #[error("log record is missing the{label}label: {record:?}")]
    MissingField {
        /// The label that was expected.
        label: &'static str,
        /// The offending record, truncated for display.
        record: String,
    },
}

/// One parsed log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Abbreviated commit SHA.
    pub sha: String,
    /// Author and message fields.
    pub metadata: CommitMatch,
}

const RECORD_PREVIEW_CHARS: usize = 80;

/// Splits raw `git log` output into record bodies, dropping the leading
/// `COMMIT: ` of each.
///
/// Every record starts on its own line, so the label inside a commit message
/// stays part of that message.
pub fn split_records(raw: &str) -> impl Iterator<Item = &str> {
    split_at_line_markers(raw.trim(), COMMIT_LABEL).into_iter()
}

/// Parses a record body of the form
/// `<sha> AUTHORDATE: <date> AUTHORNAME: <name> AUTHOREMAIL: <email>[ LOG: <message>]`.
///
/// When the message label is absent the email absorbs the remainder.
pub fn parse_record(record: &str) -> Result<LogRecord, LogParseError> {
    let (sha, rest) = take_field(record, DATE_LABEL)?;
    let (author_date, rest) = take_field(rest, NAME_LABEL)?;
    let (author_name, rest) = take_field(rest, EMAIL_LABEL)?;
    let (author_email, log) = match rest.split_once(MESSAGE_LABEL) {
        Some((email, log)) => (email, Some(log)),
        None => (rest, None),
    };

    Ok(LogRecord {
        sha: sha.trim().to_string(),
        metadata: CommitMatch {
            author_date: Some(author_date.trim().to_string()),
            author_name: Some(author_name.trim().to_string()),
            author_email: Some(author_email.trim().to_string()),
            log: log.map(|l| l.trim().to_string()),
            files: None,
        },
    })
}

fn take_field<'a>(text: &'a str, label: &'static str) -> Result<(&'a str, &'a str), LogParseError> {
    text.split_once(label).ok_or_else(|| LogParseError::MissingField {
        label,
        record: text.chars().take(RECORD_PREVIEW_CHARS).collect(),
    })
}

/// Parses every record in raw log output, yielding per-record results so a
/// single bad record does not discard the rest.
pub fn parse_log(raw: &str) -> impl Iterator<Item = Result<LogRecord, LogParseError>> + '_ {
    split_records(raw).map(parse_record)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE_RECORD: &str = "49a1c77 AUTHORDATE: Tue, 1 Dec 2015 10:00:00 -0500 AUTHORNAME: Jane Doe AUTHOREMAIL: jane@example.com LOG: fake@fake.biz leaked \n";

    #[test]
    fn parse_record_reads_all_fields_with_message() {
        let record = parse_record(MESSAGE_RECORD).unwrap();
        assert_eq!(record.sha, "49a1c77");
        assert_eq!(record.metadata.author_date.as_deref(), Some("Tue, 1 Dec 2015 10:00:00 -0500"));
        assert_eq!(record.metadata.author_name.as_deref(), Some("Jane Doe"));
        assert_eq!(record.metadata.author_email.as_deref(), Some("jane@example.com"));
        assert_eq!(record.metadata.log.as_deref(), Some("fake@fake.biz leaked"));
        assert!(record.metadata.files.is_none());
    }

    #[test]
    fn parse_record_without_message_puts_remainder_in_email() {
        let record =
            parse_record("f0a6ebc AUTHORDATE: Mon, 2 Nov 2015 AUTHORNAME: A B AUTHOREMAIL: ab@example.com \n").unwrap();
        assert_eq!(record.metadata.author_email.as_deref(), Some("ab@example.com"));
        assert!(record.metadata.log.is_none());
    }

    #[test]
    fn parse_record_keeps_multiline_message() {
        let record = parse_record("abc AUTHORDATE: d AUTHORNAME: n AUTHOREMAIL: e LOG: subject body line\nsecond\n").unwrap();
        assert_eq!(record.metadata.log.as_deref(), Some("subject body line\nsecond"));
    }

    #[test]
    fn parse_record_rejects_missing_label() {
        let err = parse_record("abc AUTHORNAME: n AUTHOREMAIL: e").unwrap_err();
        assert!(matches!(err, LogParseError::MissingField { label, .. } if label == DATE_LABEL));
    }

    #[test]
    fn split_records_drops_leading_text_and_markers() {
        let raw = "\nCOMMIT: a AUTHORDATE: d AUTHORNAME: n AUTHOREMAIL: e\nCOMMIT: b AUTHORDATE: d AUTHORNAME: n AUTHOREMAIL: e\n";
        let records: Vec<_> = split_records(raw).collect();
        assert_eq!(records.len(), 2);
        assert!(records[0].starts_with("a "));
    }

    #[test]
    fn commit_label_inside_message_stays_in_the_record() {
        let raw = "COMMIT: a AUTHORDATE: d AUTHORNAME: n AUTHOREMAIL: e LOG: revert COMMIT: 123 by mistake\n\
COMMIT: b AUTHORDATE: d AUTHORNAME: n AUTHOREMAIL: e LOG: second\n";
        let records = parse_log(raw).collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].metadata.log.as_deref(), Some("revert COMMIT: 123 by mistake"));
        assert_eq!(records[1].sha, "b");
    }

    #[test]
    fn split_records_of_empty_output_is_empty() {
        assert_eq!(split_records("").count(), 0);
        assert_eq!(split_records("  \n").count(), 0);
    }

    #[test]
    fn parse_log_reports_bad_records_individually() {
        let raw = "COMMIT: a AUTHORDATE: d AUTHORNAME: n AUTHOREMAIL: e\nCOMMIT: broken\nCOMMIT: c AUTHORDATE: d AUTHORNAME: n AUTHOREMAIL: e\n";
        let results: Vec<_> = parse_log(raw).collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().map(|r| r.sha.as_str()), Ok("c"));
    }
}
