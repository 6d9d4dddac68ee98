//! JSON Lines export of the stored ledger.
//!
//! Each stored pull request becomes one JSON object on its own line: the
//! scalar columns at the top level, followed by `comments`, `reviews` and
//! `patches` arrays in ordinal order.

use std::io::Write;

use crate::github::error::IntakeError;
use crate::persistence::LedgerEntry;

/// Writes `entries` in JSONL format to `writer`.
///
/// # Errors
///
/// Returns [`IntakeError::Io`] if serialisation or writing fails.
pub fn write_jsonl<W: Write>(writer: &mut W, entries: &[LedgerEntry]) -> Result<(), IntakeError> {
    for entry in entries {
        serde_json::to_writer(&mut *writer, entry).map_err(|error| IntakeError::Io {
            message: format!("JSON serialisation failed: {error}"),
        })?;
        writeln!(writer).map_err(|error| io_error(&error))?;
    }
    Ok(())
}

fn io_error(error: &std::io::Error) -> IntakeError {
    IntakeError::Io {
        message: error.to_string(),
    }
}

#[cfg(test)]
#[expect(
    clippy::indexing_slicing,
    reason = "test assertions use known JSON fields"
)]
mod tests {
    use std::io;

    use rstest::rstest;
    use serde_json::Value;

    use super::write_jsonl;
    use crate::github::error::IntakeError;
    use crate::persistence::{
        LedgerComment, LedgerEntry, LedgerPatch, LedgerPullRequest, LedgerReview,
    };

    fn entry(number: i64) -> LedgerEntry {
        LedgerEntry {
            pull_request: LedgerPullRequest {
                id: 1000 + number,
                repo_owner: "acme".to_owned(),
                repo_name: "widgets".to_owned(),
                number,
                title: format!("PR {number}"),
                created_at: "2025-01-01T00:00:00Z".to_owned(),
                updated_at: "2025-01-02T00:00:00Z".to_owned(),
                state: "closed".to_owned(),
                user_login: "octocat".to_owned(),
                diff: String::new(),
                files_changed: 1,
                additions: 3,
                deletions: 1,
                commit_count: 2,
                mergeable_state: None,
                base_commit_sha: "base0000".to_owned(),
                base_commit_link: "https://github.com/acme/widgets/commit/base0000".to_owned(),
                last_processed_time: "2025-01-03T00:00:00Z".to_owned(),
            },
            comments: vec![LedgerComment {
                id: number * 100 + 1,
                ordinal: 0,
                body: "nit".to_owned(),
                user_login: "bob".to_owned(),
                created_at: "2025-01-02T00:00:00Z".to_owned(),
                path: Some("src/lib.rs".to_owned()),
                position: Some(4),
            }],
            reviews: vec![LedgerReview {
                id: number * 100 + 2,
                ordinal: 0,
                body: String::new(),
                state: "APPROVED".to_owned(),
                user_login: "carol".to_owned(),
                submitted_at: None,
            }],
            patches: vec![LedgerPatch {
                ordinal: 0,
                path: "src/lib.rs".to_owned(),
                filename: "lib.rs".to_owned(),
                patch: Some("@@ -1 +1 @@".to_owned()),
                status: "modified".to_owned(),
                changes: 4,
                additions: 3,
                deletions: 1,
            }],
        }
    }

    #[rstest]
    fn writes_one_flattened_object_per_line() {
        let mut buffer = Vec::new();

        write_jsonl(&mut buffer, &[entry(2), entry(1)]).expect("export should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        let lines: Vec<Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).expect("valid JSON"))
            .collect();
        assert_eq!(lines.len(), 2);
        let first = &lines[0];
        assert_eq!(first["number"], 2);
        assert_eq!(first["repo_owner"], "acme");
        assert_eq!(first["mergeable_state"], Value::Null);
        assert_eq!(first["comments"][0]["path"], "src/lib.rs");
        assert_eq!(first["reviews"][0]["state"], "APPROVED");
        assert_eq!(first["patches"][0]["filename"], "lib.rs");
        assert!(first.get("pull_request").is_none(), "scalars are flattened");
    }

    #[rstest]
    fn empty_ledger_writes_nothing() {
        let mut buffer = Vec::new();

        write_jsonl(&mut buffer, &[]).expect("export should succeed");

        assert!(buffer.is_empty());
    }

    struct FailingWriter;

    impl io::Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[rstest]
    fn write_failures_are_io_errors() {
        let result = write_jsonl(&mut FailingWriter, &[entry(1)]);

        assert!(
            matches!(&result, Err(IntakeError::Io { message }) if message.contains("disk full")),
            "expected Io error, got {result:?}"
        );
    }
}
