//! Read-back of stored pull requests with their child rows.

use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Nullable, Text};
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use super::{PullRequestStore, ensure_schema};
use crate::persistence::PersistenceError;
use crate::persistence::connection::open_connection;

/// Scalar columns of one stored pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, QueryableByName)]
pub struct LedgerPullRequest {
    /// Identifier assigned by GitHub.
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    /// Repository owner.
    #[diesel(sql_type = Text)]
    pub repo_owner: String,
    /// Repository name.
    #[diesel(sql_type = Text)]
    pub repo_name: String,
    /// Pull request number within the repository.
    #[diesel(sql_type = BigInt)]
    pub number: i64,
    /// Pull request title.
    #[diesel(sql_type = Text)]
    pub title: String,
    /// Creation timestamp (RFC 3339).
    #[diesel(sql_type = Text)]
    pub created_at: String,
    /// Last update timestamp (RFC 3339).
    #[diesel(sql_type = Text)]
    pub updated_at: String,
    /// `open` or `closed`.
    #[diesel(sql_type = Text)]
    pub state: String,
    /// Author login.
    #[diesel(sql_type = Text)]
    pub user_login: String,
    /// Unified diff; empty when the diff fetch failed.
    #[diesel(sql_type = Text)]
    pub diff: String,
    /// Number of files changed.
    #[diesel(sql_type = BigInt)]
    pub files_changed: i64,
    /// Lines added.
    #[diesel(sql_type = BigInt)]
    pub additions: i64,
    /// Lines removed.
    #[diesel(sql_type = BigInt)]
    pub deletions: i64,
    /// Number of commits.
    #[diesel(sql_type = BigInt)]
    pub commit_count: i64,
    /// Mergeability reported by GitHub, if known.
    #[diesel(sql_type = Nullable<Text>)]
    pub mergeable_state: Option<String>,
    /// SHA of the base commit.
    #[diesel(sql_type = Text)]
    pub base_commit_sha: String,
    /// Link to the base commit.
    #[diesel(sql_type = Text)]
    pub base_commit_link: String,
    /// When the run that last wrote this row assembled it.
    #[diesel(sql_type = Text)]
    pub last_processed_time: String,
}

/// A stored review or issue comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, QueryableByName)]
pub struct LedgerComment {
    /// Identifier assigned by GitHub.
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    /// Position in fetch order.
    #[diesel(sql_type = BigInt)]
    pub ordinal: i64,
    /// Markdown body.
    #[diesel(sql_type = Text)]
    pub body: String,
    /// Author login.
    #[diesel(sql_type = Text)]
    pub user_login: String,
    /// Creation timestamp (RFC 3339).
    #[diesel(sql_type = Text)]
    pub created_at: String,
    /// File path for inline review comments.
    #[diesel(sql_type = Nullable<Text>)]
    pub path: Option<String>,
    /// Diff position for inline review comments.
    #[diesel(sql_type = Nullable<BigInt>)]
    pub position: Option<i64>,
}

/// A stored review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, QueryableByName)]
pub struct LedgerReview {
    /// Identifier assigned by GitHub.
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    /// Position in fetch order.
    #[diesel(sql_type = BigInt)]
    pub ordinal: i64,
    /// Markdown body.
    #[diesel(sql_type = Text)]
    pub body: String,
    /// Review verdict.
    #[diesel(sql_type = Text)]
    pub state: String,
    /// Author login.
    #[diesel(sql_type = Text)]
    pub user_login: String,
    /// Submission timestamp, absent for pending reviews.
    #[diesel(sql_type = Nullable<Text>)]
    pub submitted_at: Option<String>,
}

/// A stored per-file patch. The synthetic row ID is not exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, QueryableByName)]
pub struct LedgerPatch {
    /// Position in fetch order.
    #[diesel(sql_type = BigInt)]
    pub ordinal: i64,
    /// Repository-relative file path.
    #[diesel(sql_type = Text)]
    pub path: String,
    /// Final path segment of `path`.
    #[diesel(sql_type = Text)]
    pub filename: String,
    /// Patch text; absent for binary or oversized files.
    #[diesel(sql_type = Nullable<Text>)]
    pub patch: Option<String>,
    /// Change status such as `modified`.
    #[diesel(sql_type = Text)]
    pub status: String,
    /// Lines changed.
    #[diesel(sql_type = BigInt)]
    pub changes: i64,
    /// Lines added.
    #[diesel(sql_type = BigInt)]
    pub additions: i64,
    /// Lines removed.
    #[diesel(sql_type = BigInt)]
    pub deletions: i64,
}

/// One stored pull request with its children in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    /// Scalar columns, flattened into the serialised object.
    #[serde(flatten)]
    pub pull_request: LedgerPullRequest,
    /// Review comments followed by issue comments.
    pub comments: Vec<LedgerComment>,
    /// Reviews in submission order.
    pub reviews: Vec<LedgerReview>,
    /// Per-file patches.
    pub patches: Vec<LedgerPatch>,
}

fn query_failed(error: &diesel::result::Error) -> PersistenceError {
    PersistenceError::QueryFailed {
        message: error.to_string(),
    }
}

impl PullRequestStore {
    /// Loads every stored pull request, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::SchemaNotInitialised`] for an unmigrated
    /// database and [`PersistenceError::QueryFailed`] when a read fails.
    pub fn load_all(&self) -> Result<Vec<LedgerEntry>, PersistenceError> {
        let mut connection = open_connection(self.database_url())?;
        ensure_schema(&mut connection)?;

        let pull_requests: Vec<LedgerPullRequest> = sql_query(
            "SELECT id, repo_owner, repo_name, number, title, created_at, updated_at, state, \
             user_login, diff, files_changed, additions, deletions, commit_count, \
             mergeable_state, base_commit_sha, base_commit_link, last_processed_time \
             FROM pull_requests ORDER BY updated_at DESC, repo_owner, repo_name, number;",
        )
        .load(&mut connection)
        .map_err(|error| query_failed(&error))?;

        pull_requests
            .into_iter()
            .map(|pull_request| load_children(&mut connection, pull_request))
            .collect()
    }
}

fn load_children(
    connection: &mut SqliteConnection,
    pull_request: LedgerPullRequest,
) -> Result<LedgerEntry, PersistenceError> {
    let pr_id = pull_request.id;
    let comments = sql_query(
        "SELECT id, ordinal, body, user_login, created_at, path, position \
         FROM pr_comments WHERE pr_id = ? ORDER BY ordinal, id;",
    )
    .bind::<BigInt, _>(pr_id)
    .load(connection)
    .map_err(|error| query_failed(&error))?;
    let reviews = sql_query(
        "SELECT id, ordinal, body, state, user_login, submitted_at \
         FROM pr_reviews WHERE pr_id = ? ORDER BY ordinal, id;",
    )
    .bind::<BigInt, _>(pr_id)
    .load(connection)
    .map_err(|error| query_failed(&error))?;
    let patches = sql_query(
        "SELECT ordinal, path, filename, patch, status, changes, additions, deletions \
         FROM pr_patches WHERE pr_id = ? ORDER BY ordinal, path;",
    )
    .bind::<BigInt, _>(pr_id)
    .load(connection)
    .map_err(|error| query_failed(&error))?;

    Ok(LedgerEntry {
        pull_request,
        comments,
        reviews,
        patches,
    })
}
