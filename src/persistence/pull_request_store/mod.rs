//! Transactional storage of pull request aggregates.
//!
//! Each aggregate is written in its own `BEGIN IMMEDIATE` transaction: the
//! repository row is touched, the pull request row is upserted by ID, and
//! every complete child collection is deleted and re-inserted in fetch
//! order. A collection flagged as truncated is upserted on top of the rows
//! already stored so that a failed fetch never erases history; its rows are
//! numbered after the highest stored ordinal so ordinals stay unique. A
//! failing aggregate is rolled back and reported; the rest of the batch
//! continues.

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Nullable, Text};
use diesel::sqlite::SqliteConnection;
use tracing::{debug, info, warn};

use crate::github::models::{
    FilePatch, PullRequestAggregate, PullRequestComment, PullRequestReview,
};

use super::PersistenceError;
use super::connection::{check_connectivity, open_connection};

mod reader;

pub use reader::{LedgerComment, LedgerEntry, LedgerPatch, LedgerPullRequest, LedgerReview};

const PULL_REQUESTS_TABLE: &str = "pull_requests";

/// Outcome of storing one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreReport {
    /// Numbers of the pull requests committed, in batch order.
    pub stored: Vec<u64>,
    /// Numbers of the pull requests rolled back, in batch order.
    pub failed: Vec<u64>,
}

impl StoreReport {
    /// True when every aggregate in the batch was committed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// SQLite-backed store for pull request aggregates.
#[derive(Debug, Clone)]
pub struct PullRequestStore {
    database_url: String,
}

impl PullRequestStore {
    /// Creates a store targeting `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::BlankDatabaseUrl`] when the URL is blank.
    pub fn new(database_url: impl Into<String>) -> Result<Self, PersistenceError> {
        let database_url_string = database_url.into();
        if database_url_string.trim().is_empty() {
            return Err(PersistenceError::BlankDatabaseUrl);
        }
        Ok(Self {
            database_url: database_url_string,
        })
    }

    /// Database URL this store writes to.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Opens a connection and runs a `SELECT 1` check.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the database cannot be reached.
    pub fn check_connectivity(&self) -> Result<(), PersistenceError> {
        check_connectivity(&self.database_url)
    }

    /// Persists `aggregates`, one transaction each.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] only when no connection can be opened or
    /// the schema has not been migrated; individual aggregate failures are
    /// reported in [`StoreReport::failed`].
    pub fn store(
        &self,
        aggregates: &[PullRequestAggregate],
    ) -> Result<StoreReport, PersistenceError> {
        let mut connection = open_connection(&self.database_url)?;
        ensure_schema(&mut connection)?;

        let mut report = StoreReport::default();
        for aggregate in aggregates {
            let outcome = connection.immediate_transaction(|transaction| {
                write_aggregate(transaction, aggregate)
            });

            match outcome {
                Ok(()) => {
                    debug!(
                        repository = %repository_name(aggregate),
                        pr = aggregate.number,
                        "pull request stored"
                    );
                    report.stored.push(aggregate.number);
                }
                Err(error) => {
                    warn!(
                        repository = %repository_name(aggregate),
                        pr = aggregate.number,
                        %error,
                        "pull request rolled back; it will be retried on the next run"
                    );
                    report.failed.push(aggregate.number);
                }
            }
        }

        info!(
            stored = report.stored.len(),
            failed = report.failed.len(),
            "batch persisted"
        );
        Ok(report)
    }
}

fn repository_name(aggregate: &PullRequestAggregate) -> String {
    format!("{}/{}", aggregate.repo_owner, aggregate.repo_name)
}

fn ensure_schema(connection: &mut SqliteConnection) -> Result<(), PersistenceError> {
    #[derive(Debug, QueryableByName)]
    struct Row {
        #[diesel(sql_type = BigInt)]
        count: i64,
    }

    let row: Row = sql_query(
        "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?;",
    )
    .bind::<Text, _>(PULL_REQUESTS_TABLE)
    .get_result(connection)
    .map_err(|error| PersistenceError::QueryFailed {
        message: error.to_string(),
    })?;

    if row.count == 0 {
        return Err(PersistenceError::SchemaNotInitialised);
    }
    Ok(())
}

/// `SQLite` integers are signed; values past `i64::MAX` saturate.
fn sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn ordinal(base: i64, index: usize) -> i64 {
    i64::try_from(index)
        .ok()
        .and_then(|offset| base.checked_add(offset))
        .unwrap_or(i64::MAX)
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn write_aggregate(
    connection: &mut SqliteConnection,
    aggregate: &PullRequestAggregate,
) -> Result<(), diesel::result::Error> {
    upsert_repository(connection, aggregate)?;
    upsert_pull_request(connection, aggregate)?;

    let pr_id = sql_int(aggregate.id);
    let truncated = aggregate.truncated;

    let base = first_ordinal(connection, "pr_comments", pr_id, truncated.comments)?;
    for (index, comment) in aggregate.comments.iter().enumerate() {
        upsert_comment(connection, pr_id, ordinal(base, index), comment)?;
    }

    let base = first_ordinal(connection, "pr_reviews", pr_id, truncated.reviews)?;
    for (index, review) in aggregate.reviews.iter().enumerate() {
        upsert_review(connection, pr_id, ordinal(base, index), review)?;
    }

    let base = first_ordinal(connection, "pr_patches", pr_id, truncated.patches)?;
    for (index, patch) in aggregate.patches.iter().enumerate() {
        upsert_patch(connection, pr_id, ordinal(base, index), patch)?;
    }

    Ok(())
}

/// Prepares `table` for a new collection and returns its first ordinal.
///
/// Complete collections replace the stored rows and start at zero. Truncated
/// ones keep the stored rows and continue after the highest ordinal.
fn first_ordinal(
    connection: &mut SqliteConnection,
    table: &str,
    pr_id: i64,
    truncated: bool,
) -> Result<i64, diesel::result::Error> {
    #[derive(QueryableByName)]
    struct Next {
        #[diesel(sql_type = BigInt)]
        next: i64,
    }

    if !truncated {
        delete_children(connection, table, pr_id)?;
        return Ok(0);
    }
    let row: Next = sql_query(format!(
        "SELECT COALESCE(MAX(ordinal) + 1, 0) AS next FROM {table} WHERE pr_id = ?;"
    ))
    .bind::<BigInt, _>(pr_id)
    .get_result(connection)?;
    Ok(row.next)
}

fn upsert_repository(
    connection: &mut SqliteConnection,
    aggregate: &PullRequestAggregate,
) -> Result<(), diesel::result::Error> {
    sql_query(
        "INSERT INTO repositories (owner, name, created_at, updated_at) \
         VALUES (?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP) \
         ON CONFLICT(owner, name) DO UPDATE SET updated_at = CURRENT_TIMESTAMP;",
    )
    .bind::<Text, _>(aggregate.repo_owner.as_str())
    .bind::<Text, _>(aggregate.repo_name.as_str())
    .execute(connection)
    .map(drop)
}

fn upsert_pull_request(
    connection: &mut SqliteConnection,
    aggregate: &PullRequestAggregate,
) -> Result<(), diesel::result::Error> {
    let stats = aggregate.stats;
    sql_query(
        "INSERT INTO pull_requests \
         (id, repo_owner, repo_name, number, title, created_at, updated_at, state, user_login, \
          diff, files_changed, additions, deletions, commit_count, mergeable_state, \
          base_commit_sha, base_commit_link, last_processed_time) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET \
           title = excluded.title, \
           updated_at = excluded.updated_at, \
           state = excluded.state, \
           user_login = excluded.user_login, \
           diff = excluded.diff, \
           files_changed = excluded.files_changed, \
           additions = excluded.additions, \
           deletions = excluded.deletions, \
           commit_count = excluded.commit_count, \
           mergeable_state = excluded.mergeable_state, \
           base_commit_sha = excluded.base_commit_sha, \
           base_commit_link = excluded.base_commit_link, \
           last_processed_time = excluded.last_processed_time;",
    )
    .bind::<BigInt, _>(sql_int(aggregate.id))
    .bind::<Text, _>(aggregate.repo_owner.as_str())
    .bind::<Text, _>(aggregate.repo_name.as_str())
    .bind::<BigInt, _>(sql_int(aggregate.number))
    .bind::<Text, _>(aggregate.title.as_str())
    .bind::<Text, _>(timestamp(&aggregate.created_at))
    .bind::<Text, _>(timestamp(&aggregate.updated_at))
    .bind::<Text, _>(aggregate.state.as_str())
    .bind::<Text, _>(aggregate.author.as_str())
    .bind::<Text, _>(aggregate.diff.as_str())
    .bind::<BigInt, _>(sql_int(stats.files_changed))
    .bind::<BigInt, _>(sql_int(stats.additions))
    .bind::<BigInt, _>(sql_int(stats.deletions))
    .bind::<BigInt, _>(sql_int(stats.commit_count))
    .bind::<Nullable<Text>, _>(aggregate.mergeable_state.as_deref())
    .bind::<Text, _>(aggregate.base_commit_sha.as_str())
    .bind::<Text, _>(aggregate.base_commit_link.as_str())
    .bind::<Text, _>(timestamp(&aggregate.processed_at))
    .execute(connection)
    .map(drop)
}

fn delete_children(
    connection: &mut SqliteConnection,
    table: &str,
    pr_id: i64,
) -> Result<(), diesel::result::Error> {
    sql_query(format!("DELETE FROM {table} WHERE pr_id = ?;"))
        .bind::<BigInt, _>(pr_id)
        .execute(connection)
        .map(drop)
}

fn upsert_comment(
    connection: &mut SqliteConnection,
    pr_id: i64,
    ordinal: i64,
    comment: &PullRequestComment,
) -> Result<(), diesel::result::Error> {
    sql_query(
        "INSERT INTO pr_comments \
         (id, pr_id, ordinal, body, user_login, created_at, path, position) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET \
           pr_id = excluded.pr_id, \
           ordinal = excluded.ordinal, \
           body = excluded.body, \
           user_login = excluded.user_login, \
           created_at = excluded.created_at, \
           path = excluded.path, \
           position = excluded.position;",
    )
    .bind::<BigInt, _>(sql_int(comment.id))
    .bind::<BigInt, _>(pr_id)
    .bind::<BigInt, _>(ordinal)
    .bind::<Text, _>(comment.body.as_str())
    .bind::<Text, _>(comment.author.as_str())
    .bind::<Text, _>(timestamp(&comment.created_at))
    .bind::<Nullable<Text>, _>(comment.path.as_deref())
    .bind::<Nullable<BigInt>, _>(comment.position.map(i64::from))
    .execute(connection)
    .map(drop)
}

fn upsert_review(
    connection: &mut SqliteConnection,
    pr_id: i64,
    ordinal: i64,
    review: &PullRequestReview,
) -> Result<(), diesel::result::Error> {
    sql_query(
        "INSERT INTO pr_reviews \
         (id, pr_id, ordinal, body, state, user_login, submitted_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET \
           pr_id = excluded.pr_id, \
           ordinal = excluded.ordinal, \
           body = excluded.body, \
           state = excluded.state, \
           user_login = excluded.user_login, \
           submitted_at = excluded.submitted_at;",
    )
    .bind::<BigInt, _>(sql_int(review.id))
    .bind::<BigInt, _>(pr_id)
    .bind::<BigInt, _>(ordinal)
    .bind::<Text, _>(review.body.as_str())
    .bind::<Text, _>(review.state.as_str())
    .bind::<Text, _>(review.author.as_str())
    .bind::<Nullable<Text>, _>(review.submitted_at.as_ref().map(timestamp))
    .execute(connection)
    .map(drop)
}

fn upsert_patch(
    connection: &mut SqliteConnection,
    pr_id: i64,
    ordinal: i64,
    patch: &FilePatch,
) -> Result<(), diesel::result::Error> {
    let filename = patch
        .path
        .rsplit_once('/')
        .map_or(patch.path.as_str(), |(_, name)| name);

    sql_query(
        "INSERT INTO pr_patches \
         (pr_id, ordinal, path, filename, patch, status, changes, additions, deletions) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(pr_id, path) DO UPDATE SET \
           ordinal = excluded.ordinal, \
           filename = excluded.filename, \
           patch = excluded.patch, \
           status = excluded.status, \
           changes = excluded.changes, \
           additions = excluded.additions, \
           deletions = excluded.deletions;",
    )
    .bind::<BigInt, _>(pr_id)
    .bind::<BigInt, _>(ordinal)
    .bind::<Text, _>(patch.path.as_str())
    .bind::<Text, _>(filename)
    .bind::<Nullable<Text>, _>(patch.patch.as_deref())
    .bind::<Text, _>(patch.status.as_str())
    .bind::<BigInt, _>(sql_int(patch.changes))
    .bind::<BigInt, _>(sql_int(patch.additions))
    .bind::<BigInt, _>(sql_int(patch.deletions))
    .execute(connection)
    .map(drop)
}
