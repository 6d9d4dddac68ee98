//! Temporary migrated `SQLite` ledger with read-back helpers.

use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::SqliteConnection;
use diesel::{Connection, QueryableByName, RunQueryDsl, sql_query};
use prledger::persistence::migrate_database;
use prledger::telemetry::NoopTelemetrySink;
use prledger::{LedgerEntry, PullRequestStore};
use tempfile::TempDir;

#[derive(QueryableByName)]
struct Count {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

#[derive(QueryableByName)]
struct Number {
    #[diesel(sql_type = BigInt)]
    number: i64,
}

#[derive(QueryableByName)]
struct Diff {
    #[diesel(sql_type = Text)]
    diff: String,
}

/// A migrated ledger that lives as long as its temporary directory.
pub struct Ledger {
    _dir: TempDir,
    url: String,
}

impl Ledger {
    /// Creates and migrates a fresh ledger.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created or migrations fail.
    pub fn migrated() -> Self {
        let dir = TempDir::new().unwrap_or_else(|error| panic!("temp dir: {error}"));
        let url = dir
            .path()
            .join("ledger.sqlite")
            .to_string_lossy()
            .into_owned();
        migrate_database(&url, &NoopTelemetrySink)
            .unwrap_or_else(|error| panic!("migrations should apply: {error}"));
        Self { _dir: dir, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn connection(&self) -> SqliteConnection {
        SqliteConnection::establish(&self.url)
            .unwrap_or_else(|error| panic!("ledger should open: {error}"))
    }

    /// Number of rows in `table`.
    pub fn count(&self, table: &str) -> i64 {
        let row: Count = sql_query(format!("SELECT COUNT(*) AS count FROM {table};"))
            .get_result(&mut self.connection())
            .unwrap_or_else(|error| panic!("count of {table}: {error}"));
        row.count
    }

    /// Pull request numbers of `repository` in the order they were written.
    ///
    /// Patch rows carry an autoincrement ID, so they record write order.
    pub fn persisted_order(&self, repository: &str) -> Vec<i64> {
        let rows: Vec<Number> = sql_query(
            "SELECT pr.number AS number FROM pr_patches p \
             JOIN pull_requests pr ON pr.id = p.pr_id \
             WHERE pr.repo_name = ? ORDER BY p.id;",
        )
        .bind::<Text, _>(repository)
        .load(&mut self.connection())
        .unwrap_or_else(|error| panic!("persisted order of {repository}: {error}"));
        rows.into_iter().map(|row| row.number).collect()
    }

    /// Number of comments stored for one pull request.
    pub fn comment_count(&self, repository: &str, number: i64) -> i64 {
        let row: Count = sql_query(
            "SELECT COUNT(*) AS count FROM pr_comments c \
             JOIN pull_requests pr ON pr.id = c.pr_id \
             WHERE pr.repo_name = ? AND pr.number = ?;",
        )
        .bind::<Text, _>(repository)
        .bind::<BigInt, _>(number)
        .get_result(&mut self.connection())
        .unwrap_or_else(|error| panic!("comments of {repository}#{number}: {error}"));
        row.count
    }

    /// Stored diff of one pull request.
    pub fn diff(&self, repository: &str, number: i64) -> String {
        let row: Diff = sql_query(
            "SELECT diff FROM pull_requests WHERE repo_name = ? AND number = ?;",
        )
        .bind::<Text, _>(repository)
        .bind::<BigInt, _>(number)
        .get_result(&mut self.connection())
        .unwrap_or_else(|error| panic!("{repository}#{number} should be stored: {error}"));
        row.diff
    }

    /// Every stored row, with the per-run processing time blanked.
    pub fn snapshot(&self) -> Vec<LedgerEntry> {
        let mut entries = PullRequestStore::new(self.url.as_str())
            .and_then(|store| store.load_all())
            .unwrap_or_else(|error| panic!("ledger should load: {error}"));
        for entry in &mut entries {
            entry.pull_request.last_processed_time.clear();
        }
        entries
    }
}
