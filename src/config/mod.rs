//! Application configuration loaded from CLI, environment, and files.
//!
//! Values are merged with ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.prledger.toml` in the current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `PRLEDGER_*`, plus the legacy
//!    `GITHUB_REPOS`, `GITHUB_OWNER`, `GITHUB_REPO` and `GITHUB_TOKEN`
//! 4. **Command-line arguments** – `--repositories`, `--token`, ...
//!
//! Besides ingesting, the binary can stop after migrating (`--migrate-db`)
//! or export the stored ledger (`--export`, optionally with `--output`).
//!
//! # Configuration File
//!
//! ```toml
//! repositories = "acme/widgets,acme/gadgets"
//! token = "ghp_example"
//! database_url = "prledger.sqlite"
//! lookback_days = 14
//! concurrency = 4
//! rate_limit_per_hour = 5000
//! ```

use std::env;
use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::github::error::IntakeError;
use crate::github::locator::RepositoryLocator;
use crate::ingest::AggregatorSettings;
use crate::persistence::PersistenceError;
use crate::retry::RetryPolicy;

const DEFAULT_GITHUB_URL: &str = "https://github.com";
const DEFAULT_LOOKBACK_DAYS: u32 = 30;
const DEFAULT_CONCURRENCY: usize = 3;
const DEFAULT_RATE_LIMIT_PER_HOUR: u32 = 5000;
const DEFAULT_MAX_PRS_PER_REPO: usize = 50;
const DEFAULT_CONNECT_ATTEMPTS: u32 = 5;
const DEFAULT_CONNECT_RETRY_DELAY_SECONDS: u64 = 5;

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use ortho_config::OrthoConfig;
/// use prledger::PrLedgerConfig;
///
/// let config = PrLedgerConfig::load().expect("failed to load configuration");
/// let repositories = config
///     .resolve_repositories()
///     .expect("at least one repository");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "PRLEDGER",
    discovery(
        dotfile_name = ".prledger.toml",
        config_file_name = "prledger.toml",
        app_name = "prledger"
    )
)]
pub struct PrLedgerConfig {
    /// Comma-separated `owner/name` list of repositories to ingest.
    ///
    /// Falls back to the legacy `GITHUB_REPOS` environment variable.
    #[ortho_config(cli_short = 'R')]
    pub repositories: Option<String>,

    /// Single repository owner, used with `repo` when no list is configured.
    ///
    /// Falls back to `GITHUB_OWNER`.
    #[ortho_config(cli_short = 'o')]
    pub owner: Option<String>,

    /// Single repository name, used with `owner`.
    ///
    /// Falls back to `GITHUB_REPO`.
    #[ortho_config(cli_short = 'r')]
    pub repo: Option<String>,

    /// Personal access token for GitHub API authentication.
    ///
    /// Falls back to `GITHUB_TOKEN`.
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// `SQLite` database path the ledger is written to.
    #[ortho_config(cli_short = 'd')]
    pub database_url: Option<String>,

    /// Web host of the GitHub instance; enterprise hosts use `/api/v3`.
    #[ortho_config(cli_short = 'g')]
    pub github_url: String,

    /// Pull requests last updated more than this many days ago are skipped.
    #[ortho_config(cli_short = 'l')]
    pub lookback_days: u32,

    /// Number of repositories processed at once.
    #[ortho_config(cli_short = 'c')]
    pub concurrency: usize,

    /// Request budget shared by every worker, per hour.
    #[ortho_config(cli_short = 'q')]
    pub rate_limit_per_hour: u32,

    /// Maximum pull requests collected per repository per run.
    #[ortho_config(cli_short = 'm')]
    pub max_prs_per_repo: usize,

    /// Attempts made to reach the database at startup.
    #[ortho_config(cli_short = 'a')]
    pub connect_attempts: u32,

    /// Pause between startup connection attempts, in seconds.
    #[ortho_config(cli_short = 'w')]
    pub connect_retry_delay_seconds: u64,

    /// Applies pending migrations and exits without contacting GitHub.
    ///
    /// Note: `ortho_config` does not load boolean values from the
    /// environment, so this is set via `--migrate-db` or the config file.
    #[ortho_config(cli_short = 'M')]
    pub migrate_db: bool,

    /// Writes the stored ledger as JSON Lines and exits without contacting
    /// GitHub.
    #[ortho_config(cli_short = 'e')]
    pub export: bool,

    /// Export destination file; standard output when unset.
    #[ortho_config(cli_short = 'O')]
    pub output: Option<String>,
}

impl Default for PrLedgerConfig {
    fn default() -> Self {
        Self {
            repositories: None,
            owner: None,
            repo: None,
            token: None,
            database_url: None,
            github_url: DEFAULT_GITHUB_URL.to_owned(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            concurrency: DEFAULT_CONCURRENCY,
            rate_limit_per_hour: DEFAULT_RATE_LIMIT_PER_HOUR,
            max_prs_per_repo: DEFAULT_MAX_PRS_PER_REPO,
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            connect_retry_delay_seconds: DEFAULT_CONNECT_RETRY_DELAY_SECONDS,
            migrate_db: false,
            export: false,
            output: None,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn configured_or_env(value: Option<&String>, legacy: &str) -> Option<String> {
    non_blank(value.cloned()).or_else(|| non_blank(env::var(legacy).ok()))
}

fn must_be_positive(key: &str) -> IntakeError {
    IntakeError::Configuration {
        message: format!("{key} must be at least 1"),
    }
}

impl PrLedgerConfig {
    /// Resolves the token from configuration or the legacy `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::MissingToken`] when no source provides a value.
    pub fn resolve_token(&self) -> Result<String, IntakeError> {
        configured_or_env(self.token.as_ref(), "GITHUB_TOKEN").ok_or(IntakeError::MissingToken)
    }

    /// Resolves the repositories to ingest, in configured order with
    /// duplicates removed.
    ///
    /// The `repositories` list (or `GITHUB_REPOS`) wins; otherwise a single
    /// `owner` + `repo` pair (or `GITHUB_OWNER` + `GITHUB_REPO`) is used.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidRepository`] for an entry that is not
    /// `owner/name` and [`IntakeError::MissingRepositories`] when nothing is
    /// configured.
    pub fn resolve_repositories(&self) -> Result<Vec<RepositoryLocator>, IntakeError> {
        let slugs: Vec<String> =
            match configured_or_env(self.repositories.as_ref(), "GITHUB_REPOS") {
                Some(list) => list
                    .split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(ToOwned::to_owned)
                    .collect(),
                None => self.single_repository().into_iter().collect(),
            };

        let mut repositories: Vec<RepositoryLocator> = Vec::with_capacity(slugs.len());
        for slug in &slugs {
            let locator = RepositoryLocator::from_slug(&self.github_url, slug)?;
            if !repositories.contains(&locator) {
                repositories.push(locator);
            }
        }

        if repositories.is_empty() {
            return Err(IntakeError::MissingRepositories);
        }
        Ok(repositories)
    }

    fn single_repository(&self) -> Option<String> {
        let owner = configured_or_env(self.owner.as_ref(), "GITHUB_OWNER")?;
        let repo = configured_or_env(self.repo.as_ref(), "GITHUB_REPO")?;
        Some(format!("{owner}/{repo}"))
    }

    /// Returns the database URL or an error if missing.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::MissingDatabaseUrl`] when unset and
    /// [`PersistenceError::BlankDatabaseUrl`] when blank.
    pub fn require_database_url(&self) -> Result<&str, PersistenceError> {
        let url = self
            .database_url
            .as_deref()
            .ok_or(PersistenceError::MissingDatabaseUrl)?;
        if url.trim().is_empty() {
            return Err(PersistenceError::BlankDatabaseUrl);
        }
        Ok(url)
    }

    /// Number of concurrent repository workers.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::Configuration`] when zero.
    pub fn concurrency(&self) -> Result<NonZeroUsize, IntakeError> {
        NonZeroUsize::new(self.concurrency).ok_or_else(|| must_be_positive("concurrency"))
    }

    /// Shared hourly request quota.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::Configuration`] when zero.
    pub fn rate_limit_per_hour(&self) -> Result<NonZeroU32, IntakeError> {
        NonZeroU32::new(self.rate_limit_per_hour)
            .ok_or_else(|| must_be_positive("rate_limit_per_hour"))
    }

    /// Startup connectivity retry schedule.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::Configuration`] when `connect_attempts` is zero.
    pub fn connect_retry_policy(&self) -> Result<RetryPolicy, IntakeError> {
        if self.connect_attempts == 0 {
            return Err(must_be_positive("connect_attempts"));
        }
        Ok(RetryPolicy::fixed(
            self.connect_attempts,
            Duration::from_secs(self.connect_retry_delay_seconds),
        ))
    }

    /// Lookback window and per-repository cap for the aggregator.
    #[must_use]
    pub const fn aggregator_settings(&self) -> AggregatorSettings {
        AggregatorSettings {
            lookback_days: self.lookback_days,
            max_pull_requests: self.max_prs_per_repo,
        }
    }

    /// Checks numeric settings without touching the environment.
    ///
    /// Repository and token resolution are checked separately because they
    /// are only needed for an ingest run.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::Configuration`] describing the first invalid
    /// setting.
    pub fn validate(&self) -> Result<(), IntakeError> {
        self.concurrency()?;
        self.rate_limit_per_hour()?;
        self.connect_retry_policy()?;
        if self.github_url.trim().is_empty() {
            return Err(IntakeError::Configuration {
                message: "github_url must not be blank".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
