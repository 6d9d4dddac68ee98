//! Wiremock GitHub API serving a fixed set of pull requests per repository.
//!
//! Every repository lists pull requests 4, 3, 2 and 1, last updated 1, 20, 2
//! and 3 days before [`NOW`]. Pull requests 4 and 2 have detail, files, diff,
//! one review comment, one issue comment and one review.

use std::time::Duration;

use chrono::{DateTime, Duration as Days, SecondsFormat, Utc};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fixed "now" used by the aggregator clock (2025-01-01T00:00:00Z).
pub const NOW: i64 = 1_735_689_600;

/// Owner of every served repository.
pub const OWNER: &str = "acme";

const DIFF_MEDIA_TYPE: &str = "application/vnd.github.diff";

/// Listing entries as (number, days since last update).
const LISTING: [(u64, i64); 4] = [(4, 1), (3, 20), (2, 2), (1, 3)];

/// Pull requests inside a 7 day lookback with a cap of 2.
const ASSEMBLED: [u64; 2] = [4, 2];

/// How one repository is served.
#[derive(Debug, Clone, Default)]
pub struct ServedRepository {
    pub name: String,
    pub listing_delay: Duration,
    pub failing_diff: Option<u64>,
    pub without_issue_comments: Vec<u64>,
}

impl ServedRepository {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    fn pulls_path(&self) -> String {
        format!("/api/v3/repos/{OWNER}/{}/pulls", self.name)
    }

    /// Offsets IDs so that repositories never share a pull request or
    /// comment ID.
    fn id_base(&self) -> u64 {
        self.name
            .bytes()
            .map(u64::from)
            .sum::<u64>()
            .saturating_mul(100_000)
    }
}

/// The aggregator's clock reading.
///
/// # Panics
///
/// Panics if [`NOW`] is not a valid timestamp.
pub fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(NOW, 0).unwrap_or_else(|| panic!("{NOW} is a valid timestamp"))
}

fn timestamp(days_ago: i64) -> String {
    (now() - Days::days(days_ago)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn summary_json(repository: &ServedRepository, number: u64, days_ago: i64) -> Value {
    json!({
        "id": repository.id_base() + number,
        "number": number,
        "title": format!("Change {number}"),
        "state": "open",
        "user": { "login": "octocat" },
        "created_at": timestamp(days_ago + 1),
        "updated_at": timestamp(days_ago),
        "base": { "sha": format!("base{number}") }
    })
}

/// Expected diff body for `number`.
pub fn diff_for(number: u64) -> String {
    format!("diff --git a/file{number} b/file{number}\n")
}

/// Clears `server` and mounts every repository in `repositories`.
pub async fn serve(server: &MockServer, repositories: &[ServedRepository]) {
    server.reset().await;
    for repository in repositories {
        mount_repository(server, repository).await;
    }
}

async fn mount_repository(server: &MockServer, repository: &ServedRepository) {
    let listing: Vec<Value> = LISTING
        .iter()
        .map(|&(number, days_ago)| summary_json(repository, number, days_ago))
        .collect();
    Mock::given(method("GET"))
        .and(path(repository.pulls_path()))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(listing)
                .set_delay(repository.listing_delay),
        )
        .mount(server)
        .await;

    for number in ASSEMBLED {
        // The diff shares the detail path, so it must be mounted first.
        mount_diff(server, repository, number).await;
        mount_children(server, repository, number).await;
    }
}

async fn mount_diff(server: &MockServer, repository: &ServedRepository, number: u64) {
    let response = if repository.failing_diff == Some(number) {
        ResponseTemplate::new(500).set_body_json(json!({ "message": "diff unavailable" }))
    } else {
        ResponseTemplate::new(200).set_body_string(diff_for(number))
    };
    Mock::given(method("GET"))
        .and(path(format!("{}/{number}", repository.pulls_path())))
        .and(header("accept", DIFF_MEDIA_TYPE))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_children(server: &MockServer, repository: &ServedRepository, number: u64) {
    let pulls = repository.pulls_path();
    let comment_id = repository.id_base() + number * 100;
    let issue_comments = if repository.without_issue_comments.contains(&number) {
        json!([])
    } else {
        json!([{
            "id": comment_id + 2, "body": "thanks", "user": { "login": "alice" },
            "created_at": timestamp(1)
        }])
    };

    Mock::given(method("GET"))
        .and(path(format!("{pulls}/{number}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "additions": 3, "deletions": 1, "commits": 1, "changed_files": 1,
            "mergeable_state": "clean"
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{pulls}/{number}/files")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "filename": format!("file{number}"), "status": "modified",
            "additions": 3, "deletions": 1, "changes": 4, "patch": "@@ -1 +1 @@"
        }])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{pulls}/{number}/comments")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": comment_id + 1, "body": "nit", "user": { "login": "bob" },
            "created_at": timestamp(1), "path": format!("file{number}"), "position": 1
        }])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/api/v3/repos/{OWNER}/{}/issues/{number}/comments",
            repository.name
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(issue_comments))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{pulls}/{number}/reviews")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": comment_id + 3, "body": "", "state": "APPROVED",
            "user": { "login": "carol" }, "submitted_at": timestamp(1)
        }])))
        .mount(server)
        .await;
}
