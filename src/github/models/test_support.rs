//! Builders for aggregate fixtures shared by unit and integration tests.
//!
//! # Examples
//!
//! ```
//! use prledger::github::models::test_support::{aggregate, issue_comment};
//!
//! let mut pr = aggregate("acme", "widgets", 42);
//! pr.comments.push(issue_comment(7, "Looks good"));
//! assert_eq!(pr.number, 42);
//! assert_eq!(pr.comments.len(), 1);
//! ```

use chrono::{DateTime, TimeZone, Utc};

use super::{
    FilePatch, PatchStatus, PullRequestAggregate, PullRequestComment, PullRequestReview,
    PullRequestState, PullRequestStats, PullRequestSummary, ReviewState, TruncatedCollections,
};

/// Fixed instant used for every fixture timestamp: 2025-01-01T00:00:00Z.
#[must_use]
pub fn fixture_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// A list entry for PR `number`, last updated at `updated_at`.
///
/// The identifier is `1000 + number`.
#[must_use]
pub fn summary(number: u64, updated_at: DateTime<Utc>) -> PullRequestSummary {
    PullRequestSummary {
        id: 1000 + number,
        number,
        title: format!("PR {number}"),
        state: PullRequestState::Open,
        author: Some("octocat".to_owned()),
        created_at: fixture_time(),
        updated_at,
        mergeable_state: None,
        base_sha: Some("base0000".to_owned()),
    }
}

/// A fully populated aggregate without children. The identifier is
/// `1000 + number`.
#[must_use]
pub fn aggregate(owner: &str, name: &str, number: u64) -> PullRequestAggregate {
    PullRequestAggregate {
        id: 1000 + number,
        repo_owner: owner.to_owned(),
        repo_name: name.to_owned(),
        number,
        title: format!("PR {number}"),
        created_at: fixture_time(),
        updated_at: fixture_time(),
        state: PullRequestState::Open,
        author: "octocat".to_owned(),
        diff: format!("diff --git a/file{number} b/file{number}\n"),
        stats: PullRequestStats {
            files_changed: 1,
            additions: 3,
            deletions: 1,
            commit_count: 2,
        },
        mergeable_state: Some("clean".to_owned()),
        base_commit_sha: "base0000".to_owned(),
        base_commit_link: format!("https://github.com/{owner}/{name}/commit/base0000"),
        processed_at: fixture_time(),
        comments: Vec::new(),
        reviews: Vec::new(),
        patches: Vec::new(),
        truncated: TruncatedCollections::default(),
    }
}

/// An issue-level comment (no path or position).
#[must_use]
pub fn issue_comment(id: u64, body: &str) -> PullRequestComment {
    PullRequestComment {
        id,
        body: body.to_owned(),
        author: "alice".to_owned(),
        created_at: fixture_time(),
        path: None,
        position: None,
    }
}

/// An inline review comment on `path` at `position`.
#[must_use]
pub fn review_comment(id: u64, path: &str, position: u32) -> PullRequestComment {
    PullRequestComment {
        id,
        body: format!("comment {id}"),
        author: "bob".to_owned(),
        created_at: fixture_time(),
        path: Some(path.to_owned()),
        position: Some(position),
    }
}

/// A submitted review.
#[must_use]
pub fn review(id: u64, state: ReviewState) -> PullRequestReview {
    PullRequestReview {
        id,
        body: format!("review {id}"),
        state,
        author: "carol".to_owned(),
        submitted_at: Some(fixture_time()),
    }
}

/// A modified-file patch for `path`.
#[must_use]
pub fn patch(path: &str) -> FilePatch {
    FilePatch {
        path: path.to_owned(),
        patch: Some("@@ -1 +1 @@\n-old\n+new".to_owned()),
        status: PatchStatus::Modified,
        changes: 2,
        additions: 1,
        deletions: 1,
    }
}
