//! Data models for pull request aggregates and their GitHub wire shapes.
//!
//! Types prefixed with `Api` are deserialisation targets for REST responses;
//! they convert into the public domain types that the aggregator assembles
//! and the persistence layer stores.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::locator::RepositoryLocator;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Pull request state as reported by the list endpoint.
///
/// Merged pull requests are reported as `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
    /// The pull request is open.
    Open,
    /// The pull request was closed or merged.
    Closed,
}

impl PullRequestState {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// Review verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    /// The reviewer approved the changes.
    Approved,
    /// The reviewer requested changes.
    ChangesRequested,
    /// The reviewer left comments without a verdict.
    Commented,
    /// The review was dismissed.
    Dismissed,
    /// The review has not been submitted yet.
    Pending,
}

impl ReviewState {
    /// Storage representation, matching GitHub's spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::ChangesRequested => "CHANGES_REQUESTED",
            Self::Commented => "COMMENTED",
            Self::Dismissed => "DISMISSED",
            Self::Pending => "PENDING",
        }
    }
}

/// How a file changed in a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchStatus {
    /// New file.
    Added,
    /// Deleted file.
    Removed,
    /// Edited file.
    Modified,
    /// Moved file, possibly with edits.
    Renamed,
    /// Copied file.
    Copied,
    /// Mode or metadata change.
    Changed,
    /// Listed without changes.
    Unchanged,
}

impl PatchStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
            Self::Renamed => "renamed",
            Self::Copied => "copied",
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
        }
    }
}

/// One entry from the pull request list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSummary {
    /// GitHub's global identifier.
    pub id: u64,
    /// Number within the repository.
    pub number: u64,
    /// Title of the pull request.
    pub title: String,
    /// Open or closed.
    pub state: PullRequestState,
    /// Author login.
    pub author: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Mergeability as reported by the list endpoint, when present.
    pub mergeable_state: Option<String>,
    /// SHA of the base branch head the pull request targets.
    pub base_sha: Option<String>,
}

/// Counters from the pull request detail endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestDetail {
    /// Lines added.
    pub additions: u64,
    /// Lines deleted.
    pub deletions: u64,
    /// Commits on the branch.
    pub commits: u64,
    /// Files touched, as reported by GitHub. The stored count comes from the
    /// file listing instead.
    pub changed_files: u64,
    /// Mergeability (`clean`, `dirty`, `blocked`, ...), computed lazily by GitHub.
    pub mergeable_state: Option<String>,
}

/// A comment on a pull request.
///
/// Inline review comments carry a file path and diff position; issue-level
/// comments carry neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestComment {
    /// Comment identifier.
    pub id: u64,
    /// Comment body.
    pub body: String,
    /// Author login.
    pub author: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// File the comment is attached to.
    pub path: Option<String>,
    /// Position in the diff the comment refers to.
    pub position: Option<u32>,
}

/// A submitted (or pending) review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestReview {
    /// Review identifier.
    pub id: u64,
    /// Review body; empty when the reviewer left none.
    pub body: String,
    /// Verdict.
    pub state: ReviewState,
    /// Author login.
    pub author: String,
    /// Submission time; absent for pending reviews.
    pub submitted_at: Option<DateTime<Utc>>,
}

/// The change to a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePatch {
    /// Path of the file after the change.
    pub path: String,
    /// Unified diff hunk; absent for binary or oversized files.
    pub patch: Option<String>,
    /// How the file changed.
    pub status: PatchStatus,
    /// Total changed lines.
    pub changes: u64,
    /// Lines added.
    pub additions: u64,
    /// Lines deleted.
    pub deletions: u64,
}

/// Size counters for a pull request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullRequestStats {
    /// Number of files listed as changed.
    pub files_changed: u64,
    /// Lines added.
    pub additions: u64,
    /// Lines deleted.
    pub deletions: u64,
    /// Commits on the branch.
    pub commit_count: u64,
}

/// Child collections whose fetch failed part-way.
///
/// A truncated collection holds only the items gathered before the failure,
/// so persistence must not treat it as the complete current state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TruncatedCollections {
    /// File patches are incomplete.
    pub patches: bool,
    /// Comments are incomplete.
    pub comments: bool,
    /// Reviews are incomplete.
    pub reviews: bool,
}

impl TruncatedCollections {
    /// True when any collection is incomplete.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.patches || self.comments || self.reviews
    }
}

/// A pull request and everything fetched about it: one persistence unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestAggregate {
    /// GitHub's global identifier.
    pub id: u64,
    /// Owning repository owner.
    pub repo_owner: String,
    /// Owning repository name.
    pub repo_name: String,
    /// Number within the repository.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Open or closed.
    pub state: PullRequestState,
    /// Author login; empty when GitHub reports a deleted user.
    pub author: String,
    /// Full unified diff; empty when the diff could not be fetched.
    pub diff: String,
    /// Size counters.
    pub stats: PullRequestStats,
    /// Mergeability, when GitHub has computed it.
    pub mergeable_state: Option<String>,
    /// SHA of the base commit.
    pub base_commit_sha: String,
    /// Browser permalink to the base commit.
    pub base_commit_link: String,
    /// When this aggregate was assembled.
    pub processed_at: DateTime<Utc>,
    /// Inline review comments followed by issue comments.
    pub comments: Vec<PullRequestComment>,
    /// Reviews in submission order.
    pub reviews: Vec<PullRequestReview>,
    /// Per-file patches.
    pub patches: Vec<FilePatch>,
    /// Collections whose fetch did not complete.
    pub truncated: TruncatedCollections,
}

impl PullRequestAggregate {
    /// Starts an aggregate from a list entry, with every dependent field at
    /// its zero value.
    #[must_use]
    pub fn from_summary(
        repository: &RepositoryLocator,
        summary: PullRequestSummary,
        processed_at: DateTime<Utc>,
    ) -> Self {
        let base_commit_sha = summary.base_sha.unwrap_or_default();
        let base_commit_link = if base_commit_sha.is_empty() {
            String::new()
        } else {
            repository.commit_url(&base_commit_sha)
        };

        Self {
            id: summary.id,
            repo_owner: repository.owner().as_str().to_owned(),
            repo_name: repository.repository().as_str().to_owned(),
            number: summary.number,
            title: summary.title,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
            state: summary.state,
            author: summary.author.unwrap_or_default(),
            diff: String::new(),
            stats: PullRequestStats::default(),
            mergeable_state: summary.mergeable_state,
            base_commit_sha,
            base_commit_link,
            processed_at,
            comments: Vec::new(),
            reviews: Vec::new(),
            patches: Vec::new(),
            truncated: TruncatedCollections::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiUser {
    pub(crate) login: Option<String>,
}

fn login(user: Option<ApiUser>) -> Option<String> {
    user.and_then(|value| value.login)
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiBranch {
    pub(crate) sha: Option<String>,
}

/// API response type for PR listing.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiPullRequestSummary {
    pub(crate) id: u64,
    pub(crate) number: u64,
    pub(crate) title: Option<String>,
    pub(crate) state: PullRequestState,
    pub(crate) user: Option<ApiUser>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) mergeable_state: Option<String>,
    pub(crate) base: Option<ApiBranch>,
}

/// API response type for a single PR.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiPullRequestDetail {
    pub(crate) additions: Option<u64>,
    pub(crate) deletions: Option<u64>,
    pub(crate) commits: Option<u64>,
    pub(crate) changed_files: Option<u64>,
    pub(crate) mergeable_state: Option<String>,
}

/// API response type for the PR files listing.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiFile {
    pub(crate) filename: String,
    pub(crate) status: PatchStatus,
    #[serde(default)]
    pub(crate) additions: u64,
    #[serde(default)]
    pub(crate) deletions: u64,
    #[serde(default)]
    pub(crate) changes: u64,
    pub(crate) patch: Option<String>,
}

/// API response type for inline review comments.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiReviewComment {
    pub(crate) id: u64,
    pub(crate) body: Option<String>,
    pub(crate) user: Option<ApiUser>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) path: Option<String>,
    pub(crate) position: Option<u32>,
}

/// API response type for issue-level comments.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiIssueComment {
    pub(crate) id: u64,
    pub(crate) body: Option<String>,
    pub(crate) user: Option<ApiUser>,
    pub(crate) created_at: DateTime<Utc>,
}

/// API response type for reviews.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiReview {
    pub(crate) id: u64,
    pub(crate) body: Option<String>,
    pub(crate) state: ReviewState,
    pub(crate) user: Option<ApiUser>,
    pub(crate) submitted_at: Option<DateTime<Utc>>,
}

impl From<ApiPullRequestSummary> for PullRequestSummary {
    fn from(value: ApiPullRequestSummary) -> Self {
        Self {
            id: value.id,
            number: value.number,
            title: value.title.unwrap_or_default(),
            state: value.state,
            author: login(value.user),
            created_at: value.created_at,
            updated_at: value.updated_at,
            mergeable_state: value.mergeable_state,
            base_sha: value.base.and_then(|branch| branch.sha),
        }
    }
}

impl From<ApiPullRequestDetail> for PullRequestDetail {
    fn from(value: ApiPullRequestDetail) -> Self {
        Self {
            additions: value.additions.unwrap_or_default(),
            deletions: value.deletions.unwrap_or_default(),
            commits: value.commits.unwrap_or_default(),
            changed_files: value.changed_files.unwrap_or_default(),
            mergeable_state: value.mergeable_state,
        }
    }
}

impl From<ApiFile> for FilePatch {
    fn from(value: ApiFile) -> Self {
        Self {
            path: value.filename,
            patch: value.patch,
            status: value.status,
            changes: value.changes,
            additions: value.additions,
            deletions: value.deletions,
        }
    }
}

impl From<ApiReviewComment> for PullRequestComment {
    fn from(value: ApiReviewComment) -> Self {
        Self {
            id: value.id,
            body: value.body.unwrap_or_default(),
            author: login(value.user).unwrap_or_default(),
            created_at: value.created_at,
            path: value.path,
            position: value.position,
        }
    }
}

impl From<ApiIssueComment> for PullRequestComment {
    fn from(value: ApiIssueComment) -> Self {
        Self {
            id: value.id,
            body: value.body.unwrap_or_default(),
            author: login(value.user).unwrap_or_default(),
            created_at: value.created_at,
            path: None,
            position: None,
        }
    }
}

impl From<ApiReview> for PullRequestReview {
    fn from(value: ApiReview) -> Self {
        Self {
            id: value.id,
            body: value.body.unwrap_or_default(),
            state: value.state,
            author: login(value.user).unwrap_or_default(),
            submitted_at: value.submitted_at,
        }
    }
}
