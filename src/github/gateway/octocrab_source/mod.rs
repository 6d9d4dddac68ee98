//! Octocrab-backed pull request source.
//!
//! Requests go through Octocrab's raw GET so that the `Link` and
//! `X-RateLimit-*` headers stay visible; bodies are decoded here.

use async_trait::async_trait;
use http::header::ACCEPT;
use http::{HeaderMap, HeaderValue, Uri};
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use url::Url;

use crate::github::error::IntakeError;
use crate::github::locator::{PersonalAccessToken, RepositoryLocator};
use crate::github::models::{
    ApiFile, ApiIssueComment, ApiPullRequestDetail, ApiPullRequestSummary, ApiReview,
    ApiReviewComment, FilePatch, PullRequestComment, PullRequestDetail, PullRequestReview,
    PullRequestSummary,
};
use crate::github::rate_limit::RateLimitInfo;

use super::client::build_octocrab_client;
use super::error_mapping::{map_http_error, map_octocrab_error};
use super::http_utils::{extract_github_message, next_page_from_link};
use super::{ApiResponse, Page, PullRequestSource};

/// Page size for the pull request listing.
pub(crate) const PULLS_PER_PAGE: u8 = 50;

/// Page size for files, comments and reviews.
pub(crate) const DETAIL_PER_PAGE: u8 = 100;

const DIFF_MEDIA_TYPE: &str = "application/vnd.github.diff";

/// Undecoded body plus the metadata every response carries.
struct RawResponse {
    body: String,
    next_page: Option<u32>,
    rate_limit: Option<RateLimitInfo>,
}

impl RawResponse {
    fn decode<T: DeserializeOwned>(self, operation: &str) -> Result<ApiResponse<T>, IntakeError> {
        let body: T = serde_json::from_str(&self.body).map_err(|error| {
            IntakeError::api(format!(
                "{operation} response deserialisation failed: {error}"
            ))
        })?;
        Ok(ApiResponse::new(body)
            .with_next_page(self.next_page)
            .with_rate_limit(self.rate_limit))
    }

    fn decode_page<A, T>(self, operation: &str) -> Result<Page<T>, IntakeError>
    where
        A: DeserializeOwned + Into<T>,
    {
        let page = self.decode::<Vec<A>>(operation)?;
        Ok(ApiResponse {
            body: page.body.into_iter().map(Into::into).collect(),
            next_page: page.next_page,
            rate_limit: page.rate_limit,
        })
    }
}

/// Pull request source talking to a GitHub or GitHub Enterprise REST API.
pub struct OctocrabPullRequestSource {
    client: Octocrab,
}

impl OctocrabPullRequestSource {
    /// Creates a source from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Builds an authenticated client for the API rooted at `api_base`.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::InvalidUrl` when the base URI cannot be parsed or
    /// `IntakeError::Api` when Octocrab fails to construct a client.
    pub fn for_token(token: &PersonalAccessToken, api_base: &Url) -> Result<Self, IntakeError> {
        let octocrab = build_octocrab_client(token, api_base)?;
        Ok(Self::new(octocrab))
    }

    async fn get(
        &self,
        operation: &str,
        path_and_query: &str,
        accept: Option<&'static str>,
    ) -> Result<RawResponse, IntakeError> {
        let uri: Uri = path_and_query
            .parse::<Uri>()
            .map_err(|error| IntakeError::InvalidUrl(error.to_string()))?;
        let headers = accept.map(|media_type| {
            let mut map = HeaderMap::new();
            map.insert(ACCEPT, HeaderValue::from_static(media_type));
            map
        });

        let response = self
            .client
            ._get_with_headers(uri, headers)
            .await
            .map_err(|error| map_octocrab_error(operation, &error))?;

        let status = response.status();
        let rate_limit = RateLimitInfo::from_headers(response.headers());
        let next_page = next_page_from_link(response.headers());

        if !status.is_success() {
            let body = self
                .client
                .body_to_string(response)
                .await
                .unwrap_or_default();
            return Err(map_http_error(
                operation,
                status,
                extract_github_message(&body),
                rate_limit,
            ));
        }

        let body = self
            .client
            .body_to_string(response)
            .await
            .map_err(|error| {
                IntakeError::api(format!("{operation} response decode failed: {error}"))
            })?;

        Ok(RawResponse {
            body,
            next_page,
            rate_limit,
        })
    }
}

fn paged(path: &str, per_page: u8, page: u32) -> String {
    format!("{path}?per_page={per_page}&page={page}")
}

#[async_trait]
impl PullRequestSource for OctocrabPullRequestSource {
    async fn list_pull_requests(
        &self,
        repository: &RepositoryLocator,
        page: u32,
    ) -> Result<Page<PullRequestSummary>, IntakeError> {
        let request = format!(
            "{path}?state=all&sort=updated&direction=desc&per_page={PULLS_PER_PAGE}&page={page}",
            path = repository.pulls_path()
        );
        self.get("list pulls", &request, None)
            .await?
            .decode_page::<ApiPullRequestSummary, _>("list pulls")
    }

    async fn pull_request(
        &self,
        repository: &RepositoryLocator,
        number: u64,
    ) -> Result<ApiResponse<PullRequestDetail>, IntakeError> {
        let response = self
            .get("pull request", &repository.pull_request_path(number), None)
            .await?
            .decode::<ApiPullRequestDetail>("pull request")?;
        Ok(ApiResponse {
            body: response.body.into(),
            next_page: response.next_page,
            rate_limit: response.rate_limit,
        })
    }

    async fn list_files(
        &self,
        repository: &RepositoryLocator,
        number: u64,
        page: u32,
    ) -> Result<Page<FilePatch>, IntakeError> {
        let request = paged(&repository.files_path(number), DETAIL_PER_PAGE, page);
        self.get("list files", &request, None)
            .await?
            .decode_page::<ApiFile, _>("list files")
    }

    async fn raw_diff(
        &self,
        repository: &RepositoryLocator,
        number: u64,
    ) -> Result<ApiResponse<String>, IntakeError> {
        let raw = self
            .get(
                "diff",
                &repository.pull_request_path(number),
                Some(DIFF_MEDIA_TYPE),
            )
            .await?;
        Ok(ApiResponse::new(raw.body)
            .with_next_page(raw.next_page)
            .with_rate_limit(raw.rate_limit))
    }

    async fn list_review_comments(
        &self,
        repository: &RepositoryLocator,
        number: u64,
        page: u32,
    ) -> Result<Page<PullRequestComment>, IntakeError> {
        let request = paged(&repository.review_comments_path(number), DETAIL_PER_PAGE, page);
        self.get("review comments", &request, None)
            .await?
            .decode_page::<ApiReviewComment, _>("review comments")
    }

    async fn list_issue_comments(
        &self,
        repository: &RepositoryLocator,
        number: u64,
        page: u32,
    ) -> Result<Page<PullRequestComment>, IntakeError> {
        let request = paged(&repository.issue_comments_path(number), DETAIL_PER_PAGE, page);
        self.get("issue comments", &request, None)
            .await?
            .decode_page::<ApiIssueComment, _>("issue comments")
    }

    async fn list_reviews(
        &self,
        repository: &RepositoryLocator,
        number: u64,
        page: u32,
    ) -> Result<Page<PullRequestReview>, IntakeError> {
        let request = paged(&repository.reviews_path(number), DETAIL_PER_PAGE, page);
        self.get("reviews", &request, None)
            .await?
            .decode_page::<ApiReview, _>("reviews")
    }
}
