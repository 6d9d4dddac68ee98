//! Repository identity wrappers and API path construction.

use std::fmt;

use url::Url;

use super::error::IntakeError;

const GITHUB_WEB: &str = "https://github.com";
const GITHUB_API: &str = "https://api.github.com";

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    pub(crate) fn new(value: &str) -> Result<Self, IntakeError> {
        if value.is_empty() {
            return Err(IntakeError::MissingPathSegments);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub(crate) fn new(value: &str) -> Result<Self, IntakeError> {
        if value.is_empty() {
            return Err(IntakeError::MissingPathSegments);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::MissingToken` when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, IntakeError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IntakeError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

impl fmt::Debug for PersonalAccessToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("PersonalAccessToken(<redacted>)")
    }
}

/// Derives the GitHub API base URL from a web URL.
///
/// `github.com` maps to `api.github.com`; any other host is treated as GitHub
/// Enterprise, whose REST API lives under `/api/v3` on the same authority.
fn derive_api_base(web: &Url) -> Result<Url, IntakeError> {
    let host = web
        .host_str()
        .ok_or_else(|| IntakeError::InvalidUrl("URL must include a host".to_owned()))?;

    if host.eq_ignore_ascii_case("github.com") {
        return Url::parse(GITHUB_API).map_err(|error| IntakeError::InvalidUrl(error.to_string()));
    }

    let mut api_url = web.clone();
    api_url.set_path("api/v3");
    api_url.set_query(None);
    api_url.set_fragment(None);
    Ok(api_url)
}

fn web_root(parsed: &Url) -> Url {
    let mut root = parsed.clone();
    root.set_path("");
    root.set_query(None);
    root.set_fragment(None);
    root
}

/// A repository on a GitHub (or GitHub Enterprise) host.
///
/// # Example
///
/// ```
/// use prledger::github::RepositoryLocator;
///
/// let locator = RepositoryLocator::parse("https://github.com/acme/widgets")
///     .expect("should parse repository URL");
/// assert_eq!(locator.owner().as_str(), "acme");
/// assert_eq!(locator.repository().as_str(), "widgets");
/// assert_eq!(locator.api_base().as_str(), "https://api.github.com/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocator {
    web_base: Url,
    api_base: Url,
    owner: RepositoryOwner,
    repository: RepositoryName,
}

impl RepositoryLocator {
    /// Creates a repository locator on `github.com`.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::MissingPathSegments` when owner or repo is empty.
    pub fn from_owner_repo(owner: &str, repo: &str) -> Result<Self, IntakeError> {
        Self::parse(&format!("{GITHUB_WEB}/{owner}/{repo}"))
    }

    /// Parses `owner/name` relative to the web host `web_base`
    /// (e.g. `https://github.com`).
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::InvalidRepository` when the slug is not exactly
    /// two non-empty segments, or `IntakeError::InvalidUrl` when the host
    /// cannot be parsed.
    pub fn from_slug(web_base: &str, slug: &str) -> Result<Self, IntakeError> {
        let invalid = || IntakeError::InvalidRepository {
            entry: slug.to_owned(),
        };
        let (owner, name) = slug.trim().split_once('/').ok_or_else(invalid)?;
        let (owner_trimmed, name_trimmed) = (owner.trim(), name.trim());
        if owner_trimmed.is_empty() || name_trimmed.is_empty() || name_trimmed.contains('/') {
            return Err(invalid());
        }

        let base = web_base.trim_end_matches('/');
        Self::parse(&format!("{base}/{owner_trimmed}/{name_trimmed}"))
    }

    /// Parses a repository URL in the form `https://<host>/<owner>/<repo>`.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::InvalidUrl` when parsing fails or
    /// `MissingPathSegments` when the URL path is not `/owner/repo`.
    pub fn parse(input: &str) -> Result<Self, IntakeError> {
        let parsed =
            Url::parse(input).map_err(|error| IntakeError::InvalidUrl(error.to_string()))?;

        let mut segments = parsed
            .path_segments()
            .ok_or(IntakeError::MissingPathSegments)?;

        let owner_segment = segments.next().ok_or(IntakeError::MissingPathSegments)?;
        let repository_segment = segments.next().ok_or(IntakeError::MissingPathSegments)?;

        let owner = RepositoryOwner::new(owner_segment)?;
        let repository = RepositoryName::new(repository_segment)?;
        let api_base = derive_api_base(&parsed)?;

        Ok(Self {
            web_base: web_root(&parsed),
            api_base,
            owner,
            repository,
        })
    }

    /// API base URL derived from the repository host.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    /// `owner/name`, as used in log output.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner.as_str(), self.repository.as_str())
    }

    /// Browser permalink for `sha` in this repository.
    #[must_use]
    pub fn commit_url(&self, sha: &str) -> String {
        format!(
            "{}/{}/{}/commit/{sha}",
            self.web_base.as_str().trim_end_matches('/'),
            self.owner.as_str(),
            self.repository.as_str()
        )
    }

    /// Returns the API path for listing pull requests.
    pub(crate) fn pulls_path(&self) -> String {
        format!(
            "/repos/{}/{}/pulls",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }

    pub(crate) fn pull_request_path(&self, number: u64) -> String {
        format!("{}/{number}", self.pulls_path())
    }

    pub(crate) fn files_path(&self, number: u64) -> String {
        format!("{}/{number}/files", self.pulls_path())
    }

    pub(crate) fn review_comments_path(&self, number: u64) -> String {
        format!("{}/{number}/comments", self.pulls_path())
    }

    pub(crate) fn reviews_path(&self, number: u64) -> String {
        format!("{}/{number}/reviews", self.pulls_path())
    }

    pub(crate) fn issue_comments_path(&self, number: u64) -> String {
        format!(
            "/repos/{}/{}/issues/{number}/comments",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }
}

impl fmt::Display for RepositoryLocator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}/{}",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{PersonalAccessToken, RepositoryLocator};
    use crate::github::error::IntakeError;

    #[test]
    fn github_com_repositories_use_public_api() {
        let locator =
            RepositoryLocator::from_owner_repo("acme", "widgets").expect("locator should build");

        assert_eq!(locator.api_base().as_str(), "https://api.github.com/");
        assert_eq!(locator.full_name(), "acme/widgets");
        assert_eq!(
            locator.commit_url("abc123"),
            "https://github.com/acme/widgets/commit/abc123"
        );
    }

    #[test]
    fn enterprise_hosts_derive_api_v3_base() {
        let locator = RepositoryLocator::parse("https://ghe.example.com:8443/acme/widgets")
            .expect("locator should parse");

        assert_eq!(
            locator.api_base().as_str(),
            "https://ghe.example.com:8443/api/v3"
        );
        assert_eq!(
            locator.commit_url("abc"),
            "https://ghe.example.com:8443/acme/widgets/commit/abc"
        );
    }

    #[test]
    fn api_paths_cover_every_resource() {
        let locator =
            RepositoryLocator::from_owner_repo("acme", "widgets").expect("locator should build");

        assert_eq!(locator.pulls_path(), "/repos/acme/widgets/pulls");
        assert_eq!(locator.pull_request_path(7), "/repos/acme/widgets/pulls/7");
        assert_eq!(locator.files_path(7), "/repos/acme/widgets/pulls/7/files");
        assert_eq!(
            locator.review_comments_path(7),
            "/repos/acme/widgets/pulls/7/comments"
        );
        assert_eq!(locator.reviews_path(7), "/repos/acme/widgets/pulls/7/reviews");
        assert_eq!(
            locator.issue_comments_path(7),
            "/repos/acme/widgets/issues/7/comments"
        );
    }

    #[rstest]
    #[case::plain("acme/widgets", "acme", "widgets")]
    #[case::padded(" acme / widgets ", "acme", "widgets")]
    fn from_slug_accepts_owner_name_pairs(
        #[case] slug: &str,
        #[case] owner: &str,
        #[case] name: &str,
    ) {
        let locator =
            RepositoryLocator::from_slug("https://github.com/", slug).expect("slug should parse");
        assert_eq!(locator.owner().as_str(), owner);
        assert_eq!(locator.repository().as_str(), name);
    }

    #[rstest]
    #[case::no_slash("widgets")]
    #[case::empty_owner("/widgets")]
    #[case::empty_name("acme/")]
    #[case::too_many("acme/widgets/extra")]
    fn from_slug_rejects_malformed_entries(#[case] slug: &str) {
        let error = RepositoryLocator::from_slug("https://github.com", slug)
            .expect_err("slug should be rejected");
        assert_eq!(
            error,
            IntakeError::InvalidRepository {
                entry: slug.to_owned()
            }
        );
    }

    #[test]
    fn token_debug_output_is_redacted() {
        let token = PersonalAccessToken::new("  ghp_secret  ").expect("token should be valid");
        assert_eq!(token.value(), "ghp_secret");
        assert!(!format!("{token:?}").contains("ghp_secret"));
    }

    #[test]
    fn blank_tokens_are_rejected() {
        assert_eq!(
            PersonalAccessToken::new("   "),
            Err(IntakeError::MissingToken)
        );
    }
}
