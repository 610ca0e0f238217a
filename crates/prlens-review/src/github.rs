use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use prlens_core::{FileDiff, FileStatus, GitHubConfig, PrLensError, PrMetadata, PullSummary};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::url::parse_github_url;

/// Most recently updated open PRs returned by [`GitHubClient::list_open_prs`].
pub const OPEN_PR_LIMIT: usize = 20;

const FILES_PER_PAGE: usize = 100;
// The pull request files endpoint stops at 3000 files.
const MAX_FILE_PAGES: usize = 30;

/// GitHub REST client for pull request listings, details and file diffs.
///
/// # Examples
///
/// ```
/// use prlens_core::GitHubConfig;
/// use prlens_review::github::GitHubClient;
///
/// let client = GitHubClient::new(&GitHubConfig::default()).unwrap();
/// ```
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Deserialize)]
struct ApiPull {
    number: u64,
    #[serde(default)]
    title: String,
    body: Option<String>,
    user: Option<ApiUser>,
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    html_url: String,
}

#[derive(Deserialize)]
struct ApiFile {
    filename: String,
    status: FileStatus,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    patch: Option<String>,
}

impl From<ApiFile> for FileDiff {
    fn from(f: ApiFile) -> Self {
        FileDiff {
            filename: f.filename,
            status: f.status,
            additions: f.additions,
            deletions: f.deletions,
            patch: f.patch,
        }
    }
}

fn login(user: Option<ApiUser>) -> String {
    user.map(|u| u.login).unwrap_or_else(|| "ghost".into())
}

impl GitHubClient {
    /// Create a client from configuration.
    ///
    /// A missing token is not an error here; every fetch reports it.
    ///
    /// # Errors
    ///
    /// Returns [`PrLensError::UpstreamApi`] if the HTTP client cannot be built.
    pub fn new(config: &GitHubConfig) -> Result<Self, PrLensError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("prlens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PrLensError::UpstreamApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn token(&self) -> Result<&str, PrLensError> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(PrLensError::MissingCredentials("GITHUB_TOKEN"))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        route: &str,
        query: &[(&str, String)],
    ) -> Result<T, PrLensError> {
        let token = self.token()?;
        let url = format!("{}{route}", self.api_url);
        debug!(%url, "GitHub API request");

        let response = self
            .http
            .get(&url)
            .query(query)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {token}"))
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await
            .map_err(|e| transport_error(route, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PrLensError::UpstreamApi(format!(
                "{status} for {route}: {body}"
            )));
        }

        response.json().await.map_err(|e| {
            if e.is_timeout() {
                transport_error(route, e)
            } else {
                PrLensError::UpstreamApi(format!("failed to decode {route}: {e}"))
            }
        })
    }

    /// List up to [`OPEN_PR_LIMIT`] open pull requests, most recently updated first.
    ///
    /// `repo_url` may be a repository or a pull request URL; any PR number
    /// is ignored.
    ///
    /// # Errors
    ///
    /// - [`PrLensError::MissingCredentials`] if no token is configured
    /// - [`PrLensError::InvalidUrl`] if the URL is not a GitHub repository URL
    /// - [`PrLensError::UpstreamApi`] / [`PrLensError::UpstreamTimeout`] on API failure
    pub async fn list_open_prs(&self, repo_url: &str) -> Result<Vec<PullSummary>, PrLensError> {
        self.token()?;
        let target = parse_github_url(repo_url)?;

        let route = format!("/repos/{}/{}/pulls", target.owner, target.repo);
        let query = [
            ("state", "open".to_string()),
            ("sort", "updated".to_string()),
            ("direction", "desc".to_string()),
            ("per_page", OPEN_PR_LIMIT.to_string()),
        ];
        let pulls: Vec<ApiPull> = self.get_json(&route, &query).await?;

        Ok(pulls
            .into_iter()
            .take(OPEN_PR_LIMIT)
            .map(|p| PullSummary {
                number: p.number,
                title: p.title,
                user: login(p.user),
                updated_at: p
                    .updated_at
                    .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, false))
                    .unwrap_or_default(),
                url: p.html_url,
            })
            .collect())
    }

    /// Fetch title, body, author and every changed file of a pull request.
    ///
    /// # Errors
    ///
    /// - [`PrLensError::MissingCredentials`] if no token is configured,
    ///   checked before the URL is looked at
    /// - [`PrLensError::InvalidUrl`] if the URL is not a GitHub URL
    /// - [`PrLensError::MissingPrNumber`] if the URL names no pull request
    /// - [`PrLensError::UpstreamApi`] / [`PrLensError::UpstreamTimeout`] on API failure
    pub async fn get_pr_details(&self, pr_url: &str) -> Result<PrMetadata, PrLensError> {
        self.token()?;
        let target = parse_github_url(pr_url)?;
        let Some(number) = target.pr_number else {
            return Err(PrLensError::MissingPrNumber(pr_url.to_string()));
        };

        let route = format!("/repos/{}/{}/pulls/{number}", target.owner, target.repo);
        let pull: ApiPull = self.get_json(&route, &[]).await?;

        let files_route = format!("{route}/files");
        let mut files: Vec<FileDiff> = Vec::new();
        for page in 1..=MAX_FILE_PAGES {
            let query = [
                ("per_page", FILES_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            let batch: Vec<ApiFile> = self.get_json(&files_route, &query).await?;
            let short_page = batch.len() < FILES_PER_PAGE;
            files.extend(batch.into_iter().map(FileDiff::from));
            if short_page {
                break;
            }
        }

        debug!(
            owner = %target.owner,
            repo = %target.repo,
            number,
            files = files.len(),
            "fetched pull request"
        );

        Ok(PrMetadata {
            title: pull.title,
            body: pull.body.unwrap_or_default(),
            author: login(pull.user),
            files,
        })
    }
}

fn transport_error(route: &str, e: reqwest::Error) -> PrLensError {
    if e.is_timeout() {
        PrLensError::UpstreamTimeout(format!("GitHub request {route}: {e}"))
    } else {
        PrLensError::UpstreamApi(format!("request {route} failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    fn client_for(server: &mockito::Server) -> GitHubClient {
        GitHubClient::new(&GitHubConfig {
            token: Some("ghp_test".into()),
            api_url: server.url(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn api_file(name: &str, patch: Option<&str>) -> serde_json::Value {
        json!({
            "sha": "abc",
            "filename": name,
            "status": "modified",
            "additions": 1,
            "deletions": 1,
            "changes": 2,
            "patch": patch,
        })
    }

    #[tokio::test]
    async fn details_require_token_even_for_bad_urls() {
        let client = GitHubClient::new(&GitHubConfig::default()).unwrap();
        for url in ["https://github.com/acme/widgets/pull/42", "not a url"] {
            let err = client.get_pr_details(url).await.unwrap_err();
            assert!(matches!(err, PrLensError::MissingCredentials("GITHUB_TOKEN")));
        }
    }

    #[tokio::test]
    async fn listing_requires_token() {
        let client = GitHubClient::new(&GitHubConfig::default()).unwrap();
        let err = client
            .list_open_prs("https://github.com/acme/widgets")
            .await
            .unwrap_err();
        assert!(matches!(err, PrLensError::MissingCredentials(_)));
    }

    #[tokio::test]
    async fn details_require_pr_number() {
        let server = mockito::Server::new_async().await;
        let client = client_for(&server);
        let err = client
            .get_pr_details("https://github.com/acme/widgets")
            .await
            .unwrap_err();
        assert!(matches!(err, PrLensError::MissingPrNumber(_)));
    }

    #[tokio::test]
    async fn details_fetch_metadata_and_files() {
        let mut server = mockito::Server::new_async().await;
        let pull = server
            .mock("GET", "/repos/acme/widgets/pulls/42")
            .match_header("authorization", "Bearer ghp_test")
            .with_status(200)
            .with_body(
                json!({
                    "number": 42,
                    "title": "Speed up parser",
                    "body": null,
                    "user": { "login": "octocat" },
                    "updated_at": "2024-05-01T12:00:00Z",
                    "html_url": "https://github.com/acme/widgets/pull/42"
                })
                .to_string(),
            )
            .create_async()
            .await;
        let files = server
            .mock("GET", "/repos/acme/widgets/pulls/42/files")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("per_page".into(), "100".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(
                json!([
                    api_file("src/parser.rs", Some("@@ -1 +1 @@\n-a\n+b")),
                    api_file("fixtures/blob.bin", None),
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let pr = client
            .get_pr_details("https://github.com/acme/widgets/pull/42")
            .await
            .unwrap();

        assert_eq!(pr.title, "Speed up parser");
        assert_eq!(pr.body, "");
        assert_eq!(pr.author, "octocat");
        assert_eq!(pr.files.len(), 2);
        assert_eq!(pr.files[0].filename, "src/parser.rs");
        assert_eq!(pr.files[0].status, FileStatus::Modified);
        assert!(pr.files[0].has_patch());
        assert!(pr.files[1].patch.is_none());
        pull.assert_async().await;
        files.assert_async().await;
    }

    #[tokio::test]
    async fn details_follow_file_pages() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/widgets/pulls/7")
            .with_status(200)
            .with_body(json!({"number": 7, "title": "Big", "body": "b", "user": {"login": "u"}}).to_string())
            .create_async()
            .await;

        let first: Vec<serde_json::Value> = (0..100)
            .map(|i| api_file(&format!("f{i}.rs"), Some("@@ -1 +1 @@\n+x")))
            .collect();
        server
            .mock("GET", "/repos/acme/widgets/pulls/7/files")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_body(serde_json::Value::Array(first).to_string())
            .create_async()
            .await;
        let second = server
            .mock("GET", "/repos/acme/widgets/pulls/7/files")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_body(json!([api_file("last.rs", None)]).to_string())
            .create_async()
            .await;

        let client = client_for(&server);
        let pr = client
            .get_pr_details("https://github.com/acme/widgets/pull/7")
            .await
            .unwrap();
        assert_eq!(pr.files.len(), 101);
        assert_eq!(pr.files[100].filename, "last.rs");
        second.assert_async().await;
    }

    #[tokio::test]
    async fn not_found_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/widgets/pulls/999")
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .get_pr_details("https://github.com/acme/widgets/pull/999")
            .await
            .unwrap_err();
        assert!(matches!(err, PrLensError::UpstreamApi(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn list_open_prs_is_capped_and_mapped() {
        let mut server = mockito::Server::new_async().await;
        let pulls: Vec<serde_json::Value> = (1..=25)
            .map(|n| {
                json!({
                    "number": n,
                    "title": format!("PR {n}"),
                    "user": { "login": "dev" },
                    "updated_at": "2024-05-01T12:00:00Z",
                    "html_url": format!("https://github.com/acme/widgets/pull/{n}")
                })
            })
            .collect();
        let mock = server
            .mock("GET", "/repos/acme/widgets/pulls")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("state".into(), "open".into()),
                Matcher::UrlEncoded("sort".into(), "updated".into()),
                Matcher::UrlEncoded("direction".into(), "desc".into()),
            ]))
            .with_status(200)
            .with_body(serde_json::Value::Array(pulls).to_string())
            .create_async()
            .await;

        let client = client_for(&server);
        let prs = client
            .list_open_prs("https://github.com/acme/widgets/pull/3")
            .await
            .unwrap();
        assert_eq!(prs.len(), OPEN_PR_LIMIT);
        assert_eq!(prs[0].number, 1);
        assert_eq!(prs[0].user, "dev");
        assert_eq!(prs[0].updated_at, "2024-05-01T12:00:00+00:00");
        assert_eq!(prs[0].url, "https://github.com/acme/widgets/pull/1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_rejects_foreign_host() {
        let server = mockito::Server::new_async().await;
        let client = client_for(&server);
        let err = client
            .list_open_prs("https://example.com/acme/widgets")
            .await
            .unwrap_err();
        assert!(matches!(err, PrLensError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn slow_api_is_upstream_timeout() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/widgets/pulls/42")
            .with_status(200)
            .with_body_from_request(|_| {
                std::thread::sleep(std::time::Duration::from_secs(3));
                b"{}".to_vec()
            })
            .create_async()
            .await;

        let client = GitHubClient::new(&GitHubConfig {
            token: Some("ghp_test".into()),
            api_url: server.url(),
            timeout_secs: 1,
        })
        .unwrap();
        let err = client
            .get_pr_details("https://github.com/acme/widgets/pull/42")
            .await
            .unwrap_err();
        assert!(matches!(err, PrLensError::UpstreamTimeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn pull_zero_is_missing_number() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = client_for(&server)
            .get_pr_details("https://github.com/acme/widgets/pull/0")
            .await
            .unwrap_err();
        assert!(matches!(err, PrLensError::MissingPrNumber(_)));
        mock.assert_async().await;
    }
}
