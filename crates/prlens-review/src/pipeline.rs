use prlens_core::{FileDiff, PrLensConfig, PrLensError, PrMetadata, PullSummary};
use serde::Serialize;
use tracing::{error, info};

use crate::github::GitHubClient;
use crate::llm::LlmClient;
use crate::prompt::ReviewContext;
use crate::schema::Review;

/// Result of analyzing one pull request.
///
/// `files` repeats `pr.files` at the top level so a front-end can render
/// evidence snippets without digging into the PR object.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub review: Review,
    pub pr: PrMetadata,
    pub files: Vec<FileDiff>,
}

/// Orchestrates fetch, context building and LLM review for a single PR.
///
/// Steps run strictly in sequence and the first error ends the run; no
/// partial report is ever produced.
pub struct Analyzer {
    github: GitHubClient,
    llm: LlmClient,
}

impl Analyzer {
    /// Create an analyzer from already constructed clients.
    pub fn new(github: GitHubClient, llm: LlmClient) -> Self {
        Self { github, llm }
    }

    /// Build both clients from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client cannot be built.
    ///
    /// # Examples
    ///
    /// ```
    /// use prlens_core::PrLensConfig;
    /// use prlens_review::pipeline::Analyzer;
    ///
    /// let analyzer = Analyzer::from_config(&PrLensConfig::default()).unwrap();
    /// assert_eq!(analyzer.model(), "gpt-4-turbo");
    /// ```
    pub fn from_config(config: &PrLensConfig) -> Result<Self, PrLensError> {
        Ok(Self::new(
            GitHubClient::new(&config.github)?,
            LlmClient::new(&config.llm)?,
        ))
    }

    /// Model identifier used for reviews.
    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Fetch the pull request at `pr_url` and have the LLM review it.
    ///
    /// # Errors
    ///
    /// Propagates any fetch, LLM, or validation error unchanged.
    pub async fn analyze(&self, pr_url: &str) -> Result<AnalysisReport, PrLensError> {
        info!(%pr_url, "analyzing pull request");

        let run = async {
            info!("fetching PR details from GitHub");
            let pr = self.github.get_pr_details(pr_url).await?;

            let context = ReviewContext::from_metadata(&pr);

            info!(model = %self.llm.model(), files = pr.files.len(), "sending to LLM for analysis");
            let review = self.llm.review(&context, &pr.files).await?;

            Ok::<_, PrLensError>(AnalysisReport {
                review,
                files: pr.files.clone(),
                pr,
            })
        };

        match run.await {
            Ok(report) => {
                info!("analysis complete");
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "analysis failed");
                Err(e)
            }
        }
    }

    /// List open pull requests of the repository `repo_url` points at.
    ///
    /// # Errors
    ///
    /// See [`GitHubClient::list_open_prs`].
    pub async fn list_open_prs(&self, repo_url: &str) -> Result<Vec<PullSummary>, PrLensError> {
        self.github.list_open_prs(repo_url).await
    }
}
