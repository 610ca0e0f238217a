use miette::Diagnostic;

/// Errors that can occur while fetching, analyzing, or serving a pull request.
///
/// None of these are recovered internally: every variant terminates the
/// request it occurred in and surfaces its message to the caller.
///
/// # Examples
///
/// ```
/// use prlens_core::PrLensError;
///
/// let err = PrLensError::MissingCredentials("GITHUB_TOKEN");
/// assert!(err.to_string().contains("GITHUB_TOKEN"));
/// ```
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum PrLensError {
    /// The URL does not point at the expected hosting domain, or is too short.
    #[error("invalid GitHub URL: {0}")]
    #[diagnostic(help("expected https://github.com/<owner>/<repo>[/pull/<number>]"))]
    InvalidUrl(String),

    /// The URL names a repository but no pull request.
    #[error("URL must point to a specific pull request: {0}")]
    MissingPrNumber(String),

    /// A required credential is not configured.
    #[error("{0} is missing")]
    #[diagnostic(help("set it in the environment, a .env file, or .prlens.toml"))]
    MissingCredentials(&'static str),

    /// The hosting API returned an error or could not be reached.
    #[error("GitHub API error: {0}")]
    UpstreamApi(String),

    /// An upstream call exceeded its network timeout.
    #[error("upstream request timed out: {0}")]
    UpstreamTimeout(String),

    /// The LLM endpoint returned an error or could not be reached.
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// The LLM replied without any message content.
    #[error("No content returned from LLM")]
    LlmEmptyResponse,

    /// The LLM reply is not a valid review.
    #[error("LLM response failed validation: {0}")]
    LlmSchemaValidation(String),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
