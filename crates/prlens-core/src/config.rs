use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PrLensError;

/// Top-level configuration, built once at startup.
///
/// Resolution order: CLI flags > environment variables > `.prlens.toml` > defaults.
/// The resolved value is passed into every client constructor; nothing reads
/// the process environment after startup.
///
/// # Examples
///
/// ```
/// use prlens_core::PrLensConfig;
///
/// let config = PrLensConfig::default();
/// assert_eq!(config.server.port, 8000);
/// assert!(config.github.token.is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrLensConfig {
    /// Hosting API settings.
    #[serde(default)]
    pub github: GitHubConfig,
    /// LLM provider settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

impl PrLensConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PrLensError::Io`] if the file cannot be read, or
    /// [`PrLensError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, PrLensError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PrLensError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use prlens_core::PrLensConfig;
    ///
    /// let toml = r#"
    /// [llm]
    /// model = "gpt-4o-mini"
    /// "#;
    /// let config = PrLensConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.llm.model, "gpt-4o-mini");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, PrLensError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Overlay values found through `lookup` (normally `std::env::var`).
    ///
    /// Recognized keys: `GITHUB_TOKEN`, `GITHUB_API_URL`, `LLM_API_KEY`,
    /// `LLM_BASE_URL`, `LLM_MODEL`, `PRLENS_HOST`, `PRLENS_PORT`,
    /// `PRLENS_ALLOWED_ORIGINS`. Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PrLensError::Config`] if `PRLENS_PORT` is not a port number.
    ///
    /// # Examples
    ///
    /// ```
    /// use prlens_core::PrLensConfig;
    ///
    /// let config = PrLensConfig::default()
    ///     .with_env(|key| (key == "LLM_MODEL").then(|| "llama3".to_string()))
    ///     .unwrap();
    /// assert_eq!(config.llm.model, "llama3");
    /// ```
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, PrLensError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(url) = get("GITHUB_API_URL") {
            self.github.api_url = url;
        }
        if let Some(key) = get("LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = get("LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = get("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(host) = get("PRLENS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PRLENS_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| PrLensError::Config(format!("PRLENS_PORT is not a port: {port}")))?;
        }
        if let Some(origins) = get("PRLENS_ALLOWED_ORIGINS") {
            self.server.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        Ok(self)
    }

    /// Overlay the process environment.
    ///
    /// # Errors
    ///
    /// See [`PrLensConfig::with_env`].
    pub fn with_process_env(self) -> Result<Self, PrLensError> {
        self.with_env(|key| std::env::var(key).ok())
    }
}

/// Hosting API (GitHub) configuration.
///
/// # Examples
///
/// ```
/// use prlens_core::GitHubConfig;
///
/// let config = GitHubConfig::default();
/// assert_eq!(config.api_url, "https://api.github.com");
/// assert_eq!(config.timeout_secs, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Personal access token; required for every fetch.
    pub token: Option<String>,
    /// REST API base URL.
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
    /// Per-request network timeout in seconds.
    #[serde(default = "default_github_timeout")]
    pub timeout_secs: u64,
}

fn default_github_api_url() -> String {
    "https://api.github.com".into()
}

fn default_github_timeout() -> u64 {
    30
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_github_api_url(),
            timeout_secs: default_github_timeout(),
        }
    }
}

/// LLM provider configuration for an OpenAI-compatible chat completions API.
///
/// # Examples
///
/// ```
/// use prlens_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "gpt-4-turbo");
/// assert_eq!(config.base_url, "https://api.openai.com/v1");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key for the provider; required for analysis.
    pub api_key: Option<String>,
    /// Base URL; `/chat/completions` is appended to it.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-request network timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_model() -> String {
    "gpt-4-turbo".into()
}

fn default_llm_timeout() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            model: default_model(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind (default: `127.0.0.1`).
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind (default: 8000).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Front-end origins allowed by CORS.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// `host:port` address to bind.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8000
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".into(),
        "http://localhost:3001".into(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}
