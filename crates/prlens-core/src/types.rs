use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a file changed in a pull request, as reported by the hosting API.
///
/// # Examples
///
/// ```
/// use prlens_core::FileStatus;
///
/// let s: FileStatus = serde_json::from_str("\"renamed\"").unwrap();
/// assert_eq!(s, FileStatus::Renamed);
///
/// let s: FileStatus = serde_json::from_str("\"something-new\"").unwrap();
/// assert_eq!(s, FileStatus::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    Renamed,
    Copied,
    Changed,
    Unchanged,
    /// Any status this crate does not know about yet.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileStatus::Added => "added",
            FileStatus::Modified => "modified",
            FileStatus::Removed => "removed",
            FileStatus::Renamed => "renamed",
            FileStatus::Copied => "copied",
            FileStatus::Changed => "changed",
            FileStatus::Unchanged => "unchanged",
            FileStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A single changed file in a pull request.
///
/// `patch` is absent for binary files and for files too large for the
/// hosting API to render a diff.
///
/// # Examples
///
/// ```
/// use prlens_core::{FileDiff, FileStatus};
///
/// let file = FileDiff {
///     filename: "assets/logo.png".into(),
///     status: FileStatus::Added,
///     additions: 0,
///     deletions: 0,
///     patch: None,
/// };
/// assert!(!file.has_patch());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Path of the file in the new version.
    pub filename: String,
    /// Kind of change.
    pub status: FileStatus,
    /// Number of added lines.
    pub additions: u64,
    /// Number of removed lines.
    pub deletions: u64,
    /// Unified diff text, if the hosting API provided one.
    #[serde(default)]
    pub patch: Option<String>,
}

impl FileDiff {
    /// Whether diff text is available for this file.
    pub fn has_patch(&self) -> bool {
        self.patch.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Title, description, author and changed files of one pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrMetadata {
    pub title: String,
    /// Description text; empty when the PR has none.
    pub body: String,
    /// Login of the PR author.
    pub author: String,
    /// Changed files in the order the hosting API listed them.
    pub files: Vec<FileDiff>,
}

/// One row of the open pull request listing for a repository.
///
/// # Examples
///
/// ```
/// use prlens_core::PullSummary;
///
/// let pr = PullSummary {
///     number: 7,
///     title: "Fix flaky test".into(),
///     user: "octocat".into(),
///     updated_at: "2024-05-01T12:00:00+00:00".into(),
///     url: "https://github.com/acme/widgets/pull/7".into(),
/// };
/// assert_eq!(pr.number, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullSummary {
    pub number: u64,
    pub title: String,
    /// Login of the PR author.
    pub user: String,
    /// Last update time, RFC 3339.
    pub updated_at: String,
    /// Browser URL of the pull request.
    pub url: String,
}

/// Output format for CLI results.
///
/// # Examples
///
/// ```
/// use prlens_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Text,
    /// The raw analysis report as JSON.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
