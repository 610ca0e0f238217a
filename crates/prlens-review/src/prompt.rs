use prlens_core::{FileStatus, PrLensError, PrMetadata};
use serde::Serialize;

/// Stand-in for the patch of a binary or oversized file.
pub const NO_PATCH_PLACEHOLDER: &str = "[No patch available - binary or too large]";

const SYSTEM_PROMPT: &str = "\
You are a strict code review assistant.
You will analyze a GitHub Pull Request and return a JSON review.
You MUST adhere to the following rules:
1. Every key point, risk, test suggestion, smell, or security note MUST have at least one valid citation if evidence exists.
2. CITATION FORMAT: [path/to/file:Lstart-Lend]
   - \"path/to/file\" is the filename exactly as given in the input.
   - \"Lstart\" is the line number in the NEW file (post-change).
   - \"Lend\" is the end line number.
   - Example: [src/utils.ts:L12-L15] or [src/api.ts:L100-L100]
3. Do not cite deleted lines (use the surrounding context if needed, or omit the citation).
4. If a file is too large or binary and its patch is missing, do not cite it at all.
5. Focus on substantive issues, not just nitpicks.
6. Return ONLY a single valid JSON object with exactly this shape:
{
  \"overview\": \"High-level summary of the PR changes\",
  \"key_changes\": [{ \"point\": \"...\", \"citations\": [\"[path:Lstart-Lend]\"] }],
  \"risk_ranked_files\": [{ \"file\": \"path\", \"risk\": \"high\" | \"med\" | \"low\", \"why\": \"...\", \"citations\": [] }],
  \"tests\": [{ \"type\": \"unit\" | \"integration\" | \"e2e\", \"suggestion\": \"...\", \"citations\": [] }],
  \"code_smells\": [{ \"issue\": \"...\", \"impact\": \"...\", \"citations\": [] }],
  \"security_notes\": [{ \"issue\": \"...\", \"severity\": \"high\" | \"med\" | \"low\", \"recommendation\": \"...\", \"citations\": [] }]
}
Use empty arrays for sections with nothing to report.";

/// Build the fixed system instruction for the review LLM.
///
/// # Examples
///
/// ```
/// use prlens_review::prompt::build_system_prompt;
///
/// let prompt = build_system_prompt();
/// assert!(prompt.contains("[path/to/file:Lstart-Lend]"));
/// ```
pub fn build_system_prompt() -> String {
    SYSTEM_PROMPT.to_string()
}

/// Everything the LLM is told about a pull request.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewContext {
    pub pr: PrSummary,
    pub files: Vec<FileContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrSummary {
    pub title: String,
    pub body: String,
    pub author: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileContext {
    pub filename: String,
    pub status: FileStatus,
    pub additions: u64,
    pub deletions: u64,
    /// Patch text, or [`NO_PATCH_PLACEHOLDER`].
    pub patch: String,
}

impl ReviewContext {
    /// Build the context from fetched PR data.
    ///
    /// # Examples
    ///
    /// ```
    /// use prlens_core::PrMetadata;
    /// use prlens_review::prompt::ReviewContext;
    ///
    /// let pr = PrMetadata {
    ///     title: "Bump deps".into(),
    ///     body: String::new(),
    ///     author: "octocat".into(),
    ///     files: vec![],
    /// };
    /// let ctx = ReviewContext::from_metadata(&pr);
    /// assert_eq!(ctx.pr.title, "Bump deps");
    /// ```
    pub fn from_metadata(pr: &PrMetadata) -> Self {
        Self {
            pr: PrSummary {
                title: pr.title.clone(),
                body: pr.body.clone(),
                author: pr.author.clone(),
            },
            files: pr
                .files
                .iter()
                .map(|f| FileContext {
                    filename: f.filename.clone(),
                    status: f.status,
                    additions: f.additions,
                    deletions: f.deletions,
                    patch: match f.patch.as_deref() {
                        Some(p) if !p.is_empty() => p.to_string(),
                        _ => NO_PATCH_PLACEHOLDER.to_string(),
                    },
                })
                .collect(),
        }
    }
}

/// Serialize the context into the user message.
///
/// # Errors
///
/// Returns [`PrLensError::Serialization`] if serialization fails.
pub fn build_review_prompt(context: &ReviewContext) -> Result<String, PrLensError> {
    Ok(serde_json::to_string_pretty(context)?)
}
