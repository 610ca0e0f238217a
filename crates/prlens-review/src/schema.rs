use std::collections::HashMap;
use std::fmt;

use prlens_core::{FileDiff, PrLensError};
use serde::{Deserialize, Serialize};

use crate::citation::Citation;
use crate::patch::PatchIndex;

/// Structured review returned by the LLM.
///
/// Every field is required; unknown enum values and malformed citation
/// strings fail deserialization. Empty lists are accepted.
///
/// # Examples
///
/// ```
/// use prlens_review::schema::parse_review;
///
/// let json = r#"{
///     "overview": "Adds retry logic",
///     "key_changes": [],
///     "risk_ranked_files": [],
///     "tests": [],
///     "code_smells": [],
///     "security_notes": []
/// }"#;
/// let review = parse_review(json).unwrap();
/// assert_eq!(review.overview, "Adds retry logic");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// High-level summary of the change.
    pub overview: String,
    pub key_changes: Vec<KeyChange>,
    pub risk_ranked_files: Vec<RiskRankedFile>,
    pub tests: Vec<TestSuggestion>,
    pub code_smells: Vec<CodeSmell>,
    pub security_notes: Vec<SecurityNote>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyChange {
    pub point: String,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskRankedFile {
    pub file: String,
    pub risk: Level,
    pub why: String,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuggestion {
    #[serde(rename = "type")]
    pub kind: TestKind,
    pub suggestion: String,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSmell {
    pub issue: String,
    pub impact: String,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityNote {
    pub issue: String,
    pub severity: Level,
    pub recommendation: String,
    pub citations: Vec<Citation>,
}

/// Qualitative rating used for file risk and security severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    High,
    Med,
    Low,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Level::High => "high",
            Level::Med => "med",
            Level::Low => "low",
        })
    }
}

/// Kind of test being suggested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    Unit,
    Integration,
    E2e,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            TestKind::Unit => "unit",
            TestKind::Integration => "integration",
            TestKind::E2e => "e2e",
        })
    }
}

impl Review {
    /// Every citation in the review, labelled with where it appears
    /// (e.g. `tests[2]`).
    pub fn citations(&self) -> Vec<(String, &Citation)> {
        fn label<'a>(
            out: &mut Vec<(String, &'a Citation)>,
            section: &str,
            idx: usize,
            citations: &'a [Citation],
        ) {
            for c in citations {
                out.push((format!("{section}[{idx}]"), c));
            }
        }

        let mut out = Vec::new();
        for (i, k) in self.key_changes.iter().enumerate() {
            label(&mut out, "key_changes", i, &k.citations);
        }
        for (i, r) in self.risk_ranked_files.iter().enumerate() {
            label(&mut out, "risk_ranked_files", i, &r.citations);
        }
        for (i, t) in self.tests.iter().enumerate() {
            label(&mut out, "tests", i, &t.citations);
        }
        for (i, s) in self.code_smells.iter().enumerate() {
            label(&mut out, "code_smells", i, &s.citations);
        }
        for (i, s) in self.security_notes.iter().enumerate() {
            label(&mut out, "security_notes", i, &s.citations);
        }
        out
    }
}

/// Parse and structurally validate an LLM reply.
///
/// Markdown code fences around the JSON are removed first.
///
/// # Errors
///
/// Returns [`PrLensError::LlmSchemaValidation`] if the content is not JSON,
/// lacks a required field, uses an unknown enum value, or contains a
/// malformed citation.
pub fn parse_review(content: &str) -> Result<Review, PrLensError> {
    let cleaned = strip_code_fences(content);
    serde_json::from_str(cleaned).map_err(|e| PrLensError::LlmSchemaValidation(e.to_string()))
}

/// Check every citation against the files of the pull request.
///
/// A citation is accepted only if its path names a changed file that has a
/// patch, and every cited line is an added or context line of that patch.
/// Citations into binary or oversized files (no patch), into unknown files,
/// or onto lines the patch does not show in the new version are rejected.
///
/// # Errors
///
/// Returns [`PrLensError::LlmSchemaValidation`] for the first offending citation.
pub fn validate_citations(review: &Review, files: &[FileDiff]) -> Result<(), PrLensError> {
    let by_name: HashMap<&str, &FileDiff> =
        files.iter().map(|f| (f.filename.as_str(), f)).collect();
    let mut indexes: HashMap<&str, PatchIndex> = HashMap::new();

    for (location, citation) in review.citations() {
        let Some(file) = by_name.get(citation.path.as_str()) else {
            return Err(PrLensError::LlmSchemaValidation(format!(
                "{location}: citation {citation} names a file that is not part of the pull request"
            )));
        };
        let Some(patch) = file.patch.as_deref().filter(|p| !p.is_empty()) else {
            return Err(PrLensError::LlmSchemaValidation(format!(
                "{location}: citation {citation} points into a file without a patch"
            )));
        };

        let index = indexes
            .entry(file.filename.as_str())
            .or_insert_with(|| PatchIndex::parse(patch));
        if !index.covers(citation.start, citation.end) {
            return Err(PrLensError::LlmSchemaValidation(format!(
                "{location}: citation {citation} is not within the new-file lines of the patch"
            )));
        }
    }

    Ok(())
}

fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // The opening fence line may carry any info string (`json`, `JSON`, ...).
    match inner.split_once('\n') {
        Some((_, body)) => body.trim(),
        None => inner.trim(),
    }
}
