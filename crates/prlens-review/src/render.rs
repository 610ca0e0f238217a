//! Human-readable renderings of an [`AnalysisReport`].
//!
//! Each citation is followed by the new-file lines it points at, taken from
//! the report's own patches.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;

use prlens_core::FileDiff;

use crate::citation::Citation;
use crate::patch::PatchIndex;
use crate::pipeline::AnalysisReport;

struct Evidence<'a> {
    indexes: HashMap<&'a str, PatchIndex>,
}

impl<'a> Evidence<'a> {
    fn new(files: &'a [FileDiff]) -> Self {
        let indexes = files
            .iter()
            .filter_map(|f| {
                let patch = f.patch.as_deref()?;
                Some((f.filename.as_str(), PatchIndex::parse(patch)))
            })
            .collect();
        Self { indexes }
    }

    fn snippet(&self, c: &Citation) -> Option<String> {
        let s = self.indexes.get(c.path.as_str())?.snippet(c.start, c.end);
        (!s.is_empty()).then_some(s)
    }
}

fn push_evidence(out: &mut String, evidence: &Evidence<'_>, citations: &[Citation]) {
    for c in citations {
        if let Some(snippet) = evidence.snippet(c) {
            let _ = writeln!(out, "\n  `{c}`\n  ```\n{snippet}\n  ```");
        }
    }
}

fn write_evidence(
    f: &mut fmt::Formatter<'_>,
    evidence: &Evidence<'_>,
    citations: &[Citation],
) -> fmt::Result {
    for c in citations {
        writeln!(f, "      {c}")?;
        if let Some(snippet) = evidence.snippet(c) {
            for line in snippet.lines() {
                writeln!(f, "      | {line}")?;
            }
        }
    }
    Ok(())
}

fn citation_list(citations: &[Citation]) -> String {
    citations
        .iter()
        .map(Citation::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl AnalysisReport {
    /// Render the report as GitHub-flavored Markdown with evidence snippets.
    pub fn to_markdown(&self) -> String {
        let evidence = Evidence::new(&self.files);
        let mut out = String::new();

        let _ = writeln!(out, "# {}\n", self.pr.title);
        let _ = writeln!(
            out,
            "_by @{} · {} files_\n",
            self.pr.author,
            self.files.len()
        );
        let _ = writeln!(out, "## Overview\n\n{}\n", self.review.overview);

        if !self.review.key_changes.is_empty() {
            let _ = writeln!(out, "## Key changes\n");
            for k in &self.review.key_changes {
                let _ = writeln!(out, "- {} {}", k.point, citation_list(&k.citations));
                push_evidence(&mut out, &evidence, &k.citations);
            }
            out.push('\n');
        }

        if !self.review.risk_ranked_files.is_empty() {
            let _ = writeln!(
                out,
                "## Risk\n\n| File | Risk | Why | Citations |\n|---|---|---|---|"
            );
            for r in &self.review.risk_ranked_files {
                let _ = writeln!(
                    out,
                    "| `{}` | {} | {} | {} |",
                    r.file,
                    r.risk,
                    r.why,
                    citation_list(&r.citations)
                );
            }
            // Snippets cannot live inside table cells.
            for r in &self.review.risk_ranked_files {
                push_evidence(&mut out, &evidence, &r.citations);
            }
            out.push('\n');
        }

        if !self.review.tests.is_empty() {
            let _ = writeln!(out, "## Suggested tests\n");
            for t in &self.review.tests {
                let _ = writeln!(
                    out,
                    "- **{}** {} {}",
                    t.kind,
                    t.suggestion,
                    citation_list(&t.citations)
                );
                push_evidence(&mut out, &evidence, &t.citations);
            }
            out.push('\n');
        }

        if !self.review.code_smells.is_empty() {
            let _ = writeln!(out, "## Code smells\n");
            for s in &self.review.code_smells {
                let _ = writeln!(
                    out,
                    "- {} ({}) {}",
                    s.issue,
                    s.impact,
                    citation_list(&s.citations)
                );
                push_evidence(&mut out, &evidence, &s.citations);
            }
            out.push('\n');
        }

        if !self.review.security_notes.is_empty() {
            let _ = writeln!(out, "## Security\n");
            for s in &self.review.security_notes {
                let _ = writeln!(
                    out,
                    "- **{}** {}: {} {}",
                    s.severity,
                    s.issue,
                    s.recommendation,
                    citation_list(&s.citations)
                );
                push_evidence(&mut out, &evidence, &s.citations);
            }
        }

        out
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let evidence = Evidence::new(&self.files);

        writeln!(f, "PR Review: {}", self.pr.title)?;
        writeln!(f, "==========")?;
        writeln!(
            f,
            "Author: {} | Files: {}\n",
            self.pr.author,
            self.files.len()
        )?;
        writeln!(f, "{}\n", self.review.overview)?;

        if !self.review.key_changes.is_empty() {
            writeln!(f, "Key changes:")?;
            for k in &self.review.key_changes {
                writeln!(f, "  - {}", k.point)?;
                write_evidence(f, &evidence, &k.citations)?;
            }
            writeln!(f)?;
        }

        if !self.review.risk_ranked_files.is_empty() {
            writeln!(f, "Risk:")?;
            for r in &self.review.risk_ranked_files {
                writeln!(f, "  [{:<4}] {}: {}", r.risk, r.file, r.why)?;
                write_evidence(f, &evidence, &r.citations)?;
            }
            writeln!(f)?;
        }

        if !self.review.tests.is_empty() {
            writeln!(f, "Suggested tests:")?;
            for t in &self.review.tests {
                writeln!(f, "  - ({}) {}", t.kind, t.suggestion)?;
                write_evidence(f, &evidence, &t.citations)?;
            }
            writeln!(f)?;
        }

        if !self.review.code_smells.is_empty() {
            writeln!(f, "Code smells:")?;
            for s in &self.review.code_smells {
                writeln!(f, "  - {} (impact: {})", s.issue, s.impact)?;
                write_evidence(f, &evidence, &s.citations)?;
            }
            writeln!(f)?;
        }

        if self.review.security_notes.is_empty() {
            writeln!(f, "No security notes.")?;
        } else {
            writeln!(f, "Security:")?;
            for s in &self.review.security_notes {
                writeln!(f, "  [{:<4}] {}", s.severity, s.issue)?;
                writeln!(f, "         fix: {}", s.recommendation)?;
                write_evidence(f, &evidence, &s.citations)?;
            }
        }

        Ok(())
    }
}
