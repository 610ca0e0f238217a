use std::collections::BTreeMap;

/// New-file line numbers visible in a unified diff patch.
///
/// Only added and context lines have a position in the new file; removed
/// lines are skipped, so a range that is fully covered by this index can
/// never point at a deleted line.
///
/// # Examples
///
/// ```
/// use prlens_review::patch::PatchIndex;
///
/// let patch = "@@ -1,3 +1,3 @@\n fn main() {\n-    old();\n+    new();\n }";
/// let index = PatchIndex::parse(patch);
/// assert!(index.covers(1, 3));
/// assert_eq!(index.snippet(2, 2), "    new();");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PatchIndex {
    lines: BTreeMap<u32, String>,
}

impl PatchIndex {
    /// Build the index from the patch text of a single file.
    pub fn parse(patch: &str) -> Self {
        let mut lines = BTreeMap::new();
        // None until the first valid hunk header; lines outside a hunk are not attributed.
        let mut next_new: Option<u32> = None;

        for line in patch.lines() {
            if line.starts_with("@@") {
                next_new = parse_new_start(line);
                continue;
            }
            if line.starts_with("diff ") {
                next_new = None;
                continue;
            }
            if line.starts_with('\\') {
                continue;
            }

            // File headers (`diff`, `index`, `---`, `+++`) only appear before the first hunk.
            let Some(current) = next_new else {
                continue;
            };

            let content = if let Some(content) = line.strip_prefix('+') {
                content
            } else if let Some(content) = line.strip_prefix(' ') {
                content
            } else if line.is_empty() {
                // Some tools strip the leading space from empty context lines.
                ""
            } else {
                continue;
            };
            lines.insert(current, content.to_string());
            next_new = current.checked_add(1);
        }

        Self { lines }
    }

    /// Whether every line in `start..=end` is visible in the new file.
    pub fn covers(&self, start: u32, end: u32) -> bool {
        start <= end && (start..=end).all(|n| self.lines.contains_key(&n))
    }

    /// The visible new-file lines in `start..=end`, joined with newlines.
    ///
    /// Lines outside the patch are silently left out.
    pub fn snippet(&self, start: u32, end: u32) -> String {
        if start > end {
            return String::new();
        }
        self.lines
            .range(start..=end)
            .map(|(_, content)| content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of visible new-file lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the patch shows no new-file lines at all.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn parse_new_start(header: &str) -> Option<u32> {
    let inner = header.strip_prefix("@@ ")?;
    let end = inner.find(" @@")?;
    let new_range = inner[..end].split(' ').nth(1)?.strip_prefix('+')?;
    let start = new_range.split(',').next()?;
    start.parse().ok()
}
