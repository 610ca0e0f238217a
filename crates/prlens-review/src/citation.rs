use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A pointer to an inclusive line range in the new version of a file.
///
/// Only the exact form `[path:Lstart-Lend]` is accepted; there is no
/// normalization of whitespace or missing brackets.
///
/// # Examples
///
/// ```
/// use prlens_review::citation::Citation;
///
/// let c: Citation = "[src/api.ts:L100-L104]".parse().unwrap();
/// assert_eq!(c.path, "src/api.ts");
/// assert_eq!((c.start, c.end), (100, 104));
/// assert_eq!(c.to_string(), "[src/api.ts:L100-L104]");
///
/// assert!("src/api.ts:100-104".parse::<Citation>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Citation {
    /// File path as listed in the pull request.
    pub path: String,
    /// First cited line, 1-based.
    pub start: u32,
    /// Last cited line, inclusive.
    pub end: u32,
}

/// Why a citation string was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationError(String);

impl fmt::Display for CitationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "malformed citation '{}', expected [path:Lstart-Lend]",
            self.0
        )
    }
}

impl std::error::Error for CitationError {}

impl FromStr for Citation {
    type Err = CitationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CitationError(s.to_string());

        let inner = s
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(err)?;

        let (path, range) = inner.rsplit_once(':').ok_or_else(err)?;
        if path.is_empty() {
            return Err(err());
        }

        let (start, end) = range.split_once('-').ok_or_else(err)?;
        let start = parse_line(start).ok_or_else(err)?;
        let end = parse_line(end).ok_or_else(err)?;
        if start == 0 || end < start {
            return Err(err());
        }

        Ok(Citation {
            path: path.to_string(),
            start,
            end,
        })
    }
}

fn parse_line(s: &str) -> Option<u32> {
    let digits = s.strip_prefix('L')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl TryFrom<String> for Citation {
    type Error = CitationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Citation> for String {
    fn from(c: Citation) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:L{}-L{}]", self.path, self.start, self.end)
    }
}
