use prlens_core::PrLensError;

/// Domain a pull request URL must point at.
pub const GITHUB_HOST: &str = "github.com";

/// Owner, repository and optional pull request number taken from a URL.
///
/// # Examples
///
/// ```
/// use prlens_review::url::parse_github_url;
///
/// let r = parse_github_url("https://github.com/acme/widgets/pull/42").unwrap();
/// assert_eq!(r.owner, "acme");
/// assert_eq!(r.repo, "widgets");
/// assert_eq!(r.pr_number, Some(42));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    /// Present only for `.../pull/<number>` URLs with a positive number.
    pub pr_number: Option<u64>,
}

/// Parse a GitHub repository or pull request URL.
///
/// The protocol prefix is optional. A `pull/<n>` suffix with a non-numeric
/// `<n>` leaves `pr_number` empty instead of failing; callers that need a
/// number decide how to report that.
///
/// # Errors
///
/// Returns [`PrLensError::InvalidUrl`] if the host is not GitHub or the URL
/// has fewer than owner and repository segments.
///
/// # Examples
///
/// ```
/// use prlens_review::url::parse_github_url;
///
/// let r = parse_github_url("github.com/rust-lang/rust").unwrap();
/// assert_eq!(r.pr_number, None);
///
/// assert!(parse_github_url("https://example.com/x").is_err());
/// ```
pub fn parse_github_url(url: &str) -> Result<PullRequestRef, PrLensError> {
    let trimmed = url.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or(without_scheme);

    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() < 3 || !parts[0].contains(GITHUB_HOST) {
        return Err(PrLensError::InvalidUrl(url.to_string()));
    }

    let owner = parts[1];
    let repo = parts[2];
    if owner.is_empty() || repo.is_empty() {
        return Err(PrLensError::InvalidUrl(url.to_string()));
    }

    let pr_number = match parts.get(3..5) {
        Some(["pull", number]) => number.parse::<u64>().ok().filter(|n| *n > 0),
        _ => None,
    };

    Ok(PullRequestRef {
        owner: owner.to_string(),
        repo: repo.to_string(),
        pr_number,
    })
}
