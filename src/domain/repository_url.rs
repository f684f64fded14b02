use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const GITHUB_BASE_URL: &str = "https://github.com/";
const GITHUB_URL_FORMAT: &str = "https://github.com/{owner}/{repo_name}[.git]";

static OWNER_REPO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)$").expect("owner/repo pattern is valid")
});

/// Represents a GitHub repository URL.
///
/// Accepts `https://github.com/{owner}/{repo_name}` with an optional `.git`
/// suffix or trailing slash. Surrounding whitespace is trimmed before
/// validation, and the owner and repository name are kept so the provider can
/// be queried without re-parsing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RepositoryURL {
    url: String,
    #[serde(skip)]
    owner: String,
    #[serde(skip)]
    name: String,
}

impl RepositoryURL {
    /// Creates a new `RepositoryURL` instance.
    ///
    /// # Examples
    ///
    /// ```
    /// use repo_radar::domain::RepositoryURL;
    ///
    /// let url = RepositoryURL::new(" https://github.com/owner/repo.git ").unwrap();
    /// assert_eq!(url.owner(), "owner");
    /// assert_eq!(url.name(), "repo");
    /// ```
    pub fn new(url: impl Into<String>) -> Result<Self, String> {
        let url = url.into().trim().to_string();
        let (owner, name) = parse_owner_and_name(&url)?;
        Ok(Self { url, owner, name })
    }

    /// Returns the URL as it was submitted, minus surrounding whitespace.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn parse_owner_and_name(url: &str) -> Result<(String, String), String> {
    let path = url
        .strip_prefix(GITHUB_BASE_URL)
        .ok_or_else(|| format!("URL must start with {GITHUB_BASE_URL}"))?;
    let path = path.strip_suffix('/').unwrap_or(path);
    let path = path.strip_suffix(".git").unwrap_or(path);

    let caps = OWNER_REPO
        .captures(path)
        .ok_or_else(|| format!("URL must be in format {GITHUB_URL_FORMAT}"))?;
    let owner = &caps[1];
    let name = &caps[2];
    if [owner, name].iter().any(|part| *part == "." || *part == "..") {
        return Err(format!("URL must be in format {GITHUB_URL_FORMAT}"));
    }
    Ok((owner.to_string(), name.to_string()))
}

impl<'de> Deserialize<'de> for RepositoryURL {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let url = String::deserialize(deserializer)?;
        RepositoryURL::new(url).map_err(serde::de::Error::custom)
    }
}
