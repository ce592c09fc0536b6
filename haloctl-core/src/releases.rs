//! Halo releases from the GitHub REST API.
//!
//! Unauthenticated, so it talks to a plain [`Transport`] without the
//! interceptor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::interceptor::classify;
use crate::transport::{HttpRequest, Transport};

pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
pub const DEFAULT_RELEASES_REPO: &str = "halo-dev/halo";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub login: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub size: u64,
    pub download_count: u64,
    pub browser_download_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub tag_name: String,
    pub html_url: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    pub author: Author,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Release {
    /// Release name, or the tag when the release is unnamed.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.tag_name)
    }

    /// Sum of download counts over all assets.
    pub fn download_count(&self) -> u64 {
        self.assets.iter().map(|a| a.download_count).sum()
    }

    /// Whether this release is the given running version (`v` prefix ignored).
    pub fn is_version(&self, version: &str) -> bool {
        let wanted = version.trim_start_matches('v');
        [self.display_name(), self.tag_name.as_str()]
            .iter()
            .any(|candidate| candidate.trim_start_matches('v') == wanted)
    }
}

/// Lists releases of one repository.
pub struct ReleasesClient<T> {
    transport: T,
}

impl<T: Transport> ReleasesClient<T> {
    /// `transport` must point at the GitHub API root.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// `repo` is `owner/name`.
    pub async fn list(&self, repo: &str) -> Result<Vec<Release>, ApiError> {
        let request = HttpRequest::get(format!("/repos/{}/releases", repo))
            .header("Accept", "application/vnd.github+json");
        let response = classify(self.transport.send(request).await?)?;
        Ok(response.json()?)
    }
}
