//! # forge: the hosted code-forge as seen by the catalog pipeline
//!
//! This module defines the [`Forge`] trait, the small set of REST and
//! query-language lookups the pipeline needs, together with the read-only
//! data the forge hands back ([`Repository`], [`ContentFile`]).
//!
//! The trait is deliberately transport-shaped: it knows nothing about
//! modules or catalogs. The metadata questions built on top of it
//! ([`fetch_funding_links`], [`fetch_homepage`], [`fetch_pushed_at`]) live
//! here as free functions so that they run unchanged against the real
//! [`crate::github::GithubClient`] and against `MockForge` in tests.
//!
//! ## Result shape
//! - REST lookups return `Result<Lookup<T>, ForgeError>`: `Found`, `NotFound`
//!   (HTTP 404), or an error for anything else.
//! - Query-language lookups return `Ok(None)` when the response carries no
//!   `data.repository` object and at most `NOT_FOUND` errors, which is how
//!   the forge reports an unknown repository. Any other reported error is
//!   [`ForgeError::Query`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ForgeError;

/// Base of the canonical sponsorship page for forge-hosted sponsorships.
pub const SPONSORS_URL: &str = "https://github.com/sponsors";

/// Funding platform identifier for the forge's own sponsorship programme.
pub const SPONSORS_PLATFORM: &str = "GITHUB";

/// Outcome of a lookup that may legitimately find nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
        }
    }
}

/// Owner of a repository (user or organization).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

/// A repository as listed by the forge. Only the fields the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: RepositoryOwner,
    pub name: String,
    pub ssh_url: String,
    pub clone_url: String,
    pub html_url: String,
    #[serde(default)]
    pub has_issues: bool,
}

impl Repository {
    /// `owner/name`, used in logs and error messages.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner.login, self.name)
    }
}

/// Metadata of a single file on the default branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFile {
    pub name: String,
    pub path: String,
    /// Direct download URL. The forge leaves it null for non-file entries.
    pub download_url: Option<String>,
}

/// One entry of a repository's funding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingLink {
    pub platform: String,
    pub url: String,
}

impl FundingLink {
    /// The URL a reader should follow to donate.
    ///
    /// Forge sponsorship entries are rewritten to the canonical sponsors page
    /// named after the last path segment of the stored URL.
    pub fn donation_url(&self) -> String {
        if self.platform == SPONSORS_PLATFORM {
            let account = self.url.rsplit('/').next().unwrap_or_default();
            format!("{SPONSORS_URL}/{account}")
        } else {
            self.url.clone()
        }
    }
}

/// Lookups the catalog pipeline performs against a code forge.
///
/// Implemented by [`crate::github::GithubClient`] and, under the
/// `test-export-mocks` feature, by the generated `MockForge`.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Forge: Send + Sync {
    /// All repositories owned by `account`, in the forge's listing order.
    async fn list_repositories(&self, account: &str) -> Result<Vec<Repository>, ForgeError>;

    /// Metadata (including the download URL) of a file at the repository root.
    async fn file_metadata(
        &self,
        repository: &Repository,
        path: &str,
    ) -> Result<Lookup<ContentFile>, ForgeError>;

    /// Text of a file on the default branch.
    async fn file_text(
        &self,
        repository: &Repository,
        path: &str,
    ) -> Result<Lookup<String>, ForgeError>;

    /// SPDX identifier of the repository's detected license.
    async fn license_spdx_id(&self, repository: &Repository)
        -> Result<Lookup<String>, ForgeError>;

    /// Runs `selection` against `repository(owner, name)` on the query-language
    /// endpoint and returns the `data.repository` object, if any.
    async fn query_repository(
        &self,
        owner: &str,
        name: &str,
        selection: &str,
    ) -> Result<Option<serde_json::Value>, ForgeError>;
}

/// Donation URLs from the repository's funding configuration, in forge order.
pub async fn fetch_funding_links<F>(
    forge: &F,
    owner: &str,
    name: &str,
) -> Result<Vec<String>, ForgeError>
where
    F: Forge + ?Sized,
{
    let Some(repository) = forge
        .query_repository(owner, name, "fundingLinks { platform url }")
        .await?
    else {
        debug!(owner, name, "No repository data for funding links");
        return Ok(Vec::new());
    };

    let links: Vec<FundingLink> = match repository.get("fundingLinks") {
        Some(value) if !value.is_null() => serde_json::from_value(value.clone()).map_err(|e| {
            ForgeError::Decode {
                context: format!("fundingLinks of {owner}/{name}"),
                message: e.to_string(),
            }
        })?,
        _ => Vec::new(),
    };

    Ok(links.iter().map(FundingLink::donation_url).collect())
}

/// Declared homepage URL, `None` when unset or empty.
pub async fn fetch_homepage<F>(
    forge: &F,
    owner: &str,
    name: &str,
) -> Result<Option<String>, ForgeError>
where
    F: Forge + ?Sized,
{
    let repository = forge.query_repository(owner, name, "homepageUrl").await?;
    Ok(repository
        .as_ref()
        .and_then(|r| r.get("homepageUrl"))
        .and_then(|v| v.as_str())
        .filter(|url| !url.is_empty())
        .map(str::to_owned))
}

/// Time of the last push, `None` when missing or unparseable.
pub async fn fetch_pushed_at<F>(
    forge: &F,
    owner: &str,
    name: &str,
) -> Result<Option<DateTime<Utc>>, ForgeError>
where
    F: Forge + ?Sized,
{
    let repository = forge.query_repository(owner, name, "pushedAt").await?;
    let pushed_at = repository
        .as_ref()
        .and_then(|r| r.get("pushedAt"))
        .and_then(|v| v.as_str())
        .and_then(|raw| match DateTime::parse_from_rfc3339(raw) {
            Ok(time) => Some(time.with_timezone(&Utc)),
            Err(e) => {
                debug!(owner, name, raw, error = %e, "Unparseable pushedAt");
                None
            }
        });
    Ok(pushed_at)
}
