//! GitHub implementation of [`Forge`] over the REST v3 and GraphQL v4 APIs.
//!
//! [`GithubClient`] is built once from a [`ForgeConfig`] and an access token
//! and is then shared immutably by every stage of the pipeline. All requests
//! carry the bearer token; a 404 becomes [`Lookup::NotFound`], any other
//! non-success status becomes [`ForgeError::Status`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::error::ForgeError;
use crate::forge::{ContentFile, Forge, Lookup, Repository};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";
const API_VERSION: &str = "2022-11-28";
const PAGE_SIZE: usize = 100;
const NOT_FOUND_ERROR: &str = "NOT_FOUND";

/// Where the forge lives. The token is passed separately so this can be
/// loaded from (and logged as) plain configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForgeConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_graphql_url() -> String {
    DEFAULT_GRAPHQL_URL.to_string()
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            graphql_url: default_graphql_url(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LicenseResponse {
    license: Option<LicenseInfo>,
}

#[derive(Debug, Deserialize)]
struct LicenseInfo {
    spdx_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<Value>,
}

/// Authenticated GitHub client.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    config: ForgeConfig,
}

impl GithubClient {
    pub fn new(config: ForgeConfig, token: &str) -> Result<Self, ForgeError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ForgeError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("modcat/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|source| ForgeError::Transport {
                url: config.api_url.clone(),
                source,
            })?;

        info!(
            api_url = %config.api_url,
            graphql_url = %config.graphql_url,
            token_set = !token.is_empty(),
            "Initialized GitHub client"
        );
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    fn api(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    /// GET `url`; `None` on 404, error on any other non-success status.
    async fn get(&self, url: &str, accept: &'static str) -> Result<Option<Response>, ForgeError> {
        debug!(url, "GET");
        let response = self
            .http
            .get(url)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|source| {
                error!(error = ?source, url, "Request failed");
                ForgeError::Transport {
                    url: url.to_string(),
                    source,
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(url, "Not found");
            return Ok(None);
        }
        if !status.is_success() {
            error!(url, status = status.as_u16(), "Forge returned error status");
            return Err(ForgeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(Some(response))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Lookup<T>, ForgeError> {
        let Some(response) = self.get(url, JSON_MEDIA_TYPE).await? else {
            return Ok(Lookup::NotFound);
        };
        let value = response.json::<T>().await.map_err(|e| ForgeError::Decode {
            context: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Lookup::Found(value))
    }
}

#[async_trait]
impl Forge for GithubClient {
    async fn list_repositories(&self, account: &str) -> Result<Vec<Repository>, ForgeError> {
        let mut repositories = Vec::new();
        let mut page = 1;
        loop {
            let url = self.api(&format!(
                "users/{account}/repos?per_page={PAGE_SIZE}&page={page}"
            ));
            let batch: Vec<Repository> = match self.get_json(&url).await? {
                Lookup::Found(batch) => batch,
                Lookup::NotFound => {
                    error!(account, "Account not found on forge");
                    return Err(ForgeError::Status {
                        url,
                        status: StatusCode::NOT_FOUND.as_u16(),
                    });
                }
            };
            let count = batch.len();
            debug!(account, page, count, "Fetched repository page");
            repositories.extend(batch);
            if count < PAGE_SIZE {
                break;
            }
            page += 1;
        }
        info!(account, count = repositories.len(), "Listed repositories");
        Ok(repositories)
    }

    async fn file_metadata(
        &self,
        repository: &Repository,
        path: &str,
    ) -> Result<Lookup<ContentFile>, ForgeError> {
        let url = self.api(&format!(
            "repos/{}/{}/contents/{path}",
            repository.owner.login, repository.name
        ));
        self.get_json(&url).await
    }

    async fn file_text(
        &self,
        repository: &Repository,
        path: &str,
    ) -> Result<Lookup<String>, ForgeError> {
        let url = self.api(&format!(
            "repos/{}/{}/contents/{path}",
            repository.owner.login, repository.name
        ));
        let Some(response) = self.get(&url, RAW_MEDIA_TYPE).await? else {
            return Ok(Lookup::NotFound);
        };
        let text = response.text().await.map_err(|source| ForgeError::Transport {
            url: url.clone(),
            source,
        })?;
        Ok(Lookup::Found(text))
    }

    async fn license_spdx_id(
        &self,
        repository: &Repository,
    ) -> Result<Lookup<String>, ForgeError> {
        let url = self.api(&format!(
            "repos/{}/{}/license",
            repository.owner.login, repository.name
        ));
        let response: Lookup<LicenseResponse> = self.get_json(&url).await?;
        Ok(match response {
            Lookup::Found(LicenseResponse {
                license: Some(LicenseInfo {
                    spdx_id: Some(spdx_id),
                }),
            }) => Lookup::Found(spdx_id),
            _ => Lookup::NotFound,
        })
    }

    async fn query_repository(
        &self,
        owner: &str,
        name: &str,
        selection: &str,
    ) -> Result<Option<Value>, ForgeError> {
        let url = self.config.graphql_url.as_str();
        let body = json!({
            "query": format!(
                "query($owner: String!, $name: String!) {{ repository(owner: $owner, name: $name) {{ {selection} }} }}"
            ),
            "variables": { "owner": owner, "name": name },
        });

        debug!(owner, name, selection, "GraphQL query");
        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|source| {
                error!(error = ?source, url, "GraphQL request failed");
                ForgeError::Transport {
                    url: url.to_string(),
                    source,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(url, status = status.as_u16(), "GraphQL endpoint returned error status");
            return Err(ForgeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let parsed: GraphQlResponse = response.json().await.map_err(|e| ForgeError::Decode {
            context: url.to_string(),
            message: e.to_string(),
        })?;
        repository_data(owner, name, parsed)
    }
}

/// `data.repository`, if present. Errors other than `NOT_FOUND` fail the
/// query even though the endpoint answered 200.
fn repository_data(
    owner: &str,
    name: &str,
    response: GraphQlResponse,
) -> Result<Option<Value>, ForgeError> {
    let failures: Vec<String> = response
        .errors
        .iter()
        .filter(|e| e.get("type").and_then(Value::as_str) != Some(NOT_FOUND_ERROR))
        .map(describe_error)
        .collect();
    if !failures.is_empty() {
        error!(owner, name, errors = ?failures, "GraphQL query reported errors");
        return Err(ForgeError::Query {
            repository: format!("{owner}/{name}"),
            errors: failures,
        });
    }
    if !response.errors.is_empty() {
        warn!(owner, name, "Repository not found on GraphQL endpoint");
    }
    Ok(response
        .data
        .and_then(|mut data| data.get_mut("repository").map(Value::take))
        .filter(|repository| repository.is_object()))
}

fn describe_error(error: &Value) -> String {
    let kind = error.get("type").and_then(Value::as_str).unwrap_or("UNKNOWN");
    let message = error.get("message").and_then(Value::as_str).unwrap_or_default();
    format!("{kind}: {message}")
}
