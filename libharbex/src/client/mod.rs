//! HTTP client for the Harbor v2.0 REST API.
//!
//! Only the two queries needed for discovery are implemented: listing the
//! repositories of a project and listing the artifacts (with their tags) of
//! a repository. Both follow Harbor's `Link: <...>; rel="next"` pagination
//! until every page has been read.

use crate::auth::Credentials;
use crate::error::{HarbexError, Result};
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::debug;

#[cfg(test)]
mod tests;

/// Path prefix of the Harbor v2.0 API.
pub const API_PREFIX: &str = "/api/v2.0";

/// Page size requested from paginated endpoints.
pub const PAGE_SIZE: usize = 100;

/// Query flags for the artifact listing: tags are needed, everything else is skipped.
const ARTIFACT_QUERY: &str = "with_tag=true&with_label=false&with_scan_overview=false\
                              &with_signature=false&with_immutable_status=false";

/// A repository as returned by the repository listing.
///
/// `name` is project-qualified, e.g. `library/nginx`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub name: String,
}

/// A stored image revision.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Artifact {
    #[serde(default)]
    pub digest: Option<String>,

    /// Tags of this artifact; empty for untagged artifacts.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<Tag>,
}

/// A tag attached to an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tag {
    pub name: String,
}

// Harbor sends `"tags": null` for untagged artifacts.
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// The registry queries discovery depends on.
#[allow(async_fn_in_trait)]
pub trait RegistryApi {
    /// Lists every repository of `project`. Names are project-qualified.
    async fn list_repositories(&self, project: &str) -> Result<Vec<Repository>>;

    /// Lists every artifact of `project/repository`, tags included.
    async fn list_artifacts(&self, project: &str, repository: &str) -> Result<Vec<Artifact>>;
}

/// Configuration for the HTTP client.
///
/// # Examples
///
/// ```
/// use libharbex::client::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_timeout(60)
///     .with_insecure_tls(true);
/// assert!(config.insecure_tls);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
    /// Accept invalid TLS certificates (default: false)
    pub insecure_tls: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            insecure_tls: false,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout in seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Skips TLS certificate verification.
    pub fn with_insecure_tls(mut self, insecure: bool) -> Self {
        self.insecure_tls = insecure;
        self
    }
}

/// HTTP client for a single Harbor instance.
#[derive(Debug, Clone)]
pub struct Client {
    http_client: ReqwestClient,
    /// Base URL, e.g. "https://harbor.example.com"
    base_url: String,
    credentials: Credentials,
    timeout_seconds: u64,
}

impl Client {
    /// Creates a client with default configuration.
    ///
    /// `registry` may be a bare host (`harbor.example.com`), in which case
    /// `https://` is assumed.
    ///
    /// # Examples
    ///
    /// ```
    /// use libharbex::auth::Credentials;
    /// use libharbex::client::Client;
    ///
    /// let client = Client::new("harbor.example.com", Credentials::anonymous()).unwrap();
    /// assert_eq!(client.base_url(), "https://harbor.example.com");
    /// ```
    pub fn new(registry: &str, credentials: Credentials) -> Result<Self> {
        Self::with_config(registry, credentials, ClientConfig::default())
    }

    /// Creates a client with custom configuration.
    pub fn with_config(
        registry: &str,
        credentials: Credentials,
        config: ClientConfig,
    ) -> Result<Self> {
        let base_url = Self::normalize_url(registry)?;

        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .danger_accept_invalid_certs(config.insecure_tls)
            .build()
            .map_err(|e| HarbexError::network_with_source("Failed to create HTTP client", e))?;

        Ok(Self {
            http_client,
            base_url,
            credentials,
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Adds `https://` when no scheme is given and strips trailing slashes.
    fn normalize_url(url: &str) -> Result<String> {
        let url = url.trim();

        if url.is_empty() {
            return Err(HarbexError::validation("Registry URL cannot be empty"));
        }

        let url = if !url.starts_with("http://") && !url.starts_with("https://") {
            format!("https://{}", url)
        } else {
            url.to_string()
        };

        Ok(url.trim_end_matches('/').to_string())
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches `url` and every following page, concatenating the JSON arrays.
    async fn get_all_pages<T: DeserializeOwned>(&self, url: String) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut url = url;

        loop {
            debug!(url = %url, "GET");

            let mut request = self.http_client.get(&url);
            if let Some(auth_header) = self.credentials.to_header_value() {
                request = request.header(reqwest::header::AUTHORIZATION, auth_header);
            }

            let response = request
                .send()
                .await
                .map_err(|e| self.translate_reqwest_error(e))?;

            // Extract Link header for pagination before consuming response
            let next = Self::extract_next_link(response.headers());

            let response = Self::check_response_status(response).await?;

            let page: Vec<T> = response.json().await.map_err(|e| {
                HarbexError::validation_with_source(
                    format!("Failed to parse response from {}", url),
                    e,
                )
            })?;
            items.extend(page);

            match next {
                Some(next) if next.starts_with("http://") || next.starts_with("https://") => {
                    url = next
                }
                Some(path) => url = format!("{}{}", self.base_url, path),
                None => break,
            }
        }

        Ok(items)
    }

    /// Extracts the next page reference from the Link header.
    ///
    /// Harbor sends e.g.
    /// `</api/v2.0/projects/library/repositories?page=2&page_size=100>; rel="next"`,
    /// possibly alongside a `rel="prev"` entry.
    fn extract_next_link(headers: &reqwest::header::HeaderMap) -> Option<String> {
        let link_header = headers.get(reqwest::header::LINK)?;
        let link_str = link_header.to_str().ok()?;

        for link_part in link_str.split(',') {
            let link_part = link_part.trim();

            if (link_part.contains("rel=\"next\"") || link_part.contains("rel='next'"))
                && let Some(start) = link_part.find('<')
                && let Some(end) = link_part.find('>')
            {
                return Some(link_part[start + 1..end].to_string());
            }
        }

        None
    }

    /// Translates a reqwest error into a HarbexError.
    fn translate_reqwest_error(&self, error: reqwest::Error) -> HarbexError {
        if error.is_timeout() {
            HarbexError::network(format!(
                "Request to {} timed out after {} seconds",
                self.base_url, self.timeout_seconds
            ))
        } else if error.is_connect() {
            HarbexError::network_with_source(
                format!("Failed to connect to registry at {}", self.base_url),
                error,
            )
        } else {
            HarbexError::network_with_source(
                format!("Network error communicating with {}", self.base_url),
                error,
            )
        }
    }

    /// Maps every non-2xx status to an error.
    async fn check_response_status(response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("(unable to read response body)"));

        match status {
            StatusCode::UNAUTHORIZED => Err(HarbexError::authentication(
                format!("Authentication required for {}: {}", url, error_body),
                Some(401),
            )),
            StatusCode::FORBIDDEN => Err(HarbexError::authentication(
                format!("Access forbidden for {}: {}", url, error_body),
                Some(403),
            )),
            StatusCode::NOT_FOUND => Err(HarbexError::not_found("resource", url.as_str())),
            _ => Err(HarbexError::server(
                format!("HTTP {} from {}: {}", status.as_u16(), url, error_body),
                status.as_u16(),
            )),
        }
    }
}

/// Encodes a repository name for use as a path segment.
///
/// Harbor expects the `/` in nested repository names to be URL-encoded twice.
pub fn encode_repository(repository: &str) -> String {
    repository.replace('/', "%252F")
}

impl RegistryApi for Client {
    async fn list_repositories(&self, project: &str) -> Result<Vec<Repository>> {
        let url = format!(
            "{}{}/projects/{}/repositories?page=1&page_size={}",
            self.base_url, API_PREFIX, project, PAGE_SIZE
        );
        self.get_all_pages(url).await
    }

    async fn list_artifacts(&self, project: &str, repository: &str) -> Result<Vec<Artifact>> {
        let url = format!(
            "{}{}/projects/{}/repositories/{}/artifacts?{}&page=1&page_size={}",
            self.base_url,
            API_PREFIX,
            project,
            encode_repository(repository),
            ARTIFACT_QUERY,
            PAGE_SIZE
        );
        self.get_all_pages(url).await
    }
}
