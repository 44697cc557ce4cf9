//! HTTP implementations of the collaborator traits
//!
//! - `HttpPipelineClient`: books API (`/books/resolve/{key}`, `/books/{id}`)
//! - `HttpReadinessProbe`: search API (`/search_in_book`), ready iff a
//!   one-hit probe query returns anything
//!
//! Both carry a request timeout so a stuck backend cannot stall a tick.

use super::traits::{ClientError, PipelineClient, ReadinessProbe};
use super::types::{DocumentStatus, ResolveResponse, SearchResults};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};

fn build_client(timeout: Duration) -> Result<Client, ClientError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))
}

fn parse_base(base_url: &str) -> Result<Url, ClientError> {
    let url = Url::parse(base_url.trim_end_matches('/'))
        .map_err(|e| ClientError::Config(format!("invalid base URL '{}': {}", base_url, e)))?;
    if url.cannot_be_a_base() {
        return Err(ClientError::Config(format!("'{}' cannot be used as a base URL", base_url)));
    }
    Ok(url)
}

/// Append path segments to `base`, percent-encoding each one.
fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

fn transport_error(err: reqwest::Error) -> ClientError {
    if err.is_decode() {
        ClientError::Decode(err.to_string())
    } else {
        ClientError::Unavailable(err.to_string())
    }
}

async fn get_json<T: DeserializeOwned>(client: &Client, url: Url) -> Result<T, ClientError> {
    trace!(%url, "GET");
    let response = client
        .get(url.clone())
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(transport_error)?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(url.path().to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Unavailable(format!("HTTP {}: {}", status, body)));
    }

    response.json::<T>().await.map_err(transport_error)
}

/// Client for the document pipeline's books API.
#[derive(Debug, Clone)]
pub struct HttpPipelineClient {
    client: Client,
    base: Url,
}

impl HttpPipelineClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_client(timeout)?,
            base: parse_base(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }
}

#[async_trait]
impl PipelineClient for HttpPipelineClient {
    async fn resolve_identifier(&self, external_key: &str) -> Result<String, ClientError> {
        let url = endpoint(&self.base, &["books", "resolve", external_key]);
        let resolved: ResolveResponse = get_json(&self.client, url).await?;
        debug!(key = external_key, id = %resolved.download_id, "resolved document");
        Ok(resolved.download_id)
    }

    async fn get_status(&self, internal_id: &str) -> Result<DocumentStatus, ClientError> {
        let url = endpoint(&self.base, &["books", internal_id]);
        get_json(&self.client, url).await
    }
}

/// Readiness probe backed by the search service.
#[derive(Debug, Clone)]
pub struct HttpReadinessProbe {
    client: Client,
    base: Url,
}

impl HttpReadinessProbe {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_client(timeout)?,
            base: parse_base(base_url)?,
        })
    }

    fn probe_url(&self, internal_id: &str) -> Url {
        let mut url = endpoint(&self.base, &["search_in_book"]);
        url.query_pairs_mut()
            .append_pair("book_id", internal_id)
            .append_pair("query", "probe")
            .append_pair("top_k", "1");
        url
    }
}

#[async_trait]
impl ReadinessProbe for HttpReadinessProbe {
    async fn probe_readiness(&self, internal_id: &str) -> Result<bool, ClientError> {
        match get_json::<SearchResults>(&self.client, self.probe_url(internal_id)).await {
            Ok(found) => Ok(!found.results.is_empty()),
            // Not indexed yet, or an unreadable body: an answer of "no".
            Err(ClientError::NotFound(_)) | Err(ClientError::Decode(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_key_is_percent_encoded() {
        let client = HttpPipelineClient::new("http://books.local/api/", Duration::from_secs(5)).unwrap();
        let url = endpoint(client.base_url(), &["books", "resolve", "intro to ml/v2"]);
        assert_eq!(url.as_str(), "http://books.local/api/books/resolve/intro%20to%20ml%2Fv2");
    }

    #[test]
    fn probe_url_carries_query() {
        let probe = HttpReadinessProbe::new("http://search.local", Duration::from_secs(5)).unwrap();
        let url = probe.probe_url("dl-7");
        assert_eq!(url.path(), "/search_in_book");
        assert_eq!(url.query(), Some("book_id=dl-7&query=probe&top_k=1"));
    }

    #[test]
    fn rejects_unusable_base() {
        assert!(matches!(
            HttpPipelineClient::new("not a url", Duration::from_secs(5)),
            Err(ClientError::Config(_))
        ));
        assert!(matches!(
            HttpReadinessProbe::new("mailto:ops@example.com", Duration::from_secs(5)),
            Err(ClientError::Config(_))
        ));
    }
}
