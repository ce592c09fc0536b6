//! HTTP transport capability.
//!
//! [`Transport`] is the seam the [`AuthInterceptor`](crate::interceptor::AuthInterceptor)
//! decorates. Requests are plain descriptors so a 401'd request can be
//! re-issued verbatim with a fresh token.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Transport-level failure: no HTTP response was received.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, TLS, timeout or body read failure.
    #[error("{message}")]
    Network { message: String },

    /// The base URL and path do not form a valid URL.
    #[error("invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Network {
            message: e.to_string(),
        }
    }
}

/// An outbound request, relative to the transport's base URL.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Add a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Add a query parameter when `value` is present.
    pub fn query_opt<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(name, v),
            None => self,
        }
    }

    /// Set a header, replacing any previous value with the same
    /// (case-insensitive) name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Look up a header value by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A received response. Any status, including errors.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// The `message` field of an error body like `{ "status": 400, "message": "..." }`,
    /// or the raw body when it is not JSON.
    pub fn server_message(&self) -> Option<String> {
        let trimmed = self.body.trim();
        if trimmed.is_empty() {
            return None;
        }
        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(value) => value
                .get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            Err(_) => Some(trimmed.to_string()),
        }
    }
}

/// Performs one HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

/// [`Transport`] backed by a `reqwest` client and a fixed base URL.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Create a transport for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("haloctl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(client, base_url)
    }

    /// Create a transport around an existing client.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, TransportError> {
        Url::parse(base_url).map_err(|e| TransportError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, request: &HttpRequest) -> Result<Url, TransportError> {
        let raw = format!("{}/{}", self.base_url, request.path.trim_start_matches('/'));
        let mut url = Url::parse(&raw).map_err(|e| TransportError::InvalidUrl {
            url: raw.clone(),
            message: e.to_string(),
        })?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(&request)?;
        debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = self.client.request(request.method.clone(), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = %status, "Received response");

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_replaces_case_insensitively() {
        let request = HttpRequest::get("/posts")
            .header("authorization", "Bearer old")
            .header("Authorization", "Bearer new");

        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header_value("AUTHORIZATION"), Some("Bearer new"));
    }

    #[test]
    fn test_query_opt_skips_none() {
        let request = HttpRequest::get("/posts")
            .query_opt("keyword", Some("rust"))
            .query_opt::<u64>("categoryId", None);

        assert_eq!(request.query, vec![("keyword".to_string(), "rust".to_string())]);
    }

    #[test]
    fn test_url_joins_base_path() {
        let transport =
            ReqwestTransport::new("http://localhost:8090/api/admin/", Duration::from_secs(5))
                .unwrap();
        let url = transport
            .url_for(&HttpRequest::get("/posts").query("keyword", "a b"))
            .unwrap();

        assert_eq!(url.as_str(), "http://localhost:8090/api/admin/posts?keyword=a+b");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ReqwestTransport::new("not a url", Duration::from_secs(5));
        assert!(matches!(result, Err(TransportError::InvalidUrl { .. })));
    }

    #[test]
    fn test_server_message() {
        let json = HttpResponse::new(
            StatusCode::BAD_REQUEST,
            r#"{"status":400,"message":"Title must not be blank"}"#,
        );
        assert_eq!(json.server_message().as_deref(), Some("Title must not be blank"));

        let plain = HttpResponse::new(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(plain.server_message().as_deref(), Some("upstream down"));

        let empty = HttpResponse::new(StatusCode::UNAUTHORIZED, "");
        assert_eq!(empty.server_message(), None);

        let no_message = HttpResponse::new(StatusCode::NOT_FOUND, r#"{"status":404}"#);
        assert_eq!(no_message.server_message(), None);
    }
}
