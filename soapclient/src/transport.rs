//! The HTTP transport boundary.
//!
//! The client only ever needs "send bytes, get bytes back": requests and
//! responses are opaque bundles of method, URL, multi-valued headers and a
//! body, so handlers can rewrite them freely and tests can stub the whole
//! transport. [`ReqwestTransport`] is the default implementation.

use std::borrow::Cow;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SoapClientError};

/// An outbound HTTP request bundle.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method. The client issues POST; handlers may rewrite it.
    pub method: String,
    /// Destination URL.
    pub url: String,
    /// Multi-valued headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Request body bytes.
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Creates an empty POST request for the given URL.
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: "POST".to_string(),
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Replaces every value of a header.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    /// Appends a header value, keeping existing ones.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// The body as text, lossily decoded.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// A received HTTP response bundle.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers in wire order.
    pub headers: Vec<(String, String)>,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether the status is in the 2xx range.
    ///
    /// Note that SOAP faults typically arrive with status 500 and a
    /// readable body; callers should not treat a non-2xx status alone as a
    /// transport failure.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body as text, lossily decoded.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// The transport collaborator contract.
///
/// Implementations must be shareable across concurrent send calls.
/// Failures propagate to the caller unmodified, wrapped only in the
/// opaque [`SoapClientError::Transport`] variant.
#[async_trait]
pub trait SoapTransport: Send + Sync {
    /// Transmits a request and returns the response, honoring the
    /// cancellation signal.
    async fn send(&self, request: HttpRequest, cancel: &CancellationToken)
        -> Result<HttpResponse>;
}

/// Default [`SoapTransport`] backed by a shared [`reqwest::Client`].
///
/// 4xx/5xx statuses are not errors here: fault bodies must stay readable.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport over a caller-configured client, e.g. to share
    /// a connection pool or set proxy and timeout policy.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SoapTransport for ReqwestTransport {
    async fn send(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(SoapClientError::transport)?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let send_future = builder.body(request.body).send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(SoapClientError::Cancelled),
            response = send_future => response.map_err(SoapClientError::transport)?,
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(SoapClientError::Cancelled),
            body = response.bytes() => body.map_err(SoapClientError::transport)?.to_vec(),
        };

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
