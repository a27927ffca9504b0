//! Pluggable HTTP transport.
//!
//! The orchestrator never talks to `reqwest` directly. It hands a fully
//! built [`HttpRequest`] to a [`Transport`] and gets back a status, headers
//! and a streaming body. Tests substitute their own transport to observe
//! requests without network I/O.
//!
//! Transports must not follow redirects; redirect policy is applied by the
//! orchestrator for every transport alike.

use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream};
use url::Url;

use crate::error::{Error, ErrorKind, Result};
use crate::headers::HeaderSet;
use crate::request::RequestMethod;

/// Streaming response body.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A request ready for dispatch.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: RequestMethod,
    pub url: Url,
    pub headers: HeaderSet,
    pub body: Option<Bytes>,
}

/// A response whose body has not been read yet.
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderSet,
    /// Declared `Content-Length`, if any.
    pub content_length: Option<u64>,
    pub body: BodyStream,
}

impl HttpResponse {
    /// Build a response from a complete in-memory body.
    pub fn from_bytes(status: u16, headers: HeaderSet, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self {
            status,
            headers,
            content_length: Some(body.len() as u64),
            body: Box::pin(stream::once(async move { Ok::<_, Error>(body) })),
        }
    }

    /// Build a response from a stream of chunks with no declared length.
    pub fn from_stream(status: u16, headers: HeaderSet, body: BodyStream) -> Self {
        Self {
            status,
            headers,
            content_length: None,
            body,
        }
    }

    /// A header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Capability to send one HTTP request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the response head with a streaming body.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Default transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with redirects disabled.
    pub fn new(connect_timeout: Duration, user_agent: &str) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner })
    }

    /// Wrap an existing `reqwest::Client`.
    ///
    /// The client should be built with `redirect::Policy::none()`; otherwise
    /// redirects are followed before the orchestrator can vet them.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut req = self
            .inner
            .request(request.method.to_reqwest(), request.url.as_str());

        for (name, value) in &request.headers {
            req = req.header(name, value);
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        let response = req.send().await?;

        let status = response.status().as_u16();
        let content_length = response.content_length();
        let headers: HeaderSet = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?)))
            .collect();

        let body = stream::try_unfold(response, |mut response| async move {
            let chunk = response.chunk().await?;
            Ok::<_, Error>(chunk.map(|chunk| (chunk, response)))
        });

        Ok(HttpResponse {
            status,
            headers,
            content_length,
            body: Box::pin(body),
        })
    }
}
