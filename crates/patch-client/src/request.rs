//! Request building for PATCH API calls.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::AccountType;
use crate::error::Result;
use crate::headers::HeaderSet;
use crate::multipart::EncodedMultipart;
use crate::url_builder::{QueryParams, QueryValue};

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl RequestMethod {
    /// The method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Head => "HEAD",
        }
    }

    /// Convert to reqwest::Method.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Delete => reqwest::Method::DELETE,
            RequestMethod::Head => reqwest::Method::HEAD,
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body content.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Bytes {
        bytes: Bytes,
        content_type: Option<String>,
    },
    Multipart(EncodedMultipart),
}

impl RequestBody {
    /// Returns true if no body will be sent.
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }
}

/// Per-call overrides.
///
/// Token and account type replace the client defaults for this call only.
/// Headers are applied last and win over both default and derived headers.
#[derive(Clone, Default)]
pub struct RequestOptions {
    pub(crate) access_token: Option<String>,
    pub(crate) account_type: Option<AccountType>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this access token instead of the client's.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Use this account type instead of the client's.
    pub fn account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = Some(account_type);
        self
    }

    /// Add a header for this call.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Bound the whole call, including reading the body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Abort the call when `token` is cancelled.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn header_set(&self) -> HeaderSet {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("account_type", &self.account_type)
            .field("headers", &self.header_set())
            .field("timeout", &self.timeout)
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

/// Builder for a single API call.
///
/// The path template uses `{}` placeholders, filled in order by
/// [`segment`](Self::segment). Each segment is escaped on its own.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub(crate) method: RequestMethod,
    pub(crate) template: String,
    pub(crate) segments: Vec<String>,
    pub(crate) query: QueryParams,
    pub(crate) body: RequestBody,
    pub(crate) options: RequestOptions,
}

impl RequestBuilder {
    /// Create a new request builder.
    pub fn new(method: RequestMethod, template: impl Into<String>) -> Self {
        Self {
            method,
            template: template.into(),
            segments: Vec::new(),
            query: BTreeMap::new(),
            body: RequestBody::Empty,
            options: RequestOptions::default(),
        }
    }

    pub fn get(template: impl Into<String>) -> Self {
        Self::new(RequestMethod::Get, template)
    }

    pub fn post(template: impl Into<String>) -> Self {
        Self::new(RequestMethod::Post, template)
    }

    /// Fill the next `{}` placeholder.
    pub fn segment(mut self, value: impl Into<String>) -> Self {
        self.segments.push(value.into());
        self
    }

    /// Set a query parameter, replacing any previous value for `key`.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Set a query parameter only when `value` is present.
    pub fn query_opt<T: ToString>(self, key: impl Into<String>, value: Option<T>) -> Self {
        self.query(key, value.map(|v| v.to_string()))
    }

    /// Set a repeated query parameter.
    pub fn query_list<I, T>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<T>>,
        T: Into<String>,
    {
        let values = values.into_iter().map(|v| v.map(Into::into)).collect();
        self.query.insert(key.into(), QueryValue::List(values));
        self
    }

    /// Set a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Set a raw JSON body.
    pub fn json_value(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Set a raw body with an optional content type.
    pub fn bytes(mut self, body: impl Into<Bytes>, content_type: Option<&str>) -> Self {
        self.body = RequestBody::Bytes {
            bytes: body.into(),
            content_type: content_type.map(str::to_string),
        };
        self
    }

    /// Set an already encoded multipart body.
    pub fn multipart(mut self, encoded: EncodedMultipart) -> Self {
        self.body = RequestBody::Multipart(encoded);
        self
    }

    /// Attach per-call options.
    pub fn options(mut self, options: Option<&RequestOptions>) -> Self {
        if let Some(options) = options {
            self.options = options.clone();
        }
        self
    }

    pub fn method(&self) -> RequestMethod {
        self.method
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}
