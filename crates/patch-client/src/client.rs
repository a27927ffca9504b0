//! Request orchestration.
//!
//! [`PatchClient::execute`] drives one call from a [`RequestBuilder`] to a
//! classified [`Response`]:
//!
//! 1. expand the path template and build the URL
//! 2. merge headers and encode the body
//! 3. apply the insecure-transport guard and the redirect policy
//! 4. dispatch through the [`Transport`] under the call's timeout and
//!    cancellation token
//! 5. read the body under the response ceiling and classify it
//!
//! Non-2xx statuses become [`ApiError`]s. Everything that prevents a status
//! from being obtained is reported as a distinct [`ErrorKind`].

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::{
    AccountType, ClientConfig, SizeLimit, DEFAULT_MAX_MULTIPART_BYTES, DEFAULT_MAX_RESPONSE_BYTES,
};
use crate::error::{ApiError, Error, ErrorKind, Result};
use crate::headers::{auth_headers, merge_headers, HeaderSet, ACCEPT, CONTENT_TYPE};
use crate::multipart::{encode_multipart, EncodedMultipart, FilePart};
use crate::request::{RequestBody, RequestBuilder, RequestMethod};
use crate::response::{read_limited, Payload, Response};
use crate::security::multipart::reject_crlf;
use crate::security::transport::{
    check_transport, is_redirect_status, redacted, resolve_redirect, should_disable_redirects,
    MAX_REDIRECTS,
};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::url_builder::{build_url, expand_path};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Client state shared by every in-flight call.
///
/// Replaced as a whole by the setters, so a call never sees a half-applied
/// update.
#[derive(Clone)]
struct Settings {
    base_url: Url,
    default_headers: HeaderSet,
    access_token: Option<String>,
    account_type: Option<AccountType>,
    max_response_bytes: SizeLimit,
    max_multipart_bytes: SizeLimit,
    allow_insecure_http: bool,
    timeout: Option<Duration>,
    enable_tracing: bool,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url.as_str())
            .field("default_headers", &self.default_headers)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("account_type", &self.account_type)
            .field("max_response_bytes", &self.max_response_bytes)
            .field("max_multipart_bytes", &self.max_multipart_bytes)
            .field("allow_insecure_http", &self.allow_insecure_http)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// HTTP client for the PATCH Plant Data API.
///
/// Cheap to clone; clones share settings and transport.
#[derive(Clone)]
pub struct PatchClient {
    transport: Arc<dyn Transport>,
    settings: Arc<RwLock<Arc<Settings>>>,
}

impl fmt::Debug for PatchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchClient")
            .field("settings", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl PatchClient {
    /// Create a client backed by [`ReqwestTransport`].
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.connect_timeout, &config.user_agent)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client with the default configuration.
    pub fn default_client() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Create a client that dispatches through `transport`.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let base_url = validate_base_url(&config.base_url, config.allow_insecure_http)?;

        let settings = Settings {
            base_url,
            default_headers: config.default_headers.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect(),
            access_token: config.access_token,
            account_type: config.account_type,
            max_response_bytes: normalize_limit(config.max_response_bytes, DEFAULT_MAX_RESPONSE_BYTES),
            max_multipart_bytes: normalize_limit(config.max_multipart_bytes, DEFAULT_MAX_MULTIPART_BYTES),
            allow_insecure_http: config.allow_insecure_http,
            timeout: config.timeout,
            enable_tracing: config.enable_tracing,
        };

        Ok(Self {
            transport,
            settings: Arc::new(RwLock::new(Arc::new(settings))),
        })
    }

    /// The validated base URL.
    pub fn base_url(&self) -> Url {
        self.snapshot().base_url.clone()
    }

    /// Returns true if a default access token is set.
    pub fn has_access_token(&self) -> bool {
        self.snapshot().access_token.is_some()
    }

    /// The default account type.
    pub fn account_type(&self) -> Option<AccountType> {
        self.snapshot().account_type
    }

    /// Replace the default access token.
    pub fn set_access_token(&self, token: impl Into<String>) {
        let token = token.into();
        self.update(|s| s.access_token = Some(token));
    }

    /// Remove the default access token.
    pub fn clear_access_token(&self) {
        self.update(|s| s.access_token = None);
    }

    /// Replace or remove the default account type.
    pub fn set_account_type(&self, account_type: Option<AccountType>) {
        self.update(|s| s.account_type = account_type);
    }

    /// Set one default header, replacing any entry with the same name.
    pub fn set_default_header(&self, name: impl AsRef<str>, value: impl Into<String>) {
        let (name, value) = (name.as_ref().to_string(), value.into());
        self.update(|s| {
            s.default_headers.insert(name, value);
        });
    }

    /// Replace all default headers.
    pub fn set_default_headers<K, V, I>(&self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers: HeaderSet = headers.into_iter().collect();
        self.update(|s| s.default_headers = headers);
    }

    /// A copy of the default headers.
    pub fn default_headers(&self) -> HeaderSet {
        self.snapshot().default_headers.clone()
    }

    /// Set the response body ceiling. Zero restores the default.
    pub fn set_max_response_bytes(&self, limit: u64) {
        self.update(|s| {
            s.max_response_bytes = SizeLimit::or_default(limit, DEFAULT_MAX_RESPONSE_BYTES)
        });
    }

    /// Read response bodies without a ceiling.
    pub fn set_unbounded_responses(&self) {
        self.update(|s| s.max_response_bytes = SizeLimit::Unbounded);
    }

    /// Set the multipart payload ceiling. Zero restores the default.
    pub fn set_max_multipart_bytes(&self, limit: u64) {
        self.update(|s| {
            s.max_multipart_bytes = SizeLimit::or_default(limit, DEFAULT_MAX_MULTIPART_BYTES)
        });
    }

    /// Allow or forbid plain HTTP to non-loopback hosts.
    pub fn set_allow_insecure_http(&self, allow: bool) {
        self.update(|s| s.allow_insecure_http = allow);
    }

    /// Encode an upload body under the current multipart ceiling.
    pub fn encode_multipart(
        &self,
        fields: &BTreeMap<String, String>,
        files: &BTreeMap<String, FilePart>,
    ) -> Result<EncodedMultipart> {
        encode_multipart(fields, files, self.snapshot().max_multipart_bytes)
    }

    /// Execute a request and decode the payload as `T`.
    pub async fn request_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.execute(request).await?.into_payload().into_json()
    }

    /// Execute a request.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.template))]
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let settings = self.snapshot();
        let timeout = request.options.timeout.or(settings.timeout);
        let cancel = request.options.cancel.clone();

        bounded(timeout, cancel, self.execute_unbounded(&settings, request)).await
    }

    async fn execute_unbounded(&self, settings: &Settings, request: RequestBuilder) -> Result<Response> {
        let RequestBuilder {
            method,
            template,
            segments,
            query,
            body,
            options,
        } = request;

        let path = expand_path(&template, &segments)?;
        let url = build_url(&settings.base_url, &path, &query)?;

        let token = options
            .access_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(settings.access_token.as_deref());
        let account_type = options.account_type.or(settings.account_type);

        let baseline: HeaderSet = [(ACCEPT, JSON_CONTENT_TYPE)].into_iter().collect();
        let mut headers = merge_headers([
            &baseline,
            &settings.default_headers,
            &auth_headers(token, account_type),
            &options.header_set(),
        ]);

        let (body, content_type) = encode_body(body, settings.max_multipart_bytes)?;
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, content_type);
        }
        for (name, value) in &headers {
            reject_crlf(name, "header name")?;
            reject_crlf(value, &format!("{name} header"))?;
            validate_header(name, value)?;
        }

        let follow_redirects = !should_disable_redirects(&headers, body.is_some());

        if settings.enable_tracing {
            debug!(url = %redacted(&url), follow_redirects, "Request built");
        }

        let mut method = method;
        let mut target = url;
        let mut hops = 0;
        loop {
            if let Err(err) = check_transport(&target, settings.allow_insecure_http) {
                warn!(url = %redacted(&target), hops, "Blocked insecure transport");
                return Err(err);
            }

            if settings.enable_tracing {
                debug!(%method, url = %redacted(&target), "Sending request");
            }

            let response = self
                .transport
                .send(HttpRequest {
                    method,
                    url: target.clone(),
                    headers: headers.clone(),
                    body: body.clone(),
                })
                .await?;

            let location = response
                .header("Location")
                .filter(|_| follow_redirects && is_redirect_status(response.status))
                .map(str::to_string);

            let Some(location) = location else {
                return read_response(settings, method, &target, response).await;
            };

            if hops >= MAX_REDIRECTS {
                warn!(limit = MAX_REDIRECTS, "Redirect limit reached");
                return Err(Error::new(ErrorKind::TooManyRedirects {
                    limit: MAX_REDIRECTS,
                }));
            }
            hops += 1;

            let next = resolve_redirect(&target, &location)?;
            if response.status == 303 && method != RequestMethod::Head {
                method = RequestMethod::Get;
            }
            drop(response);

            if settings.enable_tracing {
                debug!(hop = hops, location = %redacted(&next), "Following redirect");
            }
            target = next;
        }
    }

    fn snapshot(&self) -> Arc<Settings> {
        let guard = self.settings.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    fn update(&self, apply: impl FnOnce(&mut Settings)) {
        let mut guard = self.settings.write().unwrap_or_else(|e| e.into_inner());
        let mut next = Settings::clone(&guard);
        apply(&mut next);
        *guard = Arc::new(next);
    }
}

/// Run `call` under an optional timeout and cancellation token.
///
/// Whichever fires first drops `call`, which drops any open body stream.
async fn bounded<F>(
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
    call: F,
) -> Result<Response>
where
    F: Future<Output = Result<Response>>,
{
    let timed = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
                warn!(timeout_ms = limit.as_millis() as u64, "Request timed out");
                Err(Error::new(ErrorKind::Timeout))
            }),
            None => call.await,
        }
    };

    match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Request cancelled");
                    Err(Error::new(ErrorKind::Cancelled))
                }
                result = timed => result,
            }
        }
        None => timed.await,
    }
}

async fn read_response(
    settings: &Settings,
    method: RequestMethod,
    target: &Url,
    response: HttpResponse,
) -> Result<Response> {
    let HttpResponse {
        status,
        headers,
        content_length,
        body,
    } = response;

    let read = read_limited(status, content_length, body, settings.max_response_bytes).await?;

    if !(200..300).contains(&status) {
        if settings.enable_tracing {
            info!(status, truncated = read.overflowed, "Non-success response");
        }
        return Err(ApiError {
            method: method.as_str().to_string(),
            url: target.to_string(),
            status,
            body: String::from_utf8_lossy(&read.bytes).into_owned(),
            truncated: read.overflowed,
        }
        .into());
    }

    if read.overflowed {
        return Err(Error::new(ErrorKind::ResponseTooLarge {
            limit: settings.max_response_bytes.reported(),
        }));
    }

    if settings.enable_tracing {
        debug!(status, bytes = read.bytes.len(), "Response received");
    }

    let payload = Payload::classify(headers.get(CONTENT_TYPE), read.bytes);
    Ok(Response::new(status, headers, payload))
}

/// Reject names and values the HTTP stack would refuse at dispatch.
fn validate_header(name: &str, value: &str) -> Result<()> {
    if HeaderName::from_bytes(name.as_bytes()).is_err() {
        return Err(Error::new(ErrorKind::InvalidHeader(format!("name '{name}'"))));
    }
    if HeaderValue::from_str(value).is_err() {
        return Err(Error::new(ErrorKind::InvalidHeader(format!("value of {name}"))));
    }
    Ok(())
}

/// Serialize the body and pick its content type.
fn encode_body(body: RequestBody, multipart_limit: SizeLimit) -> Result<(Option<Bytes>, Option<String>)> {
    match body {
        RequestBody::Empty => Ok((None, None)),
        RequestBody::Json(value) => {
            let bytes = serde_json::to_vec(&value)?;
            Ok((Some(Bytes::from(bytes)), Some(JSON_CONTENT_TYPE.to_string())))
        }
        RequestBody::Bytes {
            bytes,
            content_type,
        } => Ok((Some(bytes), content_type)),
        RequestBody::Multipart(encoded) => {
            if multipart_limit.exceeded_by(encoded.body.len() as u64) {
                return Err(Error::new(ErrorKind::MultipartTooLarge {
                    limit: multipart_limit.reported(),
                }));
            }
            Ok((Some(encoded.body), Some(encoded.content_type)))
        }
    }
}

/// Validate a base URL: http(s), a host, and no query, fragment or credentials.
fn validate_base_url(raw: &str, allow_insecure: bool) -> Result<Url> {
    let url = Url::parse(raw.trim())?;

    let invalid = |reason: &str| Error::new(ErrorKind::InvalidBaseUrl(reason.to_string()));
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host"));
    }
    if url.query().is_some() {
        return Err(invalid("must not include a query string"));
    }
    if url.fragment().is_some() {
        return Err(invalid("must not include a fragment"));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(invalid("must not embed credentials"));
    }

    check_transport(&url, allow_insecure)?;
    Ok(url)
}

fn normalize_limit(limit: SizeLimit, default: u64) -> SizeLimit {
    match limit {
        SizeLimit::Bytes(0) => SizeLimit::Bytes(default),
        other => other,
    }
}
