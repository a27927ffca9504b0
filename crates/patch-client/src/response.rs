//! Bounded response reading and payload classification.

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::SizeLimit;
use crate::error::{Error, ErrorKind, Result};
use crate::headers::{HeaderSet, CONTENT_TYPE};
use crate::transport::BodyStream;

/// A response body read up to a ceiling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimitedBody {
    /// Bytes read, never more than the ceiling.
    pub bytes: Bytes,
    /// Whether the body was longer than the ceiling.
    pub overflowed: bool,
}

/// Returns true for statuses that never carry a body.
pub fn is_bodyless_status(status: u16) -> bool {
    (100..200).contains(&status) || matches!(status, 204 | 205 | 304)
}

/// Read `body` incrementally, stopping as soon as `limit` is exceeded.
///
/// On overflow the stream is dropped, which releases the underlying
/// connection, and the bytes read so far (cut at the ceiling) are returned
/// with `overflowed` set. For 2xx statuses a declared `content_length` above
/// the ceiling overflows without reading anything; other statuses are read up
/// to the ceiling so the error body survives. Bodyless statuses yield an
/// empty body regardless of headers.
pub async fn read_limited(
    status: u16,
    content_length: Option<u64>,
    mut body: BodyStream,
    limit: SizeLimit,
) -> Result<LimitedBody> {
    if is_bodyless_status(status) {
        return Ok(LimitedBody::default());
    }

    if let Some(declared) = content_length.filter(|_| (200..300).contains(&status)) {
        if limit.exceeded_by(declared) {
            warn!(declared, limit = limit.reported(), "Declared content length exceeds limit");
            drop(body);
            return Ok(LimitedBody {
                bytes: Bytes::new(),
                overflowed: true,
            });
        }
    }

    let mut buf = BytesMut::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        let total = (buf.len() + chunk.len()) as u64;
        if let Some(max) = limit.max_bytes().filter(|max| total > *max) {
            let room = (max as usize).saturating_sub(buf.len());
            buf.extend_from_slice(&chunk[..room.min(chunk.len())]);
            warn!(limit = max, "Response body exceeds limit, aborting read");
            drop(body);
            return Ok(LimitedBody {
                bytes: buf.freeze(),
                overflowed: true,
            });
        }
        buf.extend_from_slice(&chunk);
    }

    debug!(bytes = buf.len(), "Response body read");
    Ok(LimitedBody {
        bytes: buf.freeze(),
        overflowed: false,
    })
}

/// Read `body` fully, failing with a size-limit error past `limit`.
pub async fn read_bounded(
    status: u16,
    content_length: Option<u64>,
    body: BodyStream,
    limit: SizeLimit,
) -> Result<Bytes> {
    let read = read_limited(status, content_length, body, limit).await?;
    if read.overflowed {
        return Err(Error::new(ErrorKind::ResponseTooLarge {
            limit: limit.reported(),
        }));
    }
    Ok(read.bytes)
}

/// A classified response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Zero-length body.
    Empty,
    /// Parsed JSON.
    Json(serde_json::Value),
    /// Text, or JSON-labelled content that failed to parse.
    Text(String),
    /// Anything else.
    Bytes(Bytes),
}

impl Payload {
    /// Classify `body` by its content type.
    ///
    /// `application/json` and `+json` types are parsed, falling back to text
    /// if parsing fails. `text/*` and anything mentioning `xml` or `html`
    /// become text. Everything else stays raw bytes.
    pub fn classify(content_type: Option<&str>, body: Bytes) -> Self {
        if body.is_empty() {
            return Payload::Empty;
        }

        let media_type = media_type(content_type.unwrap_or_default());
        if media_type == "application/json" || media_type.ends_with("+json") {
            return match serde_json::from_slice(&body) {
                Ok(value) => Payload::Json(value),
                Err(e) => {
                    debug!(error = %e, "JSON-labelled body failed to parse, returning text");
                    Payload::Text(String::from_utf8_lossy(&body).into_owned())
                }
            };
        }

        if media_type.starts_with("text/") || media_type.contains("xml") || media_type.contains("html") {
            return Payload::Text(String::from_utf8_lossy(&body).into_owned());
        }

        Payload::Bytes(body)
    }

    /// Returns true for an empty body.
    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    /// The parsed JSON value, if any.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The text body, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Deserialize into `T`. An empty body deserializes from JSON `null`.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        let value = match self {
            Payload::Empty => serde_json::Value::Null,
            Payload::Json(value) => value,
            Payload::Text(text) => serde_json::from_str(&text)?,
            Payload::Bytes(bytes) => serde_json::from_slice(&bytes)?,
        };
        Ok(serde_json::from_value(value)?)
    }

    /// The body as text. A JSON string value yields its contents.
    pub fn into_text(self) -> String {
        match self {
            Payload::Empty => String::new(),
            Payload::Json(serde_json::Value::String(text)) => text,
            Payload::Json(value) => value.to_string(),
            Payload::Text(text) => text,
            Payload::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// The payload as a JSON value without failing.
    ///
    /// Text and raw bytes become a JSON string and an empty body becomes `null`.
    pub fn into_value(self) -> serde_json::Value {
        match self {
            Payload::Empty => serde_json::Value::Null,
            Payload::Json(value) => value,
            Payload::Text(text) => serde_json::Value::String(text),
            Payload::Bytes(bytes) => serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    /// The body as raw bytes.
    pub fn into_bytes(self) -> Bytes {
        match self {
            Payload::Empty => Bytes::new(),
            Payload::Json(value) => Bytes::from(value.to_string()),
            Payload::Text(text) => Bytes::from(text),
            Payload::Bytes(bytes) => bytes,
        }
    }
}

/// Lowercase media type with parameters stripped.
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// A successful response with its classified payload.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HeaderSet,
    payload: Payload,
}

impl Response {
    pub(crate) fn new(status: u16, headers: HeaderSet, payload: Payload) -> Self {
        Self {
            status,
            headers,
            payload,
        }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    /// All response headers.
    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// The classified payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Take the classified payload.
    pub fn into_payload(self) -> Payload {
        self.payload
    }

    /// Deserialize the payload as JSON.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        self.payload.into_json()
    }
}
