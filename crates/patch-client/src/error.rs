//! Error types for patch-client.

use std::fmt;

/// Result type alias for patch-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for patch-client operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if the request was rejected locally before any network I/O.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::InvalidBaseUrl(_)
                | ErrorKind::InvalidPath(_)
                | ErrorKind::HeaderInjection(_)
                | ErrorKind::InvalidHeader(_)
                | ErrorKind::AmbiguousUpload(_)
                | ErrorKind::Serialization(_)
                | ErrorKind::Config(_)
        )
    }

    /// Returns true if the insecure-transport guard blocked the request.
    pub fn is_transport_security(&self) -> bool {
        matches!(self.kind, ErrorKind::InsecureTransport { .. })
    }

    /// Returns true if the request could not be completed (no status obtained).
    pub fn is_transport(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Connection(_)
                | ErrorKind::Timeout
                | ErrorKind::Cancelled
                | ErrorKind::TooManyRedirects { .. }
                | ErrorKind::Transport(_)
        )
    }

    /// Returns true if a configured byte ceiling was exceeded.
    pub fn is_size_limit(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ResponseTooLarge { .. } | ErrorKind::MultipartTooLarge { .. }
        )
    }

    /// Returns true if the server answered with a non-2xx status.
    pub fn is_api_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Api(_))
    }

    /// Returns true if the per-call timeout fired.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout)
    }

    /// Returns true if the call was cancelled by the caller.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// The HTTP status reported by the server, if one was obtained.
    pub fn status(&self) -> Option<u16> {
        self.api_error().map(|e| e.status)
    }

    /// The structured remote failure, if this is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match &self.kind {
            ErrorKind::Api(err) => Some(err),
            _ => None,
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Base URL failed validation at construction.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Path template or segment could not be expanded.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A multipart name, filename or content type contained CR or LF.
    #[error("{0} must not contain CR or LF characters")]
    HeaderInjection(String),

    /// Header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Upload files could not be mapped to the `filename` field.
    #[error("Ambiguous upload: {0}")]
    AmbiguousUpload(String),

    /// Request body could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request target uses plain HTTP to a non-loopback host.
    #[error("Refusing to send request over insecure transport to {url}")]
    InsecureTransport { url: String },

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request timeout.
    #[error("Request timeout")]
    Timeout,

    /// Request cancelled by the caller.
    #[error("Request cancelled")]
    Cancelled,

    /// Redirect chain exceeded the hop ceiling.
    #[error("Stopped after {limit} redirects")]
    TooManyRedirects { limit: usize },

    /// Any other transport failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body exceeded the configured ceiling.
    #[error("Response body exceeds {limit} bytes")]
    ResponseTooLarge { limit: u64 },

    /// Multipart payload exceeded the configured ceiling.
    #[error("Multipart payload exceeds {limit} bytes")]
    MultipartTooLarge { limit: u64 },

    /// Server answered with a non-2xx status.
    #[error("{0}")]
    Api(ApiError),
}

/// A non-2xx response from the API.
///
/// The response body is kept out of the `Display` output so that logging the
/// error never leaks server-provided content. Use [`ApiError::body`] or
/// [`ApiError::body_snippet`] to inspect it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP method of the failed request.
    pub method: String,
    /// Target URL of the failed request.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body, lossily decoded as UTF-8.
    pub body: String,
    /// Whether `body` was cut at the response-size ceiling.
    pub truncated: bool,
}

impl ApiError {
    /// The response body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The trimmed body cut to at most `max_chars` characters, with `...`
    /// appended when anything was dropped. Never splits a character.
    pub fn body_snippet(&self, max_chars: usize) -> String {
        if max_chars == 0 {
            return String::new();
        }
        let body = self.body.trim();
        match body.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &body[..cut]),
            None => body.to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.method.is_empty() && !self.url.is_empty() {
            write!(
                f,
                "PATCH API request failed: {} {} returned status {}",
                self.method, self.url, self.status
            )
        } else {
            write!(f, "PATCH API request failed with status {}", self.status)
        }
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Error::new(ErrorKind::Api(err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connection(err.to_string())
        } else {
            ErrorKind::Transport(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Serialization(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidBaseUrl(err.to_string()), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(body: &str) -> ApiError {
        ApiError {
            method: "GET".to_string(),
            url: "https://patch-api.conalog.com/api/v3/plants".to_string(),
            status: 500,
            body: body.to_string(),
            truncated: false,
        }
    }

    #[test]
    fn test_api_error_display_omits_body() {
        let err = Error::from(api_error("secret-token-in-body"));
        let display = err.to_string();

        assert!(display.contains("GET"));
        assert!(display.contains("returned status 500"));
        assert!(!display.contains("secret-token-in-body"));
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.api_error().unwrap().body(), "secret-token-in-body");
    }

    #[test]
    fn test_api_error_display_without_method() {
        let err = ApiError {
            method: String::new(),
            url: String::new(),
            status: 404,
            body: String::new(),
            truncated: false,
        };
        assert_eq!(err.to_string(), "PATCH API request failed with status 404");
    }

    #[test]
    fn test_body_snippet_respects_char_boundaries() {
        let err = api_error("  발전소 상태 오류  ");
        assert_eq!(err.body_snippet(3), "발전소...");
        assert_eq!(err.body_snippet(100), "발전소 상태 오류");
        assert_eq!(err.body_snippet(0), "");

        let emoji = api_error("☀️🔋⚡");
        let snippet = emoji.body_snippet(1);
        assert!(snippet.ends_with("..."));
        assert!(snippet.starts_with('☀'));
    }

    #[test]
    fn test_error_categories_are_distinct() {
        let cases: Vec<(Error, &str)> = vec![
            (Error::new(ErrorKind::InvalidBaseUrl("x".into())), "validation"),
            (Error::new(ErrorKind::HeaderInjection("multipart filename".into())), "validation"),
            (Error::new(ErrorKind::InvalidHeader("X Bad".into())), "validation"),
            (Error::new(ErrorKind::AmbiguousUpload("x".into())), "validation"),
            (Error::new(ErrorKind::Serialization("x".into())), "validation"),
            (
                Error::new(ErrorKind::InsecureTransport { url: "http://x".into() }),
                "security",
            ),
            (Error::new(ErrorKind::Timeout), "transport"),
            (Error::new(ErrorKind::Cancelled), "transport"),
            (Error::new(ErrorKind::TooManyRedirects { limit: 10 }), "transport"),
            (Error::new(ErrorKind::ResponseTooLarge { limit: 1 }), "size"),
            (Error::new(ErrorKind::MultipartTooLarge { limit: 1 }), "size"),
            (Error::from(api_error("")), "api"),
        ];

        for (err, category) in cases {
            let flags = [
                ("validation", err.is_validation()),
                ("security", err.is_transport_security()),
                ("transport", err.is_transport()),
                ("size", err.is_size_limit()),
                ("api", err.is_api_error()),
            ];
            for (name, set) in flags {
                assert_eq!(set, name == category, "{err:?} flagged as {name}");
            }
            assert_eq!(err.status().is_some(), category == "api");
        }
    }

    #[test]
    fn test_error_kind_display_messages() {
        let cases: Vec<(ErrorKind, &str)> = vec![
            (
                ErrorKind::HeaderInjection("multipart field name".into()),
                "multipart field name must not contain CR or LF characters",
            ),
            (ErrorKind::InvalidHeader("name 'X Bad'".into()), "Invalid header: name 'X Bad'"),
            (ErrorKind::Timeout, "Request timeout"),
            (ErrorKind::Cancelled, "Request cancelled"),
            (
                ErrorKind::TooManyRedirects { limit: 10 },
                "Stopped after 10 redirects",
            ),
            (
                ErrorKind::ResponseTooLarge { limit: 1024 },
                "Response body exceeds 1024 bytes",
            ),
            (
                ErrorKind::MultipartTooLarge { limit: 2048 },
                "Multipart payload exceeds 2048 bytes",
            ),
            (
                ErrorKind::InsecureTransport {
                    url: "http://example.com/".into(),
                },
                "insecure transport",
            ),
        ];

        for (kind, expected_substring) in cases {
            let display = kind.to_string();
            assert!(
                display.contains(expected_substring),
                "Expected '{display}' to contain '{expected_substring}'"
            );
        }
    }

    #[test]
    fn test_error_with_source() {
        let source_err = std::io::Error::other("reset by peer");
        let err = Error::with_source(ErrorKind::Transport("read failed".into()), source_err);

        assert!(err.source.is_some());
        assert_eq!(err.to_string(), "Transport error: read failed");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<String>("not valid json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err.kind, ErrorKind::Serialization(_)));
        assert!(err.is_validation());
    }

    #[test]
    fn test_from_url_parse_error() {
        let url_err = url::Url::parse("not a url").unwrap_err();
        let err: Error = url_err.into();
        assert!(matches!(err.kind, ErrorKind::InvalidBaseUrl(_)));
    }
}
