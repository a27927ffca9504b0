//! Security utilities for PATCH API requests.
//!
//! These checks run before any byte leaves the process. They are used by the
//! request orchestrator and are public so that callers building requests by
//! hand can apply the same policy.
//!
//! ## Path Parameter Encoding
//!
//! User-provided values in URL paths MUST be encoded one segment at a time:
//!
//! ```rust
//! use patch_api_client::security::url;
//!
//! let encoded = url::encode_param("unit/a");
//! assert_eq!(encoded, "unit%2Fa");
//! ```
//!
//! ## Insecure Transport
//!
//! Plain `http` is only allowed for loopback hosts unless the client was
//! explicitly configured to allow it:
//!
//! ```rust
//! use patch_api_client::security::transport;
//!
//! let target = ::url::Url::parse("http://127.0.0.1:8080/api/v3/plants").unwrap();
//! assert!(transport::check_transport(&target, false).is_ok());
//!
//! let target = ::url::Url::parse("http://example.com/api/v3/plants").unwrap();
//! assert!(transport::check_transport(&target, false).is_err());
//! ```

/// URL encoding and host classification.
pub mod url {
    use std::net::IpAddr;

    /// Percent-encode a single path segment.
    ///
    /// Everything except ASCII alphanumerics and `-_.~` is encoded, so a `/`
    /// inside the value can never act as a path separator.
    ///
    /// # Example
    ///
    /// ```rust
    /// use patch_api_client::security::url;
    ///
    /// assert_eq!(url::encode_param("001/../../secret"), "001%2F..%2F..%2Fsecret");
    /// ```
    #[must_use]
    pub fn encode_param(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }

    /// Returns true if `host` only ever refers to the local machine.
    ///
    /// Accepts `localhost` (any case) and loopback IP literals, including
    /// bracketed IPv6 such as `[::1]`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use patch_api_client::security::url;
    ///
    /// assert!(url::is_loopback_host("localhost"));
    /// assert!(url::is_loopback_host("127.0.0.1"));
    /// assert!(url::is_loopback_host("[::1]"));
    /// assert!(!url::is_loopback_host("patch-api.conalog.com"));
    /// ```
    #[must_use]
    pub fn is_loopback_host(host: &str) -> bool {
        if host.eq_ignore_ascii_case("localhost") {
            return true;
        }
        let bare = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        bare.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
    }
}

/// Insecure-transport guard and redirect policy.
pub mod transport {
    use ::url::Url;

    use crate::error::{Error, ErrorKind, Result};
    use crate::headers::{HeaderSet, ACCEPT, CONTENT_TYPE};

    /// Maximum redirect hops followed for requests that allow redirects.
    pub const MAX_REDIRECTS: usize = 10;

    /// Reject `target` unless it is HTTPS, loopback, or insecure HTTP is allowed.
    pub fn check_transport(target: &Url, allow_insecure: bool) -> Result<()> {
        if allow_insecure || is_secure_or_loopback(target) {
            return Ok(());
        }
        Err(Error::new(ErrorKind::InsecureTransport {
            url: redacted(target),
        }))
    }

    fn is_secure_or_loopback(target: &Url) -> bool {
        if target.scheme().eq_ignore_ascii_case("https") {
            return true;
        }
        if !target.scheme().eq_ignore_ascii_case("http") {
            return false;
        }
        target
            .host_str()
            .is_some_and(super::url::is_loopback_host)
    }

    /// Returns true if automatic redirect-following must be disabled.
    ///
    /// Redirects are only followed for requests without a body, without a
    /// non-blank `Authorization` header, and without any non-blank header
    /// other than `Accept` and `Content-Type`.
    pub fn should_disable_redirects(headers: &HeaderSet, has_body: bool) -> bool {
        if has_body || headers.has_authorization() {
            return true;
        }
        headers.iter().any(|(name, value)| {
            !value.trim().is_empty() && name != ACCEPT && name != CONTENT_TYPE
        })
    }

    /// Returns true for statuses that carry a `Location` to follow.
    pub fn is_redirect_status(status: u16) -> bool {
        matches!(status, 301 | 302 | 303 | 307 | 308)
    }

    /// Resolve a `Location` header against the URL that produced it.
    pub fn resolve_redirect(current: &Url, location: &str) -> Result<Url> {
        current.join(location).map_err(|e| {
            Error::with_source(
                ErrorKind::Transport(format!("invalid redirect location: {e}")),
                e,
            )
        })
    }

    /// URL without userinfo or query, safe to put in an error message.
    pub(crate) fn redacted(target: &Url) -> String {
        let mut shown = target.clone();
        let _ = shown.set_username("");
        let _ = shown.set_password(None);
        shown.set_query(None);
        shown.to_string()
    }
}

/// Multipart header-parameter safety.
pub mod multipart {
    use crate::error::{Error, ErrorKind, Result};

    /// Reject values containing CR or LF.
    ///
    /// `what` names the offending value in the error message.
    pub fn reject_crlf<'a>(value: &'a str, what: &str) -> Result<&'a str> {
        if value.contains(['\r', '\n']) {
            return Err(Error::new(ErrorKind::HeaderInjection(what.to_string())));
        }
        Ok(value)
    }

    /// Escape `\` and `"` for use inside a quoted header parameter.
    ///
    /// # Example
    ///
    /// ```rust
    /// use patch_api_client::security::multipart;
    ///
    /// assert_eq!(multipart::escape_quoted(r#"a"b\c"#), r#"a\"b\\c"#);
    /// ```
    #[must_use]
    pub fn escape_quoted(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 4);
        for ch in value.chars() {
            match ch {
                '\\' => escaped.push_str("\\\\"),
                '"' => escaped.push_str("\\\""),
                _ => escaped.push(ch),
            }
        }
        escaped
    }
}
