//! Client configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind};

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://patch-api.conalog.com";

/// Default ceiling for response bodies (10 MiB).
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 10 << 20;

/// Default ceiling for encoded multipart payloads (20 MiB).
pub const DEFAULT_MAX_MULTIPART_BYTES: u64 = 20 << 20;

/// Coarse authorization role sent in the `Account-Type` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Viewer,
    Manager,
    Admin,
}

impl AccountType {
    /// Header value for this account type.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Viewer => "viewer",
            AccountType::Manager => "manager",
            AccountType::Admin => "admin",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(AccountType::Viewer),
            "manager" => Ok(AccountType::Manager),
            "admin" => Ok(AccountType::Admin),
            other => Err(Error::new(ErrorKind::Config(format!(
                "unknown account type '{other}'"
            )))),
        }
    }
}

/// A byte ceiling, or no ceiling at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeLimit {
    Bytes(u64),
    Unbounded,
}

impl SizeLimit {
    /// The ceiling in bytes, or `None` when unbounded.
    pub fn max_bytes(&self) -> Option<u64> {
        match self {
            SizeLimit::Bytes(n) => Some(*n),
            SizeLimit::Unbounded => None,
        }
    }

    /// Returns true if `len` bytes exceed this ceiling.
    pub fn exceeded_by(&self, len: u64) -> bool {
        self.max_bytes().is_some_and(|max| len > max)
    }

    /// The ceiling as reported in errors (`u64::MAX` when unbounded).
    pub(crate) fn reported(&self) -> u64 {
        self.max_bytes().unwrap_or(u64::MAX)
    }

    /// Use `limit` if positive, otherwise `default`.
    pub(crate) fn or_default(limit: u64, default: u64) -> Self {
        if limit == 0 {
            SizeLimit::Bytes(default)
        } else {
            SizeLimit::Bytes(limit)
        }
    }
}

/// Configuration for [`PatchClient`](crate::PatchClient).
#[derive(Clone)]
pub struct ClientConfig {
    /// API base URL (scheme, host and optional path prefix).
    pub base_url: String,
    /// Headers sent with every request.
    pub default_headers: Vec<(String, String)>,
    /// Access token used when a call does not override it.
    pub access_token: Option<String>,
    /// Account type used when a call does not override it.
    pub account_type: Option<AccountType>,
    /// Response body ceiling.
    pub max_response_bytes: SizeLimit,
    /// Encoded multipart payload ceiling.
    pub max_multipart_bytes: SizeLimit,
    /// Allow plain HTTP to non-loopback hosts.
    pub allow_insecure_http: bool,
    /// Per-call timeout applied when a call does not set its own.
    pub timeout: Option<Duration>,
    /// Connection timeout for the default transport.
    pub connect_timeout: Duration,
    /// User-Agent header value for the default transport.
    pub user_agent: String,
    /// Whether to enable request/response tracing.
    pub enable_tracing: bool,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers.len())
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("account_type", &self.account_type)
            .field("max_response_bytes", &self.max_response_bytes)
            .field("max_multipart_bytes", &self.max_multipart_bytes)
            .field("allow_insecure_http", &self.allow_insecure_http)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_headers: Vec::new(),
            access_token: None,
            account_type: None,
            max_response_bytes: SizeLimit::Bytes(DEFAULT_MAX_RESPONSE_BYTES),
            max_multipart_bytes: SizeLimit::Bytes(DEFAULT_MAX_MULTIPART_BYTES),
            allow_insecure_http: false,
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Duration::from_secs(10),
            user_agent: crate::USER_AGENT.to_string(),
            enable_tracing: true,
        }
    }
}

impl ClientConfig {
    /// Create a new client config builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Load configuration from the environment.
    ///
    /// Reads `PATCH_API_BASE_URL`, `PATCH_API_TOKEN`, `PATCH_API_ACCOUNT_TYPE`
    /// and `PATCH_API_ALLOW_INSECURE_HTTP`. Unset variables keep their defaults.
    pub fn from_env() -> crate::Result<Self> {
        let mut config = ClientConfig::default();

        if let Ok(base_url) = std::env::var("PATCH_API_BASE_URL") {
            if !base_url.trim().is_empty() {
                config.base_url = base_url;
            }
        }

        config.access_token = std::env::var("PATCH_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        if let Ok(account_type) = std::env::var("PATCH_API_ACCOUNT_TYPE") {
            if !account_type.trim().is_empty() {
                config.account_type = Some(account_type.parse()?);
            }
        }

        if let Ok(flag) = std::env::var("PATCH_API_ALLOW_INSECURE_HTTP") {
            config.allow_insecure_http = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }

        Ok(config)
    }
}

/// Builder for ClientConfig.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Add a default header.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.push((name.into(), value.into()));
        self
    }

    /// Set the default access token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.config.access_token = Some(token.into());
        self
    }

    /// Set the default account type.
    pub fn with_account_type(mut self, account_type: AccountType) -> Self {
        self.config.account_type = Some(account_type);
        self
    }

    /// Set the response body ceiling. Zero restores the default.
    pub fn with_max_response_bytes(mut self, limit: u64) -> Self {
        self.config.max_response_bytes = SizeLimit::or_default(limit, DEFAULT_MAX_RESPONSE_BYTES);
        self
    }

    /// Read response bodies without a ceiling.
    pub fn with_unbounded_responses(mut self) -> Self {
        self.config.max_response_bytes = SizeLimit::Unbounded;
        self
    }

    /// Set the multipart payload ceiling. Zero restores the default.
    pub fn with_max_multipart_bytes(mut self, limit: u64) -> Self {
        self.config.max_multipart_bytes =
            SizeLimit::or_default(limit, DEFAULT_MAX_MULTIPART_BYTES);
        self
    }

    /// Allow plain HTTP to non-loopback hosts.
    pub fn with_insecure_http(mut self, allow: bool) -> Self {
        self.config.allow_insecure_http = allow;
        self
    }

    /// Set the default per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Disable the default per-call timeout.
    pub fn without_timeout(mut self) -> Self {
        self.config.timeout = None;
        self
    }

    /// Set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set custom User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Enable or disable request/response tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.config.enable_tracing = enabled;
        self
    }

    /// Build the client configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
