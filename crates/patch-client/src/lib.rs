//! # patch-api-client
//!
//! Request-building and response-safety core for the PATCH Plant Data API v3.
//!
//! This crate provides the HTTP layer every endpoint method goes through:
//! - Case-insensitive header merging with bearer/account-type derivation
//! - Per-segment path escaping and query construction
//! - `multipart/form-data` encoding with CR/LF rejection and a size ceiling
//! - Insecure-transport guard and credential-safe redirect policy
//! - Streaming response reads under a byte ceiling
//! - Per-call timeout and cancellation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Endpoint Methods                         │
//! │  (patch-api-v3)                                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PatchClient                              │
//! │  - Settings snapshot (token, account type, limits)          │
//! │  - Header merge, URL build, body encoding                   │
//! │  - Transport guard, redirects, bounded reads                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Transport                                │
//! │  - ReqwestTransport (redirects disabled, streaming bodies)  │
//! │  - Any injected implementation                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use patch_api_client::{ClientConfig, PatchClient, RequestBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), patch_api_client::Error> {
//!     let client = PatchClient::new(ClientConfig::from_env()?)?;
//!
//!     let plants: serde_json::Value = client
//!         .request_json(RequestBuilder::get("/api/v3/plants").query("page", "1"))
//!         .await?;
//!
//!     println!("{plants}");
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
pub mod headers;
pub mod multipart;
mod request;
pub mod response;
pub mod security;
pub mod transport;
pub mod url_builder;

pub use client::PatchClient;
pub use config::{
    AccountType, ClientConfig, ClientConfigBuilder, SizeLimit, DEFAULT_BASE_URL,
    DEFAULT_MAX_MULTIPART_BYTES, DEFAULT_MAX_RESPONSE_BYTES,
};
pub use error::{ApiError, Error, ErrorKind, Result};
pub use headers::HeaderSet;
pub use multipart::{EncodedMultipart, FilePart};
pub use request::{RequestBody, RequestBuilder, RequestMethod, RequestOptions};
pub use response::{Payload, Response};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use tokio_util::sync::CancellationToken;

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("patch-api/", env!("CARGO_PKG_VERSION"));
