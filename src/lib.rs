//! # patch-api
//!
//! A Rust client library for the PATCH Plant Data API v3.
//!
//! ## Security
//!
//! This library is designed with security in mind:
//! - Tokens are redacted in Debug output and never logged
//! - Credentials are never replayed across redirects
//! - Plain HTTP is refused for non-loopback hosts unless explicitly allowed
//! - Response and upload sizes are capped
//! - Error messages never include the response body
//!
//! ## Crates
//!
//! - **patch-api-client** - Request building, transport safety, bounded reads
//! - **patch-api-v3** - One method per v3 endpoint
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use patch_api::{ClientConfig, PlantDataClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PlantDataClient::new(ClientConfig::from_env()?)?;
//!     client.login("manager@example.com", "secret", None).await?;
//!
//!     let plants = client.get_plant_list(Some(1), Some(20), None).await?;
//!     for plant in plants["items"].as_array().into_iter().flatten() {
//!         println!("{}", plant["name"]);
//!     }
//!
//!     Ok(())
//! }
//! ```

// Re-export member crates for convenient access
#[cfg(feature = "client")]
pub use patch_api_client as client;
#[cfg(feature = "v3")]
pub use patch_api_v3 as v3;

// Re-export commonly used types at the top level
#[cfg(feature = "client")]
pub use patch_api_client::{
    AccountType, ApiError, ClientConfig, Error, ErrorKind, FilePart, PatchClient, Payload,
    RequestOptions, Result,
};
#[cfg(feature = "v3")]
pub use patch_api_v3::{MetricsQuery, PlantDataClient};
