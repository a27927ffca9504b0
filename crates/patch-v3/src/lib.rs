//! # patch-api-v3
//!
//! Endpoint methods for the PATCH Plant Data API v3.
//!
//! Every method fills in a `/api/v3/...` path template and query shape and
//! hands the call to [`PatchClient`](patch_api_client::PatchClient). Payloads
//! are returned as opaque JSON.
//!
//! ## Endpoints
//!
//! - **Account** - password login, token refresh, account info
//! - **Organizations** - members and plant permissions
//! - **Plants** - list, create, details, blueprint, file upload
//! - **Indicators** - asset health level, panel sequence numbers
//! - **Metrics** - latest device/inverter metrics, metrics by date
//! - **Logs** - inverter logs
//! - **Registry** - asset registration records
//!
//! ## Example
//!
//! ```rust,ignore
//! use patch_api_v3::PlantDataClient;
//! use patch_api_client::ClientConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), patch_api_v3::Error> {
//!     let client = PlantDataClient::new(ClientConfig::from_env()?)?;
//!     client.login("manager@example.com", "secret", None).await?;
//!
//!     let plants = client.get_plant_list(Some(1), Some(20), None).await?;
//!     println!("{plants}");
//!     Ok(())
//! }
//! ```

mod client;
mod models;

pub use client::PlantDataClient;
pub use models::{AuthSession, AuthWithPassword, MetricsQuery};

pub use patch_api_client::{
    AccountType, ClientConfig, Error, ErrorKind, FilePart, Payload, RequestOptions, Result,
};
