//! PATCH Plant Data API v3 client.
//!
//! This client wraps `PatchClient` from `patch-api-client` and provides one
//! method per v3 operation.

use patch_api_client::{ClientConfig, PatchClient, RequestBuilder, RequestOptions, Result};

mod account;
mod indicators;
mod logs;
mod metrics;
mod organizations;
mod plants;
mod registry;

/// PATCH Plant Data API v3 client.
///
/// Every method takes optional per-call [`RequestOptions`] for token,
/// account-type, header, timeout and cancellation overrides.
///
/// # Example
///
/// ```rust,ignore
/// use patch_api_v3::{ClientConfig, MetricsQuery, PlantDataClient};
///
/// let client = PlantDataClient::new(ClientConfig::default())?;
/// client.login("manager@example.com", "secret", None).await?;
///
/// let details = client.get_plant_details("plant-1", None).await?;
/// let metrics = client
///     .get_metrics_by_date(
///         "plant-1",
///         "device",
///         "panel",
///         "5m",
///         &MetricsQuery::new("2024-05-01").field("p"),
///         None,
///     )
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct PlantDataClient {
    client: PatchClient,
}

impl PlantDataClient {
    /// Create a client with the default transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            client: PatchClient::new(config)?,
        })
    }

    /// Create a client from an existing PatchClient.
    pub fn from_client(client: PatchClient) -> Self {
        Self { client }
    }

    /// Get the underlying PatchClient.
    pub fn inner(&self) -> &PatchClient {
        &self.client
    }

    async fn fetch(
        &self,
        request: RequestBuilder,
        options: Option<&RequestOptions>,
    ) -> Result<serde_json::Value> {
        let response = self.client.execute(request.options(options)).await?;
        Ok(response.into_payload().into_value())
    }
}
