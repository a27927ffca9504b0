use patch_api_client::{RequestBuilder, RequestOptions, Result};
use serde_json::Value;
use tracing::instrument;

impl super::PlantDataClient {
    /// List inverter logs for a plant.
    #[instrument(skip(self, options))]
    pub async fn list_inverter_logs(
        &self,
        plant_id: &str,
        page: Option<u32>,
        size: Option<u32>,
        options: Option<&RequestOptions>,
    ) -> Result<Value> {
        let request = RequestBuilder::get("/api/v3/plants/{}/logs/inverter")
            .segment(plant_id)
            .query_opt("page", page)
            .query_opt("size", size);
        self.fetch(request, options).await
    }

    /// List logs for one inverter.
    #[instrument(skip(self, options))]
    pub async fn list_inverter_logs_by_id(
        &self,
        plant_id: &str,
        inverter_id: &str,
        page: Option<u32>,
        size: Option<u32>,
        options: Option<&RequestOptions>,
    ) -> Result<Value> {
        let request = RequestBuilder::get("/api/v3/plants/{}/logs/inverters/{}")
            .segment(plant_id)
            .segment(inverter_id)
            .query_opt("page", page)
            .query_opt("size", size);
        self.fetch(request, options).await
    }
}
