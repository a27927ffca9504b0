use patch_api_client::{RequestBuilder, RequestOptions, Result};
use serde_json::Value;
use tracing::instrument;

use crate::models::MetricsQuery;

impl super::PlantDataClient {
    /// Get the latest metrics for every device of a plant.
    ///
    /// `ago` limits how far back, in seconds, a reading may be.
    #[instrument(skip(self, options))]
    pub async fn get_latest_device_metrics(
        &self,
        plant_id: &str,
        include_state: Option<bool>,
        ago: Option<i64>,
        options: Option<&RequestOptions>,
    ) -> Result<Value> {
        let request = RequestBuilder::get("/api/v3/plants/{}/metrics/device/latest")
            .segment(plant_id)
            .query_opt("includeState", include_state)
            .query_opt("ago", ago);
        self.fetch(request, options).await
    }

    /// Get the latest metrics for every inverter of a plant.
    #[instrument(skip(self, options))]
    pub async fn get_latest_inverter_metrics(
        &self,
        plant_id: &str,
        options: Option<&RequestOptions>,
    ) -> Result<Value> {
        let request =
            RequestBuilder::get("/api/v3/plants/{}/metrics/inverter/latest").segment(plant_id);
        self.fetch(request, options).await
    }

    /// Get one day of metrics for a source, unit and interval
    /// (for example `device`, `panel`, `5m`).
    #[instrument(skip(self, query, options), fields(date = %query.date))]
    pub async fn get_metrics_by_date(
        &self,
        plant_id: &str,
        source: &str,
        unit: &str,
        interval: &str,
        query: &MetricsQuery,
        options: Option<&RequestOptions>,
    ) -> Result<Value> {
        let request = RequestBuilder::get("/api/v3/plants/{}/metrics/{}/{}-{}")
            .segment(plant_id)
            .segment(source)
            .segment(unit)
            .segment(interval)
            .query("date", query.date.as_str())
            .query_opt("before", query.before)
            .query_list("fields", query.fields.iter().map(|f| Some(f.as_str())));
        self.fetch(request, options).await
    }
}
