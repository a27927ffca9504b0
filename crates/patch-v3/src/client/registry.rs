use patch_api_client::{RequestBuilder, RequestOptions, Result};
use serde_json::Value;
use tracing::instrument;

impl super::PlantDataClient {
    /// Get asset registration records of one type (for example `snapshots`)
    /// for a day, optionally narrowed to one asset or map.
    #[instrument(skip(self, options))]
    pub async fn get_asset_registration_on_plant(
        &self,
        plant_id: &str,
        record_type: &str,
        date: &str,
        asset_id: Option<&str>,
        map_id: Option<&str>,
        options: Option<&RequestOptions>,
    ) -> Result<Value> {
        let request = RequestBuilder::get("/api/v3/plants/{}/registry/{}")
            .segment(plant_id)
            .segment(record_type)
            .query("date", date)
            .query("asset_id", asset_id)
            .query("map_id", map_id);
        self.fetch(request, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::client_for;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    #[tokio::test]
    async fn test_get_asset_registration_on_plant() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/plants/p1/registry/snapshots"))
            .and(query_param("date", "2024-05-01"))
            .and(query_param("asset_id", "a-7"))
            .respond_with(|req: &Request| {
                assert!(!req.url.as_str().contains("map_id"));
                ResponseTemplate::new(200).set_body_json(serde_json::json!([{"assetId": "a-7"}]))
            })
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let records = client
            .get_asset_registration_on_plant("p1", "snapshots", "2024-05-01", Some("a-7"), None, None)
            .await
            .unwrap();
        assert_eq!(records[0]["assetId"], "a-7");
    }

    #[tokio::test]
    async fn test_registry_with_map_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/plants/p1/registry/maps"))
            .and(query_param("map_id", "m1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let records = client
            .get_asset_registration_on_plant("p1", "maps", "2024-05-01", None, Some("m1"), None)
            .await
            .unwrap();
        assert_eq!(records, serde_json::json!([]));
    }
}
