use patch_api_client::{RequestBuilder, RequestOptions, Result};
use serde_json::Value;
use tracing::instrument;

impl super::PlantDataClient {
    /// Get the health level of a plant's assets for one day.
    #[instrument(skip(self, options))]
    pub async fn get_asset_health_level(
        &self,
        plant_id: &str,
        unit: &str,
        date: &str,
        view: Option<&str>,
        options: Option<&RequestOptions>,
    ) -> Result<Value> {
        let request = RequestBuilder::get("/api/v3/plants/{}/indicator/health-level/{}")
            .segment(plant_id)
            .segment(unit)
            .query("date", date)
            .query("view", view);
        self.fetch(request, options).await
    }

    /// Get panel sequence numbers for one day.
    #[instrument(skip(self, options))]
    pub async fn get_panel_seqnum(
        &self,
        plant_id: &str,
        date: &str,
        options: Option<&RequestOptions>,
    ) -> Result<Value> {
        let request = RequestBuilder::get("/api/v3/plants/{}/indicator/seqnum")
            .segment(plant_id)
            .query("date", date);
        self.fetch(request, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::client_for;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    #[tokio::test]
    async fn test_get_asset_health_level() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/plants/p1/indicator/health-level/inverter"))
            .and(query_param("date", "2024-05-01"))
            .and(query_param("view", "summary"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "levels": [{"id": "inv-1", "level": 2}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let health = client
            .get_asset_health_level("p1", "inverter", "2024-05-01", Some("summary"), None)
            .await
            .unwrap();
        assert_eq!(health["levels"][0]["level"], 2);
    }

    #[tokio::test]
    async fn test_health_level_without_view() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/plants/p1/indicator/health-level/panel"))
            .respond_with(|req: &Request| {
                assert_eq!(req.url.query(), Some("date=2024-05-01"));
                ResponseTemplate::new(200).set_body_json(serde_json::json!({}))
            })
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        client
            .get_asset_health_level("p1", "panel", "2024-05-01", None, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_panel_seqnum() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/plants/p1/indicator/seqnum"))
            .and(query_param("date", "2024-05-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([1, 2, 3])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let seqnum = client.get_panel_seqnum("p1", "2024-05-01", None).await.unwrap();
        assert_eq!(seqnum, serde_json::json!([1, 2, 3]));
    }
}
