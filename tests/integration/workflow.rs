//! End-to-end flows through the v3 client.

use std::collections::BTreeMap;

use super::common::{client_for, start_server};
use patch_api::{AccountType, FilePart, MetricsQuery, RequestOptions};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v3/account/auth-with-password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": token,
            "type": "manager",
            "name": "Site Manager",
            "email": "manager@example.com"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_manager_session_workflow() {
    let server = start_server().await;
    mount_login(&server, "session-token").await;

    Mock::given(method("GET"))
        .and(path("/api/v3/plants"))
        .and(query_param("page", "1"))
        .and(query_param("size", "20"))
        .and(header("Authorization", "Bearer session-token"))
        .and(header("Account-Type", "manager"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{"id": "plant-1", "name": "Solar One"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/plants/plant-1"))
        .and(header("Authorization", "Bearer session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "plant-1",
            "capacity": 980.5
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/plants/plant-1/metrics/inverter/inv-1-15m"))
        .and(query_param("date", "2024-05-01"))
        .and(query_param("fields", "p"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "rows": [{"ts": 1714521600, "p": 12.5}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .login("manager@example.com", "secret", None)
        .await
        .expect("login should succeed");
    assert_eq!(client.inner().account_type(), Some(AccountType::Manager));

    let plants = client
        .get_plant_list(Some(1), Some(20), None)
        .await
        .expect("plant list should succeed");
    let plant_id = plants["items"][0]["id"].as_str().expect("plant id");

    let details = client
        .get_plant_details(plant_id, None)
        .await
        .expect("plant details should succeed");
    assert_eq!(details["capacity"], 980.5);

    let metrics = client
        .get_metrics_by_date(
            plant_id,
            "inverter",
            "inv-1",
            "15m",
            &MetricsQuery::new("2024-05-01").field("p"),
            None,
        )
        .await
        .expect("metrics should succeed");
    assert_eq!(metrics["rows"][0]["p"], 12.5);
}

#[tokio::test]
async fn test_upload_with_per_call_headers() {
    let server = start_server().await;

    Mock::given(method("POST"))
        .and(path("/api/v3/plants/plant-1/files"))
        .and(header("X-Request-Id", "req-42"))
        .and(header("Authorization", "Bearer per-call"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "file-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut fields = BTreeMap::new();
    fields.insert("name".to_string(), "Layout March".to_string());
    let mut files = BTreeMap::new();
    files.insert(
        "attachment".to_string(),
        FilePart::new("layout.pdf", b"%PDF-1.7".to_vec()).with_content_type("application/pdf"),
    );
    let options = RequestOptions::new()
        .access_token("per-call")
        .header("X-Request-Id", "req-42");

    let uploaded = client
        .upload_plant_files("plant-1", fields, files, Some(&options))
        .await
        .expect("upload should succeed");
    assert_eq!(uploaded["id"], "file-1");

    let received = server.received_requests().await.expect("recording enabled");
    let body = String::from_utf8_lossy(&received[0].body);
    assert!(body.contains("Layout March"));
    assert!(body.contains("filename=\"layout.pdf\""));
}

#[tokio::test]
async fn test_concurrent_calls_share_one_client() {
    let server = start_server().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/plants/plant-1/indicator/seqnum"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([1])))
        .expect(16)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.inner().set_access_token("token-a");

    let mut handles = Vec::new();
    for i in 0..16 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            if i % 4 == 0 {
                client.inner().set_access_token(format!("token-{i}"));
            }
            client.get_panel_seqnum("plant-1", "2024-05-01", None).await
        }));
    }
    for handle in handles {
        let seqnum = handle.await.expect("task").expect("seqnum");
        assert_eq!(seqnum, serde_json::json!([1]));
    }

    for request in server.received_requests().await.expect("recording enabled") {
        let auth = request
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .expect("authorization header");
        assert!(auth.starts_with("Bearer token-"), "{auth}");
    }
}
