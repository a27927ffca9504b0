//! Transport safety policy through the real HTTP stack.

use std::time::Duration;

use super::common::{client_for, config_for, start_server};
use patch_api::{ErrorKind, PatchClient, RequestOptions};
use patch_api::client::{CancellationToken, RequestBuilder};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_insecure_base_url_is_refused() {
    let config = patch_api::ClientConfig::builder()
        .with_base_url("http://patch-api.example.com")
        .build();

    let err = PatchClient::new(config).unwrap_err();
    assert!(err.is_transport_security());
}

#[tokio::test]
async fn test_authenticated_redirect_is_not_replayed() {
    let server = start_server().await;

    Mock::given(path("/api/v3/account/"))
        .respond_with(ResponseTemplate::new(307).insert_header("Location", "/api/v3/collect"))
        .mount(&server)
        .await;
    Mock::given(path("/api/v3/collect"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.inner().set_access_token("secret-token");

    let err = client.get_account_info(None).await.unwrap_err();
    assert_eq!(err.status(), Some(307));
}

#[tokio::test]
async fn test_redirect_downgrade_to_remote_http_is_blocked() {
    let server = start_server().await;

    Mock::given(path("/api/v3/plants"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "http://patch-api.example.com/api/v3/plants"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_plant_list(None, None, None).await.unwrap_err();

    assert!(err.is_transport_security());
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_redirect_loop_stops() {
    let server = start_server().await;

    Mock::given(path("/api/v3/plants"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/api/v3/plants"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_plant_list(None, None, None).await.unwrap_err();

    assert!(matches!(err.kind, ErrorKind::TooManyRedirects { limit: 10 }));
    let received = server.received_requests().await.expect("recording enabled");
    assert_eq!(received.len(), 11);
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let server = start_server().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/plants/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let options = RequestOptions::new().timeout(Duration::from_millis(100));
    let err = client
        .get_plant_details("slow", Some(&options))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_cancellation_aborts_call() {
    let server = start_server().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/plants/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = CancellationToken::new();
    let options = RequestOptions::new().cancel_token(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });
    let err = client
        .get_plant_details("slow", Some(&options))
        .await
        .unwrap_err();
    canceller.await.expect("canceller task");

    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_oversized_error_body_keeps_status() {
    let server = start_server().await;

    Mock::given(path("/api/v3/plants"))
        .respond_with(ResponseTemplate::new(502).set_body_string("e".repeat(8192)))
        .mount(&server)
        .await;

    let client = PatchClient::new(
        patch_api::ClientConfig::builder()
            .with_base_url(server.uri())
            .with_max_response_bytes(1024)
            .build(),
    )
    .expect("client");

    let err = client
        .execute(RequestBuilder::get("/api/v3/plants"))
        .await
        .unwrap_err();

    let api = err.api_error().expect("api error");
    assert_eq!(api.status, 502);
    assert!(api.truncated);
    assert_eq!(api.body(), "e".repeat(1024));
}

#[tokio::test]
async fn test_non_v3_paths_are_rejected() {
    let server = start_server().await;
    let client = PatchClient::new(config_for(&server)).expect("client");

    let err = client
        .execute(RequestBuilder::get("/api/v2/information/plants"))
        .await
        .unwrap_err();

    assert!(err.is_validation());
    let received = server.received_requests().await.expect("recording enabled");
    assert!(received.is_empty());
}
