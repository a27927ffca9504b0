use std::sync::Once;

use patch_api::{ClientConfig, PlantDataClient};
use wiremock::MockServer;

static TRACING: Once = Once::new();

/// Install a test subscriber once per binary. Honors `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Start a mock API server.
pub async fn start_server() -> MockServer {
    init_tracing();
    MockServer::start().await
}

/// Client configuration pointed at the mock server.
pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::builder().with_base_url(server.uri()).build()
}

/// An unauthenticated client for the mock server.
pub fn client_for(server: &MockServer) -> PlantDataClient {
    PlantDataClient::new(config_for(server)).expect("Failed to create client")
}
