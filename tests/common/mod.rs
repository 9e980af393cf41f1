//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use waypoint_config::{IdentifierSetting, Platform, ResolvedConfig};
use waypoint_router::{RoutingDecider, Waypoint};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const REGISTER_PATH: &str = "/api/v1/register";

/// Start a mock registration server with nothing mounted.
pub async fn start_registration_mock() -> MockServer {
    MockServer::start().await
}

/// Mount a registration reply expected exactly `times` times.
pub async fn mount_registration_reply(
    server: &MockServer,
    status: u16,
    body: serde_json::Value,
    times: u64,
) {
    Mock::given(method("POST"))
        .and(path(REGISTER_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

/// Mount a registration reply that arrives after `delay`.
pub async fn mount_slow_registration(server: &MockServer, delay: Duration) {
    Mock::given(method("POST"))
        .and(path(REGISTER_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "success": true, "data": "https://x/y" }))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Headless, static-identifier config pointing at `endpoint` and storing in `data_dir`.
pub fn config_for(endpoint: String, data_dir: &Path) -> ResolvedConfig {
    ResolvedConfig {
        registration_endpoint: endpoint,
        timeout: Duration::from_secs(5),
        https_only: false,
        platform: Platform::Headless,
        identifier: IdentifierSetting::Static("device-1".to_string()),
        validate_content_location: true,
        data_dir: data_dir.to_path_buf(),
        launch_screen_delay: Duration::ZERO,
    }
}

pub fn endpoint(server: &MockServer) -> String {
    format!("{}{REGISTER_PATH}", server.uri())
}

/// Build a fresh decider, as a new process launch would.
pub fn launch(config: &ResolvedConfig) -> RoutingDecider {
    Waypoint::from_config(config)
        .expect("routing stack wires")
        .into_decider()
}
