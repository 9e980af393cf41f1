//! Config file to wired routing stack.

use std::fs;
use std::time::Duration;

use tempfile::tempdir;
use waypoint_config::{IdentifierSetting, Platform, ResolvedConfig, WaypointConfig};
use waypoint_types::Route;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{REGISTER_PATH, launch, start_registration_mock};

#[tokio::test]
async fn config_file_drives_registration() {
    let server = start_registration_mock().await;
    Mock::given(method("POST"))
        .and(path(REGISTER_PATH))
        .and(header("user-agent", waypoint_client::MOBILE_USER_AGENT))
        .and(body_json(serde_json::json!({ "userData": "kiosk-7" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "success": true, "data": "https://x/y" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    let data_dir = dir.path().join("data");
    fs::write(
        &config_path,
        format!(
            r#"
[server]
base_url = "{base}/"

[http]
timeout_secs = 3
https_only = false

[client]
platform = "mobile"
identifier = "static"
static_identifier = "kiosk-7"

[storage]
data_dir = "{data}"

[app]
launch_screen_delay_ms = 0
"#,
            base = server.uri(),
            data = data_dir.display().to_string().replace('\\', "\\\\"),
        ),
    )
    .unwrap();

    let file = WaypointConfig::load_from(config_path).unwrap().unwrap();
    let resolved = ResolvedConfig::from_config_with_env(&file, |_| None).unwrap();
    assert_eq!(resolved.platform, Platform::Mobile);
    assert_eq!(
        resolved.identifier,
        IdentifierSetting::Static("kiosk-7".to_string())
    );
    assert_eq!(resolved.timeout, Duration::from_secs(3));
    assert_eq!(resolved.launch_screen_delay, Duration::ZERO);

    let route = launch(&resolved).resolve().await;
    assert_eq!(route.to_string(), "web https://x/y");
    assert!(data_dir.join(waypoint_store::DECISION_FILE_NAME).exists());
    assert!(matches!(route, Route::Web(_)));
}

#[tokio::test]
async fn https_only_refuses_plain_http_endpoint() {
    let server = start_registration_mock().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let mut config = crate::common::config_for(crate::common::endpoint(&server), dir.path());
    config.https_only = true;

    let decider = launch(&config);
    assert_eq!(decider.resolve().await, Route::Native);
    assert!(!decider.store().outcome().attempted);
}
