//! On-disk decision record shared between launches.

use std::fs;

use tempfile::tempdir;
use waypoint_client::INSTALLATION_ID_FILE_NAME;
use waypoint_config::IdentifierSetting;
use waypoint_store::{ATTEMPTED_KEY, CONTENT_LOCATION_KEY, DECISION_FILE_NAME};
use waypoint_types::{DecisionState, Route};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{
    REGISTER_PATH, config_for, endpoint, launch, mount_registration_reply, start_registration_mock,
};

#[tokio::test]
async fn decision_file_uses_stable_keys() {
    let server = start_registration_mock().await;
    mount_registration_reply(
        &server,
        200,
        serde_json::json!({ "success": true, "data": "https://x/y" }),
        1,
    )
    .await;
    let dir = tempdir().unwrap();
    launch(&config_for(endpoint(&server), dir.path()))
        .resolve()
        .await;

    let raw = fs::read_to_string(dir.path().join(DECISION_FILE_NAME)).unwrap();
    let record: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(record[ATTEMPTED_KEY], serde_json::json!(true));
    assert_eq!(record[CONTENT_LOCATION_KEY], serde_json::json!("https://x/y"));
}

#[tokio::test]
async fn record_written_elsewhere_is_honored() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(DECISION_FILE_NAME),
        r#"{"registration_attempted": true, "cached_content_url": ""}"#,
    )
    .unwrap();
    let config = config_for("https://unused.invalid/api".to_string(), dir.path());

    assert_eq!(launch(&config).state(), DecisionState::Decided(Route::Native));
}

#[tokio::test]
async fn corrupt_record_registers_again() {
    let server = start_registration_mock().await;
    mount_registration_reply(
        &server,
        200,
        serde_json::json!({ "success": false, "data": null }),
        1,
    )
    .await;
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(DECISION_FILE_NAME), "{ truncated").unwrap();
    let config = config_for(endpoint(&server), dir.path());

    assert_eq!(launch(&config).state(), DecisionState::Undecided);
    assert_eq!(launch(&config).resolve().await, Route::Native);
    assert_eq!(launch(&config).state(), DecisionState::Decided(Route::Native));
}

#[tokio::test]
async fn vendor_identifier_is_reused_across_attempts() {
    let server = start_registration_mock().await;
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(INSTALLATION_ID_FILE_NAME), "install-42").unwrap();

    Mock::given(method("POST"))
        .and(path(REGISTER_PATH))
        .and(body_json(serde_json::json!({ "userData": "install-42" })))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = config_for(endpoint(&server), dir.path());
    config.identifier = IdentifierSetting::Vendor;

    assert_eq!(launch(&config).resolve().await, Route::Native);
    assert_eq!(launch(&config).resolve().await, Route::Native);
}
