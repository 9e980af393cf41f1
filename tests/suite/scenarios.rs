//! First-launch and relaunch scenarios against a mock registration server.

use std::time::Duration;

use tempfile::tempdir;
use waypoint_store::{DecisionStore, FileStore};
use waypoint_types::{ContentLocation, DisplayMode, RegistrationOutcome};

use crate::common::{
    config_for, endpoint, launch, mount_registration_reply, mount_slow_registration,
    start_registration_mock,
};

fn stored_outcome(dir: &std::path::Path) -> RegistrationOutcome {
    DecisionStore::new(std::sync::Arc::new(FileStore::in_dir(dir))).outcome()
}

#[tokio::test]
async fn granted_location_shows_web_content() {
    let server = start_registration_mock().await;
    mount_registration_reply(
        &server,
        200,
        serde_json::json!({ "success": true, "data": "https://example.com/page" }),
        1,
    )
    .await;
    let dir = tempdir().unwrap();

    let (mode, location) = launch(&config_for(endpoint(&server), dir.path()))
        .resolve()
        .await
        .into_parts();

    assert_eq!(mode, DisplayMode::WebContent);
    assert_eq!(
        location.as_ref().map(ContentLocation::as_str),
        Some("https://example.com/page")
    );
    assert_eq!(stored_outcome(dir.path()), RegistrationOutcome::decided(location));
}

#[tokio::test]
async fn refused_registration_shows_native_and_is_remembered() {
    let server = start_registration_mock().await;
    mount_registration_reply(
        &server,
        200,
        serde_json::json!({ "success": false, "data": null }),
        1,
    )
    .await;
    let dir = tempdir().unwrap();

    let (mode, location) = launch(&config_for(endpoint(&server), dir.path()))
        .resolve()
        .await
        .into_parts();

    assert_eq!(mode, DisplayMode::NativeInterface);
    assert_eq!(location, None);
    assert_eq!(stored_outcome(dir.path()), RegistrationOutcome::decided(None));
}

#[tokio::test]
async fn timeout_shows_native_without_deciding() {
    let server = start_registration_mock().await;
    mount_slow_registration(&server, Duration::from_secs(2)).await;
    let dir = tempdir().unwrap();
    let mut config = config_for(endpoint(&server), dir.path());
    config.timeout = Duration::from_millis(100);

    let (mode, location) = launch(&config).resolve().await.into_parts();

    assert_eq!(mode, DisplayMode::NativeInterface);
    assert_eq!(location, None);
    assert!(!stored_outcome(dir.path()).attempted);
}

#[tokio::test]
async fn decided_native_makes_no_network_call() {
    let server = start_registration_mock().await;
    mount_registration_reply(
        &server,
        200,
        serde_json::json!({ "success": true, "data": "https://x/y" }),
        0,
    )
    .await;
    let dir = tempdir().unwrap();
    let config = config_for(endpoint(&server), dir.path());
    launch(&config).store().record_outcome(None).unwrap();

    let (mode, location) = launch(&config).resolve().await.into_parts();

    assert_eq!(mode, DisplayMode::NativeInterface);
    assert_eq!(location, None);
}
