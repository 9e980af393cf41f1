//! Decision memo properties across simulated relaunches.

use tempfile::tempdir;
use waypoint_types::{ContentLocation, DecisionState, Route};

use crate::common::{
    config_for, endpoint, launch, mount_registration_reply, start_registration_mock,
};

fn web(value: &str) -> Route {
    Route::Web(ContentLocation::new(value).unwrap())
}

#[tokio::test]
async fn decided_route_is_stable_without_network() {
    let server = start_registration_mock().await;
    mount_registration_reply(
        &server,
        200,
        serde_json::json!({ "success": true, "data": "https://x/y" }),
        1,
    )
    .await;
    let dir = tempdir().unwrap();
    let config = config_for(endpoint(&server), dir.path());

    assert_eq!(launch(&config).resolve().await, web("https://x/y"));
    for _ in 0..3 {
        assert_eq!(launch(&config).resolve().await, web("https://x/y"));
    }
}

#[tokio::test]
async fn transient_failure_retries_next_launch() {
    let server = start_registration_mock().await;
    mount_registration_reply(&server, 503, serde_json::json!({ "error": "busy" }), 2).await;
    let dir = tempdir().unwrap();
    let config = config_for(endpoint(&server), dir.path());

    assert_eq!(launch(&config).resolve().await, Route::Native);
    assert_eq!(launch(&config).state(), DecisionState::Undecided);
    assert_eq!(launch(&config).resolve().await, Route::Native);
}

#[tokio::test]
async fn transient_failure_then_grant() {
    let server = start_registration_mock().await;
    let dir = tempdir().unwrap();
    let config = config_for(endpoint(&server), dir.path());
    {
        let _guard = wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .expect(1)
            .mount_as_scoped(&server)
            .await;
        assert_eq!(launch(&config).resolve().await, Route::Native);
    }

    mount_registration_reply(
        &server,
        200,
        serde_json::json!({ "success": true, "data": "https://x/y" }),
        1,
    )
    .await;
    assert_eq!(launch(&config).resolve().await, web("https://x/y"));
}

#[tokio::test]
async fn definitive_negatives_are_sticky() {
    for body in [
        serde_json::json!({ "success": true, "data": "" }),
        serde_json::json!({ "success": false, "data": "anything" }),
    ] {
        let server = start_registration_mock().await;
        mount_registration_reply(&server, 200, body.clone(), 1).await;
        let dir = tempdir().unwrap();
        let config = config_for(endpoint(&server), dir.path());

        assert_eq!(launch(&config).resolve().await, Route::Native, "{body}");
        assert_eq!(
            launch(&config).state(),
            DecisionState::Decided(Route::Native),
            "{body}"
        );
        assert_eq!(launch(&config).resolve().await, Route::Native, "{body}");
    }
}

#[tokio::test]
async fn non_url_location_is_a_definitive_negative() {
    let server = start_registration_mock().await;
    mount_registration_reply(
        &server,
        200,
        serde_json::json!({ "success": true, "data": "definitely not a url" }),
        1,
    )
    .await;
    let dir = tempdir().unwrap();
    let config = config_for(endpoint(&server), dir.path());

    assert_eq!(launch(&config).resolve().await, Route::Native);
    assert_eq!(launch(&config).state(), DecisionState::Decided(Route::Native));
}

#[tokio::test]
async fn malformed_endpoint_never_persists() {
    let dir = tempdir().unwrap();
    let config = config_for("not a url/api/v1/register".to_string(), dir.path());

    assert_eq!(launch(&config).resolve().await, Route::Native);
    assert_eq!(launch(&config).state(), DecisionState::Undecided);
    assert_eq!(launch(&config).resolve().await, Route::Native);
    assert_eq!(launch(&config).state(), DecisionState::Undecided);
}

#[tokio::test]
async fn reset_restores_first_launch() {
    let server = start_registration_mock().await;
    mount_registration_reply(
        &server,
        200,
        serde_json::json!({ "success": true, "data": "https://x/y" }),
        2,
    )
    .await;
    let dir = tempdir().unwrap();
    let config = config_for(endpoint(&server), dir.path());

    assert_eq!(launch(&config).resolve().await, web("https://x/y"));
    launch(&config).reset().unwrap();
    assert_eq!(launch(&config).state(), DecisionState::Undecided);
    assert_eq!(launch(&config).resolve().await, web("https://x/y"));
}
