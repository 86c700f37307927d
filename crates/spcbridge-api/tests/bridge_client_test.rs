#![allow(clippy::unwrap_used)]
// Integration tests for `BridgeClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spcbridge_api::{BridgeClient, BridgeCredentials, Error};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, BridgeClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = BridgeClient::with_client(
        reqwest::Client::new(),
        base_url,
        BridgeCredentials::default(),
    );
    (server, client)
}

fn ok(key: &str, data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "status": "success",
        "data": { key: data }
    }))
}

async fn mount_get(server: &MockServer, key: &str, data: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/spc/{key}")))
        .and(basic_auth("get_user", "get_pwd"))
        .respond_with(ok(key, data))
        .mount(server)
        .await;
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_areas_uses_get_credentials() {
    let (server, client) = setup().await;
    mount_get(
        &server,
        "area",
        json!([
            { "id": 1, "name": "House", "mode": 0, "zones": [1, 2] },
            { "id": "2", "name": "Garage", "mode": "3" }
        ]),
    )
    .await;

    let areas = client.areas().await.unwrap();
    assert_eq!(areas.len(), 2);
    assert_eq!(areas[0].name.as_deref(), Some("House"));
    assert_eq!(areas[0].zones, Some(vec![1, 2]));
    assert_eq!(areas[1].id, Some(2));
    assert_eq!(areas[1].mode, Some(3));
}

#[tokio::test]
async fn test_single_object_is_normalised_to_list() {
    let (server, client) = setup().await;
    mount_get(&server, "output", json!({ "id": 4, "name": "Siren", "state": 1 })).await;

    let outputs = client.outputs().await.unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].state, Some(true));
}

#[tokio::test]
async fn test_fetch_snapshot_collects_every_kind() {
    let (server, client) = setup().await;
    mount_get(&server, "panel", json!({ "serial": "123456", "mode": 0 })).await;
    mount_get(&server, "user", json!([{ "id": 1, "name": "Engineer" }])).await;
    mount_get(&server, "area", json!([{ "id": 1, "name": "House" }])).await;
    mount_get(
        &server,
        "zone",
        json!([{ "id": 1, "name": "Front door", "zone_type": "door", "area": 1 }]),
    )
    .await;
    mount_get(&server, "output", json!([])).await;
    mount_get(&server, "door", json!([{ "id": 1, "name": "Main", "mode": 0 }])).await;

    let snapshot = client.fetch_snapshot().await.unwrap();
    assert_eq!(snapshot.panel.serial.as_deref(), Some("123456"));
    assert_eq!(snapshot.users.len(), 1);
    assert_eq!(snapshot.areas.len(), 1);
    assert_eq!(snapshot.zones[0].area, Some(1));
    assert!(snapshot.outputs.is_empty());
    assert_eq!(snapshot.doors.len(), 1);
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/spc/area"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.areas().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_error_envelope_maps_to_gateway_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/spc/zone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "message": "SPC panel not connected"
        })))
        .mount(&server)
        .await;

    match client.zones().await {
        Err(Error::Gateway { message, .. }) => assert_eq!(message, "SPC panel not connected"),
        other => panic!("expected Gateway error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_garbage_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/spc/door"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let result = client.doors().await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

#[tokio::test]
async fn test_connection_returns_serial() {
    let (server, client) = setup().await;
    mount_get(&server, "panel", json!({ "serial": "987654", "model": "SPC5330" })).await;

    assert_eq!(client.test_connection().await.unwrap(), "987654");
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_area_command_uses_put_credentials_and_code() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/spc/area/2/set_a"))
        .and(basic_auth("put_user", "put_pwd"))
        .and(body_json(json!({ "code": "1234" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "code": 0, "message": "OK" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let code = SecretString::from("1234".to_string());
    let response = client
        .send_command("area", 2, "set_a", Some(&code))
        .await
        .unwrap();
    assert!(response.is_success());
    assert_eq!(response.message, "OK");
}

#[tokio::test]
async fn test_panel_command_has_no_id_and_list_result_is_normalised() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/spc/panel/set"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": [
                { "area_id": 1, "code": 0, "message": "OK" },
                { "area_id": 2, "code": 7, "message": "Zone open" }
            ]
        })))
        .mount(&server)
        .await;

    let response = client.send_command("panel", 1, "set", None).await.unwrap();
    assert_eq!(response.code, 7);
    assert_eq!(response.message, "Zone open");
}

#[tokio::test]
async fn test_arm_status_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/spc/arm_status"))
        .and(query_param("mode", "set"))
        .and(query_param("area", "2"))
        .respond_with(ok(
            "arm_status",
            json!([{ "area_id": "2", "reasons": ["Zone 4 open"] }]),
        ))
        .mount(&server)
        .await;

    let status = client.arm_status("set", Some(2)).await.unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].area_id, 2);
    assert_eq!(status[0].reasons, vec!["Zone 4 open".to_string()]);
}
