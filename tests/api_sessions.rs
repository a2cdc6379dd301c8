//! Session API tests: navigation, configuration and lookups.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use common::*;

fn server() -> TestServer {
    let state = test_state(StubLoader::new(1), StubFactory::new(vec![]));
    TestServer::new(test_app(&state)).unwrap()
}

async fn new_session(server: &TestServer) -> String {
    let response = server.post("/api/v1/sessions").await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"].as_str().unwrap().to_string()
}

async fn act(server: &TestServer, id: &str, action: &str) -> Value {
    let response = server
        .post(&format!("/api/v1/sessions/{id}/actions"))
        .json(&json!({ "action": action }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

#[tokio::test]
async fn test_new_session_starts_home_with_accurate_models() {
    let server = server();
    let response = server.post("/api/v1/sessions").await;

    response.assert_status(StatusCode::CREATED);
    let session = response.json::<Value>();
    assert_eq!(session["screen"], "home");
    assert_eq!(session["config"]["detector"], "db_resnet50");
    assert_eq!(session["config"]["recognizer"], "crnn_vgg16_bn");
    assert_eq!(session["config"]["language"], "en");
    assert!(session.get("extraction").is_none());
}

#[tokio::test]
async fn test_navigate_and_configure() {
    let server = server();
    let id = new_session(&server).await;

    assert_eq!(act(&server, &id, "open_config").await["screen"], "config");

    let response = server
        .put(&format!("/api/v1/sessions/{id}/config"))
        .json(&json!({ "preset": "fast", "language": "pt", "straightBoxes": true }))
        .await;
    response.assert_status_ok();
    let session = response.json::<Value>();
    assert_eq!(session["screen"], "config");
    assert_eq!(session["config"]["detector"], "db_mobilenet_v3_large");
    assert_eq!(session["config"]["language"], "pt");
    assert_eq!(session["config"]["straightBoxes"], true);

    let home = act(&server, &id, "go_home").await;
    assert_eq!(home["screen"], "home");
    assert_eq!(home["config"]["language"], "pt");

    assert_eq!(act(&server, &id, "open_extraction").await["screen"], "extraction");
}

#[tokio::test]
async fn test_config_outside_config_screen_conflicts() {
    let server = server();
    let id = new_session(&server).await;

    let response = server
        .put(&format!("/api/v1/sessions/{id}/config"))
        .json(&json!({ "preset": "fast" }))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["error"], "invalid_transition");
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let server = server();
    let id = new_session(&server).await;
    act(&server, &id, "open_config").await;

    let response = server
        .put(&format!("/api/v1/sessions/{id}/config"))
        .json(&json!({ "recognizer": "tesseract_lstm" }))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "invalid_config");

    let session = server.get(&format!("/api/v1/sessions/{id}")).await.json::<Value>();
    assert_eq!(session["config"]["recognizer"], "crnn_vgg16_bn");
}

#[tokio::test]
async fn test_reset_restores_defaults() {
    let server = server();
    let id = new_session(&server).await;
    act(&server, &id, "open_config").await;
    server
        .put(&format!("/api/v1/sessions/{id}/config"))
        .json(&json!({ "detector": "fast_base" }))
        .await
        .assert_status_ok();

    let session = act(&server, &id, "reset").await;

    assert_eq!(session["screen"], "home");
    assert_eq!(session["config"]["detector"], "db_resnet50");
}

#[tokio::test]
async fn test_unknown_action_is_rejected() {
    let server = server();
    let id = new_session(&server).await;

    let response = server
        .post(&format!("/api/v1/sessions/{id}/actions"))
        .json(&json!({ "action": "completed" }))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_and_deleted_sessions() {
    let server = server();

    server
        .get("/api/v1/sessions/not-a-uuid")
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let id = new_session(&server).await;
    server
        .delete(&format!("/api/v1/sessions/{id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get(&format!("/api/v1/sessions/{id}"))
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_text_before_extraction_is_not_found() {
    let server = server();
    let id = new_session(&server).await;

    for path in ["text", "text/download", "export", "pages/1/annotated"] {
        server
            .get(&format!("/api/v1/sessions/{id}/{path}"))
            .expect_failure()
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_options_lists_configuration_surface() {
    let server = server();
    let options = server.get("/api/v1/options").await.json::<Value>();

    assert_eq!(options["detectors"].as_array().unwrap().len(), 4);
    assert_eq!(options["recognizers"].as_array().unwrap().len(), 5);
    assert_eq!(options["presets"][1]["name"], "fast");
    assert_eq!(options["languages"][1]["tesseract"], "por");
    assert_eq!(
        options["acceptedExtensions"],
        json!(["jpg", "jpeg", "png", "bmp", "tiff", "pdf"])
    );
}

#[tokio::test]
async fn test_health() {
    let server = server();
    for path in ["/health", "/api/v1/health"] {
        let health = server.get(path).await.json::<Value>();
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["service"], "ocr-desk-server");
        assert_eq!(health["backend"], "tesseract");
    }
}
