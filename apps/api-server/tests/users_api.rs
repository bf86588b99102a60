#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use serde_json::json;

use common::test_state;

fn register(email: &str, password: &str) -> TestRequest {
    TestRequest::post().uri("/api/v1/users").set_json(json!({
        "name": "Alice",
        "email": email,
        "password": password,
        "bio": "Writes about Rust",
    }))
}

fn login(email: &str, password: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/v1/login")
        .set_json(json!({ "email": email, "password": password }))
}

#[actix_web::test]
async fn test_register_hides_password_hash() {
    let app = test_app!(test_state(&[]));

    let (status, body) = send!(app, register("alice@example.com", "s3cret-pw"));

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["bio"], "Writes about Rust");
    assert_eq!(body["user"]["active"], false);
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());
    assert!(!body.to_string().contains("s3cret-pw"));
}

#[actix_web::test]
async fn test_register_rejects_missing_fields() {
    let app = test_app!(test_state(&[]));

    let (status, body) = send!(
        app,
        TestRequest::post()
            .uri("/api/v1/users")
            .set_json(json!({ "name": "Alice", "email": "not-an-email" }))
    );

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
}

#[actix_web::test]
async fn test_register_rejects_malformed_json() {
    let app = test_app!(test_state(&[]));

    let (status, body) = send!(
        app,
        TestRequest::post()
            .uri("/api/v1/users")
            .insert_header(("content-type", "application/json"))
            .set_payload("{ not json")
    );

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[actix_web::test]
async fn test_register_rejects_duplicate_email() {
    let app = test_app!(test_state(&[]));

    let (status, _) = send!(app, register("alice@example.com", "pw-one"));
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send!(app, register("alice@example.com", "pw-two"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_login_requires_activation() {
    let app = test_app!(test_state(&[]));

    let (_, body) = send!(app, register("alice@example.com", "s3cret-pw"));
    let id = body["user"]["id"].as_str().unwrap().to_string();

    let (status, body) = send!(app, login("alice@example.com", "s3cret-pw"));
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.get("token").is_none());

    let (status, body) = send!(
        app,
        TestRequest::get().uri(&format!("/api/v1/users/activate/{id}"))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User activated successfully");

    let (status, body) = send!(app, login("alice@example.com", "s3cret-pw"));
    assert_eq!(status, StatusCode::OK);
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);
}

#[actix_web::test]
async fn test_login_immediately_when_activation_disabled() {
    let app = test_app!(test_state(&[("REQUIRE_ACTIVATION", "false")]));

    let (status, body) = send!(app, register("bob@example.com", "pw-bob"));
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["active"], true);

    let (status, body) = send!(app, login("bob@example.com", "pw-bob"));
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
}

#[actix_web::test]
async fn test_login_wrong_password_or_unknown_user() {
    let app = test_app!(test_state(&[("REQUIRE_ACTIVATION", "false")]));
    send!(app, register("alice@example.com", "s3cret-pw"));

    let (status, body) = send!(app, login("alice@example.com", "wrong"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("token").is_none());

    let (status, body) = send!(app, login("nobody@example.com", "s3cret-pw"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("token").is_none());
}

#[actix_web::test]
async fn test_activate_errors() {
    let app = test_app!(test_state(&[]));

    let (status, _) = send!(
        app,
        TestRequest::get().uri("/api/v1/users/activate/not-a-uuid")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send!(
        app,
        TestRequest::get().uri(&format!(
            "/api/v1/users/activate/{}",
            uuid::Uuid::new_v4()
        ))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "User not found");
}

#[actix_web::test]
async fn test_health_echoes_request_id() {
    let app = test_app!(test_state(&[]));

    let resp = actix_web::test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/health")
            .insert_header(("x-request-id", "req-42"))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "req-42");
    let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["request_id"], "req-42");
}

#[actix_web::test]
async fn test_concurrent_registrations_share_one_email() {
    let app = test_app!(test_state(&[("REQUIRE_ACTIVATION", "false")]));

    let (first, second) = tokio::join!(
        actix_web::test::call_service(&app, register("alice@example.com", "pw-one").to_request()),
        actix_web::test::call_service(&app, register("alice@example.com", "pw-two").to_request()),
    );

    let mut statuses = [first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);

    let winner = if first.status() == StatusCode::CREATED {
        "pw-one"
    } else {
        "pw-two"
    };
    let loser = if winner == "pw-one" { "pw-two" } else { "pw-one" };

    let (status, _) = send!(app, login("alice@example.com", winner));
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send!(app, login("alice@example.com", loser));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
