use std::collections::HashMap;

use api_server::config::AppConfig;
use api_server::state::AppState;

/// Config with a cheap password hash so tests stay fast.
pub fn test_config(overrides: &[(&str, &str)]) -> AppConfig {
    let mut vars: HashMap<String, String> = [
        ("JWT_SECRET", "integration-test-secret"),
        ("PASSWORD_HASH_MEMORY_KIB", "8"),
        ("PASSWORD_HASH_ITERATIONS", "1"),
        ("PASSWORD_HASH_PARALLELISM", "1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }

    AppConfig::from_lookup(|key| vars.get(key).cloned()).expect("valid test config")
}

pub fn test_state(overrides: &[(&str, &str)]) -> AppState {
    AppState::in_memory(&test_config(overrides)).expect("state")
}

/// Build the full application as a test service.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(api_server::observability::RequestIdMiddleware)
                .configure(api_server::handlers::configure($state)),
        )
        .await
    };
}

/// Send a request and return the status plus the JSON body (`Null` when empty).
macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body = actix_web::test::read_body(resp).await;
        let json: serde_json::Value = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).expect("json body")
        };
        (status, json)
    }};
}

/// Register (and activate, when required) a user, log in and return the token.
macro_rules! login_token {
    ($app:expr, $email:expr) => {{
        use actix_web::test::TestRequest;

        let (status, body) = send!(
            $app,
            TestRequest::post().uri("/api/v1/users").set_json(serde_json::json!({
                "name": "Test User",
                "email": $email,
                "password": "correct horse",
            }))
        );
        assert_eq!(status, actix_web::http::StatusCode::CREATED, "{body}");

        if body["user"]["active"] == false {
            let id = body["user"]["id"].as_str().unwrap().to_string();
            let (status, _) = send!(
                $app,
                TestRequest::get().uri(&format!("/api/v1/users/activate/{id}"))
            );
            assert_eq!(status, actix_web::http::StatusCode::OK);
        }

        let (status, body) = send!(
            $app,
            TestRequest::post().uri("/api/v1/login").set_json(serde_json::json!({
                "email": $email,
                "password": "correct horse",
            }))
        );
        assert_eq!(status, actix_web::http::StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }};
}
