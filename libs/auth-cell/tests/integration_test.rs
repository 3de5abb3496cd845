use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::router::auth_routes;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_login_proxies_to_identity_provider() {
    let mock_server = MockServer::start().await;

    let test_config = TestConfig::default();
    let mut config = test_config.to_app_config();
    config.supabase_url = mock_server.uri();

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "token-value",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-value",
            "user": { "id": "user-id", "email": "dr@example.com" }
        })))
        .mount(&mock_server)
        .await;

    let response = auth_routes(Arc::new(config))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    json!({ "email": "dr@example.com", "password": "secret-pass" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["access_token"], json!("token-value"));
}

#[tokio::test]
async fn test_bad_credentials_are_unauthorized() {
    let mock_server = MockServer::start().await;

    let test_config = TestConfig::default();
    let mut config = test_config.to_app_config();
    config.supabase_url = mock_server.uri();

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&mock_server)
        .await;

    let response = auth_routes(Arc::new(config))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    json!({ "email": "dr@example.com", "password": "wrong" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_validate_accepts_good_token_rejects_expired() {
    let test_config = TestConfig::default();
    let config = Arc::new(test_config.to_app_config());

    let user = TestUser::doctor("dr.jwt@example.com");
    let good = JwtTestUtils::create_test_token(&user, &test_config.jwt_secret, None);
    let expired = JwtTestUtils::create_expired_token(&user, &test_config.jwt_secret);

    let response = auth_routes(config.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/validate")
                .header("Authorization", format!("Bearer {}", good))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["valid"], json!(true));
    assert_eq!(body["user_id"], json!(user.id));

    let response = auth_routes(config)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/validate")
                .header("Authorization", format!("Bearer {}", expired))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
