use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::router::patient_routes;
use shared_utils::test_utils::{JwtTestUtils, MockStoreResponses, TestConfig, TestUser};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_roster_groups_appointments_by_patient() {
    let mock_server = MockServer::start().await;

    let test_config = TestConfig::default();
    let mut config = test_config.to_app_config();
    config.supabase_url = mock_server.uri();

    let user = TestUser::doctor("dr.roster@example.com");
    let token = JwtTestUtils::create_test_token(&user, &test_config.jwt_secret, None);

    // Both rows carry the same patient contact, so the roster has one entry.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                &Uuid::new_v4().to_string(), &user.id, "2025-06-10", "10:00 AM", "completed"),
            MockStoreResponses::appointment_row(
                &Uuid::new_v4().to_string(), &user.id, "2025-05-02", "11:00 AM", "cancelled"),
        ])))
        .mount(&mock_server)
        .await;

    let response = patient_routes(Arc::new(config))
        .oneshot(
            Request::builder()
                .uri(format!("/doctors/{}", user.id))
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let patients = body["patients"].as_array().unwrap();
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0]["appointment_count"], json!(2));
    assert_eq!(patients[0]["email"], json!("patient@example.com"));
    assert_eq!(patients[0]["last_visit"], json!("2025-06-10"));
}

#[tokio::test]
async fn test_roster_of_other_doctor_is_unauthorized() {
    let mock_server = MockServer::start().await;

    let test_config = TestConfig::default();
    let mut config = test_config.to_app_config();
    config.supabase_url = mock_server.uri();

    let user = TestUser::doctor("dr.nosy@example.com");
    let token = JwtTestUtils::create_test_token(&user, &test_config.jwt_secret, None);

    let response = patient_routes(Arc::new(config))
        .oneshot(
            Request::builder()
                .uri(format!("/doctors/{}", Uuid::new_v4()))
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
