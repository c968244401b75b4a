use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::auth_routes;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn register_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/register")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn token_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn registration() -> Value {
    json!({
        "first_name": "Greg",
        "last_name": "House",
        "username": "drhouse",
        "email": "house@example.com",
        "password": "vicodin123"
    })
}

#[tokio::test]
async fn test_register_user() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(server.uri());
    let user_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .and(body_partial_json(json!({ "email": "house@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "session-token",
            "user": { "id": user_id }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(body_partial_json(json!({ "id": user_id, "username": "drhouse" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::user_row(&user_id, "drhouse", "house@example.com")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let response = auth_routes(config.to_arc())
        .oneshot(register_request(registration()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["data"]["username"], "drhouse");
}

#[tokio::test]
async fn test_register_existing_user() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": Uuid::new_v4() }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let response = auth_routes(config.to_arc())
        .oneshot(register_request(registration()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "Another user exists with same username/email");
}

#[tokio::test]
async fn test_register_existing_user_with_comma_in_username() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("or", r#"(username.eq."house,md",email.eq."house@example.com")"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": Uuid::new_v4() }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut body = registration();
    body["username"] = json!("house,md");

    let response = auth_routes(config.to_arc())
        .oneshot(register_request(body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "Another user exists with same username/email");
}

#[tokio::test]
async fn test_register_invalid_body() {
    let config = TestConfig::default();
    let mut body = registration();
    body["password"] = json!("short");

    let response = auth_routes(config.to_arc())
        .oneshot(register_request(body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "validation failed on request body");
}

#[tokio::test]
async fn test_validate_token() {
    let config = TestConfig::default();
    let user = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

    let response = auth_routes(config.to_arc())
        .oneshot(token_request("/validate", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["user_id"], user.id);
    assert_eq!(body["username"], "admin");
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn test_validate_expired_token() {
    let config = TestConfig::default();
    let user = TestUser::patient("pat@example.com");
    let token = JwtTestUtils::create_expired_token(&user, &config.jwt_secret);

    let response = auth_routes(config.to_arc())
        .oneshot(token_request("/validate", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_token() {
    let config = TestConfig::default();
    let user = TestUser::patient("pat@example.com");

    let good = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);
    let response = auth_routes(config.to_arc())
        .oneshot(token_request("/verify", &good))
        .await
        .unwrap();
    assert_eq!(read_json(response).await["valid"], true);

    let bad = JwtTestUtils::create_invalid_signature_token(&user);
    let response = auth_routes(config.to_arc())
        .oneshot(token_request("/verify", &bad))
        .await
        .unwrap();
    assert_eq!(read_json(response).await["valid"], false);
}
