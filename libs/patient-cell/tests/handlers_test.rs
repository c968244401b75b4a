use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::patient_routes;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

async fn setup() -> (MockServer, TestConfig) {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(server.uri());
    (server, config)
}

fn request(config: &TestConfig, user: &TestUser, http_method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let token = JwtTestUtils::create_test_token(user, &config.jwt_secret, None);
    let builder = Request::builder()
        .method(http_method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json");

    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_create_patient_profile() {
    let (server, config) = setup().await;
    let user = TestUser::patient("pat@example.com");
    let patient_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_row(&user.id, &user.username, &user.email)
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .and(body_partial_json(json!({
            "user_id": user.id,
            "username": "pat",
            "dob": "1990-05-17",
            "gender": "M"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::patient_row(&patient_id, &user.id, "pat")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let body = json!({ "dob": "17-05-1990", "phone_number": "0851234567" });
    let response = patient_routes(config.to_arc())
        .oneshot(request(&config, &user, "POST", "/", Some(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(read_json(response).await["data"]["id"], patient_id);
}

#[tokio::test]
async fn test_create_patient_rejects_long_phone_number() {
    let (_server, config) = setup().await;
    let user = TestUser::patient("pat@example.com");

    let body = json!({ "dob": "17-05-1990", "phone_number": "08512345678901" });
    let response = patient_routes(config.to_arc())
        .oneshot(request(&config, &user, "POST", "/", Some(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_patients_with_filters() {
    let (server, config) = setup().await;
    let user = TestUser::doctor("drsmith@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("gender", "eq.F"))
        .and(query_param("order", "first_name.desc"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_row(&Uuid::new_v4().to_string(), &Uuid::new_v4().to_string(), "ann")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let uri = "/?gender=F&min_dob=01-01-1980&max_dob=31-12-1999&search=ann&sortby=first_name&sortorder=desc";
    let response = patient_routes(config.to_arc())
        .oneshot(request(&config, &user, "GET", uri, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["username"], "ann");
}

#[tokio::test]
async fn test_list_patients_search_with_comma() {
    let (server, config) = setup().await;
    let user = TestUser::doctor("drsmith@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param(
            "or",
            r#"(first_name.ilike."*smith,jr*",last_name.ilike."*smith,jr*",username.ilike."*smith,jr*")"#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let response = patient_routes(config.to_arc())
        .oneshot(request(&config, &user, "GET", "/?search=smith%2Cjr", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["count"], 0);
}

#[tokio::test]
async fn test_list_patients_bad_dob_range() {
    let (_server, config) = setup().await;
    let user = TestUser::doctor("drsmith@example.com");

    let response = patient_routes(config.to_arc())
        .oneshot(request(&config, &user, "GET", "/?min_dob=1980-01-01&max_dob=31-12-1999", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json(response).await["error"],
        "Unable to parse min_dob/max_dob. Please provide the dates in proper format"
    );
}

#[tokio::test]
async fn test_list_patients_bad_sort_field() {
    let (_server, config) = setup().await;
    let user = TestUser::doctor("drsmith@example.com");

    let response = patient_routes(config.to_arc())
        .oneshot(request(&config, &user, "GET", "/?sortby=phone_number", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_missing_patient() {
    let (server, config) = setup().await;
    let user = TestUser::patient("pat@example.com");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let body = json!({ "dob": "17-05-1990", "gender": "O", "phone_number": "0851234567" });
    let uri = format!("/{}", Uuid::new_v4());
    let response = patient_routes(config.to_arc())
        .oneshot(request(&config, &user, "PATCH", &uri, Some(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await["error"], "patient doesn't exists by provided patient_id");
}

#[tokio::test]
async fn test_delete_patient_as_admin() {
    let (server, config) = setup().await;
    let admin = TestUser::admin("admin@example.com");
    let patient_id = Uuid::new_v4().to_string();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("eq.{}", patient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_row(&patient_id, &Uuid::new_v4().to_string(), "pat")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let uri = format!("/{}", patient_id);
    let response = patient_routes(config.to_arc())
        .oneshot(request(&config, &admin, "DELETE", &uri, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let patient = TestUser::patient("pat@example.com");
    let response = patient_routes(config.to_arc())
        .oneshot(request(&config, &patient, "DELETE", &uri, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
