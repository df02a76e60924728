//! Integration test: dashboard routes

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;
use tourism_package_predictor::{
    config::{PrepConfig, TrainConfig},
    dashboard::{create_router, AppState},
    data::read_csv_bytes,
    prep::prepare,
    ForestParams, Predictor, TrainingJob,
};

const FORM_BODY: &str = "age=30&gender=Male&marital_status=Married&monthly_income=25000\
&type_of_contact=Self+Enquiry&city_tier=2&duration_of_pitch=15&number_of_trips=3\
&occupation=Salaried&designation=Manager&passport=Yes&own_car=No";

fn test_app() -> axum::Router {
    let raw = read_csv_bytes(common::raw_tourism_csv(60).into_bytes()).unwrap();
    let prepared = prepare(raw, &PrepConfig::default()).unwrap();
    let artifacts = TrainingJob::new(TrainConfig {
        forest: ForestParams::default().with_n_estimators(10),
    })
    .fit(&prepared.train, prepared.encoding)
    .unwrap();
    create_router(Arc::new(AppState::new(Predictor::new(artifacts))))
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

fn form_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = test_app()
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["trees"], 10);
    assert_eq!(json["features"], 18);
}

#[tokio::test]
async fn test_root_serves_form() {
    let response = test_app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Generate Prediction"));
    assert!(html.contains(r#"<option value="Self Enquiry">Self Enquiry</option>"#));
    assert!(html.contains(r#"name="age" min="18" max="70" step="1" value="30""#));
}

#[tokio::test]
async fn test_form_prediction_renders_charts() {
    let response = test_app().oneshot(form_request(FORM_BODY)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Purchase Probability (%)"));
    assert!(html.contains("Top 10 Factors Influencing This Prediction"));
    assert!(html.contains("to purchase. (Confidence: "));
    assert!(html.contains("not why this particular customer"));
    // submitted values stay selected
    assert!(html.contains(r#"<option value="Manager" selected>Manager</option>"#));
}

#[tokio::test]
async fn test_form_out_of_range_shows_banner() {
    let body = FORM_BODY.replace("age=30", "age=12");
    let response = test_app().oneshot(form_request(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let html = body_text(response).await;
    assert!(html.contains("outside the allowed range"));
    assert!(!html.contains(r#"id="gauge""#));
}

#[tokio::test]
async fn test_form_unparseable_number_shows_banner() {
    for bad in ["age=30.5", "age="] {
        let body = FORM_BODY.replace("age=30", bad);
        let response = test_app().oneshot(form_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{bad}");

        let html = body_text(response).await;
        assert!(html.contains(r#"class="status error""#));
        assert!(html.contains("Failed to deserialize form"));
        assert!(html.contains("Generate Prediction"));
        assert!(!html.contains(r#"id="gauge""#));
    }
}

#[tokio::test]
async fn test_api_malformed_body_is_json_error() {
    let mut profile = serde_json::to_value(common::sample_profile()).unwrap();
    profile.as_object_mut().unwrap().remove("age");
    let response = test_app().oneshot(json_request("/api/predict", profile)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], true);
    assert!(json["message"].as_str().unwrap().contains("age"));
}

#[tokio::test]
async fn test_api_predict() {
    let profile = serde_json::to_value(common::sample_profile()).unwrap();
    let response = test_app().oneshot(json_request("/api/predict", profile)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let probability = json["probability"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&probability));

    let expected_label = if probability > 0.5 { "High Potential" } else { "Low Potential" };
    assert_eq!(json["label"], expected_label);
    assert_eq!(json["top_features"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_api_unknown_label_is_bad_request() {
    let mut profile = serde_json::to_value(common::sample_profile()).unwrap();
    profile["designation"] = serde_json::json!("Intern");
    let response = test_app().oneshot(json_request("/api/predict", profile)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], true);
    assert!(json["message"].as_str().unwrap().contains("Intern"));
}

#[tokio::test]
async fn test_features_endpoint() {
    let response = test_app()
        .oneshot(Request::builder().uri("/api/features").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["features"].as_array().unwrap().len(), 18);
    assert_eq!(json["features"][0], "Age");
    assert_eq!(json["categorical"]["Gender"], serde_json::json!(["Female", "Male"]));
    assert_eq!(json["uncollected_defaults"]["NumberOfFollowups"], 3.0);
    assert_eq!(json["encoding_version"], 1);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = test_app()
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
