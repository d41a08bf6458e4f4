use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::forms::router::form_router;
use crate::forms::schema::{messages, SchemaOptions};
use crate::forms::service::RegistrationService;

fn json_request(method: Method, uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build request")
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

async fn open_form(router: &Router, variant: &str) -> String {
    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/forms",
            json!({ "variant": variant }),
        ))
        .await
        .expect("open form");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    body["form_id"].as_str().expect("form id").to_string()
}

async fn fill_portfolio(router: &Router, form_id: &str) {
    let response = router
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            &format!("/api/v1/forms/{form_id}/fields"),
            json!({ "email": "ana@example.com", "password": "segredo", "name": "ana silva" }),
        ))
        .await
        .expect("fields");
    assert_eq!(response.status(), StatusCode::OK);

    for (title, knowledge) in [("Rust", json!(90)), ("React", json!("50"))] {
        let response = router
            .clone()
            .oneshot(json_request(
                Method::POST,
                &format!("/api/v1/forms/{form_id}/techs"),
                json!({ "title": title, "knowledge": knowledge }),
            ))
            .await
            .expect("append tech");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri(format!("/api/v1/forms/{form_id}/avatar?name=ana.png"))
                .header(header::CONTENT_TYPE, "image/png")
                .body(Body::from(vec![0x89, b'P', b'N', b'G']))
                .expect("build request"),
        )
        .await
        .expect("avatar");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn open_returns_empty_form_view() {
    let (service, _, _) = build_service();
    let router = form_router(Arc::new(service));

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/forms",
            json!({ "variant": "profile" }),
        ))
        .await
        .expect("open form");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["variant"], json!("profile"));
    assert_eq!(body["state"], json!("idle"));
    assert_eq!(body["password_set"], json!(false));
    assert!(body["form_id"].as_str().is_some());
}

#[tokio::test]
async fn unknown_variant_is_a_client_error() {
    let (service, _, _) = build_service();
    let router = form_router(Arc::new(service));

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/forms",
            json!({ "variant": "newsletter" }),
        ))
        .await
        .expect("open form");

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn empty_submit_returns_field_errors() {
    let (service, _, store) = build_service();
    let router = form_router(Arc::new(service));
    let form_id = open_form(&router, "credentials").await;

    let response = router
        .oneshot(empty_request(
            Method::POST,
            &format!("/api/v1/forms/{form_id}/submit"),
        ))
        .await
        .expect("submit");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["errors"]["email"], json!(messages::EMAIL_REQUIRED));
    assert_eq!(body["errors"]["password"], json!(messages::PASSWORD_REQUIRED));
    assert!(store.uploads().is_empty());
}

#[tokio::test]
async fn portfolio_round_trip_uploads_and_renders() {
    let (service, _, store) = build_service();
    let router = form_router(Arc::new(service));
    let form_id = open_form(&router, "portfolio").await;
    fill_portfolio(&router, &form_id).await;

    let response = router
        .clone()
        .oneshot(empty_request(
            Method::POST,
            &format!("/api/v1/forms/{form_id}/submit"),
        ))
        .await
        .expect("submit");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["submission"]["name"], json!("Ana Silva"));
    assert_eq!(body["submission"]["techs"][1]["knowledge"], json!(50));
    assert_eq!(body["submission"]["avatar"]["name"], json!("ana.png"));
    assert_eq!(body["upload"]["key"], json!("ana.png"));
    assert!(body["output"].as_str().expect("output").contains("Ana Silva"));
    assert_eq!(store.uploads().len(), 1);

    let response = router
        .oneshot(empty_request(
            Method::GET,
            &format!("/api/v1/forms/{form_id}"),
        ))
        .await
        .expect("view");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tech_rows_are_edited_by_id() {
    let (service, _, _) = build_service();
    let router = form_router(Arc::new(service));
    let form_id = open_form(&router, "portfolio").await;

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/forms/{form_id}/techs"),
            json!({ "title": "Rust" }),
        ))
        .await
        .expect("append");
    assert_eq!(response.status(), StatusCode::CREATED);
    let tech_id = read_json_body(response).await["tech_id"]
        .as_u64()
        .expect("numeric tech id");

    let response = router
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            &format!("/api/v1/forms/{form_id}/techs/{tech_id}"),
            json!({ "knowledge": 75 }),
        ))
        .await
        .expect("update");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["techs"][0]["title"], json!("Rust"));
    assert_eq!(body["techs"][0]["knowledge"], json!(75));

    let response = router
        .oneshot(json_request(
            Method::PATCH,
            &format!("/api/v1/forms/{form_id}/techs/999"),
            json!({ "knowledge": 10 }),
        ))
        .await
        .expect("update missing row");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn credentials_form_refuses_techs() {
    let (service, _, _) = build_service();
    let router = form_router(Arc::new(service));
    let form_id = open_form(&router, "credentials").await;

    let response = router
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/forms/{form_id}/techs"),
            json!({ "title": "Rust", "knowledge": 10 }),
        ))
        .await
        .expect("append");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn page_renders_inline_errors() {
    let (service, _, _) = build_service();
    let router = form_router(Arc::new(service));
    let form_id = open_form(&router, "profile").await;

    let _ = router
        .clone()
        .oneshot(empty_request(
            Method::POST,
            &format!("/api/v1/forms/{form_id}/submit"),
        ))
        .await
        .expect("submit");

    let response = router
        .oneshot(empty_request(
            Method::GET,
            &format!("/api/v1/forms/{form_id}/page"),
        ))
        .await
        .expect("page");

    assert_eq!(response.status(), StatusCode::OK);
    let html = read_text_body(response).await;
    assert!(html.contains("name=\"name\""));
    assert!(html.contains(messages::NAME_REQUIRED));
    assert!(html.contains(messages::EMAIL_REQUIRED));
}

#[tokio::test]
async fn upload_failure_maps_to_bad_gateway() {
    let service = RegistrationService::new(
        Arc::new(MemorySessions::default()),
        Arc::new(FailingStore::default()),
        BUCKET,
        SchemaOptions::default(),
    );
    let router = form_router(Arc::new(service));
    let form_id = open_form(&router, "portfolio").await;
    fill_portfolio(&router, &form_id).await;

    let response = router
        .clone()
        .oneshot(empty_request(
            Method::POST,
            &format!("/api/v1/forms/{form_id}/submit"),
        ))
        .await
        .expect("submit");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = router
        .oneshot(empty_request(
            Method::GET,
            &format!("/api/v1/forms/{form_id}"),
        ))
        .await
        .expect("view");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_form_returns_not_found() {
    let (service, _, _) = build_service();
    let router = form_router(Arc::new(service));

    let response = router
        .oneshot(empty_request(Method::GET, "/api/v1/forms/form-nope"))
        .await
        .expect("view");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn discarded_form_returns_no_content_then_not_found() {
    let (service, _, _) = build_service();
    let router = form_router(Arc::new(service));
    let form_id = open_form(&router, "profile").await;

    let response = router
        .clone()
        .oneshot(empty_request(
            Method::DELETE,
            &format!("/api/v1/forms/{form_id}"),
        ))
        .await
        .expect("discard");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(empty_request(
            Method::GET,
            &format!("/api/v1/forms/{form_id}"),
        ))
        .await
        .expect("view");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn page_post_renders_submitted_output() {
    let (service, _, store) = build_service();
    let router = form_router(Arc::new(service));
    let form_id = open_form(&router, "portfolio").await;
    fill_portfolio(&router, &form_id).await;

    let response = router
        .oneshot(empty_request(
            Method::POST,
            &format!("/api/v1/forms/{form_id}/page"),
        ))
        .await
        .expect("page submit");

    assert_eq!(response.status(), StatusCode::OK);
    let html = read_text_body(response).await;
    assert!(html.contains("<pre>{"));
    assert!(html.contains("&quot;name&quot;: &quot;Ana Silva&quot;"));
    assert_eq!(store.uploads().len(), 1);
}

#[tokio::test]
async fn page_post_with_errors_is_unprocessable() {
    let (service, _, _) = build_service();
    let router = form_router(Arc::new(service));
    let form_id = open_form(&router, "credentials").await;

    let response = router
        .oneshot(empty_request(
            Method::POST,
            &format!("/api/v1/forms/{form_id}/page"),
        ))
        .await
        .expect("page submit");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = read_text_body(response).await;
    assert!(html.contains(messages::EMAIL_REQUIRED));
    assert!(html.contains("<pre></pre>"));
}
