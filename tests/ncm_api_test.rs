//! End-to-end tests of the HTTP API over the in-memory repository.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use codexfiscal::AppState;
use codexfiscal::api::routes::create_router;
use codexfiscal::config::ServerConfig;
use codexfiscal::models::Ncm;
use codexfiscal::repositories::InMemoryNcmRepository;
use codexfiscal::services::Services;

fn app_with(records: Vec<Ncm>) -> Router {
    let repo = Arc::new(InMemoryNcmRepository::with_records(records));
    let state = AppState::with_services(Services::with_repository(repo));
    create_router(state, &ServerConfig::default())
}

fn app() -> Router {
    app_with(vec![
        Ncm::new("a1", "0101.21.00", "Cavalos reprodutores de raca pura"),
        Ncm::new("b2", "1234.56", "Produto de teste"),
        Ncm::new("c3", "8471.30.12", "Maquinas portateis de processamento de dados"),
    ])
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn create_returns_201_with_generated_id() {
    let app = app_with(Vec::new());
    let (status, body) = send(
        &app,
        Method::POST,
        "/ncm/",
        Some(json!({
            "id_ncm": "ignored",
            "codigo": "0101.21.00",
            "descricao": "Reprodutores de raca pura",
            "data_inicio": "2022-04-01"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(body["id_ncm"], "ignored");
    assert!(!body["id_ncm"].as_str().unwrap().is_empty());
    assert_eq!(body["codigo"], "0101.21.00");
    assert_eq!(body["data_inicio"], "2022-04-01");

    let id = body["id_ncm"].as_str().unwrap();
    let (status, fetched) = send(&app, Method::GET, &format!("/ncm/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, body);
}

#[tokio::test]
async fn created_record_is_found_by_code() {
    let app = app_with(Vec::new());
    let (status, created) = send(
        &app,
        Method::POST,
        "/ncm/",
        Some(json!({ "codigo": "1234.56", "descricao": "Test" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, found) = send(&app, Method::GET, "/ncm/code/1234.56", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found, created);
}

#[tokio::test]
async fn create_without_trailing_slash_is_routed() {
    let (status, _) = send(
        &app_with(Vec::new()),
        Method::POST,
        "/ncm",
        Some(json!({ "codigo": "01", "descricao": "Animais vivos" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn create_with_blank_fields_lists_both() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/ncm/",
        Some(json!({ "codigo": "  ", "descricao": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["details"]["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["codigo", "descricao"]);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/ncm/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"codigo\": "))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_by_code_ignores_punctuation() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/ncm/code/1234.56", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id_ncm"], "b2");

    let (status, body) = send(&app, Method::GET, "/ncm/code/847130-12", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id_ncm"], "c3");
}

#[tokio::test]
async fn unknown_id_is_404() {
    let (status, body) = send(&app(), Method::GET, "/ncm/nonexistent-id", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn update_replaces_record() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::PUT,
        "/ncm/",
        Some(json!({
            "id_ncm": "b2",
            "codigo": "1234.57",
            "descricao": "Produto revisado"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["descricao"], "Produto revisado");

    let (status, _) = send(&app, Method::GET, "/ncm/code/123457", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, "/ncm/code/123456", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_without_description_is_400() {
    let (status, body) = send(
        &app(),
        Method::PUT,
        "/ncm/",
        Some(json!({ "id_ncm": "b2", "codigo": "1234.56" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "descricao");
}

#[tokio::test]
async fn update_unknown_id_is_404() {
    let (status, _) = send(
        &app(),
        Method::PUT,
        "/ncm/",
        Some(json!({ "id_ncm": "zz", "codigo": "01", "descricao": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_then_get_is_404() {
    let app = app();

    let (status, body) = send(&app, Method::DELETE, "/ncm/a1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app, Method::GET, "/ncm/a1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, "/ncm/a1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_all_is_sorted_by_code() {
    let (status, body) = send(&app(), Method::GET, "/ncm/", None).await;
    assert_eq!(status, StatusCode::OK);

    let codes: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["codigo"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["0101.21.00", "1234.56", "8471.30.12"]);
}

#[tokio::test]
async fn list_by_codes() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/ncm/codes?codes=123456,%208471.30.12", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = send(&app, Method::GET, "/ncm/codes?codes=9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/ncm/codes?codes=", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn text_lookups() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/ncm/text?text=RACA", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id_ncm"], "a1");

    let (status, body) = send(&app, Method::GET, "/ncm/search?text=de", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, _) = send(&app, Method::GET, "/ncm/search?text=bicicleta", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/ncm/text", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
    let (status, _) = send(&app(), Method::GET, "/ncm/search?text=%25", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bulk_insert_skips_repeated_ids() {
    let app = app_with(Vec::new());
    let (status, body) = send(
        &app,
        Method::POST,
        "/ncm/bulk",
        Some(json!([
            { "id_ncm": "same", "codigo": "01", "descricao": "Primeiro" },
            { "id_ncm": "same", "codigo": "02", "descricao": "Segundo" },
            { "codigo": "03", "descricao": "Sem id" }
        ])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let inserted = body.as_array().unwrap();
    assert_eq!(inserted.len(), 2);
    assert_eq!(inserted[0]["descricao"], "Primeiro");

    let (_, all) = send(&app, Method::GET, "/ncm/", None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    // Existing ids are left untouched
    let (status, body) = send(
        &app,
        Method::POST,
        "/ncm/bulk",
        Some(json!([{ "id_ncm": "same", "codigo": "09", "descricao": "Outro" }])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
    let (_, record) = send(&app, Method::GET, "/ncm/same", None).await;
    assert_eq!(record["descricao"], "Primeiro");
}

#[tokio::test]
async fn bulk_insert_validation() {
    let app = app_with(Vec::new());

    let (status, _) = send(&app, Method::POST, "/ncm/bulk", Some(json!([]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/ncm/bulk",
        Some(json!([
            { "codigo": "01", "descricao": "ok" },
            { "codigo": "", "descricao": "sem codigo" }
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["errors"][0]["field"], "ncms[1].codigo");

    let (_, all) = send(&app, Method::GET, "/ncm/", None).await;
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn health_reports_healthy_repository() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"]["status"], "healthy");

    let (status, _) = send(&app, Method::GET, "/health/live", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn errors_carry_request_id() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::PATCH)
                .uri("/ncm/")
                .header("x-request-id", "trace-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "METHOD_NOT_ALLOWED");
    assert_eq!(body["request_id"], "trace-42");
}
