//! NCM request handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::api::doc::NCM_TAG;
use crate::api::dto::{
    CodesQuery, ErrorResponse, NcmRequest, NcmResponse, TextQuery, validate_batch,
};
use crate::error::{AppError, AppResult};
use crate::models::Ncm;
use crate::repositories::NCM_ENTITY;
use crate::state::AppState;
use crate::utils::validate::{AppJson, ValidatedJson, ValidatedQuery};

/// Creates NCM routes.
///
/// Routes:
/// - GET    /ncm/              - List all records
/// - POST   /ncm/              - Create a record
/// - PUT    /ncm/              - Replace a record (id in body)
/// - POST   /ncm/bulk          - Insert many records
/// - GET    /ncm/code/{code}   - Get by code
/// - GET    /ncm/codes?codes=  - List by codes
/// - GET    /ncm/text?text=    - First record matching a description
/// - GET    /ncm/search?text=  - All records matching a description
/// - GET    /ncm/{id}          - Get by id
/// - DELETE /ncm/{id}          - Delete by id
pub fn ncm_routes() -> Router<AppState> {
    let collection = get(list_ncm).post(create_ncm).put(update_ncm);

    Router::new()
        .route("/ncm", collection.clone())
        .route("/ncm/", collection)
        .route("/ncm/bulk", post(bulk_insert_ncm))
        .route("/ncm/code/{code}", get(get_ncm_by_code))
        .route("/ncm/codes", get(list_ncm_by_codes))
        .route("/ncm/text", get(get_ncm_by_text))
        .route("/ncm/search", get(search_ncm))
        .route("/ncm/{id}", get(get_ncm).delete(delete_ncm))
}

fn to_responses(records: Vec<Ncm>) -> Vec<NcmResponse> {
    records.into_iter().map(NcmResponse::from).collect()
}

/// An empty result on a list lookup is reported as not found.
fn non_empty(records: Vec<Ncm>, field: &str, value: &str) -> AppResult<Vec<NcmResponse>> {
    if records.is_empty() {
        return Err(AppError::not_found(NCM_ENTITY, field, value));
    }
    Ok(to_responses(records))
}

#[utoipa::path(
    get,
    path = "/ncm/",
    responses(
        (status = 200, description = "All NCM records ordered by code", body = Vec<NcmResponse>),
        (status = 500, description = "Database failure", body = ErrorResponse)
    ),
    tag = NCM_TAG
)]
pub async fn list_ncm(State(state): State<AppState>) -> AppResult<Json<Vec<NcmResponse>>> {
    let records = state.services.ncm.list_all().await?;
    Ok(Json(to_responses(records)))
}

#[utoipa::path(
    get,
    path = "/ncm/{id}",
    params(("id" = String, Path, description = "NCM identifier")),
    responses(
        (status = 200, description = "NCM record", body = NcmResponse),
        (status = 400, description = "Blank identifier", body = ErrorResponse),
        (status = 404, description = "No record with this identifier", body = ErrorResponse)
    ),
    tag = NCM_TAG
)]
pub async fn get_ncm(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<NcmResponse>> {
    let ncm = state.services.ncm.get_by_id(&id).await?;
    Ok(Json(NcmResponse::from(ncm)))
}

#[utoipa::path(
    get,
    path = "/ncm/code/{code}",
    params(("code" = String, Path, description = "NCM code, punctuation is ignored")),
    responses(
        (status = 200, description = "NCM record", body = NcmResponse),
        (status = 400, description = "Blank code", body = ErrorResponse),
        (status = 404, description = "No record with this code", body = ErrorResponse)
    ),
    tag = NCM_TAG
)]
pub async fn get_ncm_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<NcmResponse>> {
    let ncm = state.services.ncm.get_by_code(&code).await?;
    Ok(Json(NcmResponse::from(ncm)))
}

#[utoipa::path(
    get,
    path = "/ncm/text",
    params(TextQuery),
    responses(
        (status = 200, description = "First record whose description matches", body = NcmResponse),
        (status = 400, description = "Missing or blank text", body = ErrorResponse),
        (status = 404, description = "No description matches", body = ErrorResponse)
    ),
    tag = NCM_TAG
)]
pub async fn get_ncm_by_text(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<TextQuery>,
) -> AppResult<Json<NcmResponse>> {
    let ncm = state.services.ncm.get_by_text(&query.text).await?;
    Ok(Json(NcmResponse::from(ncm)))
}

#[utoipa::path(
    get,
    path = "/ncm/codes",
    params(CodesQuery),
    responses(
        (status = 200, description = "Records matching any of the codes", body = Vec<NcmResponse>),
        (status = 400, description = "Missing or blank codes", body = ErrorResponse),
        (status = 404, description = "No record matches", body = ErrorResponse)
    ),
    tag = NCM_TAG
)]
pub async fn list_ncm_by_codes(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<CodesQuery>,
) -> AppResult<Json<Vec<NcmResponse>>> {
    let records = state.services.ncm.list_by_codes(&query.code_list()).await?;
    Ok(Json(non_empty(records, "codes", &query.codes)?))
}

#[utoipa::path(
    get,
    path = "/ncm/search",
    params(TextQuery),
    responses(
        (status = 200, description = "Records whose description matches", body = Vec<NcmResponse>),
        (status = 400, description = "Missing or blank text", body = ErrorResponse),
        (status = 404, description = "No description matches", body = ErrorResponse)
    ),
    tag = NCM_TAG
)]
pub async fn search_ncm(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<TextQuery>,
) -> AppResult<Json<Vec<NcmResponse>>> {
    let records = state.services.ncm.list_by_text(&query.text).await?;
    Ok(Json(non_empty(records, "description", &query.text)?))
}

/// Creates a record. The identifier is always generated by the server.
#[utoipa::path(
    post,
    path = "/ncm/",
    request_body = NcmRequest,
    responses(
        (status = 201, description = "Record created", body = NcmResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 500, description = "Database failure", body = ErrorResponse)
    ),
    tag = NCM_TAG
)]
pub async fn create_ncm(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<NcmRequest>,
) -> AppResult<(StatusCode, Json<NcmResponse>)> {
    let ncm = state.services.ncm.create(payload.into_draft()).await?;
    Ok((StatusCode::CREATED, Json(NcmResponse::from(ncm))))
}

/// Inserts a batch. Records whose `id_ncm` already exists are skipped and left
/// out of the response.
#[utoipa::path(
    post,
    path = "/ncm/bulk",
    request_body = Vec<NcmRequest>,
    responses(
        (status = 200, description = "Records actually inserted", body = Vec<NcmResponse>),
        (status = 400, description = "Empty or invalid batch", body = ErrorResponse),
        (status = 500, description = "Database failure", body = ErrorResponse)
    ),
    tag = NCM_TAG
)]
pub async fn bulk_insert_ncm(
    State(state): State<AppState>,
    AppJson(payload): AppJson<Vec<NcmRequest>>,
) -> AppResult<Json<Vec<NcmResponse>>> {
    validate_batch(&payload)?;
    let drafts = payload.into_iter().map(NcmRequest::into_draft).collect();
    let inserted = state.services.ncm.bulk_insert(drafts).await?;
    Ok(Json(to_responses(inserted)))
}

/// Replaces every attribute of the record named by `id_ncm`.
#[utoipa::path(
    put,
    path = "/ncm/",
    request_body = NcmRequest,
    responses(
        (status = 200, description = "Record updated", body = NcmResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 404, description = "No record with this identifier", body = ErrorResponse)
    ),
    tag = NCM_TAG
)]
pub async fn update_ncm(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<NcmRequest>,
) -> AppResult<Json<NcmResponse>> {
    let ncm = state.services.ncm.update(payload.into_draft()).await?;
    Ok(Json(NcmResponse::from(ncm)))
}

#[utoipa::path(
    delete,
    path = "/ncm/{id}",
    params(("id" = String, Path, description = "NCM identifier")),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 400, description = "Blank identifier", body = ErrorResponse),
        (status = 404, description = "No record with this identifier", body = ErrorResponse)
    ),
    tag = NCM_TAG
)]
pub async fn delete_ncm(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.services.ncm.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
