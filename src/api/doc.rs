use utoipa::OpenApi;

use crate::api::handlers::{health, ncm};

pub const NCM_TAG: &str = "NCM";
pub const HEALTH_TAG: &str = "Health";

/// Path the generated document is served from
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "codexfiscal",
        description = "Registry of Mercosur NCM tariff codes",
    ),
    paths(
        ncm::list_ncm,
        ncm::get_ncm,
        ncm::get_ncm_by_code,
        ncm::get_ncm_by_text,
        ncm::list_ncm_by_codes,
        ncm::search_ncm,
        ncm::create_ncm,
        ncm::bulk_insert_ncm,
        ncm::update_ncm,
        ncm::delete_ncm,
        health::health_check,
        health::liveness_check,
    ),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::api::dto::NcmRequest,
            crate::api::dto::NcmResponse,
            crate::api::dto::HealthResponse,
            crate::api::dto::HealthStatus,
            crate::api::dto::ComponentHealth,
        )
    ),
    tags(
        (name = NCM_TAG, description = "NCM record management"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;
