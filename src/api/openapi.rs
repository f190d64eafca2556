//! OpenAPI documentation for the admin API

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, visits};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gatehouse API",
        version = "1.0.0",
        description = "Visitor Management System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Visits
        visits::list_visits,
        visits::get_visit,
        visits::create_visit,
        visits::cancel_visit,
        visits::confirm_invitation,
        visits::list_present_visitors,
        visits::add_visitor,
        visits::admin_checkout,
        // PIN lifecycle
        visits::generate_pin,
        visits::extend_pin,
        visits::pin_status,
    ),
    components(
        schemas(
            // Visits
            crate::models::visit::Visit,
            crate::models::visit::CreateVisit,
            visits::CreateVisitResponse,
            visits::PinResponse,
            visits::ExtendPinRequest,
            visits::AdminCheckoutRequest,
            crate::models::visitor::Visitor,
            crate::models::visitor::PresentVisitor,
            crate::models::visitor::RegisterVisitor,
            crate::models::enums::VisitType,
            crate::models::enums::VisitStatus,
            crate::models::enums::CheckoutOutcome,
            crate::models::enums::Language,
            // PIN
            crate::services::pin::PinState,
            crate::services::pin::PinStatusReport,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "visits", description = "Visit administration"),
        (name = "pin", description = "PIN lifecycle management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
