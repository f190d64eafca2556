//! Visit administration endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::Language,
        visit::{CreateVisit, Visit, VisitQuery},
        visitor::{PresentVisitor, RegisterVisitor, Visitor},
    },
    services::pin::PinStatusReport,
};

/// Visit creation response with the PIN when one was issued
#[derive(Serialize, ToSchema)]
pub struct CreateVisitResponse {
    pub visit: Visit,
    /// Present when an invitation PIN was generated at creation time
    pub pin: Option<String>,
}

/// PIN generation/extension response
#[derive(Serialize, ToSchema)]
pub struct PinResponse {
    pub visit_id: i32,
    pub pin: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Extension request: exactly one of `hours` or `until`
#[derive(Deserialize, ToSchema)]
pub struct ExtendPinRequest {
    /// Preset or arbitrary number of hours to extend by
    pub hours: Option<i64>,
    /// Operator-chosen absolute expiry
    pub until: Option<DateTime<Utc>>,
}

#[derive(Deserialize, ToSchema)]
pub struct PinStatusQuery {
    /// Language for the duration text (cs, en, uk); defaults to cs
    pub lang: Option<String>,
}

/// List visits
#[utoipa::path(
    get,
    path = "/visits",
    tag = "visits",
    params(
        ("branch_id" = Option<i32>, Query, description = "Filter by branch"),
        ("company_id" = Option<i32>, Query, description = "Filter by company"),
        ("status" = Option<String>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "Visits matching the filter", body = Vec<Visit>)
    )
)]
pub async fn list_visits(
    State(state): State<crate::AppState>,
    Query(query): Query<VisitQuery>,
) -> AppResult<Json<Vec<Visit>>> {
    let visits = state.services.visits.list(&query).await?;
    Ok(Json(visits))
}

/// Get a single visit
#[utoipa::path(
    get,
    path = "/visits/{id}",
    tag = "visits",
    params(("id" = i32, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Visit", body = Visit),
        (status = 404, description = "Visit not found")
    )
)]
pub async fn get_visit(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Visit>> {
    let visit = state.services.visits.get(id).await?;
    Ok(Json(visit))
}

/// Create a visit. Planned visits with an invitation address get a PIN
/// generated and the invitation mail sent right away.
#[utoipa::path(
    post,
    path = "/visits",
    tag = "visits",
    request_body = CreateVisit,
    responses(
        (status = 201, description = "Visit created", body = CreateVisitResponse),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn create_visit(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateVisit>,
) -> AppResult<(StatusCode, Json<CreateVisitResponse>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (visit, pin) = state.services.visits.create(request).await?;
    Ok((StatusCode::CREATED, Json(CreateVisitResponse { visit, pin })))
}

/// Generate (or regenerate) the visit's PIN
#[utoipa::path(
    post,
    path = "/visits/{id}/pin",
    tag = "pin",
    params(("id" = i32, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "PIN generated", body = PinResponse),
        (status = 404, description = "Visit not found"),
        (status = 422, description = "Visit is cancelled")
    )
)]
pub async fn generate_pin(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<PinResponse>> {
    let (pin, expires_at) = state.services.pin.generate(id).await?;
    Ok(Json(PinResponse {
        visit_id: id,
        pin: Some(pin),
        expires_at,
    }))
}

/// Extend the visit's PIN by preset hours (24/48/168), any positive hour
/// count, or to an absolute timestamp
#[utoipa::path(
    post,
    path = "/visits/{id}/pin/extend",
    tag = "pin",
    params(("id" = i32, Path, description = "Visit ID")),
    request_body = ExtendPinRequest,
    responses(
        (status = 200, description = "PIN extended", body = PinResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Visit not found"),
        (status = 422, description = "Visit is cancelled or has no PIN")
    )
)]
pub async fn extend_pin(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<ExtendPinRequest>,
) -> AppResult<Json<PinResponse>> {
    let expires_at = match (request.hours, request.until) {
        (Some(hours), None) => state.services.pin.extend_hours(id, hours).await?,
        (None, Some(until)) => state.services.pin.extend_until(id, until).await?,
        _ => {
            return Err(AppError::Validation(
                "Provide exactly one of 'hours' or 'until'".to_string(),
            ))
        }
    };
    Ok(Json(PinResponse {
        visit_id: id,
        pin: None,
        expires_at,
    }))
}

/// Time-based PIN status with a formatted duration
#[utoipa::path(
    get,
    path = "/visits/{id}/pin/status",
    tag = "pin",
    params(
        ("id" = i32, Path, description = "Visit ID"),
        ("lang" = Option<String>, Query, description = "Duration text language")
    ),
    responses(
        (status = 200, description = "PIN status", body = PinStatusReport),
        (status = 404, description = "Visit not found or has no PIN")
    )
)]
pub async fn pin_status(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Query(query): Query<PinStatusQuery>,
) -> AppResult<Json<PinStatusReport>> {
    let lang = query
        .lang
        .as_deref()
        .and_then(Language::from_code)
        .unwrap_or_default();
    let report = state.services.pin.status(id, lang).await?;
    Ok(Json(report))
}

/// Cancel a visit. Cancelled visits no longer offer PIN actions.
#[utoipa::path(
    post,
    path = "/visits/{id}/cancel",
    tag = "visits",
    params(("id" = i32, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Visit cancelled", body = Visit),
        (status = 404, description = "Visit not found")
    )
)]
pub async fn cancel_visit(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Visit>> {
    let visit = state.services.visits.cancel(id).await?;
    Ok(Json(visit))
}

/// Confirm the invitation for a visit
#[utoipa::path(
    post,
    path = "/visits/{id}/confirm",
    tag = "visits",
    params(("id" = i32, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Invitation confirmed", body = Visit),
        (status = 404, description = "Visit not found"),
        (status = 422, description = "Visit cannot be confirmed")
    )
)]
pub async fn confirm_invitation(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Visit>> {
    let visit = state.services.visits.confirm_invitation(id).await?;
    Ok(Json(visit))
}

/// Visitors of the visit currently on premises
#[utoipa::path(
    get,
    path = "/visits/{id}/visitors",
    tag = "visits",
    params(("id" = i32, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Present visitors", body = Vec<PresentVisitor>),
        (status = 404, description = "Visit not found")
    )
)]
pub async fn list_present_visitors(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<PresentVisitor>>> {
    let present = state.services.checkout.list_present(id).await?;
    Ok(Json(present))
}

/// Pre-register a visitor on a planned visit
#[utoipa::path(
    post,
    path = "/visits/{id}/visitors",
    tag = "visits",
    params(("id" = i32, Path, description = "Visit ID")),
    request_body = RegisterVisitor,
    responses(
        (status = 201, description = "Visitor attached", body = Visitor),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Visit not found")
    )
)]
pub async fn add_visitor(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<RegisterVisitor>,
) -> AppResult<(StatusCode, Json<Visitor>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let visitor = state.services.visits.add_visitor(id, &request).await?;
    Ok((StatusCode::CREATED, Json(visitor)))
}

/// Checkout finalization from the admin side (reception desk override)
#[derive(Deserialize, ToSchema)]
pub struct AdminCheckoutRequest {
    pub visitor_ids: Vec<i32>,
    /// "return" keeps the visit open, "complete" closes it
    pub outcome: String,
}

#[utoipa::path(
    post,
    path = "/visits/{id}/checkout",
    tag = "visits",
    params(("id" = i32, Path, description = "Visit ID")),
    request_body = AdminCheckoutRequest,
    responses(
        (status = 200, description = "Visitors checked out", body = Visit),
        (status = 404, description = "Visit not found"),
        (status = 422, description = "Empty or invalid selection")
    )
)]
pub async fn admin_checkout(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<AdminCheckoutRequest>,
) -> AppResult<Json<Visit>> {
    let outcome = crate::models::CheckoutOutcome::from_code(&request.outcome)
        .ok_or_else(|| AppError::Validation("Unknown checkout outcome".to_string()))?;
    state
        .services
        .checkout
        .finalize(id, &request.visitor_ids, outcome)
        .await?;
    let visit = state.services.visits.get(id).await?;
    Ok(Json(visit))
}
