use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::player::{
        ReportView, ReporterQuery, SubmitReportRequest, SubmitReportResponse, UpdateReportRequest,
    },
    error::AppError,
    services::reports,
    state::SharedState,
};

/// Player-facing endpoints for self-reported match outcomes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/player/matches/{id}/reports", post(submit_report))
        .route(
            "/player/reports/{id}",
            put(update_report).delete(delete_report),
        )
}

/// Submit a score report for a matchup the reporter participates in.
#[utoipa::path(
    post,
    path = "/player/matches/{id}/reports",
    tag = "player",
    params(("id" = Uuid, Path, description = "Identifier of the matchup")),
    request_body = SubmitReportRequest,
    responses(
        (status = 200, description = "Report stored", body = SubmitReportResponse),
        (status = 409, description = "A report by this player is already outstanding")
    )
)]
pub async fn submit_report(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitReportRequest>,
) -> Result<Json<SubmitReportResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        reports::submit_score_report(&state, id, payload).await?,
    ))
}

/// Replace a not-yet-accepted report; only its original reporter may.
#[utoipa::path(
    put,
    path = "/player/reports/{id}",
    tag = "player",
    params(("id" = Uuid, Path, description = "Identifier of the report")),
    request_body = UpdateReportRequest,
    responses(
        (status = 200, description = "Report replaced", body = ReportView),
        (status = 409, description = "Report already accepted")
    )
)]
pub async fn update_report(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReportRequest>,
) -> Result<Json<ReportView>, AppError> {
    payload.validate()?;
    Ok(Json(reports::update_report(&state, id, payload).await?))
}

/// Delete a not-yet-accepted report; only its original reporter may.
#[utoipa::path(
    delete,
    path = "/player/reports/{id}",
    tag = "player",
    params(
        ("id" = Uuid, Path, description = "Identifier of the report"),
        ("reporter_id" = Uuid, Query, description = "Player deleting their own report")
    ),
    responses(
        (status = 204, description = "Report deleted"),
        (status = 409, description = "Report already accepted")
    )
)]
pub async fn delete_report(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ReporterQuery>,
) -> Result<StatusCode, AppError> {
    reports::delete_report(&state, id, query.reporter_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
