use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::organizer::{
        AcceptReportResponse, ClearResultResponse, CreateTournamentRequest, DeclareResultRequest,
        DeclareResultResponse, NextRoundResponse, ReportQueueItem, StartNextRoundRequest,
        StartTournamentRequest, StartTournamentResponse, TournamentListItem,
    },
    dto::{common::TournamentView, public::BracketResponse},
    error::AppError,
    services::{match_service, reports, tournament_service},
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Organizer-only endpoints driving the progression engine.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route(
            "/organizer/tournaments",
            get(list_tournaments).post(create_tournament),
        )
        .route(
            "/organizer/tournaments/{id}",
            get(get_tournament).delete(delete_tournament),
        )
        .route("/organizer/tournaments/{id}/start", post(start_tournament))
        .route(
            "/organizer/tournaments/{id}/complete",
            post(complete_tournament),
        )
        .route(
            "/organizer/tournaments/{id}/rounds/next",
            post(start_next_round),
        )
        .route("/organizer/tournaments/{id}/reports", get(list_reports))
        .route(
            "/organizer/matches/{id}/result",
            post(declare_result).delete(clear_result),
        )
        .route("/organizer/reports/{id}/accept", post(accept_report))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Retrieve all tournaments known to the system.
#[utoipa::path(
    get,
    path = "/organizer/tournaments",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "List tournaments", body = [TournamentListItem]))
)]
pub async fn list_tournaments(
    State(state): State<SharedState>,
) -> Result<Json<Vec<TournamentListItem>>, AppError> {
    Ok(Json(tournament_service::list_tournaments(&state).await?))
}

/// Create a tournament in the initialization state.
#[utoipa::path(
    post,
    path = "/organizer/tournaments",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = CreateTournamentRequest,
    responses((status = 200, description = "Tournament created", body = TournamentView))
)]
pub async fn create_tournament(
    State(state): State<SharedState>,
    Json(payload): Json<CreateTournamentRequest>,
) -> Result<Json<TournamentView>, AppError> {
    payload.validate()?;
    Ok(Json(
        tournament_service::create_tournament(&state, payload).await?,
    ))
}

/// Retrieve a tournament with its full bracket.
#[utoipa::path(
    get,
    path = "/organizer/tournaments/{id}",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the tournament")),
    responses((status = 200, description = "Tournament and bracket", body = BracketResponse))
)]
pub async fn get_tournament(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BracketResponse>, AppError> {
    Ok(Json(tournament_service::get_bracket(&state, id).await?))
}

/// Delete a tournament together with its matchups and score reports.
#[utoipa::path(
    delete,
    path = "/organizer/tournaments/{id}",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the tournament to delete")),
    responses((status = 204, description = "Tournament deleted"))
)]
pub async fn delete_tournament(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    tournament_service::delete_tournament(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Start a tournament: build the initial bracket from the active roster.
#[utoipa::path(
    post,
    path = "/organizer/tournaments/{id}/start",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the tournament to start")),
    request_body = StartTournamentRequest,
    responses(
        (status = 200, description = "Initial bracket generated", body = StartTournamentResponse),
        (status = 409, description = "Tournament already started")
    )
)]
pub async fn start_tournament(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StartTournamentRequest>,
) -> Result<Json<StartTournamentResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        tournament_service::start_tournament(&state, id, payload).await?,
    ))
}

/// Close a running tournament.
#[utoipa::path(
    post,
    path = "/organizer/tournaments/{id}/complete",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the tournament to complete")),
    responses((status = 200, description = "Tournament completed", body = TournamentView))
)]
pub async fn complete_tournament(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TournamentView>, AppError> {
    Ok(Json(
        tournament_service::complete_tournament(&state, id).await?,
    ))
}

/// Generate the next Swiss round from the current standings.
#[utoipa::path(
    post,
    path = "/organizer/tournaments/{id}/rounds/next",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the tournament")),
    request_body = StartNextRoundRequest,
    responses(
        (status = 200, description = "Next round generated", body = NextRoundResponse),
        (status = 409, description = "Round already generated or unresolved matchups remain")
    )
)]
pub async fn start_next_round(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StartNextRoundRequest>,
) -> Result<Json<NextRoundResponse>, AppError> {
    Ok(Json(
        tournament_service::start_next_round(&state, id, payload).await?,
    ))
}

/// The reconciliation queue: all score reports with agreement annotations.
#[utoipa::path(
    get,
    path = "/organizer/tournaments/{id}/reports",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the tournament")),
    responses((status = 200, description = "Score report queue", body = [ReportQueueItem]))
)]
pub async fn list_reports(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ReportQueueItem>>, AppError> {
    Ok(Json(reports::list_reports(&state, id).await?))
}

/// Declare a matchup result directly (winner or tie).
#[utoipa::path(
    post,
    path = "/organizer/matches/{id}/result",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the matchup")),
    request_body = DeclareResultRequest,
    responses(
        (status = 200, description = "Result committed", body = DeclareResultResponse),
        (status = 409, description = "Matchup locked or concurrently modified")
    )
)]
pub async fn declare_result(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeclareResultRequest>,
) -> Result<Json<DeclareResultResponse>, AppError> {
    payload.validate()?;
    Ok(Json(match_service::declare_result(&state, id, payload).await?))
}

/// Clear a matchup result back to open, retracting the propagated winner.
#[utoipa::path(
    delete,
    path = "/organizer/matches/{id}/result",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the matchup")),
    responses(
        (status = 200, description = "Result cleared", body = ClearResultResponse),
        (status = 409, description = "Matchup locked by a decided downstream result")
    )
)]
pub async fn clear_result(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClearResultResponse>, AppError> {
    Ok(Json(match_service::clear_result(&state, id).await?))
}

/// Accept a score report as the authoritative matchup result.
#[utoipa::path(
    post,
    path = "/organizer/reports/{id}/accept",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the report to accept")),
    responses(
        (status = 200, description = "Report accepted and result committed", body = AcceptReportResponse),
        (status = 409, description = "Report already accepted or matchup locked")
    )
)]
pub async fn accept_report(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AcceptReportResponse>, AppError> {
    Ok(Json(reports::accept_score_report(&state, id).await?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    let expected = {
        let guard = state.admin_token().lock().await;
        guard.clone()
    };

    match expected {
        Some(token) if token == provided => Ok(next.run(req).await),
        Some(_) => Err(AppError::Unauthorized("invalid admin token".into())),
        None => Err(AppError::Unauthorized(
            "admin SSE stream not initialised yet".into(),
        )),
    }
}
