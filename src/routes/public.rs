use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::public::{BracketResponse, StandingsResponse},
    error::AppError,
    services::tournament_service,
    state::SharedState,
};

/// Public read-only endpoints that expose bracket and standings data.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/public/tournaments/{id}/bracket", get(get_bracket))
        .route("/public/tournaments/{id}/standings", get(get_standings))
}

/// Return the full bracket of a tournament, matchups grouped into rounds.
#[utoipa::path(
    get,
    path = "/public/tournaments/{id}/bracket",
    tag = "public",
    params(("id" = Uuid, Path, description = "Identifier of the tournament")),
    responses(
        (status = 200, description = "Bracket", body = BracketResponse),
        (status = 404, description = "Unknown tournament")
    )
)]
pub async fn get_bracket(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BracketResponse>, AppError> {
    Ok(Json(tournament_service::get_bracket(&state, id).await?))
}

/// Return the standings computed from all finalized matchups.
#[utoipa::path(
    get,
    path = "/public/tournaments/{id}/standings",
    tag = "public",
    params(("id" = Uuid, Path, description = "Identifier of the tournament")),
    responses(
        (status = 200, description = "Standings", body = StandingsResponse),
        (status = 404, description = "Unknown tournament")
    )
)]
pub async fn get_standings(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StandingsResponse>, AppError> {
    Ok(Json(tournament_service::get_standings(&state, id).await?))
}
