use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod organizer;
pub mod player;
pub mod public;
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(organizer::router(state.clone()))
        .merge(player::router())
        .merge(public::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
