use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Matchflow Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::sse::admin_stream,
        crate::routes::organizer::list_tournaments,
        crate::routes::organizer::create_tournament,
        crate::routes::organizer::get_tournament,
        crate::routes::organizer::delete_tournament,
        crate::routes::organizer::start_tournament,
        crate::routes::organizer::complete_tournament,
        crate::routes::organizer::start_next_round,
        crate::routes::organizer::list_reports,
        crate::routes::organizer::declare_result,
        crate::routes::organizer::clear_result,
        crate::routes::organizer::accept_report,
        crate::routes::player::submit_report,
        crate::routes::player::update_report,
        crate::routes::player::delete_report,
        crate::routes::public::get_bracket,
        crate::routes::public::get_standings,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::AdminHandshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::MatchUpdatedEvent,
            crate::dto::sse::RoundCreatedEvent,
            crate::dto::sse::ReportSubmittedEvent,
            crate::dto::sse::ReportDisputedEvent,
            crate::dto::sse::ReportAcceptedEvent,
            crate::dto::sse::TournamentUpdatedEvent,
            crate::dto::common::SlotView,
            crate::dto::common::MatchupView,
            crate::dto::common::MatchPhaseView,
            crate::dto::common::RoundView,
            crate::dto::common::TournamentView,
            crate::dto::common::ScoreInput,
            crate::dto::organizer::TournamentListItem,
            crate::dto::organizer::CreateTournamentRequest,
            crate::dto::organizer::TournamentSettingsInput,
            crate::dto::organizer::PlayerInput,
            crate::dto::organizer::StartTournamentRequest,
            crate::dto::organizer::StartTournamentResponse,
            crate::dto::organizer::DeclareResultRequest,
            crate::dto::organizer::DeclareResultResponse,
            crate::dto::organizer::ClearResultResponse,
            crate::dto::organizer::PropagationStatus,
            crate::dto::organizer::PropagationView,
            crate::dto::organizer::StartNextRoundRequest,
            crate::dto::organizer::NextRoundResponse,
            crate::dto::organizer::AcceptReportResponse,
            crate::dto::organizer::ReportQueueItem,
            crate::dto::player::ReportView,
            crate::dto::player::ReportedOutcome,
            crate::dto::player::SubmitReportRequest,
            crate::dto::player::SubmitReportResponse,
            crate::dto::player::UpdateReportRequest,
            crate::dto::public::BracketResponse,
            crate::dto::public::StandingRow,
            crate::dto::public::StandingsResponse,
            crate::dao::models::TournamentFormat,
            crate::dao::models::TournamentStatus,
            crate::dao::models::TournamentSettings,
            crate::dao::models::PairingMode,
            crate::dao::models::SwissWinCondition,
            crate::dao::models::SlotKind,
            crate::dao::models::ReportStatus,
            crate::dao::models::ReportedScore,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "organizer", description = "Organizer commands driving the tournament engine"),
        (name = "player", description = "Player score report submission"),
        (name = "public", description = "Read-only bracket and standings projections"),
    )
)]
pub struct ApiDoc;
