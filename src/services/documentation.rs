use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the KineKids sync service.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::events::event_stream,
        crate::routes::session::begin_session,
        crate::routes::session::session_status,
        crate::routes::session::end_session,
        crate::routes::session::advance,
        crate::routes::session::sync_check,
        crate::routes::session::refresh_scores,
        crate::routes::session::set_polling,
        crate::routes::session::restart_polling,
        crate::routes::session::session_summary,
        crate::routes::connection::connection_status,
        crate::routes::connection::check_connection,
        crate::routes::connection::set_engine_url,
        crate::routes::connection::set_mode,
        crate::routes::alerts::list_alerts,
        crate::routes::alerts::dismiss_alert,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::session::BeginSessionRequest,
            crate::dto::session::PollingRequest,
            crate::dto::session::SessionStatusResponse,
            crate::dto::session::StudentCard,
            crate::dto::session::SummaryResponse,
            crate::dto::session::PhaseView,
            crate::dto::session::ModeView,
            crate::dto::session::RunView,
            crate::dto::session::ScoreHolderView,
            crate::dto::session::GradeAverageView,
            crate::dto::connection::ConnectionView,
            crate::dto::connection::ConnectionResponse,
            crate::dto::connection::EngineUrlRequest,
            crate::dto::connection::ModeRequest,
            crate::dto::alerts::AlertView,
        )
    ),
    tags(
        (name = "session", description = "Play session lifecycle and controls"),
        (name = "connection", description = "Engine reachability and overrides"),
        (name = "alerts", description = "Dismissible operator alerts"),
        (name = "events", description = "Server-sent session events"),
        (name = "health", description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;
