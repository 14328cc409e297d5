use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Interview lifecycle
        .route(
            "/interviews",
            get(handlers::list_interviews).post(handlers::start_interview),
        )
        .route("/interviews/:interview_id", get(handlers::get_interview))
        .route(
            "/interviews/:interview_id/messages",
            post(handlers::submit_message),
        )
        .route("/interviews/:interview_id/end", post(handlers::end_interview))
        // Voice control
        .route(
            "/interviews/:interview_id/voice/listen",
            post(handlers::start_listening),
        )
        .route(
            "/interviews/:interview_id/voice/stop",
            post(handlers::stop_listening),
        )
        .route(
            "/interviews/:interview_id/voice/submit",
            post(handlers::submit_voice),
        )
        .route(
            "/interviews/:interview_id/voice/fragments",
            post(handlers::push_voice_fragment),
        )
        .route(
            "/interviews/:interview_id/voice/output",
            put(handlers::set_voice_output),
        )
        // Review
        .route(
            "/interviews/:interview_id/transcript",
            get(handlers::get_transcript),
        )
        .route(
            "/interviews/:interview_id/evaluate",
            post(handlers::evaluate_interview),
        )
        // Request logging, then CORS for browser clients
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
