use super::state::{ActiveInterview, AppState};
use crate::agent::EvaluationResult;
use crate::review::{self, InterviewRecord, InterviewSummary};
use crate::session::{PositionLevel, SessionConfig, SessionHandle, SessionState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartInterviewRequest {
    pub candidate_name: String,
    pub position_level: PositionLevel,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Serialize)]
pub struct StartInterviewResponse {
    pub interview_id: String,
    pub status: String,
    pub remaining_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct SubmitMessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct VoiceFragmentRequest {
    pub text: String,
    #[serde(default)]
    pub is_final: bool,
}

#[derive(Debug, Deserialize)]
pub struct VoiceOutputRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
}

#[derive(Debug, Serialize)]
pub struct ListeningResponse {
    pub listening: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum InterviewView {
    Running {
        interview_id: String,
        state: SessionState,
    },
    Finished(InterviewRecord),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn not_active(interview_id: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Interview {} is not in progress", interview_id),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /interviews
/// Start a new interview
pub async fn start_interview(
    State(state): State<AppState>,
    Json(req): Json<StartInterviewRequest>,
) -> impl IntoResponse {
    let config = SessionConfig {
        candidate_name: req.candidate_name,
        position_level: req.position_level,
        notes: req.notes,
    };

    if let Err(e) = config.validate() {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    let mut active = state.active.write().await;
    if let Some(current) = active.as_ref() {
        return error_response(
            StatusCode::CONFLICT,
            format!("Interview {} is already in progress", current.id),
        );
    }

    let interview_id = format!("interview-{}", uuid::Uuid::new_v4());
    info!("Starting interview {} for {}", interview_id, config.candidate_name);

    let (runner, feed) = state.build_runner();
    let handle = match SessionHandle::start(runner, config) {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start interview: {:#}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to start interview: {}", e),
            );
        }
    };

    let remaining_seconds = handle.state().remaining_seconds;

    *active = Some(ActiveInterview {
        id: interview_id.clone(),
        handle: handle.clone(),
        feed,
    });
    drop(active);

    // Sessions that run out of time end without an explicit request
    let watcher_state = state.clone();
    let watcher_id = interview_id.clone();
    tokio::spawn(async move {
        if let Some(bundle) = handle.finished().await {
            watcher_state.complete(&watcher_id, bundle).await;
        }
    });

    (
        StatusCode::CREATED,
        Json(StartInterviewResponse {
            interview_id,
            status: "running".to_string(),
            remaining_seconds,
        }),
    )
        .into_response()
}

/// GET /interviews
/// List finished interviews, newest first
pub async fn list_interviews(State(state): State<AppState>) -> impl IntoResponse {
    let interviews = state.interviews.read().await;
    let mut summaries: Vec<InterviewSummary> = interviews.values().map(|r| r.summary()).collect();
    summaries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
    Json(summaries)
}

/// GET /interviews/:interview_id
/// Live state of a running interview, or the record of a finished one
pub async fn get_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    if let Some(active) = state.active_interview(&interview_id).await {
        return Json(InterviewView::Running {
            interview_id,
            state: active.handle.state(),
        })
        .into_response();
    }

    let interviews = state.interviews.read().await;
    match interviews.get(&interview_id) {
        Some(record) => Json(InterviewView::Finished(record.clone())).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Interview {} not found", interview_id),
        ),
    }
}

/// POST /interviews/:interview_id/messages
/// Submit typed candidate input
pub async fn submit_message(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
    Json(req): Json<SubmitMessageRequest>,
) -> impl IntoResponse {
    match state.active_interview(&interview_id).await {
        Some(active) => {
            let accepted = active.handle.submit_text(req.text).await;
            Json(AcceptedResponse { accepted }).into_response()
        }
        None => not_active(&interview_id),
    }
}

/// POST /interviews/:interview_id/voice/listen
pub async fn start_listening(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    match state.active_interview(&interview_id).await {
        Some(active) => {
            let listening = active.handle.start_listening().await;
            Json(ListeningResponse { listening }).into_response()
        }
        None => not_active(&interview_id),
    }
}

/// POST /interviews/:interview_id/voice/stop
pub async fn stop_listening(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    match state.active_interview(&interview_id).await {
        Some(active) => {
            active.handle.stop_listening().await;
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_active(&interview_id),
    }
}

/// POST /interviews/:interview_id/voice/submit
/// Submit the accumulated speech buffer
pub async fn submit_voice(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    match state.active_interview(&interview_id).await {
        Some(active) => {
            let accepted = active.handle.submit_voice_buffer().await;
            Json(AcceptedResponse { accepted }).into_response()
        }
        None => not_active(&interview_id),
    }
}

/// POST /interviews/:interview_id/voice/fragments
/// Push a recognition result produced on the client
pub async fn push_voice_fragment(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
    Json(req): Json<VoiceFragmentRequest>,
) -> impl IntoResponse {
    let Some(active) = state.active_interview(&interview_id).await else {
        return not_active(&interview_id);
    };

    match active.feed {
        Some(feed) => {
            let accepted = feed.push(req.text, req.is_final);
            Json(AcceptedResponse { accepted }).into_response()
        }
        None => error_response(
            StatusCode::CONFLICT,
            "Voice input is not available for this interview",
        ),
    }
}

/// PUT /interviews/:interview_id/voice/output
pub async fn set_voice_output(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
    Json(req): Json<VoiceOutputRequest>,
) -> impl IntoResponse {
    match state.active_interview(&interview_id).await {
        Some(active) => {
            active.handle.set_voice_output(req.enabled).await;
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_active(&interview_id),
    }
}

/// POST /interviews/:interview_id/end
/// End an interview and return its transcript
pub async fn end_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    if let Some(active) = state.active_interview(&interview_id).await {
        info!("Ending interview {}", interview_id);
        return match active.handle.end().await {
            Some(bundle) => {
                state.complete(&interview_id, bundle.clone()).await;
                (StatusCode::OK, Json(bundle)).into_response()
            }
            None => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Interview {} produced no transcript", interview_id),
            ),
        };
    }

    // Already finished (possibly by timeout): ending again is a no-op
    let interviews = state.interviews.read().await;
    match interviews.get(&interview_id) {
        Some(record) => (StatusCode::OK, Json(record.bundle.clone())).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Interview {} not found", interview_id),
        ),
    }
}

/// GET /interviews/:interview_id/transcript
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    let interviews = state.interviews.read().await;
    match interviews.get(&interview_id) {
        Some(record) => (StatusCode::OK, Json(record.bundle.clone())).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("No transcript for interview {}", interview_id),
        ),
    }
}

/// POST /interviews/:interview_id/evaluate
/// Request an evaluation; replaces any previous one
pub async fn evaluate_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    let record = {
        let interviews = state.interviews.read().await;
        interviews.get(&interview_id).cloned()
    };

    let Some(mut record) = record else {
        return error_response(
            StatusCode::NOT_FOUND,
            format!("Interview {} not found or still in progress", interview_id),
        );
    };

    match review::evaluate(&mut record, state.gateway.as_ref()).await {
        Ok(result) => {
            let mut interviews = state.interviews.write().await;
            interviews.insert(interview_id, record);
            (StatusCode::OK, Json::<EvaluationResult>(result)).into_response()
        }
        Err(e) => {
            warn!("Evaluation failed: {}", e);
            error_response(StatusCode::BAD_GATEWAY, format!("Evaluation failed: {}", e))
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
