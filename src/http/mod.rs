//! HTTP API for driving interviews from a front end
//!
//! - POST /interviews - Start an interview
//! - GET /interviews - List finished interviews
//! - GET /interviews/:id - Live state or finished record
//! - POST /interviews/:id/messages - Submit typed input
//! - POST /interviews/:id/voice/{listen,stop,submit,fragments} - Voice input
//! - PUT /interviews/:id/voice/output - Toggle spoken replies
//! - POST /interviews/:id/end - End and get the transcript
//! - GET /interviews/:id/transcript - Transcript of a finished interview
//! - POST /interviews/:id/evaluate - Request an evaluation
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{ActiveInterview, AppState};
