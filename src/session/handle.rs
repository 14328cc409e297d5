use anyhow::Result;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

use super::config::SessionConfig;
use super::runner::{SessionEvent, SessionRunner};
use super::state::SessionState;
use super::transcript::TranscriptBundle;

const COMMAND_CHANNEL_SIZE: usize = 32;

/// Request sent from a [`SessionHandle`] to the session task
#[derive(Debug)]
pub enum SessionCommand {
    SubmitText {
        text: String,
        reply: oneshot::Sender<bool>,
    },
    SubmitVoice {
        reply: oneshot::Sender<bool>,
    },
    StartListening {
        reply: oneshot::Sender<bool>,
    },
    StopListening {
        reply: oneshot::Sender<()>,
    },
    SetVoiceOutput {
        enabled: bool,
        reply: oneshot::Sender<()>,
    },
    End {
        reply: oneshot::Sender<Option<TranscriptBundle>>,
    },
}

enum Step {
    Command(Option<SessionCommand>),
    Event(SessionEvent),
}

/// Cloneable handle to a session running on its own task
///
/// The task exclusively owns the [`SessionRunner`]; callers talk to it
/// through commands and observe it through `subscribe()`. Dropping every
/// handle ends the session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    state: watch::Receiver<SessionState>,
    transcript: watch::Receiver<Option<TranscriptBundle>>,
}

impl SessionHandle {
    /// Start `runner` with `config` and spawn the session task
    pub fn start(mut runner: SessionRunner, config: SessionConfig) -> Result<Self> {
        runner.start(config)?;

        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let (transcript_tx, transcript_rx) = watch::channel(None);
        let state = runner.subscribe();

        tokio::spawn(run_session(runner, commands_rx, transcript_tx));

        Ok(Self {
            commands: commands_tx,
            state,
            transcript: transcript_rx,
        })
    }

    pub async fn submit_text(&self, text: impl Into<String>) -> bool {
        let (reply, rx) = oneshot::channel();
        let command = SessionCommand::SubmitText {
            text: text.into(),
            reply,
        };
        if self.commands.send(command).await.is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    pub async fn submit_voice_buffer(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(SessionCommand::SubmitVoice { reply }).await.is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Start voice capture; returns whether capture is active afterwards
    pub async fn start_listening(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(SessionCommand::StartListening { reply }).await.is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    pub async fn stop_listening(&self) {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(SessionCommand::StopListening { reply }).await.is_ok() {
            let _ = rx.await;
        }
    }

    pub async fn set_voice_output(&self, enabled: bool) {
        let (reply, rx) = oneshot::channel();
        let command = SessionCommand::SetVoiceOutput { enabled, reply };
        if self.commands.send(command).await.is_ok() {
            let _ = rx.await;
        }
    }

    /// End the session (idempotent) and return the final transcript
    pub async fn end(&self) -> Option<TranscriptBundle> {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(SessionCommand::End { reply }).await.is_ok() {
            if let Ok(bundle) = rx.await {
                return bundle;
            }
        }
        self.transcript.borrow().clone()
    }

    /// Latest state snapshot
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Transcript, if the session has already ended
    pub fn transcript(&self) -> Option<TranscriptBundle> {
        self.transcript.borrow().clone()
    }

    /// Wait until the session ends, by timeout or by request
    pub async fn finished(&self) -> Option<TranscriptBundle> {
        let mut rx = self.transcript.clone();
        let bundle = match rx.wait_for(Option::is_some).await {
            Ok(bundle) => (*bundle).clone(),
            Err(_) => None,
        };
        bundle
    }
}

async fn run_session(
    mut runner: SessionRunner,
    mut commands: mpsc::Receiver<SessionCommand>,
    transcript: watch::Sender<Option<TranscriptBundle>>,
) {
    debug!("Session task started");

    loop {
        let step = tokio::select! {
            command = commands.recv() => Step::Command(command),
            event = runner.next_event() => Step::Event(event),
        };

        match step {
            Step::Command(Some(command)) => apply(&mut runner, command).await,
            Step::Command(None) => {
                runner.end().await;
                publish_transcript(&runner, &transcript);
                break;
            }
            Step::Event(event) => runner.handle_event(event).await,
        }

        publish_transcript(&runner, &transcript);
    }

    info!("Session task stopped");
}

async fn apply(runner: &mut SessionRunner, command: SessionCommand) {
    match command {
        SessionCommand::SubmitText { text, reply } => {
            let _ = reply.send(runner.submit_text(&text));
        }
        SessionCommand::SubmitVoice { reply } => {
            let _ = reply.send(runner.submit_voice_buffer().await);
        }
        SessionCommand::StartListening { reply } => {
            let _ = reply.send(runner.start_listening().await);
        }
        SessionCommand::StopListening { reply } => {
            runner.stop_listening().await;
            let _ = reply.send(());
        }
        SessionCommand::SetVoiceOutput { enabled, reply } => {
            runner.set_voice_output(enabled).await;
            let _ = reply.send(());
        }
        SessionCommand::End { reply } => {
            let _ = reply.send(runner.end().await);
        }
    }
}

fn publish_transcript(runner: &SessionRunner, transcript: &watch::Sender<Option<TranscriptBundle>>) {
    if transcript.borrow().is_some() {
        return;
    }
    if let Some(bundle) = runner.transcript() {
        transcript.send_replace(Some(bundle.clone()));
    }
}
