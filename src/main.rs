use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use loqa_interview::session::{format_clock, Role};
use loqa_interview::speech::{RecognitionFeed, RecognitionKind, SynthesisKind};
use loqa_interview::{
    create_router, AgentGateway, AppState, Config, HttpAgentGateway, PositionLevel,
    RunnerOptions, SessionConfig, SessionHandle, SessionRunner, SpeechBackendFactory,
    TranscriptBundle,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loqa-interview", version, about = "AI-assisted technical interviews")]
struct Cli {
    /// Config file (without extension)
    #[arg(long, global = true, default_value = "config/loqa-interview")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Run one interview in the terminal
    Console {
        /// Candidate name
        #[arg(long)]
        candidate: String,
        /// Position level (junior, mid, senior)
        #[arg(long, default_value = "mid")]
        level: PositionLevel,
        #[arg(long, default_value = "")]
        notes: String,
        /// Override the interview length in seconds
        #[arg(long)]
        duration: Option<u64>,
        /// Do not speak interviewer replies
        #[arg(long)]
        no_voice: bool,
        /// Request an evaluation once the interview ends
        #[arg(long)]
        evaluate: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Loqa Interview v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let gateway: Arc<dyn AgentGateway> = Arc::new(HttpAgentGateway::new(&cfg.agent)?);

    match cli.command {
        Command::Serve => serve(cfg, gateway).await,
        Command::Console {
            candidate,
            level,
            notes,
            duration,
            no_voice,
            evaluate,
        } => {
            let mut options = RunnerOptions::from_config(&cfg);
            if let Some(duration) = duration {
                options.duration_secs = duration;
            }
            if no_voice {
                options.voice_output = false;
            }
            let session = SessionConfig::new(candidate, level).with_notes(notes);
            console(cfg, gateway, options, session, evaluate).await
        }
    }
}

async fn serve(cfg: Config, gateway: Arc<dyn AgentGateway>) -> Result<()> {
    let state = AppState::new(gateway, RunnerOptions::from_config(&cfg), cfg.voice.clone());
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}

async fn console(
    cfg: Config,
    gateway: Arc<dyn AgentGateway>,
    options: RunnerOptions,
    session: SessionConfig,
    evaluate: bool,
) -> Result<()> {
    // Typed "/hear" lines stand in for a microphone, the log for a speaker
    let (recognizer, feed) = SpeechBackendFactory::recognizer(RecognitionKind::Push);
    let synthesizer =
        SpeechBackendFactory::synthesizer(SynthesisKind::Simulated, cfg.voice.words_per_minute);

    let runner = SessionRunner::new(Arc::clone(&gateway), recognizer, synthesizer, options);
    let handle = SessionHandle::start(runner, session)?;

    println!("Interview started. Type to answer, /help for commands.");

    let printer = tokio::spawn(print_turns(handle.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !run_console_command(&handle, feed.as_ref(), line.trim()).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = handle.finished() => {
                println!("Time is up.");
                break;
            }
        }
    }

    let bundle = handle.end().await;
    printer.abort();

    let Some(bundle) = bundle else {
        return Ok(());
    };
    print_transcript(&bundle);

    if evaluate {
        match gateway.request_evaluation(&bundle).await {
            Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
            Err(e) => warn!("Evaluation failed: {}", e),
        }
    }

    Ok(())
}

/// Returns `false` when the user asked to end the interview
async fn run_console_command(
    handle: &SessionHandle,
    feed: Option<&RecognitionFeed>,
    line: &str,
) -> bool {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

    match command {
        "" => {}
        "/end" => return false,
        "/listen" => {
            if !handle.start_listening().await {
                println!("(voice input unavailable)");
            }
        }
        "/stop" => handle.stop_listening().await,
        "/send" => {
            if !handle.submit_voice_buffer().await {
                println!("(nothing to send)");
            }
        }
        "/hear" | "/partial" => match feed {
            Some(feed) => {
                if !feed.push(rest, command == "/hear") {
                    println!("(not listening, use /listen first)");
                }
            }
            None => println!("(voice input unavailable)"),
        },
        "/voice" => handle.set_voice_output(rest.trim() != "off").await,
        "/help" => {
            println!("/listen  /hear <text>  /partial <text>  /stop  /send  /voice on|off  /end");
        }
        _ => {
            if !handle.submit_text(line).await {
                println!("(still waiting for the interviewer, try again shortly)");
            }
        }
    }

    true
}

async fn print_turns(handle: SessionHandle) {
    let mut updates = handle.subscribe();
    let mut printed = 0;
    let mut last_minute = None;

    while updates.changed().await.is_ok() {
        let state = updates.borrow_and_update().clone();

        for turn in state.turns.iter().skip(printed) {
            if turn.role == Role::Interviewer {
                println!("Interviewer: {}", turn.content);
            }
        }
        printed = state.turns.len();

        let minute = state.remaining_seconds / 60;
        if last_minute != Some(minute) && state.remaining_seconds % 60 == 0 {
            println!("[{} remaining]", format_clock(state.remaining_seconds));
            last_minute = Some(minute);
        }
    }
}

fn print_transcript(bundle: &TranscriptBundle) {
    println!();
    println!("Transcript: {} ({})", bundle.candidate_name, bundle.position_level);
    for item in &bundle.transcript {
        println!("[{}] {}: {}", item.timestamp, item.speaker, item.content);
    }
}
