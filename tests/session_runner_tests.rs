// Integration tests for the interview session runner
//
// Agent replies are released by hand through `ControlledGateway`, so each
// test decides exactly when (and whether) the interviewer answers.

mod common;

use anyhow::Result;
use common::{ada, ControlledGateway, RecordingSynthesizer};
use loqa_interview::agent::AgentError;
use loqa_interview::session::{Phase, Role};
use loqa_interview::speech::{PushRecognizer, UnavailableRecognizer, UnavailableSynthesizer};
use loqa_interview::{RunnerOptions, SessionHandle, SessionRunner, SessionState};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn options(voice_output: bool) -> RunnerOptions {
    RunnerOptions {
        voice_output,
        ..RunnerOptions::default()
    }
}

fn runner_with(
    gateway: Arc<ControlledGateway>,
    voice_output: bool,
) -> (SessionRunner, Arc<Mutex<Vec<String>>>) {
    let (synth, spoken) = RecordingSynthesizer::new();
    let runner = SessionRunner::new(
        gateway,
        Box::new(UnavailableRecognizer),
        Box::new(synth),
        options(voice_output),
    );
    (runner, spoken)
}

/// Fold events until `done` holds
async fn settle(runner: &mut SessionRunner, done: impl Fn(&SessionState) -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !done(runner.state()) {
            runner.process_next().await;
        }
    })
    .await
    .expect("session did not reach the expected state");
}

fn contents(state: &SessionState) -> Vec<(Role, String)> {
    state
        .turns
        .iter()
        .map(|t| (t.role, t.content.clone()))
        .collect()
}

#[tokio::test]
async fn test_reply_is_appended_and_spoken() -> Result<()> {
    let (gateway, mut agent) = ControlledGateway::new();
    let (mut runner, spoken) = runner_with(gateway, true);
    runner.start(ada())?;

    assert!(runner.submit_text("Hello"));
    assert!(runner.state().awaiting_reply);

    let call = agent.next_call().await;
    assert_eq!(call.utterance, "Hello");
    assert_eq!(call.context.candidate_name, "Ada");
    assert_eq!(call.context.interview_type, "frontend_developer");
    call.reply_text("Hi there");

    settle(&mut runner, |s| s.turns.len() == 2).await;

    assert_eq!(
        contents(runner.state()),
        vec![
            (Role::Candidate, "Hello".to_string()),
            (Role::Interviewer, "Hi there".to_string()),
        ]
    );
    assert!(!runner.state().awaiting_reply);
    assert_eq!(spoken.lock().unwrap().as_slice(), ["Hi there"]);

    Ok(())
}

#[tokio::test]
async fn test_reply_not_spoken_when_voice_output_disabled() -> Result<()> {
    let (gateway, mut agent) = ControlledGateway::new();
    let (mut runner, spoken) = runner_with(gateway, false);
    runner.start(ada())?;

    assert!(runner.submit_text("Hello"));
    agent.next_call().await.reply_text("Hi there");
    settle(&mut runner, |s| s.turns.len() == 2).await;

    assert!(spoken.lock().unwrap().is_empty());
    assert!(!runner.state().voice_output_enabled);

    Ok(())
}

#[tokio::test]
async fn test_toggling_voice_output_mid_session() -> Result<()> {
    let (gateway, mut agent) = ControlledGateway::new();
    let (mut runner, spoken) = runner_with(gateway, false);
    runner.start(ada())?;

    runner.set_voice_output(true).await;
    assert!(runner.state().voice_output_enabled);

    assert!(runner.submit_text("Hello"));
    agent.next_call().await.reply_text("Hi there");
    settle(&mut runner, |s| s.turns.len() == 2).await;

    assert_eq!(spoken.lock().unwrap().as_slice(), ["Hi there"]);

    Ok(())
}

#[tokio::test]
async fn test_submission_rejected_while_reply_pending() -> Result<()> {
    let (gateway, mut agent) = ControlledGateway::new();
    let (mut runner, _spoken) = runner_with(gateway, false);
    runner.start(ada())?;

    assert!(runner.submit_text("first"));
    let before = runner.state().clone();

    assert!(!runner.submit_text("second"));
    assert_eq!(runner.state(), &before);

    agent.next_call().await.reply_text("reply to first");
    settle(&mut runner, |s| s.turns.len() == 2).await;

    assert!(runner.submit_text("second"));
    let call = agent.next_call().await;
    assert_eq!(call.utterance, "second");
    call.reply_text("reply to second");
    settle(&mut runner, |s| s.turns.len() == 4).await;

    assert_eq!(
        contents(runner.state()),
        vec![
            (Role::Candidate, "first".to_string()),
            (Role::Interviewer, "reply to first".to_string()),
            (Role::Candidate, "second".to_string()),
            (Role::Interviewer, "reply to second".to_string()),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_failed_agent_call_records_only_candidate_turn() -> Result<()> {
    let (gateway, mut agent) = ControlledGateway::new();
    let (mut runner, spoken) = runner_with(gateway, true);
    runner.start(ada())?;

    assert!(runner.submit_text("Hello"));
    agent
        .next_call()
        .await
        .fail(AgentError::Rejected(Some("agent offline".to_string())));

    settle(&mut runner, |s| !s.awaiting_reply).await;

    assert_eq!(
        contents(runner.state()),
        vec![(Role::Candidate, "Hello".to_string())]
    );
    assert!(spoken.lock().unwrap().is_empty());

    // The session keeps going: the next submission is accepted
    assert!(runner.submit_text("Are you there?"));

    Ok(())
}

#[tokio::test]
async fn test_blank_submissions_change_nothing() -> Result<()> {
    let (gateway, mut agent) = ControlledGateway::new();
    let (mut runner, _spoken) = runner_with(gateway, false);
    runner.start(ada())?;

    let before = runner.state().clone();

    assert!(!runner.submit_text(""));
    assert!(!runner.submit_text("   \n\t"));
    assert!(!runner.submit_voice_buffer().await);

    assert_eq!(runner.state(), &before);
    assert!(!agent.has_pending());

    Ok(())
}

#[tokio::test]
async fn test_submission_before_start_is_rejected() {
    let (gateway, _agent) = ControlledGateway::new();
    let (mut runner, _spoken) = runner_with(gateway, false);

    assert!(!runner.submit_text("Hello"));
    assert!(runner.state().turns.is_empty());
    assert_eq!(runner.phase(), Phase::Idle);
}

#[tokio::test]
async fn test_start_rejects_blank_candidate_name() {
    let (gateway, _agent) = ControlledGateway::new();
    let (mut runner, _spoken) = runner_with(gateway, false);

    let mut config = ada();
    config.candidate_name = "  ".to_string();

    assert!(runner.start(config).is_err());
    assert_eq!(runner.phase(), Phase::Idle);
}

#[tokio::test]
async fn test_start_twice_is_rejected() -> Result<()> {
    let (gateway, _agent) = ControlledGateway::new();
    let (mut runner, _spoken) = runner_with(gateway, false);

    runner.start(ada())?;
    assert!(runner.start(ada()).is_err());
    assert_eq!(runner.config().map(|c| c.candidate_name.as_str()), Some("Ada"));

    Ok(())
}

#[tokio::test]
async fn test_end_before_start_returns_nothing() {
    let (gateway, _agent) = ControlledGateway::new();
    let (mut runner, _spoken) = runner_with(gateway, false);

    assert!(runner.end().await.is_none());
    assert_eq!(runner.phase(), Phase::Idle);
}

#[tokio::test]
async fn test_end_is_idempotent() -> Result<()> {
    let (gateway, mut agent) = ControlledGateway::new();
    let (mut runner, _spoken) = runner_with(gateway, false);
    runner.start(ada())?;

    assert!(runner.submit_text("Hello"));
    agent.next_call().await.reply_text("Hi there");
    settle(&mut runner, |s| s.turns.len() == 2).await;

    let first = runner.end().await.expect("bundle");
    let second = runner.end().await.expect("bundle");

    assert_eq!(first, second);
    assert_eq!(runner.phase(), Phase::Ended);
    assert_eq!(first.candidate_name, "Ada");
    assert_eq!(first.notes, "Strong on CSS");
    assert_eq!(first.transcript.len(), 2);

    // Ended sessions accept nothing
    assert!(!runner.submit_text("one more thing"));
    assert_eq!(runner.state().turns.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_reply_arriving_after_end_is_discarded() -> Result<()> {
    let (gateway, mut agent) = ControlledGateway::new();
    let (mut runner, spoken) = runner_with(gateway, true);
    runner.start(ada())?;

    assert!(runner.submit_text("Hello"));
    let call = agent.next_call().await;

    let bundle = runner.end().await.expect("bundle");
    assert!(!runner.state().awaiting_reply);

    call.reply_text("Too late");
    let _ = tokio::time::timeout(Duration::from_millis(200), runner.process_next()).await;

    assert_eq!(runner.state().turns.len(), 1);
    assert_eq!(runner.transcript(), Some(&bundle));
    assert!(spoken.lock().unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_clock_reaching_zero_ends_session_once() -> Result<()> {
    let (gateway, mut agent) = ControlledGateway::new();
    let (mut runner, _spoken) = runner_with(gateway, false);
    runner.start(ada())?;

    assert!(runner.submit_text("Hello"));
    let call = agent.next_call().await;

    for _ in 0..1199 {
        runner.tick().await;
    }
    assert_eq!(runner.phase(), Phase::Running);
    assert_eq!(runner.state().remaining_seconds, 1);

    runner.tick().await;
    assert_eq!(runner.phase(), Phase::Ended);
    assert_eq!(runner.state().remaining_seconds, 0);
    let bundle = runner.transcript().cloned().expect("bundle");

    // Further ticks and a late reply leave the ended session untouched
    runner.tick().await;
    call.reply_text("Hi there");
    let _ = tokio::time::timeout(Duration::from_millis(200), runner.process_next()).await;

    assert_eq!(runner.phase(), Phase::Ended);
    assert_eq!(runner.state().turns.len(), 1);
    assert_eq!(runner.transcript(), Some(&bundle));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_countdown_expiry_ends_session() -> Result<()> {
    let (gateway, _agent) = ControlledGateway::new();
    let (synth, _spoken) = RecordingSynthesizer::new();
    let mut runner = SessionRunner::new(
        gateway,
        Box::new(UnavailableRecognizer),
        Box::new(synth),
        RunnerOptions {
            duration_secs: 3,
            voice_output: false,
            ..RunnerOptions::default()
        },
    );
    runner.start(ada())?;

    let mut seen = Vec::new();
    while runner.phase() == Phase::Running {
        runner.process_next().await;
        seen.push(runner.state().remaining_seconds);
    }

    assert_eq!(seen.last(), Some(&0));
    assert_eq!(runner.phase(), Phase::Ended);
    assert!(runner.transcript().is_some());

    Ok(())
}

#[tokio::test]
async fn test_transcript_timestamps_spread_over_session() -> Result<()> {
    let (gateway, mut agent) = ControlledGateway::new();
    let (mut runner, _spoken) = runner_with(gateway, false);
    runner.start(ada())?;

    assert!(runner.submit_text("Hello"));
    agent.next_call().await.reply_text("Tell me about flexbox");
    settle(&mut runner, |s| s.turns.len() == 2).await;
    assert!(runner.submit_text("It lays out items in one dimension"));

    let bundle = runner.end().await.expect("bundle");
    let stamps: Vec<&str> = bundle
        .transcript
        .iter()
        .map(|item| item.timestamp.as_str())
        .collect();

    assert_eq!(stamps, ["00:00", "06:40", "13:20"]);
    assert!(stamps.iter().all(|s| *s <= "20:00"));
    assert_eq!(bundle.transcript[1].speaker, Role::Interviewer);

    Ok(())
}

#[tokio::test]
async fn test_turn_order_matches_acceptance_order() -> Result<()> {
    let (gateway, mut agent) = ControlledGateway::new();
    let (mut runner, _spoken) = runner_with(gateway, false);
    runner.start(ada())?;

    for round in 0..5 {
        let answer = format!("answer {}", round);
        assert!(runner.submit_text(&answer));
        assert!(!runner.submit_text("interruption"));

        let call = agent.next_call().await;
        assert_eq!(call.utterance, answer);
        call.reply_text(&format!("question {}", round + 1));

        let expected = 2 * (round + 1);
        settle(&mut runner, |s| s.turns.len() == expected).await;
    }

    let state = runner.state();
    for (index, turn) in state.turns.iter().enumerate() {
        assert_eq!(turn.sequence, index as u64);
        let round = index / 2;
        if index % 2 == 0 {
            assert_eq!(turn.role, Role::Candidate);
            assert_eq!(turn.content, format!("answer {}", round));
        } else {
            assert_eq!(turn.role, Role::Interviewer);
            assert_eq!(turn.content, format!("question {}", round + 1));
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_voice_buffer_submission() -> Result<()> {
    let (gateway, mut agent) = ControlledGateway::new();
    let (recognizer, feed) = PushRecognizer::new();
    let mut runner = SessionRunner::new(
        gateway,
        Box::new(recognizer),
        Box::new(UnavailableSynthesizer),
        options(false),
    );
    runner.start(ada())?;

    assert!(runner.start_listening().await);
    assert!(runner.state().voice_capture_active);

    assert!(feed.push("I would use", false));
    settle(&mut runner, |s| !s.interim_transcript.is_empty()).await;
    assert_eq!(runner.state().interim_transcript, "I would use");
    assert_eq!(runner.state().pending_transcript_buffer, "");

    assert!(feed.push("I would use flexbox", true));
    assert!(feed.push("for the header", true));
    settle(&mut runner, |s| s.pending_transcript_buffer.ends_with("header")).await;
    assert_eq!(
        runner.state().pending_transcript_buffer,
        "I would use flexbox for the header"
    );
    assert_eq!(runner.state().interim_transcript, "");

    assert!(runner.submit_voice_buffer().await);
    assert!(!runner.state().voice_capture_active);
    assert_eq!(runner.state().pending_transcript_buffer, "");

    let call = agent.next_call().await;
    assert_eq!(call.utterance, "I would use flexbox for the header");
    assert_eq!(
        contents(runner.state()),
        vec![(Role::Candidate, "I would use flexbox for the header".to_string())]
    );

    Ok(())
}

#[tokio::test]
async fn test_voice_buffer_rejected_while_reply_pending() -> Result<()> {
    let (gateway, mut agent) = ControlledGateway::new();
    let (recognizer, feed) = PushRecognizer::new();
    let mut runner = SessionRunner::new(
        gateway,
        Box::new(recognizer),
        Box::new(UnavailableSynthesizer),
        options(false),
    );
    runner.start(ada())?;

    assert!(runner.submit_text("typed answer"));
    let _call = agent.next_call().await;

    assert!(runner.start_listening().await);
    assert!(feed.push("spoken answer", true));
    settle(&mut runner, |s| !s.pending_transcript_buffer.is_empty()).await;

    let before = runner.state().clone();
    assert!(!runner.submit_voice_buffer().await);
    assert_eq!(runner.state(), &before);
    assert!(runner.state().voice_capture_active);

    Ok(())
}

#[tokio::test]
async fn test_interim_only_speech_is_not_submitted() -> Result<()> {
    let (gateway, mut agent) = ControlledGateway::new();
    let (recognizer, feed) = PushRecognizer::new();
    let mut runner = SessionRunner::new(
        gateway,
        Box::new(recognizer),
        Box::new(UnavailableSynthesizer),
        options(false),
    );
    runner.start(ada())?;

    runner.start_listening().await;
    assert!(feed.push("um", false));
    settle(&mut runner, |s| s.interim_transcript == "um").await;

    assert!(!runner.submit_voice_buffer().await);
    assert!(runner.state().turns.is_empty());
    assert!(!agent.has_pending());

    Ok(())
}

#[tokio::test]
async fn test_end_stops_voice_capture() -> Result<()> {
    let (gateway, _agent) = ControlledGateway::new();
    let (recognizer, feed) = PushRecognizer::new();
    let mut runner = SessionRunner::new(
        gateway,
        Box::new(recognizer),
        Box::new(UnavailableSynthesizer),
        options(false),
    );
    runner.start(ada())?;

    runner.start_listening().await;
    assert!(feed.is_listening());

    runner.end().await;

    assert!(!runner.state().voice_capture_active);
    assert!(!feed.is_listening());
    assert!(!feed.push("after the end", true));

    Ok(())
}

#[tokio::test]
async fn test_listening_without_recognizer_is_a_no_op() -> Result<()> {
    let (gateway, _agent) = ControlledGateway::new();
    let (mut runner, _spoken) = runner_with(gateway, false);
    runner.start(ada())?;

    assert!(!runner.start_listening().await);
    assert!(!runner.state().voice_capture_active);
    assert_eq!(runner.phase(), Phase::Running);

    Ok(())
}

#[tokio::test]
async fn test_session_handle_round_trip() -> Result<()> {
    let (gateway, mut agent) = ControlledGateway::new();
    let (runner, _spoken) = runner_with(gateway, false);
    let handle = SessionHandle::start(runner, ada())?;

    assert!(handle.submit_text("Hello").await);
    assert!(!handle.submit_text("again").await);

    agent.next_call().await.reply_text("Hi there");

    let mut updates = handle.subscribe();
    tokio::time::timeout(
        Duration::from_secs(5),
        updates.wait_for(|s| s.turns.len() == 2),
    )
    .await??;

    let bundle = handle.end().await.expect("bundle");
    assert_eq!(bundle.transcript.len(), 2);
    assert_eq!(bundle.transcript[1].content, "Hi there");

    assert_eq!(handle.end().await, Some(bundle.clone()));
    assert_eq!(handle.finished().await, Some(bundle.clone()));
    assert_eq!(handle.transcript(), Some(bundle));
    assert!(!handle.submit_text("after the end").await);

    Ok(())
}

#[tokio::test]
async fn test_voice_submit_includes_fragment_not_yet_folded() -> Result<()> {
    let (gateway, mut agent) = ControlledGateway::new();
    let (recognizer, feed) = PushRecognizer::new();
    let mut runner = SessionRunner::new(
        gateway,
        Box::new(recognizer),
        Box::new(UnavailableSynthesizer),
        options(false),
    );
    runner.start(ada())?;
    runner.start_listening().await;

    assert!(feed.push("I would use grid", true));
    assert!(runner.submit_voice_buffer().await);

    assert_eq!(agent.next_call().await.utterance, "I would use grid");
    assert_eq!(runner.state().turns[0].content, "I would use grid");

    Ok(())
}

#[tokio::test]
async fn test_handle_voice_submit_right_after_fragment() -> Result<()> {
    for _ in 0..50 {
        let (gateway, mut agent) = ControlledGateway::new();
        let (recognizer, feed) = PushRecognizer::new();
        let runner = SessionRunner::new(
            gateway,
            Box::new(recognizer),
            Box::new(UnavailableSynthesizer),
            options(false),
        );
        let handle = SessionHandle::start(runner, ada())?;

        assert!(handle.start_listening().await);
        assert!(feed.push("I would use grid", true));
        assert!(handle.submit_voice_buffer().await);
        assert_eq!(agent.next_call().await.utterance, "I would use grid");

        handle.end().await;
    }

    Ok(())
}

#[tokio::test]
async fn test_handle_stop_keeps_fragment_pushed_just_before() -> Result<()> {
    for _ in 0..50 {
        let (gateway, _agent) = ControlledGateway::new();
        let (recognizer, feed) = PushRecognizer::new();
        let runner = SessionRunner::new(
            gateway,
            Box::new(recognizer),
            Box::new(UnavailableSynthesizer),
            options(false),
        );
        let handle = SessionHandle::start(runner, ada())?;

        assert!(handle.start_listening().await);
        assert!(feed.push("first thought", true));
        assert!(feed.push("second thought", true));
        handle.stop_listening().await;

        let state = handle.state();
        assert!(!state.voice_capture_active);
        assert_eq!(state.pending_transcript_buffer, "first thought second thought");

        handle.end().await;
    }

    Ok(())
}
