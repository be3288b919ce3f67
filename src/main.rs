//! Application entry point: a terminal-driven coaching session.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk, writing the defaults on first run.
//! 3. Create the [`tokio`] runtime.
//! 4. Build the advice client from config.
//! 5. Spawn the session controller and an update printer.
//! 6. Read commands from stdin until `quit` or end of input.
//!
//! # Commands
//!
//! | Input          | Effect                                     |
//! |----------------|--------------------------------------------|
//! | `start`        | begin a listening round                    |
//! | `stop`         | end the round and move to the next line    |
//! | `toggle`       | start or stop                              |
//! | `say <text>`   | feed a final speech fragment               |
//! | `hear <text>`  | feed an interim speech fragment            |
//! | `feel <label>` | feed an emotion label or classifier result |
//! | `quit`         | tear the session down and exit             |

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use voice_coach::{
    advice::{EntryKind, HttpAdviceClient},
    capture::NoSpeechCapture,
    config::{AppConfig, AppPaths},
    emotion::parse_detected_emotion,
    session::{SessionCommand, SessionController, SessionHandle, SessionUpdate},
    transcript::{Fragment, RecognitionEvent},
    voice::SilentPlayback,
};

// ---------------------------------------------------------------------------
// Input parsing
// ---------------------------------------------------------------------------

/// Map one line of terminal input to a session command.
fn parse_command(line: &str, config: &AppConfig) -> Option<SessionCommand> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match word {
        "start" => Some(SessionCommand::Start),
        "stop" => Some(SessionCommand::Stop),
        "toggle" => Some(SessionCommand::Toggle),
        "quit" | "exit" => Some(SessionCommand::Shutdown),
        "say" if !rest.is_empty() => Some(SessionCommand::Recognition(RecognitionEvent::new(
            vec![Fragment::final_text(rest)],
        ))),
        "hear" if !rest.is_empty() => Some(SessionCommand::Recognition(RecognitionEvent::new(
            vec![Fragment::interim(rest)],
        ))),
        "feel" if !rest.is_empty() => {
            // Accept either a bare label or a raw classifier result.
            let label = parse_detected_emotion(rest, &config.emotion.result_prefix)
                .unwrap_or_else(|| rest.to_string());
            Some(SessionCommand::Emotion(label))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Update printer
// ---------------------------------------------------------------------------

async fn print_updates(mut updates: mpsc::UnboundedReceiver<SessionUpdate>) {
    while let Some(update) = updates.recv().await {
        match update {
            SessionUpdate::Phase(phase) => println!("[{}]", phase.label()),
            SessionUpdate::Prompt(line) => println!("next prompt: {line}"),
            SessionUpdate::Transcript { finalized, interim } => {
                println!("transcript: {finalized}{interim}")
            }
            SessionUpdate::Emotion(label) => println!("emotion: {label}"),
            SessionUpdate::Advice(entry) => match entry.kind {
                EntryKind::Advice => println!("advice: {}", entry.text),
                EntryKind::Error => println!("error: {}", entry.text),
            },
            SessionUpdate::Generating(true) => println!("(waiting for advice...)"),
            SessionUpdate::Generating(false) => {}
            SessionUpdate::ScriptComplete => println!("script complete"),
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voice coach starting up");

    // 2. Configuration
    let paths = AppPaths::new();
    let first_run = !paths.settings_file.exists();
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    if first_run {
        match config.save() {
            Ok(()) => log::info!("wrote default settings to {}", paths.settings_file.display()),
            Err(e) => log::warn!("Failed to write default settings: {e}"),
        }
    }

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(run(config))
}

async fn run(config: AppConfig) -> Result<()> {
    // 4. Advice client
    let client = Arc::new(HttpAdviceClient::from_config(&config.advisor));
    log::info!("advice endpoint: {}", client.url());

    // 5. Controller + update printer
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let controller = SessionController::new(
        config.clone(),
        client,
        Arc::new(SilentPlayback),
        Arc::new(NoSpeechCapture),
    )
    .with_updates(update_tx);

    println!("first prompt: {}", controller.current_prompt());

    let (handle, commands) = SessionHandle::channel(64);
    let session = tokio::spawn(controller.run(commands));
    let printer = tokio::spawn(print_updates(update_rx));

    // 6. Stdin loop
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let Some(command) = parse_command(&line, &config) else {
            if !line.trim().is_empty() {
                println!("commands: start | stop | toggle | say <text> | hear <text> | feel <label> | quit");
            }
            continue;
        };

        let quitting = command == SessionCommand::Shutdown;
        if handle.send(command).await.is_err() || quitting {
            break;
        }
    }

    drop(handle);
    session.await.context("session task failed")?;
    printer.await.context("update printer failed")?;
    log::info!("voice coach stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_control_words() {
        let cfg = AppConfig::default();
        assert_eq!(parse_command("start", &cfg), Some(SessionCommand::Start));
        assert_eq!(parse_command(" stop ", &cfg), Some(SessionCommand::Stop));
        assert_eq!(parse_command("toggle", &cfg), Some(SessionCommand::Toggle));
        assert_eq!(parse_command("quit", &cfg), Some(SessionCommand::Shutdown));
    }

    #[test]
    fn parses_speech() {
        let cfg = AppConfig::default();
        assert_eq!(
            parse_command("say I feel bad", &cfg),
            Some(SessionCommand::Recognition(RecognitionEvent::new(vec![
                Fragment::final_text("I feel bad")
            ])))
        );
        assert_eq!(
            parse_command("hear I fe", &cfg),
            Some(SessionCommand::Recognition(RecognitionEvent::new(vec![
                Fragment::interim("I fe")
            ])))
        );
    }

    #[test]
    fn parses_emotion_label_or_classifier_result() {
        let cfg = AppConfig::default();
        assert_eq!(
            parse_command("feel sad", &cfg),
            Some(SessionCommand::Emotion("sad".into()))
        );
        assert_eq!(
            parse_command("feel Detected emotion: angry", &cfg),
            Some(SessionCommand::Emotion("angry".into()))
        );
    }

    #[test]
    fn rejects_unknown_or_incomplete_input() {
        let cfg = AppConfig::default();
        assert_eq!(parse_command("say", &cfg), None);
        assert_eq!(parse_command("dance", &cfg), None);
        assert_eq!(parse_command("", &cfg), None);
    }
}
