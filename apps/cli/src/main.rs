use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use console::{Key, Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use reelmark_core::{
    ApiClient, EditorState, MediaEvent, PlaybackController, PlayerCommand, ProcessingStep,
    TranscriptBackend, TranscriptStore, ViewState, format_time, format_transcript_outline,
};
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;

use crate::backend::FileBackend;
use crate::sim::ClockMedia;

mod backend;
mod sim;

#[derive(Parser)]
#[command(name = "reelmark")]
#[command(
    about = "Upload a video, edit transcript highlights, and play them back with a synchronized transcript"
)]
struct Cli {
    /// Video file to upload
    video: PathBuf,

    /// Backend origin serving /api/upload and /api/transcript
    #[arg(long, default_value = "http://localhost:3000")]
    api_base: String,

    /// Skip the backend and read the transcript from a .json sidecar next
    /// to the video file
    #[arg(long)]
    local: bool,
}

fn create_spinner(msg: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn step_label(step: ProcessingStep) -> &'static str {
    match step {
        ProcessingStep::Idle => "",
        ProcessingStep::Upload => "Uploading video...",
        ProcessingStep::Transcript => "Processing with AI...",
        ProcessingStep::Finalizing => "Preparing transcript...",
    }
}

fn status_line(state: &EditorState) -> String {
    let glyph = if state.is_playing { "▶" } else { "⏸" };
    let duration = state
        .transcript
        .as_ref()
        .map(|transcript| transcript.duration)
        .unwrap_or(0.0);
    let clock = format!(
        "[{} / {}]",
        format_time(state.current_time),
        format_time(duration)
    );

    let sentence = state.active_sentence_id.as_deref().and_then(|id| {
        state.transcript.as_ref().and_then(|transcript| {
            transcript
                .sections
                .iter()
                .flat_map(|section| &section.sentences)
                .find(|sentence| sentence.id == id)
        })
    });

    match sentence {
        Some(sentence) if sentence.is_highlight => {
            format!("{glyph} {clock} {}", style(&sentence.text).yellow().bold())
        }
        Some(sentence) => format!("{glyph} {clock} {}", sentence.text),
        None => format!("{glyph} {clock}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    println!(
        "\n{}  {}\n",
        style("reelmark").cyan().bold(),
        style("Highlight Editor").dim()
    );

    let store = TranscriptStore::new();
    let backend: Box<dyn TranscriptBackend> = if cli.local {
        Box::new(FileBackend)
    } else {
        Box::new(ApiClient::new(&cli.api_base))
    };

    let spinner = create_spinner(step_label(ProcessingStep::Upload));
    let mut progress_rx = store.subscribe();
    {
        let store = store.clone();
        let video = cli.video.clone();
        tokio::spawn(async move { store.load_transcript(backend.as_ref(), &video).await });
    }

    let state = loop {
        progress_rx
            .changed()
            .await
            .map_err(|_| anyhow::anyhow!("store closed during load"))?;
        let state = progress_rx.borrow_and_update().clone();
        match state.view_state {
            ViewState::Processing => spinner.set_message(step_label(state.processing_step)),
            ViewState::Editor => {
                spinner.finish_with_message(format!(
                    "{} Transcript ready",
                    style("✓").green().bold()
                ));
                break state;
            }
            ViewState::Upload => {
                spinner.finish_and_clear();
                anyhow::bail!("transcript load failed, see log output");
            }
        }
    };

    let transcript = state
        .transcript
        .as_ref()
        .context("editor state is missing its transcript")?;

    println!("\n{}", style(&transcript.title).bold());
    println!(
        "{}",
        style(format!(
            "{} sections · {} highlights",
            transcript.sections.len(),
            state.highlight_segments.len()
        ))
        .dim()
    );
    println!("{}", style("─".repeat(60)).dim());
    print!("{}", format_transcript_outline(&transcript.sections));
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}",
        style("space play/pause · n/p next/previous highlight · h toggle highlight · q quit").dim()
    );

    let (event_tx, event_rx) = mpsc::channel::<MediaEvent>(64);
    let (command_tx, command_rx) = mpsc::channel::<PlayerCommand>(16);
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

    let (clock, _ticker) = ClockMedia::spawn(transcript.duration, event_tx.clone());
    let mut controller = PlaybackController::new(store.clone());
    controller.bind(clock);
    let controller_task = tokio::spawn(controller.run(event_rx, command_rx, shutdown_rx));

    let (key_tx, mut key_rx) = mpsc::channel::<Key>(8);
    std::thread::spawn(move || {
        let term = Term::stdout();
        loop {
            match term.read_key() {
                Ok(key) => {
                    if key_tx.blocking_send(key).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let term = Term::stdout();
    let mut ui_rx = store.subscribe();
    term.write_str(&status_line(&store.snapshot()))?;
    loop {
        tokio::select! {
            changed = ui_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = ui_rx.borrow_and_update().clone();
                term.clear_line()?;
                term.write_str(&status_line(&state))?;
            }
            key = key_rx.recv() => {
                let Some(key) = key else { break };
                match key {
                    Key::Char(' ') => {
                        let _ = command_tx.send(PlayerCommand::TogglePlayPause).await;
                    }
                    Key::Char('n') => {
                        let _ = store.seek_to_next_highlight();
                    }
                    Key::Char('p') => {
                        let _ = store.seek_to_previous_highlight();
                    }
                    Key::Char('h') => {
                        if let Some(id) = store.snapshot().active_sentence_id {
                            store.toggle_highlight(&id);
                        }
                    }
                    Key::Char('q') | Key::Escape => break,
                    _ => {}
                }
            }
        }
    }

    let _ = shutdown_tx.send(());
    let _ = controller_task.await;
    store.reset();
    term.clear_line()?;
    println!("\n{}", style("Bye.").dim());
    std::process::exit(0);
}
