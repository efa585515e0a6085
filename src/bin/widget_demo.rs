//! Terminal stand-in for the browser page hosting the upload widget.
//!
//! Simulates the pick-then-upload gesture sequence for a file given on the
//! command line, feeding every gesture, progress tick and terminal outcome
//! through the same event loop a real front end would use, and rendering
//! the widget state after each transition.

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use dropzone::uploader::{SelectedFile, UploadClient};
use dropzone::widget::{StatusTone, WidgetEvent, WidgetState};

const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/upload";

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let path = args.next().context("usage: widget-demo <file> [endpoint]")?;
    let endpoint = args.next().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    let file = SelectedFile::from_path(&path)
        .await
        .with_context(|| format!("could not read {path}"))?;

    let client = UploadClient::new(endpoint);
    let (events, mut inbox) = mpsc::unbounded_channel();

    // the gesture sequence: choose the file, then press upload
    events.send(WidgetEvent::Picked(vec![file]))?;
    events.send(WidgetEvent::UploadClicked)?;

    let mut state = WidgetState::default();

    while let Some(event) = inbox.recv().await {
        let clicked = matches!(event, WidgetEvent::UploadClicked);
        let finished = matches!(event, WidgetEvent::Finished(_));

        state = state.apply(event);
        render(&state);

        if clicked && state.upload_in_progress() {
            if let Some(file) = state.selected_file.clone() {
                start_transfer(&client, file, &events);
            }
        }

        if finished {
            break;
        }
    }

    if state.status_tone() == Some(StatusTone::Error) {
        std::process::exit(1);
    }
    Ok(())
}

/// Kicks off the upload and forwards its progress feed and terminal
/// outcome back into the event loop. The upload never blocks the loop, so
/// the widget stays responsive while the transfer runs.
fn start_transfer(
    client: &UploadClient,
    file: SelectedFile,
    events: &mpsc::UnboundedSender<WidgetEvent>,
) {
    let task = client.start(file);
    let mut progress = task.progress();

    let feed = events.clone();
    tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let pct = *progress.borrow();
            if feed.send(WidgetEvent::Progress(pct)).is_err() {
                break;
            }
        }
    });

    let feed = events.clone();
    tokio::spawn(async move {
        let outcome = task.outcome().await;
        let _ = feed.send(WidgetEvent::Finished(outcome));
    });
}

fn render(state: &WidgetState) {
    match &state.selected_file {
        Some(file) => println!("[drop zone] selected: {} ({} bytes)", file.name, file.size()),
        None => println!("[drop zone] drag a file here, or click to choose one"),
    }

    if state.progress_bar_visible() {
        let filled = usize::from(state.upload_progress) / 5;
        println!("[{:<20}] {:>3}%", "#".repeat(filled), state.upload_progress);
    }

    if !state.upload_status.is_empty() {
        let tone = match state.status_tone() {
            Some(StatusTone::Error) => "!!",
            _ => "ok",
        };
        println!("[{tone}] {}", state.upload_status);
    }
    println!();
}
