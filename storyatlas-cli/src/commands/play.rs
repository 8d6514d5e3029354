//! Headless playback command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use storyatlas::config::EngineConfig;
use storyatlas::playback::{PlaybackRole, PlaybackState};
use storyatlas::sync::{LocalSyncBus, ViewerSession};
use tracing::info;

use super::common::{load_document, spawn_engine};
use crate::error::CliError;

/// Arguments for `storyatlas play`.
#[derive(Debug, Args)]
pub struct PlayArgs {
    /// Story-map document (JSON)
    pub document: PathBuf,

    /// Start from this segment index instead of 0
    #[arg(long)]
    pub from: Option<usize>,

    /// Mirror playback to an in-process viewer over the sync bus
    #[arg(long)]
    pub mirror: bool,
}

/// Run headless playback until the tour completes or Ctrl-C.
pub async fn run(args: PlayArgs, config: EngineConfig) -> Result<(), CliError> {
    let document = load_document(&args.document)?;
    let map_id = document.map_id.clone();
    let segment_names: Vec<String> = document.segments.iter().map(|s| s.name.clone()).collect();

    let bus = Arc::new(LocalSyncBus::new());
    let role = if args.mirror {
        PlaybackRole::Controller
    } else {
        PlaybackRole::Standalone
    };
    let engine = spawn_engine(document.clone(), role, config.clone(), Some(bus.clone()));

    // The in-process viewer mirrors onto its own surface, exactly as a
    // second browser tab would.
    let _mirror = if args.mirror {
        let viewer = spawn_engine(document, PlaybackRole::Viewer, config, Some(bus.clone()));
        let session = ViewerSession::attach(viewer.playback.clone(), bus, &map_id);
        let mut viewer_status = viewer.playback.watch_status();
        tokio::spawn(async move {
            while viewer_status.changed().await.is_ok() {
                let status = *viewer_status.borrow();
                if let Some(index) = status.active_index() {
                    println!(
                        "{}",
                        style(format!("  viewer: mirrored segment {}", index)).dim()
                    );
                }
            }
        });
        Some((viewer.surface, session))
    } else {
        None
    };

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.enable_steady_tick(Duration::from_millis(120));

    info!(map = %map_id, "Starting playback");
    engine.playback.start(args.from).await?;

    let mut status_rx = engine.playback.watch_status();
    let mut waiting_prompted = false;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                progress.finish_with_message("interrupted");
                engine.playback.stop().await.ok();
                println!("{}", style("Playback stopped.").yellow());
                break;
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = *status_rx.borrow();
                match status.state {
                    PlaybackState::Playing { index } => {
                        waiting_prompted = false;
                        let name = segment_names.get(index).map(String::as_str).unwrap_or("?");
                        progress.set_message(format!(
                            "segment {}/{}: {}",
                            index + 1,
                            status.segment_count,
                            name
                        ));
                    }
                    PlaybackState::WaitingForUserAction { index } => {
                        if !waiting_prompted {
                            waiting_prompted = true;
                            progress.set_message(format!(
                                "segment {}/{}: press Enter to continue",
                                index + 1,
                                status.segment_count
                            ));
                            let playback = engine.playback.clone();
                            tokio::spawn(async move {
                                let _ = tokio::task::spawn_blocking(|| {
                                    let mut line = String::new();
                                    std::io::stdin().read_line(&mut line)
                                })
                                .await;
                                let _ = playback.continue_after_user_action().await;
                            });
                        }
                    }
                    PlaybackState::Stopped => {
                        progress.finish_with_message("done");
                        println!("{}", style("Tour complete.").green());
                        break;
                    }
                    PlaybackState::Paused { .. } => {}
                }
            }
        }
    }
    Ok(())
}
