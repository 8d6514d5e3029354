//! Route-only demonstration command.

use std::path::PathBuf;

use clap::Args;
use console::style;
use storyatlas::config::EngineConfig;
use storyatlas::playback::PlaybackRole;
use tracing::info;

use super::common::{load_document, spawn_engine};
use crate::error::CliError;

/// Arguments for `storyatlas routes`.
#[derive(Debug, Args)]
pub struct RoutesArgs {
    /// Story-map document (JSON)
    pub document: PathBuf,

    /// Segment whose routes to demonstrate
    #[arg(long)]
    pub segment: String,
}

/// Play a segment's route animations without camera or geometry work.
pub async fn run(args: RoutesArgs, config: EngineConfig) -> Result<(), CliError> {
    let document = load_document(&args.document)?;
    let route_count = document.routes_for(&args.segment).len();
    let engine = spawn_engine(document, PlaybackRole::Standalone, config, None);

    info!(segment = %args.segment, routes = route_count, "Routes-only demonstration");
    println!(
        "Demonstrating {} route(s) of segment '{}'",
        route_count, args.segment
    );

    engine.playback.play_routes_only(&args.segment).await?;

    // Wait for the demonstration to finish (or Ctrl-C). The flag is
    // checked before each wait in case the routes finished instantly.
    let mut status_rx = engine.playback.watch_status();
    while status_rx.borrow_and_update().routes_only_active {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                engine.playback.stop().await.ok();
                println!("{}", style("Demonstration stopped.").yellow());
                return Ok(());
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    println!("{}", style("Routes drawn.").green());
    Ok(())
}
