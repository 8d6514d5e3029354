//! Document inspection command.

use std::path::PathBuf;

use clap::Args;
use console::style;

use super::common::load_document;
use crate::error::CliError;

/// Arguments for `storyatlas inspect`.
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Story-map document (JSON)
    pub document: PathBuf,
}

/// Validate a document and print a summary.
pub fn run(args: InspectArgs) -> Result<(), CliError> {
    let document = load_document(&args.document)?;

    println!(
        "{} {}",
        style("Story map:").bold(),
        document.name.as_deref().unwrap_or(&document.map_id)
    );
    println!("  map id:   {}", document.map_id);
    println!("  segments: {}", document.segments.len());
    println!();

    for (index, segment) in document.segments.iter().enumerate() {
        let routes = document.routes_for(&segment.id).len();
        println!(
            "  {} {} {}",
            style(format!("[{}]", index)).cyan(),
            style(&segment.name).bold(),
            style(format!("({})", segment.id)).dim()
        );
        println!(
            "      {} ms · {} zone(s) · {} location(s) · {} layer(s) · {} route(s) · camera {}",
            segment.duration_ms(),
            segment.zones.len(),
            segment.locations.len(),
            segment.layers.len(),
            routes,
            match &segment.camera {
                Some(pose) => format!("{}", pose),
                None => "auto-fit".to_string(),
            }
        );
    }

    if !document.transitions.is_empty() {
        println!();
        println!("{}", style("Transitions:").bold());
        for transition in &document.transitions {
            println!(
                "  {} → {} · {:?} {} ms · camera {:?} {} ms{}",
                transition.from_segment_id,
                transition.to_segment_id,
                transition.style,
                transition.duration_ms,
                transition.camera,
                transition.camera_duration_ms,
                if transition.require_user_action {
                    " · requires user action"
                } else {
                    ""
                }
            );
        }
    }

    println!();
    println!("{}", style("Document is valid.").green());
    Ok(())
}
