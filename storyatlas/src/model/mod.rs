//! Validated story-map data model.
//!
//! This module defines the records the playback engine consumes: segments,
//! zones, locations, transitions, and route animations, bundled into a
//! [`StoryMapDocument`].
//!
//! # Design Philosophy
//!
//! **Validate at the boundary, trust everywhere else.**
//!
//! Documents arrive as JSON from an external authoring system. All defaults
//! are applied and all malformed payloads rejected in
//! [`StoryMapDocument::from_json`]; rendering code never probes optional
//! fields defensively. A segment is immutable for the duration of one render
//! cycle; a *new* version of the same segment id is detected through its
//! [`ContentHash`].

mod document;
mod geometry;
mod segment;

pub use document::{ModelError, StoryMapDocument, Transition, TransitionStyle};
pub use geometry::ZoneGeometry;
pub use segment::{
    ContentHash, IconStyle, LayerRef, Location, RouteAnimation, RouteStyle, Segment, Zone,
    ZoneStyle, DEFAULT_SEGMENT_DURATION_MS,
};
