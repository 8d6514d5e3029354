//! StoryAtlas - story-map playback and synchronization engine
//!
//! Turns an authored, ordered sequence of narrative segments (map zones,
//! point annotations, data layers, camera poses, and animated routes) into
//! a timed, visually smooth guided tour, optionally mirrored live from a
//! controller to passive viewers over an unreliable, unordered message
//! channel.
//!
//! # Components
//!
//! - [`playback`]: the state machine driving segment activation, advance
//!   timers, cancellation, and sync publishing
//! - [`render`]: segment geometry to map drawables, with per-item failure
//!   tolerance
//! - [`camera`]: viewport motion strategies, including the two-phase fly
//! - [`fade`]: cross-fades between drawable sets, attach-before-detach
//! - [`route`]: ordered polyline draw-in animation
//! - [`sync`]: controller-to-viewer state mirroring
//! - [`surface`]: the seam to the external map widget
//! - [`source`]: the seam to the external segment data provider
//!
//! Everything here degrades rather than fails: bad geometry is skipped,
//! missing data becomes an empty category, an unavailable sync transport
//! means standalone playback.

pub mod camera;
pub mod config;
pub mod fade;
pub mod geo;
pub mod log;
pub mod model;
pub mod playback;
pub mod render;
pub mod route;
pub mod source;
pub mod surface;
pub mod sync;
