//! Shared helpers for CLI commands.

use std::path::Path;
use std::sync::Arc;

use storyatlas::config::EngineConfig;
use storyatlas::model::StoryMapDocument;
use storyatlas::playback::{PlaybackDaemon, PlaybackHandle, PlaybackRole};
use storyatlas::render::NoLayers;
use storyatlas::source::StaticSegmentSource;
use storyatlas::surface::RecordingSurface;
use storyatlas::sync::{LocalSyncBus, SyncChannel};

use crate::error::CliError;

/// Load and validate a story-map document from disk.
pub fn load_document(path: &Path) -> Result<StoryMapDocument, CliError> {
    let json = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    StoryMapDocument::from_json(&json).map_err(|source| CliError::Document {
        path: path.to_path_buf(),
        source,
    })
}

/// A headless engine instance: playback handle plus its surface and source.
pub struct Engine {
    pub playback: PlaybackHandle,
    pub surface: Arc<RecordingSurface>,
    pub source: Arc<StaticSegmentSource>,
}

/// Spawn an engine over a fresh recording surface.
pub fn spawn_engine(
    document: StoryMapDocument,
    role: PlaybackRole,
    config: EngineConfig,
    bus: Option<Arc<LocalSyncBus>>,
) -> Engine {
    let surface = Arc::new(RecordingSurface::new());
    let source = Arc::new(StaticSegmentSource::new(document.clone()));
    let sync = bus.map(|b| b as Arc<dyn SyncChannel>);
    let (playback, _join) = PlaybackDaemon::spawn(
        document.map_id,
        role,
        config,
        source.clone(),
        surface.clone(),
        Arc::new(NoLayers),
        sync,
    );
    Engine {
        playback,
        surface,
        source,
    }
}
