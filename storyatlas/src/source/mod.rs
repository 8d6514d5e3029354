//! Segment data source seam.
//!
//! The engine consumes authored records through [`SegmentSource`], an
//! external network collaborator that may be slow, partially failing, or
//! stale. The playback controller treats every fetch failure as an empty
//! category and keeps playing; nothing here is fatal.
//!
//! Dyn-compatible via boxed futures so the daemon can hold the source as a
//! trait object across await points.

use std::future::Future;
use std::pin::Pin;

use parking_lot::RwLock;
use thiserror::Error;

use crate::model::{RouteAnimation, Segment, StoryMapDocument, Transition};

/// Boxed future returned by source operations.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Errors from the segment data source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Unknown map '{0}'")]
    UnknownMap(String),

    #[error("Story map data unavailable: {0}")]
    Unavailable(String),
}

/// External provider of story-map records for a given map id.
pub trait SegmentSource: Send + Sync {
    /// Ordered segments of the map.
    fn segments(&self, map_id: &str) -> SourceFuture<'_, Vec<Segment>>;

    /// Authored transitions of the map.
    fn transitions(&self, map_id: &str) -> SourceFuture<'_, Vec<Transition>>;

    /// Route animations of one segment, in record order.
    fn route_animations(&self, map_id: &str, segment_id: &str)
        -> SourceFuture<'_, Vec<RouteAnimation>>;
}

/// In-memory source backed by a validated document.
///
/// [`update`](StaticSegmentSource::update) swaps the document mid-session,
/// modeling authoring edits arriving while playback runs.
pub struct StaticSegmentSource {
    document: RwLock<StoryMapDocument>,
}

impl StaticSegmentSource {
    pub fn new(document: StoryMapDocument) -> Self {
        Self {
            document: RwLock::new(document),
        }
    }

    /// Replace the backing document.
    pub fn update(&self, document: StoryMapDocument) {
        *self.document.write() = document;
    }

    /// Current document snapshot.
    pub fn snapshot(&self) -> StoryMapDocument {
        self.document.read().clone()
    }

    fn check_map(&self, map_id: &str) -> Result<(), SourceError> {
        if self.document.read().map_id == map_id {
            Ok(())
        } else {
            Err(SourceError::UnknownMap(map_id.to_string()))
        }
    }
}

impl SegmentSource for StaticSegmentSource {
    fn segments(&self, map_id: &str) -> SourceFuture<'_, Vec<Segment>> {
        let result = self
            .check_map(map_id)
            .map(|_| self.document.read().segments.clone());
        Box::pin(async move { result })
    }

    fn transitions(&self, map_id: &str) -> SourceFuture<'_, Vec<Transition>> {
        let result = self
            .check_map(map_id)
            .map(|_| self.document.read().transitions.clone());
        Box::pin(async move { result })
    }

    fn route_animations(
        &self,
        map_id: &str,
        segment_id: &str,
    ) -> SourceFuture<'_, Vec<RouteAnimation>> {
        let result = self
            .check_map(map_id)
            .map(|_| self.document.read().routes_for(segment_id));
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> StoryMapDocument {
        StoryMapDocument::from_json(
            r#"{
                "map_id": "demo",
                "segments": [ { "id": "s1", "name": "Intro" } ]
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_static_source_serves_document() {
        let source = StaticSegmentSource::new(document());
        let segments = source.segments("demo").await.unwrap();
        assert_eq!(segments.len(), 1);
        assert!(source.route_animations("demo", "s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_map_is_an_error() {
        let source = StaticSegmentSource::new(document());
        assert!(matches!(
            source.segments("other").await,
            Err(SourceError::UnknownMap(_))
        ));
    }

    #[tokio::test]
    async fn test_update_swaps_document() {
        let source = StaticSegmentSource::new(document());
        let mut updated = document();
        updated.segments[0].name = "Renamed".to_string();
        source.update(updated);
        let segments = source.segments("demo").await.unwrap();
        assert_eq!(segments[0].name, "Renamed");
    }
}
