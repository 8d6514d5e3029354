//! Integration tests for controller-to-viewer mirroring.
//!
//! A controller and a viewer run as independent engines over separate map
//! surfaces, connected only by the in-process sync bus, the same shape as
//! two browser tabs sharing a named channel.
//!
//! Run with: `cargo test --test sync_mirroring`

use std::sync::Arc;
use std::time::Duration;

use storyatlas::config::EngineConfig;
use storyatlas::model::StoryMapDocument;
use storyatlas::playback::{PlaybackDaemon, PlaybackError, PlaybackHandle, PlaybackRole};
use storyatlas::render::NoLayers;
use storyatlas::source::StaticSegmentSource;
use storyatlas::surface::RecordingSurface;
use storyatlas::sync::{channel_name, LocalSyncBus, SyncChannel, SyncMessage, ViewerSession};

// ============================================================================
// Helper Functions
// ============================================================================

const MAP_ID: &str = "city-tour";

fn document() -> StoryMapDocument {
    StoryMapDocument::from_json(
        r#"{
            "map_id": "city-tour",
            "segments": [
                {
                    "id": "s1", "name": "Old Town", "duration_ms": 2000,
                    "locations": [
                        { "id": "l1", "geometry": { "lat": 53.5503, "lng": 9.9920 } }
                    ]
                },
                { "id": "s2", "name": "Harbor", "duration_ms": 3000 },
                { "id": "s3", "name": "Riverside", "duration_ms": 1000 }
            ]
        }"#,
    )
    .unwrap()
}

fn spawn_role(
    role: PlaybackRole,
    bus: &Arc<LocalSyncBus>,
) -> (PlaybackHandle, Arc<RecordingSurface>) {
    let surface = Arc::new(RecordingSurface::new());
    let sync: Arc<dyn SyncChannel> = bus.clone();
    let (handle, _join) = PlaybackDaemon::spawn(
        MAP_ID,
        role,
        EngineConfig::default(),
        Arc::new(StaticSegmentSource::new(document())),
        surface.clone(),
        Arc::new(NoLayers),
        Some(sync),
    );
    (handle, surface)
}

/// Controller + mirrored viewer joined by one bus.
fn spawn_pair(
    bus: &Arc<LocalSyncBus>,
) -> (PlaybackHandle, PlaybackHandle, ViewerSession, Arc<RecordingSurface>) {
    let (controller, _) = spawn_role(PlaybackRole::Controller, bus);
    let (viewer, viewer_surface) = spawn_role(PlaybackRole::Viewer, bus);
    let session = ViewerSession::attach(viewer.clone(), bus.clone(), MAP_ID);
    (controller, viewer, session, viewer_surface)
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

// ============================================================================
// Round trips
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_segment_change_round_trip() {
    let bus = Arc::new(LocalSyncBus::new());
    let (controller, viewer, _session, viewer_surface) = spawn_pair(&bus);

    controller.start(None).await.unwrap();
    settle().await;
    assert_eq!(viewer.status().active_index(), Some(0));
    assert!(
        viewer_surface.live_count() > 0,
        "the viewer renders the mirrored segment on its own surface"
    );

    controller.go_to(2).await.unwrap();
    settle().await;
    assert_eq!(viewer.status().active_index(), Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_play_state_round_trip() {
    let bus = Arc::new(LocalSyncBus::new());
    let (controller, viewer, _session, _surface) = spawn_pair(&bus);

    controller.start(None).await.unwrap();
    settle().await;
    assert!(viewer.status().is_playing());

    controller.set_playing(false).await.unwrap();
    settle().await;
    assert!(!viewer.status().is_playing());
    assert_eq!(viewer.status().active_index(), Some(0));

    controller.set_playing(true).await.unwrap();
    settle().await;
    assert!(viewer.status().is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_viewer_follows_automatic_advance() {
    let bus = Arc::new(LocalSyncBus::new());
    let (controller, viewer, _session, _surface) = spawn_pair(&bus);

    controller.start(None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2200)).await;
    assert_eq!(controller.status().active_index(), Some(1));
    assert_eq!(viewer.status().active_index(), Some(1));
}

// ============================================================================
// Single-writer semantics
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_viewer_rejects_local_controls() {
    let bus = Arc::new(LocalSyncBus::new());
    let (_controller, viewer, _session, _surface) = spawn_pair(&bus);

    assert!(matches!(
        viewer.start(None).await,
        Err(PlaybackError::ViewerControlled)
    ));
    assert!(matches!(
        viewer.go_to(1).await,
        Err(PlaybackError::ViewerControlled)
    ));
    assert!(matches!(
        viewer.stop().await,
        Err(PlaybackError::ViewerControlled)
    ));
    assert!(matches!(
        viewer.set_playing(false).await,
        Err(PlaybackError::ViewerControlled)
    ));
    assert!(matches!(
        viewer.play_routes_only("s1").await,
        Err(PlaybackError::ViewerControlled)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_viewer_never_schedules_its_own_advance() {
    let bus = Arc::new(LocalSyncBus::new());
    let (controller, viewer, _session, _surface) = spawn_pair(&bus);

    // Seek outside running playback: the controller parks on segment 0 and
    // publishes the change; the viewer mirrors it.
    controller.go_to(0).await.unwrap();
    settle().await;
    assert_eq!(viewer.status().active_index(), Some(0));

    // No timer exists on either side.
    tokio::time::sleep(Duration::from_millis(60_000)).await;
    assert_eq!(controller.status().active_index(), Some(0));
    assert_eq!(viewer.status().active_index(), Some(0));
}

// ============================================================================
// Delivery semantics
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_no_replay_for_late_subscribers() {
    let bus = Arc::new(LocalSyncBus::new());
    let (controller, _) = spawn_role(PlaybackRole::Controller, &bus);

    controller.start(None).await.unwrap();
    settle().await;

    // The viewer attaches after the segment-change was published.
    let (viewer, _surface) = spawn_role(PlaybackRole::Viewer, &bus);
    let _session = ViewerSession::attach(viewer.clone(), bus.clone(), MAP_ID);
    settle().await;
    assert_eq!(
        viewer.status().active_index(),
        None,
        "missed messages are never replayed"
    );

    // The next published change is applied.
    controller.go_to(1).await.unwrap();
    settle().await;
    assert_eq!(viewer.status().active_index(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_last_arrival_wins_for_conflicting_messages() {
    let bus = Arc::new(LocalSyncBus::new());
    let (viewer, _surface) = spawn_role(PlaybackRole::Viewer, &bus);
    let _session = ViewerSession::attach(viewer.clone(), bus.clone(), MAP_ID);
    settle().await;

    // Hand-publish a conflicting sequence, as an unordered transport might
    // deliver it: playing=false arrives after the segment change.
    let name = channel_name(MAP_ID);
    let segment = document().segments[1].clone();
    bus.publish(&name, &SyncMessage::play_state(true)).unwrap();
    bus.publish(&name, &SyncMessage::segment_change(1, &segment))
        .unwrap();
    bus.publish(&name, &SyncMessage::play_state(false)).unwrap();
    settle().await;

    let status = viewer.status();
    assert_eq!(status.active_index(), Some(1));
    assert!(!status.is_playing(), "the last-delivered play-state wins");
}

#[tokio::test(start_paused = true)]
async fn test_segment_payload_refreshes_stale_viewer_copy() {
    let bus = Arc::new(LocalSyncBus::new());
    let (viewer, viewer_surface) = spawn_role(PlaybackRole::Viewer, &bus);
    let _session = ViewerSession::attach(viewer.clone(), bus.clone(), MAP_ID);
    settle().await;

    // The controller's copy of s2 has an extra location the viewer's local
    // document lacks; the embedded payload must win.
    let mut segment = document().segments[1].clone();
    segment.locations.push(
        serde_json::from_str(r#"{ "id": "new", "geometry": { "lat": 53.5, "lng": 9.9 } }"#)
            .unwrap(),
    );
    bus.publish(&channel_name(MAP_ID), &SyncMessage::segment_change(1, &segment))
        .unwrap();
    settle().await;

    assert_eq!(viewer.status().active_index(), Some(1));
    assert_eq!(
        viewer_surface.live_count(),
        1,
        "the payload's location renders even though the local copy lacks it"
    );
}

// ============================================================================
// Degradation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_controller_without_channel_plays_standalone() {
    let surface = Arc::new(RecordingSurface::new());
    let (controller, _join) = PlaybackDaemon::spawn(
        MAP_ID,
        PlaybackRole::Controller,
        EngineConfig::default(),
        Arc::new(StaticSegmentSource::new(document())),
        surface.clone(),
        Arc::new(NoLayers),
        None,
    );
    controller.start(None).await.unwrap();
    settle().await;
    assert_eq!(controller.status().active_index(), Some(0));
    assert!(surface.live_count() > 0);
}
