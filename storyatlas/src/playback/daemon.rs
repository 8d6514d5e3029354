//! Playback controller daemon.
//!
//! A long-running actor that owns the playback state machine and processes
//! commands from a channel:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                        PlaybackDaemon                          │
//! │                                                                │
//! │  Command ──► ┌───────────────┐   hash unchanged                │
//! │              │  Hash diff    │──► idempotent no-op             │
//! │              └───────┬───────┘                                 │
//! │                      ▼                                         │
//! │              ┌───────────────┐                                 │
//! │              │   Renderer    │──► attach new set (opacity 0)   │
//! │              └───────┬───────┘                                 │
//! │                      ▼                                         │
//! │              ┌───────────────┐                                 │
//! │              │    Camera     │──► pose / auto-fit / fly        │
//! │              └───────┬───────┘                                 │
//! │                      ▼                                         │
//! │              ┌───────────────┐                                 │
//! │              │  Cross-fade   │──► detach old set after fade    │
//! │              └───────┬───────┘                                 │
//! │                      ▼                                         │
//! │              ┌───────────────┐                                 │
//! │              │ Route animator│──► draw-in from segment origin  │
//! │              └───────┬───────┘                                 │
//! │                      ▼                                         │
//! │               schedule advance, publish sync                   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cancellation: each segment activation owns an epoch (counter plus
//! `CancellationToken`). Stop and seek retire the epoch, which kills
//! in-flight fades, route ticks, and a pending camera descent; a stale
//! completion can never act on a no-longer-active segment. The advance
//! timer is a single deadline slot in the select loop, so a cancelled
//! timer simply ceases to exist.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::camera::CameraController;
use crate::config::EngineConfig;
use crate::fade::{FadeCurve, LayerTransitionManager};
use crate::geo::GeoBounds;
use crate::model::{ContentHash, Segment, StoryMapDocument, Transition, TransitionStyle};
use crate::render::{GeometryRenderer, LayerProvider, RenderedDrawable};
use crate::route::RouteAnimator;
use crate::source::SegmentSource;
use crate::surface::MapSurface;
use crate::sync::{channel_name, SyncChannel, SyncMessage};

use super::state::{Command, Envelope, PlaybackError, PlaybackRole, PlaybackState, PlaybackStatus};

/// Cloneable front end to a running playback daemon.
#[derive(Clone)]
pub struct PlaybackHandle {
    tx: mpsc::Sender<Envelope>,
    status: watch::Receiver<PlaybackStatus>,
}

impl PlaybackHandle {
    async fn send(&self, command: Command) -> Result<(), PlaybackError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                command,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| PlaybackError::Closed)?;
        reply_rx.await.map_err(|_| PlaybackError::Closed)?
    }

    /// Begin automatic playback at `from_index` (default 0).
    pub async fn start(&self, from_index: Option<usize>) -> Result<(), PlaybackError> {
        self.send(Command::Start { from_index }).await
    }

    /// Cancel pending work, clear the map, return to `Stopped` at index 0.
    pub async fn stop(&self) -> Result<(), PlaybackError> {
        self.send(Command::Stop).await
    }

    /// Manual seek. Auto-scheduling resumes only if playback was running.
    pub async fn go_to(&self, index: usize) -> Result<(), PlaybackError> {
        self.send(Command::GoTo { index }).await
    }

    /// Release a `WaitingForUserAction` gate and advance.
    pub async fn continue_after_user_action(&self) -> Result<(), PlaybackError> {
        self.send(Command::ContinueAfterUserAction).await
    }

    /// Pause or resume automatic advance.
    pub async fn set_playing(&self, playing: bool) -> Result<(), PlaybackError> {
        self.send(Command::SetPlaying { playing }).await
    }

    /// Play a segment's routes alone, without camera or geometry work.
    /// Automatic advance is suspended while the demonstration runs.
    pub async fn play_routes_only(&self, segment_id: &str) -> Result<(), PlaybackError> {
        self.send(Command::PlayRoutesOnly {
            segment_id: segment_id.to_string(),
        })
        .await
    }

    /// Replace the segment list mid-session. A changed content hash for the
    /// active segment triggers a quick-update re-render without resetting
    /// the route origin or disturbing the advance timer.
    pub async fn refresh(&self, document: StoryMapDocument) -> Result<(), PlaybackError> {
        self.send(Command::Refresh { document }).await
    }

    /// Apply a received `segment-change` (viewer role).
    pub async fn apply_remote_segment(
        &self,
        index: usize,
        segment: Option<Segment>,
    ) -> Result<(), PlaybackError> {
        self.send(Command::ApplyRemoteSegment { index, segment })
            .await
    }

    /// Apply a received `play-state` (viewer role).
    pub async fn apply_remote_play_state(&self, playing: bool) -> Result<(), PlaybackError> {
        self.send(Command::ApplyRemotePlayState { playing }).await
    }

    /// Latest status snapshot.
    pub fn status(&self) -> PlaybackStatus {
        *self.status.borrow()
    }

    /// Watch channel for status updates.
    pub fn watch_status(&self) -> watch::Receiver<PlaybackStatus> {
        self.status.clone()
    }
}

/// The playback controller state machine, run as a background task.
pub struct PlaybackDaemon {
    map_id: String,
    role: PlaybackRole,
    config: EngineConfig,
    source: Arc<dyn SegmentSource>,
    surface: Arc<dyn MapSurface>,
    renderer: GeometryRenderer,
    camera: CameraController,
    fades: Arc<LayerTransitionManager>,
    routes: Arc<RouteAnimator>,
    sync: Option<Arc<dyn SyncChannel>>,

    rx: mpsc::Receiver<Envelope>,
    self_tx: mpsc::WeakSender<Envelope>,
    status_tx: watch::Sender<PlaybackStatus>,

    segments: Vec<Segment>,
    transitions: Vec<Transition>,
    loaded: bool,
    state: PlaybackState,
    pending_transition: Option<Transition>,
    last_rendered: Option<(usize, ContentHash)>,
    live: Vec<RenderedDrawable>,
    epoch: u64,
    epoch_token: CancellationToken,
    fade_token: Option<CancellationToken>,
    route_token: Option<CancellationToken>,
    segment_origin: Instant,
    advance_deadline: Option<Instant>,
    routes_only: bool,
    resume_after_routes: bool,
    remote_playing: bool,
}

impl PlaybackDaemon {
    /// Build a daemon with its collaborators and spawn its run loop.
    ///
    /// Passing `sync: None` (or a channel whose publishes fail) degrades
    /// silently to standalone playback.
    pub fn spawn(
        map_id: impl Into<String>,
        role: PlaybackRole,
        config: EngineConfig,
        source: Arc<dyn SegmentSource>,
        surface: Arc<dyn MapSurface>,
        layers: Arc<dyn LayerProvider>,
        sync: Option<Arc<dyn SyncChannel>>,
    ) -> (PlaybackHandle, tokio::task::JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.playback.channel_capacity);
        let (status_tx, status_rx) = watch::channel(PlaybackStatus::default());

        let daemon = Self {
            map_id: map_id.into(),
            role,
            renderer: GeometryRenderer::new(surface.clone(), layers),
            camera: CameraController::new(surface.clone(), config.camera.clone()),
            fades: Arc::new(LayerTransitionManager::new(
                surface.clone(),
                config.fade.clone(),
            )),
            routes: Arc::new(RouteAnimator::new(surface.clone(), config.route.clone())),
            config,
            source,
            surface,
            sync,
            self_tx: tx.downgrade(),
            rx,
            status_tx,
            segments: Vec::new(),
            transitions: Vec::new(),
            loaded: false,
            state: PlaybackState::Stopped,
            pending_transition: None,
            last_rendered: None,
            live: Vec::new(),
            epoch: 0,
            epoch_token: CancellationToken::new(),
            fade_token: None,
            route_token: None,
            segment_origin: Instant::now(),
            advance_deadline: None,
            routes_only: false,
            resume_after_routes: false,
            remote_playing: true,
        };

        let handle = PlaybackHandle {
            tx,
            status: status_rx,
        };
        let join = tokio::spawn(daemon.run());
        (handle, join)
    }

    /// Process commands and advance timers until every handle is dropped.
    pub async fn run(mut self) {
        debug!(map = %self.map_id, role = ?self.role, "Playback daemon started");
        loop {
            let deadline = self.advance_deadline;
            tokio::select! {
                envelope = self.rx.recv() => {
                    match envelope {
                        Some(envelope) => self.handle(envelope).await,
                        None => break,
                    }
                }
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                    if deadline.is_some() =>
                {
                    self.on_advance_due().await;
                }
            }
        }
        // Shutdown: retire everything without broadcasting.
        self.epoch_token.cancel();
        self.camera.cancel();
        for drawable in self.live.drain(..) {
            self.surface.detach(drawable.handle);
        }
        debug!(map = %self.map_id, "Playback daemon stopped");
    }

    async fn handle(&mut self, envelope: Envelope) {
        let result = self.dispatch(envelope.command).await;
        if let Err(e) = &result {
            debug!(error = %e, "Command rejected");
        }
        if let Some(reply) = envelope.reply {
            let _ = reply.send(result);
        }
        self.publish_status();
    }

    async fn dispatch(&mut self, command: Command) -> Result<(), PlaybackError> {
        match command {
            Command::Start { from_index } => {
                self.guard_local()?;
                self.cmd_start(from_index).await
            }
            Command::Stop => {
                self.guard_local()?;
                self.stop_playback();
                Ok(())
            }
            Command::GoTo { index } => {
                self.guard_local()?;
                self.cmd_go_to(index).await
            }
            Command::ContinueAfterUserAction => {
                self.guard_local()?;
                self.cmd_continue().await
            }
            Command::SetPlaying { playing } => {
                self.guard_local()?;
                self.cmd_set_playing(playing).await
            }
            Command::PlayRoutesOnly { segment_id } => {
                self.guard_local()?;
                self.cmd_play_routes_only(segment_id).await
            }
            Command::Refresh { document } => self.cmd_refresh(document).await,
            Command::ApplyRemoteSegment { index, segment } => {
                self.cmd_apply_remote_segment(index, segment).await
            }
            Command::ApplyRemotePlayState { playing } => {
                self.cmd_apply_remote_play_state(playing);
                Ok(())
            }
            Command::RoutesOnlyFinished { epoch } => {
                self.cmd_routes_only_finished(epoch);
                Ok(())
            }
        }
    }

    /// Local mutating controls are rejected under remote control, keeping
    /// the shared viewport single-writer.
    fn guard_local(&self) -> Result<(), PlaybackError> {
        if self.role == PlaybackRole::Viewer {
            return Err(PlaybackError::ViewerControlled);
        }
        Ok(())
    }

    async fn cmd_start(&mut self, from_index: Option<usize>) -> Result<(), PlaybackError> {
        self.ensure_loaded().await;
        if self.segments.is_empty() {
            return Err(PlaybackError::NoSegments);
        }
        let index = from_index.unwrap_or(0);
        self.check_index(index)?;
        info!(index, "Playback start");
        // Start always re-renders and resets the elapsed-time origin, even
        // when the requested segment is already on screen.
        self.last_rendered = None;
        self.render_segment(index).await;
        self.after_render(index, true);
        self.broadcast(SyncMessage::play_state(true));
        Ok(())
    }

    async fn cmd_go_to(&mut self, index: usize) -> Result<(), PlaybackError> {
        self.ensure_loaded().await;
        self.check_index(index)?;
        let was_running = matches!(
            self.state,
            PlaybackState::Playing { .. } | PlaybackState::WaitingForUserAction { .. }
        );
        debug!(index, was_running, "Manual seek");
        self.advance_deadline = None;
        self.render_segment(index).await;
        self.after_render(index, was_running);
        Ok(())
    }

    async fn cmd_continue(&mut self) -> Result<(), PlaybackError> {
        let PlaybackState::WaitingForUserAction { index } = self.state else {
            return Err(PlaybackError::NotWaiting);
        };
        if let Some(transition) = self.pending_transition.take() {
            debug!(
                from = %transition.from_segment_id,
                to = %transition.to_segment_id,
                "User action released the gate"
            );
        }
        let next = index + 1;
        if next == self.segments.len() {
            info!("User action released the final segment; stopping");
            self.stop_playback();
        } else {
            self.render_segment(next).await;
            self.after_render(next, true);
        }
        Ok(())
    }

    async fn cmd_set_playing(&mut self, playing: bool) -> Result<(), PlaybackError> {
        match (playing, self.state) {
            (false, PlaybackState::Playing { index })
            | (false, PlaybackState::WaitingForUserAction { index }) => {
                self.advance_deadline = None;
                self.pending_transition = None;
                self.state = PlaybackState::Paused { index };
                self.broadcast(SyncMessage::play_state(false));
            }
            (true, PlaybackState::Paused { index }) => {
                // Resume reschedules the full segment duration; consumed
                // time is not tracked across a pause.
                self.after_render(index, true);
                self.broadcast(SyncMessage::play_state(true));
            }
            (true, PlaybackState::Stopped) => return self.cmd_start(None).await,
            _ => {}
        }
        Ok(())
    }

    async fn cmd_play_routes_only(&mut self, segment_id: String) -> Result<(), PlaybackError> {
        self.ensure_loaded().await;
        let Some(segment) = self.segments.iter().find(|s| s.id == segment_id).cloned() else {
            return Err(PlaybackError::UnknownSegment(segment_id));
        };
        info!(segment = %segment.id, "Routes-only demonstration");

        self.resume_after_routes = matches!(self.state, PlaybackState::Playing { .. });
        self.advance_deadline = None;
        self.routes_only = true;

        let records = match self
            .source
            .route_animations(&self.map_id, &segment.id)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(segment = %segment.id, error = %e, "Route fetch failed; nothing to demonstrate");
                Vec::new()
            }
        };
        if let Some(token) = self.route_token.take() {
            token.cancel();
        }
        let plan = self.routes.prepare(records, 1.0);
        self.live
            .extend(plan.routes.iter().map(|r| RenderedDrawable {
                handle: r.handle,
                base_opacity: r.animation.style.opacity,
            }));

        let token = self.epoch_token.child_token();
        self.route_token = Some(token.clone());
        let animator = self.routes.clone();
        let origin = Instant::now();
        let epoch = self.epoch;
        let notify = self.self_tx.clone();
        tokio::spawn(async move {
            animator.run(plan, origin, token).await;
            if let Some(tx) = notify.upgrade() {
                let _ = tx
                    .send(Envelope {
                        command: Command::RoutesOnlyFinished { epoch },
                        reply: None,
                    })
                    .await;
            }
        });
        Ok(())
    }

    fn cmd_routes_only_finished(&mut self, epoch: u64) {
        if epoch != self.epoch {
            debug!("Stale routes-only completion ignored");
            return;
        }
        self.routes_only = false;
        if self.resume_after_routes {
            self.resume_after_routes = false;
            if let PlaybackState::Playing { index } = self.state {
                let duration = Duration::from_millis(self.segments[index].duration_ms());
                self.advance_deadline = Some(Instant::now() + duration);
                debug!(index, "Automatic advance resumed after routes-only");
            }
        }
    }

    async fn cmd_refresh(&mut self, document: StoryMapDocument) -> Result<(), PlaybackError> {
        if document.map_id != self.map_id {
            warn!(incoming = %document.map_id, "Refresh for a different map ignored");
            return Ok(());
        }
        self.segments = document.segments;
        self.transitions = document.transitions;
        self.loaded = true;

        if let Some(index) = self.state.index() {
            if index >= self.segments.len() {
                warn!(index, "Active segment disappeared in refresh; stopping");
                self.stop_playback();
                return Ok(());
            }
            let hash = self.segments[index].content_hash();
            if self.last_rendered.map(|(_, h)| h != hash).unwrap_or(false) {
                debug!(index, "Active segment content changed; quick update");
                self.render_segment(index).await;
            }
        }
        Ok(())
    }

    async fn cmd_apply_remote_segment(
        &mut self,
        index: usize,
        segment: Option<Segment>,
    ) -> Result<(), PlaybackError> {
        self.ensure_loaded().await;
        if let Some(segment) = segment {
            if index < self.segments.len() {
                self.segments[index] = segment;
            } else if index == self.segments.len() {
                self.segments.push(segment);
            } else {
                warn!(index, "Remote segment index beyond local list; ignored");
                return Ok(());
            }
        } else if index >= self.segments.len() {
            warn!(index, "Remote segment change without payload for unknown index");
            return Ok(());
        }
        // An in-flight local camera motion is cancelled and restarted
        // toward the received state (jump-cut accepted).
        self.render_segment(index).await;
        self.state = if self.remote_playing {
            PlaybackState::Playing { index }
        } else {
            PlaybackState::Paused { index }
        };
        Ok(())
    }

    fn cmd_apply_remote_play_state(&mut self, playing: bool) {
        self.remote_playing = playing;
        match (playing, self.state) {
            (false, PlaybackState::Playing { index })
            | (false, PlaybackState::WaitingForUserAction { index }) => {
                self.state = PlaybackState::Paused { index };
            }
            (true, PlaybackState::Paused { index }) => {
                self.state = PlaybackState::Playing { index };
            }
            _ => {}
        }
    }

    async fn on_advance_due(&mut self) {
        self.advance_deadline = None;
        let PlaybackState::Playing { index } = self.state else {
            // Stale wake-up after a state change; nothing to do.
            return;
        };
        if !self.surface.is_ready() {
            warn!("Map surface not ready; retrying advance shortly");
            self.advance_deadline = Some(Instant::now() + self.config.playback.surface_retry);
            return;
        }
        let next = index + 1;
        if next == self.segments.len() {
            info!("Tour complete; stopping");
            self.stop_playback();
        } else {
            self.render_segment(next).await;
            self.after_render(next, true);
        }
        self.publish_status();
    }

    /// Render segment `index`, cross-fading from whatever is on screen.
    ///
    /// Idempotent for unchanged content: the same `(index, hash)` pair is a
    /// no-op with no drawable churn. A same-index render with a new hash is
    /// a quick update that leaves the advance timer and route origin alone.
    async fn render_segment(&mut self, index: usize) {
        let segment = self.segments[index].clone();
        let hash = segment.content_hash();

        if self.last_rendered == Some((index, hash)) {
            debug!(index, %hash, "Segment content unchanged; skipping render");
            return;
        }
        let index_changed = self.last_rendered.map(|(i, _)| i != index).unwrap_or(true);

        if index_changed {
            // New activation: retire the epoch, killing in-flight fades,
            // route ticks, and a pending camera descent. A running
            // routes-only demonstration is superseded with it.
            self.epoch += 1;
            let retired = std::mem::replace(&mut self.epoch_token, CancellationToken::new());
            retired.cancel();
            self.camera.cancel();
            self.fade_token = None;
            self.route_token = None;
            self.routes_only = false;
            self.resume_after_routes = false;
            self.segment_origin = Instant::now();
        } else {
            // Data refresh of the active segment: cancel only the previous
            // fade and route ticks; the origin and advance timer persist.
            if let Some(token) = self.fade_token.take() {
                token.cancel();
            }
            if let Some(token) = self.route_token.take() {
                token.cancel();
            }
        }

        let outgoing = std::mem::take(&mut self.live);

        let set = self.renderer.render(&self.map_id, &segment, 0.0).await;

        let route_records = match self
            .source
            .route_animations(&self.map_id, &segment.id)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(segment = %segment.id, error = %e, "Route fetch failed; playing without routes");
                Vec::new()
            }
        };
        let plan = self.routes.prepare(route_records, 0.0);

        let mut incoming = set.drawables.clone();
        incoming.extend(plan.routes.iter().map(|r| RenderedDrawable {
            handle: r.handle,
            base_opacity: r.animation.style.opacity,
        }));
        self.live = incoming.clone();

        // Camera: authored pose via the edge's strategy, else auto-fit over
        // rendered geometry plus full route paths.
        let transition = self.transition_into(index).cloned();
        match segment.camera {
            Some(pose) => {
                let strategy = transition.as_ref().map(|t| t.camera).unwrap_or_default();
                let duration = transition
                    .as_ref()
                    .map(|t| Duration::from_millis(t.camera_duration_ms));
                self.camera
                    .move_to(pose, strategy, duration, !outgoing.is_empty());
            }
            None => {
                let mut bounds = set.bounds;
                for route in &plan.routes {
                    if let Some(b) = GeoBounds::from_points(&route.animation.path) {
                        bounds = Some(match bounds {
                            Some(union) => union.union(&b),
                            None => b,
                        });
                    }
                }
                self.camera.auto_fit(bounds);
            }
        }

        // Cross-fade the old set out underneath the new one.
        let (fade_duration, curve) = if !index_changed {
            (self.fades.quick_update_duration(), FadeCurve::Linear)
        } else {
            match transition.as_ref() {
                Some(t) => match t.style {
                    TransitionStyle::Instant => (Duration::ZERO, FadeCurve::Linear),
                    TransitionStyle::Linear => {
                        (Duration::from_millis(t.duration_ms), FadeCurve::Linear)
                    }
                    TransitionStyle::Eased => {
                        (Duration::from_millis(t.duration_ms), FadeCurve::Eased)
                    }
                },
                None => (self.fades.crossfade_duration(), FadeCurve::Eased),
            }
        };
        let fade_token = self.epoch_token.child_token();
        self.fade_token = Some(fade_token.clone());
        let fades = self.fades.clone();
        tokio::spawn(async move {
            fades
                .run(outgoing, incoming, fade_duration, curve, fade_token)
                .await;
        });

        // Route draw-in, keyed to the segment activation origin. On a data
        // refresh the origin is the original activation time, so routes
        // resume at their correct progress instead of restarting.
        if !plan.is_empty() {
            let route_token = self.epoch_token.child_token();
            self.route_token = Some(route_token.clone());
            let animator = self.routes.clone();
            let origin = self.segment_origin;
            tokio::spawn(async move {
                animator.run(plan, origin, route_token).await;
            });
        }

        self.last_rendered = Some((index, hash));
        debug!(index, %hash, "Segment rendered");
        self.broadcast(SyncMessage::segment_change(index, &segment));
    }

    /// Establish post-render state: gate on the incoming edge or schedule
    /// the advance timer.
    fn after_render(&mut self, index: usize, auto: bool) {
        if !auto {
            self.state = PlaybackState::Paused { index };
            self.pending_transition = None;
            self.advance_deadline = None;
            return;
        }
        let gate = self
            .transition_into(index)
            .filter(|t| t.require_user_action)
            .cloned();
        match gate {
            Some(transition) => {
                debug!(index, "Advance gated on user action");
                self.state = PlaybackState::WaitingForUserAction { index };
                self.pending_transition = Some(transition);
                self.advance_deadline = None;
            }
            None => {
                self.state = PlaybackState::Playing { index };
                self.pending_transition = None;
                if self.routes_only {
                    self.advance_deadline = None;
                } else {
                    let duration = Duration::from_millis(self.segments[index].duration_ms());
                    self.advance_deadline = Some(Instant::now() + duration);
                }
            }
        }
    }

    /// Full stop: retire everything and clear the map.
    fn stop_playback(&mut self) {
        info!("Playback stop");
        self.epoch += 1;
        let retired = std::mem::replace(&mut self.epoch_token, CancellationToken::new());
        retired.cancel();
        self.camera.cancel();
        self.fade_token = None;
        self.route_token = None;
        for drawable in self.live.drain(..) {
            self.surface.detach(drawable.handle);
        }
        self.advance_deadline = None;
        self.last_rendered = None;
        self.pending_transition = None;
        self.routes_only = false;
        self.resume_after_routes = false;
        self.state = PlaybackState::Stopped;
        self.broadcast(SyncMessage::play_state(false));
    }

    async fn ensure_loaded(&mut self) {
        if self.loaded {
            return;
        }
        match self.source.segments(&self.map_id).await {
            Ok(segments) => self.segments = segments,
            Err(e) => {
                warn!(error = %e, "Segment fetch failed; continuing with an empty list");
                self.segments = Vec::new();
            }
        }
        match self.source.transitions(&self.map_id).await {
            Ok(transitions) => self.transitions = transitions,
            Err(e) => {
                warn!(error = %e, "Transition fetch failed; continuing without transitions");
                self.transitions = Vec::new();
            }
        }
        self.loaded = true;
    }

    /// The authored transition on the edge into `index`: list adjacency
    /// `(segment[index - 1], segment[index])`.
    fn transition_into(&self, index: usize) -> Option<&Transition> {
        if index == 0 {
            return None;
        }
        let from = &self.segments.get(index - 1)?.id;
        let to = &self.segments.get(index)?.id;
        self.transitions
            .iter()
            .find(|t| &t.from_segment_id == from && &t.to_segment_id == to)
    }

    fn check_index(&self, index: usize) -> Result<(), PlaybackError> {
        if index < self.segments.len() {
            Ok(())
        } else {
            Err(PlaybackError::IndexOutOfRange {
                index,
                count: self.segments.len(),
            })
        }
    }

    /// Publish a sync message when this instance holds the controller role.
    fn broadcast(&self, message: SyncMessage) {
        if self.role != PlaybackRole::Controller {
            return;
        }
        let Some(channel) = &self.sync else {
            return;
        };
        if let Err(e) = channel.publish(&channel_name(&self.map_id), &message) {
            // Unsupported context: degrade silently to standalone.
            debug!(error = %e, "Sync publish unavailable; continuing standalone");
        }
    }

    fn publish_status(&self) {
        let _ = self.status_tx.send_replace(PlaybackStatus {
            state: self.state,
            segment_count: self.segments.len(),
            epoch: self.epoch,
            routes_only_active: self.routes_only,
        });
    }
}
