//! Playback coordinator.
//!
//! The coordinator exclusively owns the mutable playback aggregate
//! ([`PlaybackSession`]), the queue and loop state, and the adapter
//! lifecycle. Adapters report events through [`AdapterSink`]s; the
//! coordinator decides what to do with them. UI layers observe the
//! coordinator through the [`EventBus`] and its read accessors.
//!
//! Playback state is `idle -> requesting -> active` and back to `idle` on
//! close. Presentation (`full`/`compact`/`mini`) is orthogonal to playback;
//! switching presentation never disturbs the adapter or the rendering
//! surface. Cinema is a flag re-entrant from `full`, kept in sync with the
//! platform's full-screen state in both directions.
//!
//! Ordering rule: the generation counter is bumped before any teardown is
//! awaited, so a replaced adapter's late signals always compare stale and
//! are discarded.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use core_runtime::events::{CoreEvent, EventBus, LayoutEvent, PlaybackEvent, SessionEvent};

use crate::adapter::{AdapterEnvelope, AdapterFactory, AdapterSignal, AdapterSink, ProviderAdapter};
use crate::animator::SeekDisplayAnimator;
use crate::capability::capability_for;
use crate::error::Result;
use crate::queue::PlayQueue;
use crate::resolver::resolve_deep_link;
use crate::sections::{section_at, LoopController};
use crate::types::{PlaybackRequest, PlaybackSession, QueueTrack, Section};

/// `previous()` restarts the current track instead of changing tracks when
/// playback has advanced past this point.
pub const PREVIOUS_RESTART_THRESHOLD_MS: u64 = 3_000;

/// Playback lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Requesting,
    Active,
}

/// Presentation sub-state, orthogonal to playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Full,
    Compact,
    Mini,
}

impl Presentation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Presentation::Full => "full",
            Presentation::Compact => "compact",
            Presentation::Mini => "mini",
        }
    }
}

/// Hook invoked when the internal queue is exhausted at a boundary,
/// letting an outer feed supply the next item.
pub type EdgeCallback = Box<dyn Fn() -> Option<PlaybackRequest> + Send + Sync>;

pub struct PlaybackCoordinator {
    state: CoordinatorState,
    presentation: Presentation,
    cinema: bool,
    session: Option<PlaybackSession>,
    queue: PlayQueue,
    sections: Vec<Section>,
    loop_controller: LoopController,
    animator: SeekDisplayAnimator,
    adapter: Option<Box<dyn ProviderAdapter>>,
    /// Bumped before every adapter replacement; envelopes tagged with an
    /// older generation are discarded.
    generation: u64,
    signal_tx: mpsc::UnboundedSender<AdapterEnvelope>,
    signal_rx: mpsc::UnboundedReceiver<AdapterEnvelope>,
    factory: Arc<dyn AdapterFactory>,
    events: EventBus,
    volume: f32,
    muted: bool,
    current_request: Option<PlaybackRequest>,
    on_next: Option<EdgeCallback>,
    on_previous: Option<EdgeCallback>,
}

impl PlaybackCoordinator {
    pub fn new(factory: Arc<dyn AdapterFactory>, events: EventBus) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        Self {
            state: CoordinatorState::Idle,
            presentation: Presentation::Full,
            cinema: false,
            session: None,
            queue: PlayQueue::new(),
            sections: Vec::new(),
            loop_controller: LoopController::new(),
            animator: SeekDisplayAnimator::new(),
            adapter: None,
            generation: 0,
            signal_tx,
            signal_rx,
            factory,
            events,
            volume: 1.0,
            muted: false,
            current_request: None,
            on_next: None,
            on_previous: None,
        }
    }

    pub fn on_next(&mut self, callback: EdgeCallback) {
        self.on_next = Some(callback);
    }

    pub fn on_previous(&mut self, callback: EdgeCallback) {
        self.on_previous = Some(callback);
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    pub fn is_cinema(&self) -> bool {
        self.cinema
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The smoothed position for the progress indicator.
    pub fn display_position_ms(&self) -> u64 {
        self.animator.display_position_ms()
    }

    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    // ------------------------------------------------------------------
    // Playback requests
    // ------------------------------------------------------------------

    /// Start playback of `request`, replacing any active session.
    ///
    /// Link-only providers never reach an adapter: an
    /// [`SessionEvent::OutboundOnly`] is published with the deep link and
    /// the current state is left untouched.
    pub async fn request_playback(&mut self, request: PlaybackRequest) -> Result<()> {
        let capability = capability_for(&request.provider);
        if !capability.embeddable && !capability.requires_premium_session {
            let deep_link =
                resolve_deep_link(&request.provider, &request.track_id, request.start_offset_ms);
            info!(provider = %request.provider, "Provider is link-only, surfacing deep link");
            self.publish(CoreEvent::Session(SessionEvent::OutboundOnly {
                provider: request.provider.as_str().to_string(),
                deep_link,
            }));
            return Ok(());
        }
        self.begin_request(request, false).await
    }

    async fn begin_request(&mut self, request: PlaybackRequest, degraded: bool) -> Result<()> {
        // Invalidate the previous adapter's signals before awaiting its
        // teardown, so anything it emits while winding down is stale.
        self.generation += 1;
        if let Some(mut old) = self.adapter.take() {
            if let Err(error) = old.teardown().await {
                warn!(%error, "Teardown of replaced adapter failed");
            }
        }

        self.animator.reset();
        self.loop_controller.reset();
        if !degraded {
            // A genuine track change; a degraded retry keeps the track's
            // section list.
            self.sections.clear();
        }

        self.state = CoordinatorState::Requesting;
        self.publish(CoreEvent::Session(SessionEvent::Requesting {
            provider: request.provider.as_str().to_string(),
            track_id: request.track_id.clone(),
        }));

        let capability = capability_for(&request.provider);
        let mut session =
            PlaybackSession::from_request(&request, capability.seekable_in_embed && !degraded);
        session.degraded = degraded;
        session.volume = self.volume;
        session.is_muted = self.muted;
        self.session = Some(session);

        let sink = AdapterSink::new(self.generation, self.signal_tx.clone());
        let started = match self.factory.create(&request, degraded, sink).await {
            Ok(mut adapter) => match adapter.start(&request).await {
                Ok(()) => {
                    self.adapter = Some(adapter);
                    Ok(())
                }
                Err(error) => Err(error),
            },
            Err(error) => Err(error),
        };

        match started {
            Ok(()) => {
                self.current_request = Some(request);
                Ok(())
            }
            Err(error) => {
                warn!(%error, provider = %request.provider, "Adapter setup failed");
                self.fall_back_or_fail(request, degraded, error.to_string()).await
            }
        }
    }

    /// After a setup failure: retry on the degraded path when one exists,
    /// otherwise surface the deep link and return to idle. The error never
    /// propagates past this point.
    async fn fall_back_or_fail(
        &mut self,
        request: PlaybackRequest,
        degraded: bool,
        message: String,
    ) -> Result<()> {
        let capability = capability_for(&request.provider);
        if !degraded && capability.requires_premium_session && capability.embeddable {
            self.publish(CoreEvent::Session(SessionEvent::Degraded {
                provider: request.provider.as_str().to_string(),
                reason: message.clone(),
            }));
            // Note the downgrade on the replacement session, not the one
            // begin_request is about to discard.
            let result = Box::pin(self.begin_request(request, true)).await;
            if let Some(session) = self.session.as_mut() {
                session.notice = Some(message);
            }
            return result;
        }

        let deep_link =
            resolve_deep_link(&request.provider, &request.track_id, request.start_offset_ms);
        self.publish(CoreEvent::Session(SessionEvent::ProviderUnavailable {
            provider: request.provider.as_str().to_string(),
            deep_link,
            message,
        }));
        self.reset_to_idle();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Adapter signals
    // ------------------------------------------------------------------

    /// Drain and apply every pending adapter signal. `now` is the time the
    /// signals are being applied, used for loop-seek debouncing.
    pub async fn process_signals(&mut self, now: Instant) -> Result<()> {
        while let Ok(envelope) = self.signal_rx.try_recv() {
            self.handle_envelope(envelope, now).await?;
        }
        Ok(())
    }

    async fn handle_envelope(&mut self, envelope: AdapterEnvelope, now: Instant) -> Result<()> {
        if envelope.generation != self.generation {
            debug!(
                generation = envelope.generation,
                current = self.generation,
                "Discarding stale adapter signal"
            );
            return Ok(());
        }

        match envelope.signal {
            AdapterSignal::Ready => self.on_adapter_ready().await,
            AdapterSignal::Status(status) => self.on_status(status, now).await,
            AdapterSignal::TrackEnded => self.on_track_ended().await,
            AdapterSignal::Error { message, fatal } => self.on_adapter_error(message, fatal).await,
            AdapterSignal::Downgrade { reason } => self.on_downgrade(reason).await,
            AdapterSignal::FullscreenChanged { active } => {
                self.sync_cinema(active);
                Ok(())
            }
        }
    }

    async fn on_adapter_ready(&mut self) -> Result<()> {
        if self.state != CoordinatorState::Requesting {
            trace!("Ready signal outside requesting state ignored");
            return Ok(());
        }
        self.state = CoordinatorState::Active;

        let seekable = self.adapter.as_ref().is_some_and(|a| a.supports_seek());
        let (provider, track_id) = match self.session.as_mut() {
            Some(session) => {
                session.seekable = seekable;
                (session.provider.as_str().to_string(), session.track_id.clone())
            }
            None => return Ok(()),
        };

        // Carry the user's volume and mute choice onto the new adapter.
        if let Some(adapter) = self.adapter.as_mut() {
            if let Err(error) = adapter.set_volume(self.volume).await {
                warn!(%error, "Failed to apply volume to new adapter");
            }
            if let Err(error) = adapter.set_mute(self.muted).await {
                warn!(%error, "Failed to apply mute to new adapter");
            }
        }

        info!(%provider, %track_id, seekable, "Playback session active");
        self.publish(CoreEvent::Session(SessionEvent::Activated {
            provider: provider.clone(),
            track_id: track_id.clone(),
            seekable,
        }));
        self.publish(CoreEvent::Playback(PlaybackEvent::Started {
            provider,
            track_id,
        }));
        Ok(())
    }

    async fn on_status(
        &mut self,
        status: crate::types::AuthoritativeStatus,
        now: Instant,
    ) -> Result<()> {
        if self.state != CoordinatorState::Active {
            trace!("Status signal outside active state ignored");
            return Ok(());
        }
        let (position, duration, was_playing, is_playing, seekable) = {
            let Some(session) = self.session.as_mut() else {
                return Ok(());
            };
            let was_playing = session.is_playing;
            session.apply_status(&status);
            session.current_section_id = section_at(&self.sections, session.authoritative_position_ms)
                .map(|s| s.id.clone());
            (
                session.authoritative_position_ms,
                session.duration_ms,
                was_playing,
                session.is_playing,
                session.seekable,
            )
        };

        self.animator.apply_authoritative(position, duration, is_playing);
        match (was_playing, is_playing) {
            (true, false) => self.publish(CoreEvent::Playback(PlaybackEvent::Paused)),
            (false, true) => self.publish(CoreEvent::Playback(PlaybackEvent::Resumed)),
            _ => {}
        }
        self.publish(CoreEvent::Playback(PlaybackEvent::PositionChanged {
            position_ms: position,
            duration_ms: duration,
        }));

        // Loop seeks need an in-place seek path.
        if seekable {
            if let Some(target) = self.loop_controller.evaluate(&self.sections, position, now) {
                if let Some(adapter) = self.adapter.as_mut() {
                    if let Err(error) = adapter.seek(target).await {
                        warn!(%error, target_ms = target, "Loop seek failed");
                    }
                }
            }
        }
        Ok(())
    }

    async fn on_track_ended(&mut self) -> Result<()> {
        let track_id = self
            .session
            .as_ref()
            .map(|s| s.track_id.clone())
            .unwrap_or_default();
        self.publish(CoreEvent::Playback(PlaybackEvent::TrackCompleted { track_id }));

        if let Some(next) = self.queue.advance().map(QueueTrack::to_request) {
            return self.request_playback(next).await;
        }
        let fallback = self.on_next.as_ref().and_then(|cb| cb());
        if let Some(request) = fallback {
            return self.request_playback(request).await;
        }
        // Queue exhausted with no outer feed: the session ends.
        self.close().await
    }

    async fn on_adapter_error(&mut self, message: String, fatal: bool) -> Result<()> {
        warn!(%message, fatal, "Adapter reported playback error");
        self.publish(CoreEvent::Playback(PlaybackEvent::Error {
            message: message.clone(),
            recoverable: !fatal,
        }));
        if !fatal {
            // Transient; playback may resume on the next status update.
            return Ok(());
        }
        let Some(request) = self.current_request.clone() else {
            self.reset_to_idle();
            return Ok(());
        };
        let degraded = self.session.as_ref().is_some_and(|s| s.degraded);
        self.fall_back_or_fail(request, degraded, message).await
    }

    async fn on_downgrade(&mut self, reason: String) -> Result<()> {
        let Some(request) = self.current_request.clone().or_else(|| {
            self.session
                .as_ref()
                .map(|s| PlaybackRequest::new(s.provider.clone(), s.track_id.clone()))
        }) else {
            self.reset_to_idle();
            return Ok(());
        };
        let already_degraded = self.session.as_ref().is_some_and(|s| s.degraded);
        if already_degraded {
            // No lower path left.
            return self.fall_back_or_fail(request, true, reason).await;
        }

        info!(provider = %request.provider, %reason, "Capability downgrade");
        self.publish(CoreEvent::Session(SessionEvent::Degraded {
            provider: request.provider.as_str().to_string(),
            reason: reason.clone(),
        }));
        let result = Box::pin(self.begin_request(request, true)).await;
        if let Some(session) = self.session.as_mut() {
            session.notice = Some(reason);
        }
        result
    }

    // ------------------------------------------------------------------
    // Transport controls
    // ------------------------------------------------------------------

    pub async fn toggle_play(&mut self) -> Result<()> {
        let playing = self.session.as_ref().is_some_and(|s| s.is_playing);
        if playing {
            self.pause().await
        } else {
            self.resume().await
        }
    }

    pub async fn pause(&mut self) -> Result<()> {
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.pause().await?;
        }
        if let Some(session) = self.session.as_mut() {
            session.is_playing = false;
            self.animator.apply_authoritative(
                session.authoritative_position_ms,
                session.duration_ms,
                false,
            );
        }
        self.publish(CoreEvent::Playback(PlaybackEvent::Paused));
        Ok(())
    }

    pub async fn resume(&mut self) -> Result<()> {
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.play(None).await?;
        }
        if let Some(session) = self.session.as_mut() {
            session.is_playing = true;
            self.animator.apply_authoritative(
                session.authoritative_position_ms,
                session.duration_ms,
                true,
            );
        }
        self.publish(CoreEvent::Playback(PlaybackEvent::Resumed));
        Ok(())
    }

    /// Seek to `position_ms`. A no-op when the active path does not support
    /// in-place seeking; the UI disables the control based on the session's
    /// `seekable` flag.
    pub async fn seek(&mut self, position_ms: u64) -> Result<()> {
        let seekable = self.session.as_ref().is_some_and(|s| s.seekable);
        if !seekable {
            debug!(position_ms, "Seek ignored on non-seekable path");
            return Ok(());
        }
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.seek(position_ms).await?;
        }
        if let Some(session) = self.session.as_mut() {
            session.authoritative_position_ms = match session.duration_ms {
                Some(duration) => position_ms.min(duration),
                None => position_ms,
            };
            self.animator.apply_authoritative(
                session.authoritative_position_ms,
                session.duration_ms,
                session.is_playing,
            );
        }
        Ok(())
    }

    pub async fn set_volume(&mut self, volume: f32) -> Result<()> {
        let volume = volume.clamp(0.0, 1.0);
        self.volume = volume;
        if let Some(session) = self.session.as_mut() {
            session.volume = volume;
        }
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.set_volume(volume).await?;
        }
        Ok(())
    }

    pub async fn set_mute(&mut self, muted: bool) -> Result<()> {
        self.muted = muted;
        if let Some(session) = self.session.as_mut() {
            session.is_muted = muted;
        }
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.set_mute(muted).await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sections and looping
    // ------------------------------------------------------------------

    /// Replace the section list for the current track. Supplied read-only
    /// by the external metadata source; an empty list is normal.
    pub fn set_sections(&mut self, sections: Vec<Section>) {
        self.sections = sections;
        if self
            .loop_controller
            .loop_section_id()
            .is_some_and(|id| !self.sections.iter().any(|s| s.id == id))
        {
            self.set_loop_section(None);
        }
    }

    /// Set or clear the looped section.
    pub fn set_loop_section(&mut self, section_id: Option<String>) {
        self.loop_controller.set_loop_section(section_id.clone());
        if let Some(session) = self.session.as_mut() {
            session.loop_section_id = section_id;
        }
    }

    pub fn loop_section_id(&self) -> Option<&str> {
        self.loop_controller.loop_section_id()
    }

    // ------------------------------------------------------------------
    // Queue navigation
    // ------------------------------------------------------------------

    /// Replace the queue contents and optionally the active position.
    pub fn set_queue(&mut self, tracks: Vec<QueueTrack>, current_index: Option<usize>) {
        self.queue.set_tracks(tracks, current_index);
    }

    pub fn enqueue(&mut self, track: QueueTrack) {
        self.queue.push(track);
    }

    /// Play the queue entry at `index`.
    pub async fn play_from_index(&mut self, index: usize) -> Result<()> {
        let request = self.queue.select(index)?.to_request();
        self.request_playback(request).await
    }

    /// Advance to the next queue entry, or delegate to the `on_next` hook
    /// when the queue is exhausted.
    pub async fn next(&mut self) -> Result<()> {
        if let Some(request) = self.queue.advance().map(QueueTrack::to_request) {
            return self.request_playback(request).await;
        }
        let fallback = self.on_next.as_ref().and_then(|cb| cb());
        if let Some(request) = fallback {
            return self.request_playback(request).await;
        }
        Ok(())
    }

    /// Restart the current track when playback is past
    /// [`PREVIOUS_RESTART_THRESHOLD_MS`]; otherwise go to the previous
    /// queue entry, or delegate to the `on_previous` hook at the boundary.
    pub async fn previous(&mut self) -> Result<()> {
        let position = self
            .session
            .as_ref()
            .map(|s| s.authoritative_position_ms)
            .unwrap_or(0);
        let seekable = self.session.as_ref().is_some_and(|s| s.seekable);
        if seekable && position > PREVIOUS_RESTART_THRESHOLD_MS {
            return self.seek(0).await;
        }
        if let Some(request) = self.queue.retreat().map(QueueTrack::to_request) {
            return self.request_playback(request).await;
        }
        let fallback = self.on_previous.as_ref().and_then(|cb| cb());
        if let Some(request) = fallback {
            return self.request_playback(request).await;
        }
        Ok(())
    }

    /// Remove the queue entry at `index`; the active track keeps playing.
    pub fn remove_from_queue(&mut self, index: usize) -> Result<QueueTrack> {
        self.queue.remove(index)
    }

    /// Replace the queue ordering; the active position follows the
    /// currently playing entry by identity.
    pub fn reorder_queue(&mut self, new_order: Vec<QueueTrack>) {
        self.queue.reorder(new_order);
    }

    /// Randomize the queue, keeping the active entry in place.
    pub fn shuffle_queue(&mut self) {
        self.queue.shuffle();
    }

    /// Empty the queue without stopping the active track.
    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    // ------------------------------------------------------------------
    // Presentation and cinema
    // ------------------------------------------------------------------

    /// Switch presentation. Playback is never interrupted by this; the
    /// adapter and rendering surface stay alive.
    pub fn set_presentation(&mut self, presentation: Presentation) {
        if self.presentation == presentation {
            return;
        }
        if self.cinema {
            self.cinema = false;
            self.publish(CoreEvent::Layout(LayoutEvent::CinemaExited));
        }
        self.presentation = presentation;
        self.publish(CoreEvent::Layout(LayoutEvent::PresentationChanged {
            mode: presentation.as_str().to_string(),
        }));
    }

    /// Enter the cinema overlay. Only reachable from the full presentation.
    pub fn enter_cinema(&mut self) {
        if self.presentation == Presentation::Full && !self.cinema {
            self.cinema = true;
            self.publish(CoreEvent::Layout(LayoutEvent::CinemaEntered));
        }
    }

    pub fn exit_cinema(&mut self) {
        if self.cinema {
            self.cinema = false;
            self.publish(CoreEvent::Layout(LayoutEvent::CinemaExited));
        }
    }

    /// Reconcile with the platform full-screen state. An external exit
    /// always clears the cinema flag, so it can never go stale.
    fn sync_cinema(&mut self, platform_fullscreen: bool) {
        if platform_fullscreen {
            self.enter_cinema();
        } else {
            self.exit_cinema();
        }
    }

    // ------------------------------------------------------------------
    // Shutdown
    // ------------------------------------------------------------------

    /// Explicit close: tear the adapter down and discard the session.
    pub async fn close(&mut self) -> Result<()> {
        self.generation += 1;
        if let Some(mut adapter) = self.adapter.take() {
            if let Err(error) = adapter.teardown().await {
                warn!(%error, "Adapter teardown on close failed");
            }
        }
        self.reset_to_idle();
        self.publish(CoreEvent::Playback(PlaybackEvent::Stopped));
        self.publish(CoreEvent::Session(SessionEvent::Closed));
        Ok(())
    }

    fn reset_to_idle(&mut self) {
        self.state = CoordinatorState::Idle;
        self.session = None;
        self.current_request = None;
        self.adapter = None;
        self.sections.clear();
        self.loop_controller.reset();
        self.animator.reset();
        self.exit_cinema();
    }

    /// Advance the display-position interpolation one frame.
    pub fn tick(&mut self, now: Instant) {
        self.animator.tick(now);
    }

    fn publish(&self, event: CoreEvent) {
        // No subscribers is fine; headless operation is supported.
        let _ = self.events.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlayerError;
    use crate::types::ProviderKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Adapter that signals readiness immediately and records teardown.
    struct InstantAdapter {
        provider: ProviderKind,
        seekable: bool,
        sink: AdapterSink,
        teardowns: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ProviderAdapter for InstantAdapter {
        fn provider(&self) -> &ProviderKind {
            &self.provider
        }

        fn supports_seek(&self) -> bool {
            self.seekable
        }

        async fn start(&mut self, _request: &PlaybackRequest) -> Result<()> {
            self.sink.emit(AdapterSignal::Ready);
            Ok(())
        }

        async fn play(&mut self, _start_offset_ms: Option<u64>) -> Result<()> {
            Ok(())
        }

        async fn pause(&mut self) -> Result<()> {
            Ok(())
        }

        async fn seek(&mut self, _position_ms: u64) -> Result<()> {
            Ok(())
        }

        async fn set_volume(&mut self, _volume: f32) -> Result<()> {
            Ok(())
        }

        async fn set_mute(&mut self, _muted: bool) -> Result<()> {
            Ok(())
        }

        async fn teardown(&mut self) -> Result<()> {
            self.teardowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InstantFactory {
        teardowns: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AdapterFactory for InstantFactory {
        async fn create(
            &self,
            request: &PlaybackRequest,
            degraded: bool,
            sink: AdapterSink,
        ) -> Result<Box<dyn ProviderAdapter>> {
            let seekable = capability_for(&request.provider).seekable_in_embed && !degraded;
            Ok(Box::new(InstantAdapter {
                provider: request.provider.clone(),
                seekable,
                sink,
                teardowns: Arc::clone(&self.teardowns),
            }))
        }
    }

    fn coordinator() -> (PlaybackCoordinator, Arc<AtomicUsize>) {
        let teardowns = Arc::new(AtomicUsize::new(0));
        let factory = Arc::new(InstantFactory {
            teardowns: Arc::clone(&teardowns),
        });
        (
            PlaybackCoordinator::new(factory, EventBus::new(64)),
            teardowns,
        )
    }

    #[tokio::test]
    async fn request_reaches_active_on_readiness() {
        let (mut coordinator, _) = coordinator();
        coordinator
            .request_playback(PlaybackRequest::new(ProviderKind::YouTube, "vid1"))
            .await
            .unwrap();
        assert_eq!(coordinator.state(), CoordinatorState::Requesting);

        coordinator.process_signals(Instant::now()).await.unwrap();
        assert_eq!(coordinator.state(), CoordinatorState::Active);
        let session = coordinator.session().unwrap();
        assert!(session.seekable);
        assert_eq!(session.track_id, "vid1");
    }

    #[tokio::test]
    async fn link_only_provider_stays_idle() {
        let (mut coordinator, _) = coordinator();
        let mut events = coordinator.events().subscribe();
        coordinator
            .request_playback(PlaybackRequest::new(ProviderKind::AppleMusic, "song1"))
            .await
            .unwrap();

        assert_eq!(coordinator.state(), CoordinatorState::Idle);
        assert!(coordinator.session().is_none());
        match events.recv().await.unwrap() {
            CoreEvent::Session(SessionEvent::OutboundOnly { deep_link, .. }) => {
                assert!(deep_link.contains("music.apple.com"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn new_request_tears_down_previous_adapter() {
        let (mut coordinator, teardowns) = coordinator();
        coordinator
            .request_playback(PlaybackRequest::new(ProviderKind::YouTube, "a"))
            .await
            .unwrap();
        coordinator.process_signals(Instant::now()).await.unwrap();

        coordinator
            .request_playback(PlaybackRequest::new(ProviderKind::YouTube, "b"))
            .await
            .unwrap();
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);

        coordinator.process_signals(Instant::now()).await.unwrap();
        assert_eq!(coordinator.session().unwrap().track_id, "b");
    }

    #[tokio::test]
    async fn presentation_changes_do_not_disturb_playback() {
        let (mut coordinator, teardowns) = coordinator();
        coordinator
            .request_playback(PlaybackRequest::new(ProviderKind::YouTube, "a"))
            .await
            .unwrap();
        coordinator.process_signals(Instant::now()).await.unwrap();

        coordinator.set_presentation(Presentation::Compact);
        coordinator.set_presentation(Presentation::Mini);
        assert_eq!(coordinator.state(), CoordinatorState::Active);
        assert_eq!(teardowns.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cinema_is_reentrant_from_full_only() {
        let (mut coordinator, _) = coordinator();
        coordinator.set_presentation(Presentation::Compact);
        coordinator.enter_cinema();
        assert!(!coordinator.is_cinema());

        coordinator.set_presentation(Presentation::Full);
        coordinator.enter_cinema();
        assert!(coordinator.is_cinema());
        coordinator.exit_cinema();
        assert!(!coordinator.is_cinema());
    }

    #[tokio::test]
    async fn external_fullscreen_exit_clears_cinema() {
        let (mut coordinator, _) = coordinator();
        coordinator
            .request_playback(PlaybackRequest::new(ProviderKind::YouTube, "a"))
            .await
            .unwrap();
        coordinator.process_signals(Instant::now()).await.unwrap();
        coordinator.enter_cinema();
        assert!(coordinator.is_cinema());

        // Platform leaves full-screen outside the app's control.
        let sink = AdapterSink::new(coordinator.generation, coordinator.signal_tx.clone());
        sink.emit(AdapterSignal::FullscreenChanged { active: false });
        coordinator.process_signals(Instant::now()).await.unwrap();
        assert!(!coordinator.is_cinema());
    }

    #[tokio::test]
    async fn close_resets_everything() {
        let (mut coordinator, teardowns) = coordinator();
        coordinator
            .request_playback(PlaybackRequest::new(ProviderKind::YouTube, "a"))
            .await
            .unwrap();
        coordinator.process_signals(Instant::now()).await.unwrap();

        coordinator.close().await.unwrap();
        assert_eq!(coordinator.state(), CoordinatorState::Idle);
        assert!(coordinator.session().is_none());
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn play_from_index_validates_bounds() {
        let (mut coordinator, _) = coordinator();
        coordinator.set_queue(
            vec![QueueTrack::new(ProviderKind::YouTube, "q1")],
            None,
        );
        assert!(matches!(
            coordinator.play_from_index(5).await,
            Err(PlayerError::QueueIndexOutOfBounds { .. })
        ));
        coordinator.play_from_index(0).await.unwrap();
        coordinator.process_signals(Instant::now()).await.unwrap();
        assert_eq!(coordinator.session().unwrap().track_id, "q1");
    }
}
