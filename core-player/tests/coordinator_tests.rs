//! End-to-end coordinator behavior against a scripted adapter factory.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use core_player::{
    capability_for, AdapterFactory, AdapterSignal, AdapterSink, AuthoritativeStatus,
    CoordinatorState, PlayerError, PlaybackCoordinator, PlaybackRequest, ProviderAdapter,
    ProviderKind, QueueTrack, Result, Section,
};
use core_runtime::events::EventBus;

/// Shared observation point for everything the scripted adapters do.
#[derive(Default)]
struct Recorder {
    /// Sink of every adapter ever created, in creation order. Lets tests
    /// emit signals "from" a replaced adapter.
    sinks: Mutex<Vec<AdapterSink>>,
    seeks: Mutex<Vec<u64>>,
    teardowns: AtomicUsize,
}

impl Recorder {
    fn sink(&self, index: usize) -> AdapterSink {
        self.sinks.lock().unwrap()[index].clone()
    }

    fn latest_sink(&self) -> AdapterSink {
        self.sinks.lock().unwrap().last().unwrap().clone()
    }

    fn seeks(&self) -> Vec<u64> {
        self.seeks.lock().unwrap().clone()
    }
}

struct ScriptedAdapter {
    provider: ProviderKind,
    seekable: bool,
    degraded: bool,
    suppress_ready: bool,
    sink: AdapterSink,
    recorder: Arc<Recorder>,
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn provider(&self) -> &ProviderKind {
        &self.provider
    }

    fn supports_seek(&self) -> bool {
        self.seekable
    }

    async fn start(&mut self, _request: &PlaybackRequest) -> Result<()> {
        let premium = capability_for(&self.provider).requires_premium_session;
        if premium && !self.degraded {
            self.sink.emit(AdapterSignal::Downgrade {
                reason: "premium session unavailable".to_string(),
            });
        } else if !self.suppress_ready {
            self.sink.emit(AdapterSignal::Ready);
        }
        Ok(())
    }

    async fn play(&mut self, _start_offset_ms: Option<u64>) -> Result<()> {
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        Ok(())
    }

    async fn seek(&mut self, position_ms: u64) -> Result<()> {
        self.recorder.seeks.lock().unwrap().push(position_ms);
        Ok(())
    }

    async fn set_volume(&mut self, _volume: f32) -> Result<()> {
        Ok(())
    }

    async fn set_mute(&mut self, _muted: bool) -> Result<()> {
        Ok(())
    }

    async fn teardown(&mut self) -> Result<()> {
        self.recorder.teardowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct ScriptedFactory {
    recorder: Arc<Recorder>,
    /// When set, newly created adapters never report readiness, simulating
    /// a slow provider still initializing.
    suppress_ready: AtomicBool,
    /// When set, non-degraded creation fails outright, simulating a native
    /// path that cannot be set up at all.
    fail_primary_create: AtomicBool,
}

#[async_trait]
impl AdapterFactory for ScriptedFactory {
    async fn create(
        &self,
        request: &PlaybackRequest,
        degraded: bool,
        sink: AdapterSink,
    ) -> Result<Box<dyn ProviderAdapter>> {
        if !degraded && self.fail_primary_create.load(Ordering::SeqCst) {
            return Err(PlayerError::Authentication(
                "device setup rejected".to_string(),
            ));
        }
        self.recorder.sinks.lock().unwrap().push(sink.clone());
        let capability = capability_for(&request.provider);
        Ok(Box::new(ScriptedAdapter {
            provider: request.provider.clone(),
            seekable: capability.seekable_in_embed && !degraded,
            degraded,
            suppress_ready: self.suppress_ready.load(Ordering::SeqCst),
            sink,
            recorder: Arc::clone(&self.recorder),
        }))
    }
}

fn harness() -> (PlaybackCoordinator, Arc<Recorder>, Arc<ScriptedFactory>) {
    let recorder = Arc::new(Recorder::default());
    let factory = Arc::new(ScriptedFactory {
        recorder: Arc::clone(&recorder),
        suppress_ready: AtomicBool::new(false),
        fail_primary_create: AtomicBool::new(false),
    });
    let coordinator = PlaybackCoordinator::new(factory.clone(), EventBus::new(64));
    (coordinator, recorder, factory)
}

fn status(position_ms: u64) -> AdapterSignal {
    AdapterSignal::Status(AuthoritativeStatus {
        position_ms: Some(position_ms),
        duration_ms: Some(180_000),
        is_playing: Some(true),
        ..Default::default()
    })
}

#[tokio::test]
async fn late_signals_from_replaced_adapter_are_ignored() {
    let (mut coordinator, recorder, factory) = harness();

    // First request: the adapter stalls during initialization.
    factory.suppress_ready.store(true, Ordering::SeqCst);
    coordinator
        .request_playback(PlaybackRequest::new(ProviderKind::YouTube, "track-a"))
        .await
        .unwrap();

    // Second request supersedes it before it ever became ready.
    factory.suppress_ready.store(false, Ordering::SeqCst);
    coordinator
        .request_playback(PlaybackRequest::new(ProviderKind::YouTube, "track-b"))
        .await
        .unwrap();
    coordinator.process_signals(Instant::now()).await.unwrap();
    assert_eq!(coordinator.state(), CoordinatorState::Active);

    // The replaced adapter wakes up late and reports a bogus position.
    recorder.sink(0).emit(AdapterSignal::Ready);
    recorder.sink(0).emit(status(99_000));
    coordinator.process_signals(Instant::now()).await.unwrap();

    let session = coordinator.session().unwrap();
    assert_eq!(session.track_id, "track-b");
    assert_eq!(session.authoritative_position_ms, 0);
}

#[tokio::test]
async fn premium_failure_degrades_and_still_reaches_active() {
    let (mut coordinator, recorder, _) = harness();

    coordinator
        .request_playback(PlaybackRequest::new(
            ProviderKind::Spotify,
            "spotify:track:4uLU6hMCjMI75M1A2tKUQC",
        ))
        .await
        .unwrap();
    // First drain handles the downgrade signal, spins up the degraded
    // adapter, and picks up its readiness in the same pass.
    coordinator.process_signals(Instant::now()).await.unwrap();

    assert_eq!(coordinator.state(), CoordinatorState::Active);
    let session = coordinator.session().unwrap();
    assert!(session.degraded);
    assert!(!session.seekable);
    assert_eq!(recorder.sinks.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn failed_device_setup_notes_the_downgrade_on_the_new_session() {
    let (mut coordinator, recorder, factory) = harness();
    factory.fail_primary_create.store(true, Ordering::SeqCst);

    coordinator
        .request_playback(PlaybackRequest::new(
            ProviderKind::Spotify,
            "spotify:track:abc",
        ))
        .await
        .unwrap();
    coordinator.process_signals(Instant::now()).await.unwrap();

    assert_eq!(coordinator.state(), CoordinatorState::Active);
    let session = coordinator.session().unwrap();
    assert!(session.degraded);
    // The user-visible note lands on the session that replaced the failed one.
    assert!(session
        .notice
        .as_deref()
        .is_some_and(|notice| notice.contains("device setup rejected")));
    assert_eq!(recorder.sinks.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn track_completion_advances_through_the_queue() {
    let (mut coordinator, recorder, _) = harness();
    coordinator.set_queue(
        vec![
            QueueTrack::new(ProviderKind::YouTube, "q1"),
            QueueTrack::new(ProviderKind::YouTube, "q2"),
        ],
        None,
    );

    coordinator.play_from_index(0).await.unwrap();
    coordinator.process_signals(Instant::now()).await.unwrap();
    assert_eq!(coordinator.session().unwrap().track_id, "q1");

    recorder.latest_sink().emit(AdapterSignal::TrackEnded);
    coordinator.process_signals(Instant::now()).await.unwrap();

    assert_eq!(coordinator.state(), CoordinatorState::Active);
    assert_eq!(coordinator.session().unwrap().track_id, "q2");
    assert_eq!(coordinator.queue().current_index(), Some(1));
}

#[tokio::test]
async fn queue_exhaustion_without_hooks_closes_the_session() {
    let (mut coordinator, recorder, _) = harness();
    coordinator.set_queue(vec![QueueTrack::new(ProviderKind::YouTube, "only")], None);

    coordinator.play_from_index(0).await.unwrap();
    coordinator.process_signals(Instant::now()).await.unwrap();

    recorder.latest_sink().emit(AdapterSignal::TrackEnded);
    coordinator.process_signals(Instant::now()).await.unwrap();

    assert_eq!(coordinator.state(), CoordinatorState::Idle);
    assert!(coordinator.session().is_none());
}

#[tokio::test]
async fn exhausted_queue_delegates_to_next_hook() {
    let (mut coordinator, recorder, _) = harness();
    coordinator.on_next(Box::new(|| {
        Some(PlaybackRequest::new(ProviderKind::YouTube, "from-feed"))
    }));

    coordinator
        .request_playback(PlaybackRequest::new(ProviderKind::YouTube, "solo"))
        .await
        .unwrap();
    coordinator.process_signals(Instant::now()).await.unwrap();

    recorder.latest_sink().emit(AdapterSignal::TrackEnded);
    coordinator.process_signals(Instant::now()).await.unwrap();

    assert_eq!(coordinator.session().unwrap().track_id, "from-feed");
}

#[tokio::test]
async fn previous_restarts_after_threshold_and_retreats_before_it() {
    let (mut coordinator, recorder, _) = harness();
    coordinator.set_queue(
        vec![
            QueueTrack::new(ProviderKind::YouTube, "q1"),
            QueueTrack::new(ProviderKind::YouTube, "q2"),
        ],
        None,
    );

    coordinator.play_from_index(1).await.unwrap();
    coordinator.process_signals(Instant::now()).await.unwrap();

    // Deep into the track: previous() restarts it.
    recorder.latest_sink().emit(status(45_000));
    coordinator.process_signals(Instant::now()).await.unwrap();
    coordinator.previous().await.unwrap();
    assert_eq!(recorder.seeks(), vec![0]);
    assert_eq!(coordinator.session().unwrap().track_id, "q2");
    assert_eq!(coordinator.queue().current_index(), Some(1));

    // Near the start: previous() changes tracks instead.
    recorder.latest_sink().emit(status(1_000));
    coordinator.process_signals(Instant::now()).await.unwrap();
    coordinator.previous().await.unwrap();
    coordinator.process_signals(Instant::now()).await.unwrap();
    assert_eq!(coordinator.session().unwrap().track_id, "q1");
    assert_eq!(coordinator.queue().current_index(), Some(0));
}

#[tokio::test]
async fn loop_boundary_crossing_seeks_exactly_once() {
    let (mut coordinator, recorder, _) = harness();

    coordinator
        .request_playback(PlaybackRequest::new(ProviderKind::YouTube, "looped"))
        .await
        .unwrap();
    coordinator.process_signals(Instant::now()).await.unwrap();

    coordinator.set_sections(vec![
        Section::new("a", "Intro", 0, 15_000),
        Section::new("b", "Verse", 15_000, 45_000),
    ]);
    coordinator.set_loop_section(Some("a".to_string()));

    // Two successive updates straddle the section end inside the cooldown
    // window; only the first triggers a seek.
    let t0 = Instant::now();
    recorder.latest_sink().emit(status(14_850));
    coordinator.process_signals(t0).await.unwrap();
    recorder.latest_sink().emit(status(15_050));
    coordinator
        .process_signals(t0 + Duration::from_millis(200))
        .await
        .unwrap();

    assert_eq!(recorder.seeks(), vec![0]);
}

#[tokio::test]
async fn current_section_follows_the_position() {
    let (mut coordinator, recorder, _) = harness();
    coordinator
        .request_playback(PlaybackRequest::new(ProviderKind::YouTube, "sectioned"))
        .await
        .unwrap();
    coordinator.process_signals(Instant::now()).await.unwrap();
    coordinator.set_sections(vec![
        Section::new("a", "Intro", 0, 15_000),
        Section::new("b", "Verse", 15_000, 45_000),
    ]);

    recorder.latest_sink().emit(status(20_000));
    coordinator.process_signals(Instant::now()).await.unwrap();
    assert_eq!(
        coordinator.session().unwrap().current_section_id.as_deref(),
        Some("b")
    );

    recorder.latest_sink().emit(status(50_000));
    coordinator.process_signals(Instant::now()).await.unwrap();
    assert_eq!(coordinator.session().unwrap().current_section_id, None);
}

#[tokio::test]
async fn removing_an_earlier_entry_keeps_the_active_track() {
    let (mut coordinator, _, _) = harness();
    coordinator.set_queue(
        vec![
            QueueTrack::new(ProviderKind::YouTube, "t1"),
            QueueTrack::new(ProviderKind::YouTube, "t2"),
            QueueTrack::new(ProviderKind::YouTube, "t3"),
        ],
        None,
    );
    coordinator.play_from_index(1).await.unwrap();
    coordinator.process_signals(Instant::now()).await.unwrap();

    coordinator.remove_from_queue(0).unwrap();

    let ids: Vec<&str> = coordinator
        .queue()
        .tracks()
        .iter()
        .map(|t| t.track_id.as_str())
        .collect();
    assert_eq!(ids, vec!["t2", "t3"]);
    assert_eq!(coordinator.queue().current_index(), Some(0));
    assert_eq!(coordinator.session().unwrap().track_id, "t2");
}

#[tokio::test]
async fn transient_errors_leave_the_session_alive() {
    let (mut coordinator, recorder, _) = harness();
    coordinator
        .request_playback(PlaybackRequest::new(ProviderKind::YouTube, "glitchy"))
        .await
        .unwrap();
    coordinator.process_signals(Instant::now()).await.unwrap();

    recorder.latest_sink().emit(AdapterSignal::Error {
        message: "network hiccup".to_string(),
        fatal: false,
    });
    coordinator.process_signals(Instant::now()).await.unwrap();
    assert_eq!(coordinator.state(), CoordinatorState::Active);

    // Playback resumes on the next authoritative update.
    recorder.latest_sink().emit(status(5_000));
    coordinator.process_signals(Instant::now()).await.unwrap();
    assert_eq!(
        coordinator.session().unwrap().authoritative_position_ms,
        5_000
    );
}

#[tokio::test]
async fn seek_is_a_noop_on_non_seekable_paths() {
    let (mut coordinator, recorder, _) = harness();
    // SoundCloud embeds are not seekable.
    coordinator
        .request_playback(PlaybackRequest::new(ProviderKind::SoundCloud, "sc1"))
        .await
        .unwrap();
    coordinator.process_signals(Instant::now()).await.unwrap();
    assert!(!coordinator.session().unwrap().seekable);

    coordinator.seek(30_000).await.unwrap();
    assert!(recorder.seeks().is_empty());
}
