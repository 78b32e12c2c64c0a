// Session event loop
//
// One tokio task per open player screen. The task resolves the playback
// mode, then owns the PlayerMachine and applies commands and timer fires
// one at a time. Snapshots are published on a watch channel after every step.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::machine::{PlayerCommand, PlayerMachine, SessionOutputs};
use super::mode::{resolve_playback, AudioLoader, PlatformCapabilities, SourceProber};
use super::snapshot::PlayerSnapshot;
use super::timers::{Fired, TokioScheduler};
use crate::catalog::{Cue, MeditationEntry};
use crate::error::{PlayerError, Result};
use crate::settings::CueAnchoring;

/// Everything a session needs from the outside world
#[derive(Clone)]
pub struct PlayerEnvironment {
    pub capabilities: PlatformCapabilities,
    pub prober: Arc<dyn SourceProber>,
    pub loader: Arc<dyn AudioLoader>,
    pub outputs: SessionOutputs,
    pub anchoring: CueAnchoring,
}

/// A command and, optionally, where to send the snapshot taken after it
struct Envelope {
    command: PlayerCommand,
    reply: Option<oneshot::Sender<PlayerSnapshot>>,
}

pub struct PlayerHandle {
    meditation_id: String,
    commands: mpsc::UnboundedSender<Envelope>,
    state: watch::Receiver<PlayerSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl PlayerHandle {
    /// Open a session and start resolving its playback mode.
    /// Must be called inside a tokio runtime.
    pub fn spawn(entry: MeditationEntry, script: Vec<Cue>, env: PlayerEnvironment) -> Self {
        let meditation_id = entry.id.clone();
        let (scheduler, fired) = TokioScheduler::new();
        let mut machine =
            PlayerMachine::new(entry, script, env.anchoring, scheduler, env.outputs.clone());
        machine.begin_loading();

        let (state_tx, state) = watch::channel(machine.snapshot());
        let (commands, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_session(machine, fired, command_rx, state_tx, env));

        Self {
            meditation_id,
            commands,
            state,
            task: Some(task),
        }
    }

    pub fn meditation_id(&self) -> &str {
        &self.meditation_id
    }

    pub fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands
            .send(Envelope {
                command,
                reply: None,
            })
            .map_err(|_| PlayerError::SessionClosed)
    }

    /// Send a command and resolve to the snapshot taken once the session has
    /// applied it. Does not borrow the handle.
    pub fn request(
        &self,
        command: PlayerCommand,
    ) -> impl Future<Output = Result<PlayerSnapshot>> + Send + 'static {
        let commands = self.commands.clone();
        async move {
            let (reply, applied) = oneshot::channel();
            commands
                .send(Envelope {
                    command,
                    reply: Some(reply),
                })
                .map_err(|_| PlayerError::SessionClosed)?;
            applied.await.map_err(|_| PlayerError::SessionClosed)
        }
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Wait for the session to end on its own (completion or exit)
    pub async fn finished(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(meditation_id = %self.meditation_id, "session task failed: {}", e);
            }
        }
    }

    /// Tear the session down without navigating and wait for it to release
    /// its timers, audio and speech
    pub async fn close(self) {
        let PlayerHandle {
            meditation_id,
            commands,
            task,
            ..
        } = self;
        drop(commands);
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(%meditation_id, "session task failed: {}", e);
            }
        }
    }
}

async fn run_session(
    mut machine: PlayerMachine<TokioScheduler>,
    mut fired: mpsc::UnboundedReceiver<Fired>,
    mut commands: mpsc::UnboundedReceiver<Envelope>,
    state: watch::Sender<PlayerSnapshot>,
    env: PlayerEnvironment,
) {
    let entry = machine.entry().clone();
    let resolution = resolve_playback(
        &entry,
        &env.capabilities,
        env.prober.as_ref(),
        env.loader.as_ref(),
    );
    tokio::pin!(resolution);

    // Loading: only an exit is meaningful until the mode is known
    loop {
        tokio::select! {
            (mode, audio) = &mut resolution => {
                machine.resolve(mode, audio);
                break;
            }
            envelope = commands.recv() => match envelope {
                Some(Envelope { command: PlayerCommand::Exit, reply }) => {
                    machine.exit();
                    publish(&state, &machine, reply);
                    return;
                }
                Some(Envelope { command, reply }) => {
                    tracing::debug!(?command, "command ignored while loading");
                    if let Some(reply) = reply {
                        let _ = reply.send(machine.snapshot());
                    }
                }
                None => {
                    machine.teardown();
                    return;
                }
            },
        }
    }
    state.send_replace(machine.snapshot());

    loop {
        tokio::select! {
            envelope = commands.recv() => match envelope {
                Some(Envelope { command, reply }) => {
                    machine.apply(command);
                    publish(&state, &machine, reply);
                }
                None => {
                    machine.teardown();
                    state.send_replace(machine.snapshot());
                    break;
                }
            },
            Some(event) = fired.recv() => {
                machine.on_timer(event);
                state.send_replace(machine.snapshot());
            }
        }

        if machine.phase().is_terminal() {
            break;
        }
    }

    tracing::debug!(meditation_id = %entry.id, phase = ?machine.phase(), "session loop finished");
}

fn publish(
    state: &watch::Sender<PlayerSnapshot>,
    machine: &PlayerMachine<TokioScheduler>,
    reply: Option<oneshot::Sender<PlayerSnapshot>>,
) {
    let snapshot = machine.snapshot();
    if let Some(reply) = reply {
        // The requester may have gone away
        let _ = reply.send(snapshot.clone());
    }
    state.send_replace(snapshot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mode::PlaybackMode;
    use crate::session::snapshot::PlayerPhase;
    use crate::session::testing::{
        AudioCall, CountingProber, NavCall, RecordingAnalytics, RecordingLoader,
        RecordingNavigator, RecordingSpeech, StalledProber,
    };
    use std::time::Duration;

    struct Fixture {
        speech: Arc<RecordingSpeech>,
        analytics: Arc<RecordingAnalytics>,
        navigator: Arc<RecordingNavigator>,
        loader: Arc<RecordingLoader>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                speech: Arc::new(RecordingSpeech::default()),
                analytics: Arc::new(RecordingAnalytics::default()),
                navigator: Arc::new(RecordingNavigator::default()),
                loader: Arc::new(RecordingLoader::default()),
            }
        }

        fn env(&self, prober: Arc<dyn SourceProber>) -> PlayerEnvironment {
            PlayerEnvironment {
                capabilities: PlatformCapabilities {
                    network_fetch: true,
                    speech_synthesis: true,
                    audio_output: true,
                },
                prober,
                loader: self.loader.clone(),
                outputs: SessionOutputs {
                    speech: self.speech.clone(),
                    analytics: self.analytics.clone(),
                    navigator: self.navigator.clone(),
                },
                anchoring: CueAnchoring::PlaybackTime,
            }
        }
    }

    fn short_session() -> MeditationEntry {
        MeditationEntry::new("calm3", "3-Minute Calm", 15).with_audio("/audio/calm3.mp3")
    }

    fn script() -> Vec<Cue> {
        vec![
            Cue::new(0, "Let's reset together."),
            Cue::new(3, "Breathe in..."),
            Cue::new(13, "Again."),
        ]
    }

    async fn wait_ready(handle: &PlayerHandle) {
        let mut state = handle.subscribe();
        state.wait_for(|s| s.is_ready).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_recorded_session_runs_to_completion() {
        let fixture = Fixture::new();
        let env = fixture.env(Arc::new(CountingProber::new(true)));
        let mut handle = PlayerHandle::spawn(short_session(), script(), env);
        let state = handle.subscribe();

        wait_ready(&handle).await;
        assert_eq!(handle.snapshot().mode, PlaybackMode::Recorded);
        handle.send(PlayerCommand::TogglePlay).unwrap();
        handle.finished().await;

        let last = state.borrow().clone();
        assert_eq!(last.phase, PlayerPhase::Completed);
        assert_eq!(last.remaining_sec, 0);
        assert_eq!(fixture.loader.loaded(), vec!["/audio/calm3.mp3".to_string()]);
        assert_eq!(
            fixture.loader.audio.calls(),
            vec![AudioCall::PlayFromStart, AudioCall::Stop]
        );
        assert_eq!(
            fixture.navigator.calls(),
            vec![NavCall::Completion("calm3".to_string())]
        );
        assert_eq!(fixture.analytics.events().len(), 2);
        assert!(fixture.speech.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_synthesized_session_speaks_script() {
        let fixture = Fixture::new();
        let env = fixture.env(Arc::new(CountingProber::new(false)));
        let mut handle = PlayerHandle::spawn(short_session(), script(), env);

        wait_ready(&handle).await;
        assert_eq!(handle.snapshot().mode, PlaybackMode::Synthesized);
        handle.send(PlayerCommand::Start).unwrap();
        handle.finished().await;

        assert_eq!(
            fixture.speech.spoken(),
            vec!["Let's reset together.", "Breathe in...", "Again."]
        );
        assert!(fixture.loader.loaded().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_holds_remaining_time() {
        let fixture = Fixture::new();
        let env = fixture.env(Arc::new(CountingProber::new(false)));
        let handle = PlayerHandle::spawn(short_session(), script(), env);

        wait_ready(&handle).await;
        handle.send(PlayerCommand::Start).unwrap();
        tokio::time::sleep(Duration::from_millis(4500)).await;
        handle.send(PlayerCommand::Pause).unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;

        let paused = handle.snapshot();
        assert_eq!(paused.phase, PlayerPhase::Paused);
        assert_eq!(paused.remaining_sec, 11);
        assert_eq!(paused.clock, "0:11");
        assert_eq!(fixture.speech.spoken().len(), 2);
        handle.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_tears_down_without_navigation() {
        let fixture = Fixture::new();
        let env = fixture.env(Arc::new(CountingProber::new(true)));
        let handle = PlayerHandle::spawn(short_session(), script(), env);

        wait_ready(&handle).await;
        handle.send(PlayerCommand::Start).unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        handle.close().await;

        assert_eq!(
            fixture.loader.audio.calls(),
            vec![AudioCall::PlayFromStart, AudioCall::Stop]
        );
        assert!(fixture.navigator.calls().is_empty());
        assert_eq!(fixture.analytics.events().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_while_loading() {
        let fixture = Fixture::new();
        let env = fixture.env(Arc::new(StalledProber));
        let mut handle = PlayerHandle::spawn(short_session(), script(), env);

        // Play is not available until the mode resolves
        handle.send(PlayerCommand::TogglePlay).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.snapshot().phase, PlayerPhase::Loading);
        assert_eq!(handle.snapshot().status, "Loading...");

        handle.send(PlayerCommand::Exit).unwrap();
        handle.finished().await;

        assert_eq!(handle.snapshot().phase, PlayerPhase::Exited);
        assert_eq!(fixture.navigator.calls(), vec![NavCall::Back]);
        assert!(fixture.loader.loaded().is_empty());
        assert!(fixture.analytics.events().is_empty());
        assert!(matches!(
            handle.send(PlayerCommand::Start),
            Err(PlayerError::SessionClosed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_returns_state_after_command() {
        let fixture = Fixture::new();
        let env = fixture.env(Arc::new(CountingProber::new(false)));
        let handle = PlayerHandle::spawn(short_session(), script(), env);

        wait_ready(&handle).await;
        let started = handle.request(PlayerCommand::TogglePlay).await.unwrap();
        assert_eq!(started.phase, PlayerPhase::Playing);
        assert!(started.is_playing);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let paused = handle.request(PlayerCommand::TogglePlay).await.unwrap();
        assert_eq!(paused.phase, PlayerPhase::Paused);
        assert_eq!(paused.remaining_sec, 13);

        let exited = handle.request(PlayerCommand::Exit).await.unwrap();
        assert_eq!(exited.phase, PlayerPhase::Exited);
        assert!(matches!(
            handle.request(PlayerCommand::Start).await,
            Err(PlayerError::SessionClosed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_while_loading_answers_current_state() {
        let fixture = Fixture::new();
        let env = fixture.env(Arc::new(StalledProber));
        let handle = PlayerHandle::spawn(short_session(), script(), env);

        let snapshot = handle.request(PlayerCommand::Start).await.unwrap();
        assert_eq!(snapshot.phase, PlayerPhase::Loading);
        handle.close().await;
    }
}
