// Recorded-audio channel backed by a dedicated audio thread
//
// The session drives the channel through a Transport; the thread owns the
// decoder, resampler and output device and feeds the device in small writes
// so pause and stop take effect within one write.

use anyhow::{Context, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::decoder::AudioDecoder;
use super::resampler::{remap_channels, StreamResampler};
use crate::session::AudioChannel;

/// Where decoded PCM goes. Lives on the audio thread only.
pub trait PcmSink {
    fn sample_rate(&self) -> u32;
    fn channels(&self) -> usize;
    /// Non-blocking; returns how many samples were accepted
    fn write(&mut self, samples: &[f32]) -> usize;
    fn pause(&mut self);
    fn resume(&mut self);
    /// Drop anything buffered but not yet played
    fn clear(&mut self);
}

/// Opens the sink on the audio thread (device streams are not Send)
pub type SinkFactory = Arc<dyn Fn() -> Result<Box<dyn PcmSink>> + Send + Sync>;

const IDLE_WRITE_BACKOFF: Duration = Duration::from_millis(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Playing,
    Paused,
    Shutdown,
}

/// Control shared between the session and the audio thread
pub struct Transport {
    state: Mutex<TransportState>,
    changed: Condvar,
    rewind: AtomicBool,
}

impl Transport {
    fn new() -> Self {
        Self {
            state: Mutex::new(TransportState::Idle),
            changed: Condvar::new(),
            rewind: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> TransportState {
        *self.state.lock()
    }

    fn set(&self, next: TransportState) {
        let mut state = self.state.lock();
        if *state != TransportState::Shutdown {
            *state = next;
        }
        self.changed.notify_all();
    }

    /// Move to `next` only from `from`
    fn transition(&self, from: TransportState, next: TransportState) -> bool {
        let mut state = self.state.lock();
        if *state != from {
            return false;
        }
        *state = next;
        self.changed.notify_all();
        true
    }

    fn rewind_to(&self, next: TransportState) {
        // Flag first so the thread never sees the new state without it
        self.rewind.store(true, Ordering::SeqCst);
        self.set(next);
    }

    fn take_rewind(&self) -> bool {
        self.rewind.swap(false, Ordering::SeqCst)
    }

    fn wait_while(&self, seen: TransportState) {
        let mut state = self.state.lock();
        while *state == seen {
            self.changed.wait(&mut state);
        }
    }

    fn shutdown(&self) {
        *self.state.lock() = TransportState::Shutdown;
        self.changed.notify_all();
    }
}

/// Decoded, device-format PCM for one pass through the clip
struct PcmStream {
    decoder: AudioDecoder,
    resampler: StreamResampler,
    out_channels: usize,
    backlog: Vec<f32>,
    offset: usize,
    flushed: bool,
}

impl PcmStream {
    fn open(clip: &Arc<[u8]>, extension: Option<&str>, rate: u32, channels: usize) -> Result<Self> {
        let decoder = AudioDecoder::from_bytes(clip.clone(), extension)?;
        let resampler = StreamResampler::new(decoder.sample_rate(), rate, channels)?;
        tracing::debug!(
            from_rate = decoder.sample_rate(),
            to_rate = rate,
            channels,
            duration_ms = ?decoder.duration_ms(),
            "opened clip"
        );

        Ok(Self {
            decoder,
            resampler,
            out_channels: channels,
            backlog: Vec::new(),
            offset: 0,
            flushed: false,
        })
    }

    fn pending(&self) -> &[f32] {
        &self.backlog[self.offset..]
    }

    fn consume(&mut self, samples: usize) {
        self.offset = (self.offset + samples).min(self.backlog.len());
    }

    /// Refill the backlog once drained. Returns false at end of clip.
    fn refill(&mut self) -> Result<bool> {
        if !self.pending().is_empty() {
            return Ok(true);
        }
        self.offset = 0;

        loop {
            match self.decoder.decode_next()? {
                Some(samples) => {
                    let remapped = remap_channels(&samples, self.decoder.channels(), self.out_channels);
                    self.backlog = self.resampler.process(&remapped)?;
                    if !self.backlog.is_empty() {
                        return Ok(true);
                    }
                }
                None => {
                    if self.flushed {
                        self.backlog.clear();
                        return Ok(false);
                    }
                    self.flushed = true;
                    self.backlog = self.resampler.flush()?;
                    return Ok(!self.backlog.is_empty());
                }
            }
        }
    }
}

fn run_worker(clip: Arc<[u8]>, extension: Option<String>, factory: SinkFactory, transport: Arc<Transport>) {
    let mut sink = match factory() {
        Ok(sink) => sink,
        Err(e) => {
            tracing::warn!("Audio output unavailable, recorded audio stays silent: {:#}", e);
            return;
        }
    };

    let mut stream: Option<PcmStream> = None;
    let mut sink_running = true;

    loop {
        match transport.state() {
            TransportState::Shutdown => break,
            state @ (TransportState::Idle | TransportState::Paused) => {
                if sink_running {
                    sink.pause();
                    sink_running = false;
                }
                if transport.take_rewind() {
                    sink.clear();
                    stream = None;
                }
                transport.wait_while(state);
                continue;
            }
            TransportState::Playing => {
                if !sink_running {
                    sink.resume();
                    sink_running = true;
                }
            }
        }

        if transport.take_rewind() {
            sink.clear();
            stream = None;
        }

        if stream.is_none() {
            match PcmStream::open(&clip, extension.as_deref(), sink.sample_rate(), sink.channels()) {
                Ok(pcm) => stream = Some(pcm),
                Err(e) => {
                    tracing::warn!("Failed to open recorded audio: {:#}", e);
                    break;
                }
            }
        }
        let Some(pcm) = stream.as_mut() else {
            break;
        };

        match pcm.refill() {
            Ok(true) => {}
            Ok(false) => {
                // End of clip: go quiet until the session rewinds
                transport.transition(TransportState::Playing, TransportState::Idle);
                continue;
            }
            Err(e) => {
                tracing::warn!("Recorded audio playback failed: {:#}", e);
                break;
            }
        }

        let written = sink.write(pcm.pending());
        pcm.consume(written);
        if written == 0 {
            thread::sleep(IDLE_WRITE_BACKOFF);
        }
    }

    sink.pause();
    tracing::debug!("audio thread finished");
}

/// `AudioChannel` playing one clip through a native output
pub struct NativeAudioChannel {
    transport: Arc<Transport>,
    worker: Option<JoinHandle<()>>,
}

impl NativeAudioChannel {
    pub fn spawn(clip: Arc<[u8]>, extension: Option<String>, factory: SinkFactory) -> Result<Self> {
        let transport = Arc::new(Transport::new());
        let worker_transport = transport.clone();

        let worker = thread::Builder::new()
            .name("stillwater-audio".to_string())
            .spawn(move || run_worker(clip, extension, factory, worker_transport))
            .context("Failed to spawn audio thread")?;

        Ok(Self {
            transport,
            worker: Some(worker),
        })
    }

    pub fn state(&self) -> TransportState {
        self.transport.state()
    }
}

impl AudioChannel for NativeAudioChannel {
    fn play_from_start(&mut self) {
        self.transport.rewind_to(TransportState::Playing);
    }

    fn pause(&mut self) {
        self.transport
            .transition(TransportState::Playing, TransportState::Paused);
    }

    fn resume(&mut self) {
        self.transport
            .transition(TransportState::Paused, TransportState::Playing);
    }

    fn stop(&mut self) {
        self.transport.rewind_to(TransportState::Idle);
    }
}

impl Drop for NativeAudioChannel {
    /// Inside a tokio runtime the join moves to the blocking pool, so a
    /// worker still opening its device never stalls a session task
    fn drop(&mut self) {
        self.transport.shutdown();
        let Some(worker) = self.worker.take() else {
            return;
        };
        let join = move || {
            if worker.join().is_err() {
                tracing::error!("audio thread panicked");
            }
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(join);
            }
            Err(_) => join(),
        }
    }
}
