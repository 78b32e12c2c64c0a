// Audio output using cpal
// Device stream fed from a ring buffer by the audio thread

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use parking_lot::Mutex;
use ringbuf::{
    traits::{Consumer, Producer, Split},
    HeapRb,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::player::{PcmSink, SinkFactory};

const RING_BUFFER_SIZE: usize = 48000 * 2 / 4; // ~250ms of stereo audio at 48kHz

type RingProducer = ringbuf::HeapProd<f32>;
type RingConsumer = ringbuf::HeapCons<f32>;

pub struct AudioOutput {
    stream: Stream,
    producer: RingProducer,
    sample_rate: u32,
    channels: u16,
    clear_flag: Arc<AtomicBool>,
}

impl AudioOutput {
    /// Open the default output device at its default config
    pub fn new(volume: f32) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No output device available"))?;

        let config = device
            .default_output_config()
            .context("Failed to get default output config")?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        let rb = HeapRb::<f32>::new(RING_BUFFER_SIZE);
        let (producer, consumer) = rb.split();
        let consumer = Arc::new(Mutex::new(consumer));

        let volume = volume.clamp(0.0, 1.0);
        let clear_flag = Arc::new(AtomicBool::new(false));
        let clear = clear_flag.clone();

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &config.into(), consumer, volume, clear)?
            }
            cpal::SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &config.into(), consumer, volume, clear)?
            }
            cpal::SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &config.into(), consumer, volume, clear)?
            }
            format => return Err(anyhow!("Unsupported sample format: {:?}", format)),
        };

        stream.play().context("Failed to start stream")?;
        tracing::debug!(sample_rate, channels, "audio output opened");

        Ok(Self {
            stream,
            producer,
            sample_rate,
            channels,
            clear_flag,
        })
    }

    fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &cpal::Device,
        config: &StreamConfig,
        consumer: Arc<Mutex<RingConsumer>>,
        volume: f32,
        clear_flag: Arc<AtomicBool>,
    ) -> Result<Stream> {
        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let mut consumer = consumer.lock();

                    // Drain on request, then play silence until refilled
                    if clear_flag.swap(false, Ordering::SeqCst) {
                        while consumer.try_pop().is_some() {}
                    }

                    for sample in data.iter_mut() {
                        let value = consumer.try_pop().unwrap_or(0.0) * volume;
                        *sample = T::from_sample(value);
                    }
                },
                move |err| {
                    tracing::warn!("Audio output error: {}", err);
                },
                None,
            )
            .context("Failed to build output stream")?;

        Ok(stream)
    }
}

impl PcmSink for AudioOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> usize {
        self.channels as usize
    }

    fn write(&mut self, samples: &[f32]) -> usize {
        self.producer.push_slice(samples)
    }

    fn pause(&mut self) {
        if let Err(e) = self.stream.pause() {
            tracing::warn!("Failed to pause output stream: {}", e);
        }
    }

    fn resume(&mut self) {
        if let Err(e) = self.stream.play() {
            tracing::warn!("Failed to resume output stream: {}", e);
        }
    }

    fn clear(&mut self) {
        self.clear_flag.store(true, Ordering::SeqCst);
    }
}

/// Sink factory opening the default device at the given volume
pub fn cpal_sink_factory(volume: f32) -> SinkFactory {
    Arc::new(move || Ok(Box::new(AudioOutput::new(volume)?) as Box<dyn PcmSink>))
}

/// Whether the host has a default output device
pub fn output_available() -> bool {
    cpal::default_host().default_output_device().is_some()
}
