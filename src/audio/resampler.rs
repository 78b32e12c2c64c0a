// Sample rate and channel conversion to the output device format
use anyhow::{Context, Result};
use rubato::{FftFixedIn, Resampler};

const CHUNK_FRAMES: usize = 1024;

/// Streaming resampler over interleaved samples. Passes audio through
/// untouched when the rates already match.
pub struct StreamResampler {
    inner: Option<FftFixedIn<f32>>,
    channels: usize,
    /// Per-channel input waiting for a full chunk
    pending: Vec<Vec<f32>>,
}

impl StreamResampler {
    pub fn new(from_rate: u32, to_rate: u32, channels: usize) -> Result<Self> {
        let channels = channels.max(1);
        let inner = if from_rate == to_rate {
            None
        } else {
            let resampler = FftFixedIn::<f32>::new(
                from_rate as usize,
                to_rate as usize,
                CHUNK_FRAMES,
                2,
                channels,
            )
            .with_context(|| format!("Failed to create resampler {} -> {} Hz", from_rate, to_rate))?;
            Some(resampler)
        };

        Ok(Self {
            inner,
            channels,
            pending: vec![Vec::new(); channels],
        })
    }

    pub fn is_passthrough(&self) -> bool {
        self.inner.is_none()
    }

    pub fn process(&mut self, interleaved: &[f32]) -> Result<Vec<f32>> {
        let Some(resampler) = self.inner.as_mut() else {
            return Ok(interleaved.to_vec());
        };

        for frame in interleaved.chunks_exact(self.channels) {
            for (ch, sample) in frame.iter().enumerate() {
                self.pending[ch].push(*sample);
            }
        }

        let mut out = Vec::new();
        loop {
            let needed = resampler.input_frames_next();
            if self.pending[0].len() < needed {
                break;
            }
            let chunk: Vec<Vec<f32>> = self
                .pending
                .iter_mut()
                .map(|ch| ch.drain(..needed).collect())
                .collect();
            let resampled = resampler.process(chunk.as_slice(), None).context("Resampling failed")?;
            interleave_into(&resampled, &mut out);
        }
        Ok(out)
    }

    /// Push out whatever is buffered at end of stream
    pub fn flush(&mut self) -> Result<Vec<f32>> {
        let Some(resampler) = self.inner.as_mut() else {
            return Ok(Vec::new());
        };
        if self.pending[0].is_empty() {
            return Ok(Vec::new());
        }

        let chunk: Vec<Vec<f32>> = self.pending.iter_mut().map(std::mem::take).collect();
        let resampled = resampler
            .process_partial(Some(chunk.as_slice()), None)
            .context("Resampling failed")?;

        let mut out = Vec::new();
        interleave_into(&resampled, &mut out);
        Ok(out)
    }
}

fn interleave_into(planes: &[Vec<f32>], out: &mut Vec<f32>) {
    let frames = planes.first().map_or(0, Vec::len);
    out.reserve(frames * planes.len());
    for frame in 0..frames {
        for plane in planes {
            out.push(plane[frame]);
        }
    }
}

/// Map interleaved audio between channel counts. Mono is duplicated to every
/// output channel, downmixing to mono averages, anything else maps by index
/// and fills missing channels with silence.
pub fn remap_channels(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }

    let frames = samples.len() / from;
    let mut out = Vec::with_capacity(frames * to);
    for frame in samples.chunks_exact(from) {
        if from == 1 {
            out.extend(std::iter::repeat(frame[0]).take(to));
        } else if to == 1 {
            out.push(frame.iter().sum::<f32>() / from as f32);
        } else {
            for ch in 0..to {
                out.push(frame.get(ch).copied().unwrap_or(0.0));
            }
        }
    }
    out
}
