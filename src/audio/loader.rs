// Fetches a recorded clip and opens a native channel for it
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::player::{NativeAudioChannel, SinkFactory};
use crate::session::{AudioChannel, AudioLoader, SilentAudio, SourceRef};

pub struct NativeAudioLoader {
    client: reqwest::Client,
    base: Url,
    factory: SinkFactory,
    timeout: Duration,
}

impl NativeAudioLoader {
    pub fn new(client: reqwest::Client, base: Url, factory: SinkFactory, timeout: Duration) -> Self {
        Self {
            client,
            base,
            factory,
            timeout,
        }
    }

    pub async fn open(&self, audio_ref: &str) -> Result<NativeAudioChannel> {
        let source = SourceRef::resolve(audio_ref, &self.base)
            .ok_or_else(|| anyhow!("Unsupported audio source {}", audio_ref))?;
        let extension = match &source {
            SourceRef::Remote(url) => extension_of(Path::new(url.path())),
            SourceRef::Local(path) => extension_of(path),
        };

        let clip = tokio::time::timeout(self.timeout, self.fetch(&source))
            .await
            .map_err(|_| anyhow!("Timed out fetching {} after {:?}", audio_ref, self.timeout))??;
        tracing::debug!(audio_ref, bytes = clip.len(), "fetched recorded audio");
        NativeAudioChannel::spawn(clip, extension, self.factory.clone())
    }

    async fn fetch(&self, source: &SourceRef) -> Result<Arc<[u8]>> {
        match source {
            SourceRef::Remote(url) => {
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .with_context(|| format!("Failed to fetch {}", url))?
                    .error_for_status()
                    .with_context(|| format!("Failed to fetch {}", url))?;
                let bytes = response.bytes().await.context("Failed to read audio body")?;
                Ok(Arc::from(bytes.as_ref()))
            }
            SourceRef::Local(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read audio file {:?}", path))?;
                Ok(Arc::from(bytes))
            }
        }
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

#[async_trait]
impl AudioLoader for NativeAudioLoader {
    /// Load failures are absorbed: the session keeps its mode and the
    /// countdown runs over silence
    async fn load(&self, audio_ref: &str) -> Box<dyn AudioChannel> {
        match self.open(audio_ref).await {
            Ok(channel) => Box::new(channel),
            Err(e) => {
                tracing::warn!(audio_ref, "Recorded audio unavailable, playing silently: {:#}", e);
                Box::new(SilentAudio)
            }
        }
    }
}
