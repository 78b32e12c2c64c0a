// Source availability probing and sound diagnostics
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use super::mode::{decide, PlatformCapabilities, PlaybackMode, SourceProber};
use crate::catalog::MeditationEntry;
use crate::settings::SourceSettings;

/// An audio ref resolved to something we know how to open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    Remote(Url),
    Local(PathBuf),
}

impl SourceRef {
    /// Absolute refs are taken as-is, relative ones are joined onto `base`.
    /// Schemes other than http(s) and file resolve to None.
    pub fn resolve(raw: &str, base: &Url) -> Option<SourceRef> {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => base.join(raw).ok()?,
            Err(_) => return None,
        };

        match url.scheme() {
            "http" | "https" => Some(SourceRef::Remote(url)),
            "file" => url.to_file_path().ok().map(SourceRef::Local),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SourceRef::Remote(url) => url.to_string(),
            SourceRef::Local(path) => path.display().to_string(),
        }
    }
}

/// Outcome of one probe, with enough detail for the diagnostics panel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub audio_ref: Option<String>,
    pub resolved: Option<String>,
    pub reachable: bool,
    pub status: Option<u16>,
    pub content_type: Option<String>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundDiagnostics {
    pub meditation_id: String,
    pub probe: ProbeReport,
    pub capabilities: PlatformCapabilities,
    /// The mode a session opened now would select
    pub expected_mode: PlaybackMode,
}

/// Prober for http(s) and file sources
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    base: Url,
    network: bool,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(sources: &SourceSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(sources.probe_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base: sources.asset_base(),
            network: sources.allow_network,
            timeout: sources.probe_timeout(),
        })
    }

    /// Remote sources are only probed when the platform can fetch
    pub fn with_network(mut self, network_fetch: bool) -> Self {
        self.network = self.network && network_fetch;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn inspect(&self, audio_ref: Option<&str>) -> ProbeReport {
        let mut report = ProbeReport {
            audio_ref: audio_ref.map(str::to_string),
            ..Default::default()
        };

        let Some(raw) = audio_ref else {
            report.detail = Some("no audio source".to_string());
            return report;
        };

        let Some(source) = SourceRef::resolve(raw, &self.base) else {
            report.detail = Some("unsupported audio source".to_string());
            tracing::debug!(audio_ref = raw, "unsupported audio source");
            return report;
        };
        report.resolved = Some(source.describe());

        match source {
            SourceRef::Local(path) => self.inspect_file(&path, &mut report).await,
            SourceRef::Remote(url) => {
                if self.network {
                    self.inspect_remote(&url, &mut report).await;
                } else {
                    report.detail = Some("network fetch unavailable".to_string());
                }
            }
        }

        tracing::debug!(
            audio_ref = raw,
            reachable = report.reachable,
            status = ?report.status,
            "probed audio source"
        );
        report
    }

    async fn inspect_file(&self, path: &Path, report: &mut ProbeReport) {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {
                report.reachable = true;
                report.content_type = content_type_for(path).map(str::to_string);
            }
            Ok(_) => report.detail = Some("not a regular file".to_string()),
            Err(e) => report.detail = Some(e.to_string()),
        }
    }

    async fn inspect_remote(&self, url: &Url, report: &mut ProbeReport) {
        let response = match tokio::time::timeout(self.timeout, self.request(url)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                report.detail = Some(e.to_string());
                return;
            }
            Err(_) => {
                report.detail = Some(format!("timed out after {}ms", self.timeout.as_millis()));
                return;
            }
        };

        let status = response.status();
        report.status = Some(status.as_u16());
        report.reachable = status.is_success();
        report.content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if !status.is_success() {
            report.detail = Some(format!("HTTP {}", status));
        }
    }

    /// HEAD, retried as GET when the server refuses HEAD
    async fn request(&self, url: &Url) -> reqwest::Result<reqwest::Response> {
        let response = self.client.head(url.clone()).send().await?;
        if matches!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
        ) {
            return self.client.get(url.clone()).send().await;
        }
        Ok(response)
    }

    pub async fn diagnose(
        &self,
        entry: &MeditationEntry,
        capabilities: &PlatformCapabilities,
    ) -> SoundDiagnostics {
        let probe = self.inspect(entry.audio_ref.as_deref()).await;
        let expected_mode = decide(
            capabilities.audio_output && probe.reachable,
            capabilities.speech_synthesis,
        );

        SoundDiagnostics {
            meditation_id: entry.id.clone(),
            probe,
            capabilities: *capabilities,
            expected_mode,
        }
    }
}

#[async_trait]
impl SourceProber for HttpProber {
    async fn probe(&self, audio_ref: Option<&str>) -> bool {
        self.inspect(audio_ref).await.reachable
    }
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "m4a" | "mp4" | "aac" => Some("audio/mp4"),
        "ogg" => Some("audio/ogg"),
        "flac" => Some("audio/flac"),
        _ => None,
    }
}
