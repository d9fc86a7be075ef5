//! C10: EAS preemption. Two cooperating watchers (§4.9): the alert runner
//! drains the pending-alert directory and temporarily owns playback; the
//! crawl keeper re-asserts the crawl overlay filter until it expires.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use broadcast_config::models::EasConfig;
use broadcast_contracts::ids::ChannelNumber;
use broadcast_contracts::player::PlayerControl;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::state::RuntimeState;
use crate::tuner::Tuner;

/// The crawl filter's label (§4.9, §5 "Filter isolation"): distinct from
/// the scramble filter's label so installing/removing one never disturbs
/// the other.
pub const CRAWL_FILTER_LABEL: &str = "eas_crawl";
const MINIMUM_DISPLAY_SECONDS: u64 = 60;
const DEFAULT_EXPIRY_SECONDS: i64 = 120;
const KEEP_GENERATED_VIDEOS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertDescriptor {
    pub event: String,
    #[serde(default)]
    pub areas: Vec<String>,
    #[serde(default)]
    pub headline: String,
    pub expires: Option<DateTime<Utc>>,
}

pub fn parse_descriptor(text: &str) -> Option<AlertDescriptor> {
    serde_json::from_str(text).ok()
}

/// `EVENT for AREAS until EXPIRES. HEADLINE`, omitting missing parts
/// (§4.9). `EXPIRES` is rendered as a local 12-hour clock time to match
/// the literal boundary scenario's `04:30 PM`.
pub fn crawl_text(descriptor: &AlertDescriptor, expiry: DateTime<Utc>) -> String {
    let mut text = descriptor.event.clone();
    if !descriptor.areas.is_empty() {
        text.push_str(" for ");
        text.push_str(&descriptor.areas.join(", "));
    }
    text.push_str(" until ");
    text.push_str(&expiry.format("%I:%M %p").to_string().trim_start_matches('0').to_string());
    text.push('.');
    if !descriptor.headline.is_empty() {
        text.push(' ');
        text.push_str(&descriptor.headline);
    }
    text
}

pub fn resolve_expiry(descriptor: &AlertDescriptor, now: DateTime<Utc>) -> DateTime<Utc> {
    descriptor
        .expires
        .unwrap_or_else(|| now + chrono::Duration::seconds(DEFAULT_EXPIRY_SECONDS))
}

/// Renders an alert descriptor into a playable video file. Implemented by
/// an external collaborator (§1 "Out of scope"); failure for one alert
/// does not stop the queue (§4.9 step 4, §7).
#[async_trait]
pub trait AlertVideoGenerator: Send + Sync {
    async fn generate(&self, descriptor: &AlertDescriptor, out_dir: &Path) -> Option<PathBuf>;
}

async fn list_pending(dir: &Path) -> Vec<PathBuf> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(_) => return Vec::new(),
    };
    let mut paths = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        paths.push(entry.path());
    }
    paths.sort();
    paths
}

async fn prune_generated(dir: &Path) {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(_) => return,
    };
    let mut files = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        if let Ok(metadata) = entry.metadata().await {
            if let Ok(modified) = metadata.modified() {
                files.push((modified, entry.path()));
            }
        }
    }
    files.sort_by_key(|(modified, _)| *modified);
    if files.len() > KEEP_GENERATED_VIDEOS {
        for (_, path) in &files[..files.len() - KEEP_GENERATED_VIDEOS] {
            let _ = tokio::fs::remove_file(path).await;
        }
    }
}

/// One pass of the alert runner (§4.9). The 1 Hz outer loop belongs to the
/// caller (`broadcast-server`'s watcher task); this function is the unit
/// of work triggered once pending alerts are found, so it can be driven
/// deterministically in tests.
pub async fn run_once(
    player: &dyn PlayerControl,
    state: &RuntimeState,
    tuner: &Tuner,
    eas: &EasConfig,
    generator: &dyn AlertVideoGenerator,
    paths: &broadcast_config::Paths,
) {
    if state.is_eas_active().await {
        return;
    }

    let pending_dir = paths.pending_alerts_dir();
    let pending = list_pending(&pending_dir).await;
    if pending.is_empty() {
        return;
    }

    let Some(current_channel) = state.current_channel().await else {
        return;
    };
    let Some(current_station) = tuner.registry().resolve(current_channel).cloned() else {
        return;
    };
    if eas.is_exempt(&current_station) {
        for path in &pending {
            let _ = tokio::fs::remove_file(path).await;
        }
        return;
    }

    state.set_eas_resume_channel(current_channel).await;
    state.set_eas_active(true).await;
    let start = tokio::time::Instant::now();
    info!(count = pending.len(), "EAS preemption: draining pending alerts");

    let mut last_crawl: Option<(String, i64)> = None;

    'alerts: for pending_path in &pending {
        let Ok(text) = tokio::fs::read_to_string(pending_path).await else {
            let _ = tokio::fs::remove_file(pending_path).await;
            continue;
        };
        let Some(descriptor) = parse_descriptor(&text) else {
            warn!(path = %pending_path.display(), "malformed alert descriptor");
            let _ = tokio::fs::remove_file(pending_path).await;
            continue;
        };

        let now = Utc::now();
        let expiry = resolve_expiry(&descriptor, now);
        let text = crawl_text(&descriptor, expiry);
        state.set_eas_crawl(&text, expiry.timestamp()).await;
        last_crawl = Some((text, expiry.timestamp()));

        let generated_dir = paths.generated_alerts_dir();
        let Some(video_path) = generator.generate(&descriptor, &generated_dir).await else {
            warn!(path = %pending_path.display(), "alert video generation failed");
            let _ = tokio::fs::remove_file(pending_path).await;
            continue;
        };

        let _ = tokio::fs::remove_file(pending_path).await;
        let video_path_str = video_path.to_string_lossy().into_owned();
        let _ = player.load(&video_path_str, 0.0).await;

        tokio::time::sleep(Duration::from_millis(2000)).await;
        loop {
            let eof = player.get_property("eof-reached").await.as_bool().unwrap_or(false);
            let current_path = player.get_property("path").await;
            if let Some(p) = current_path.as_str() {
                if p != video_path_str {
                    for remaining in &pending {
                        let _ = tokio::fs::remove_file(remaining).await;
                    }
                    break 'alerts;
                }
            }
            if eof {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    let elapsed = start.elapsed();
    if elapsed < Duration::from_secs(MINIMUM_DISPLAY_SECONDS) {
        tokio::time::sleep(Duration::from_secs(MINIMUM_DISPLAY_SECONDS) - elapsed).await;
    }

    state.set_eas_active(false).await;

    let resume_channel = state.eas_resume_channel().await.unwrap_or(current_channel);
    tuner.tune(resume_channel, chrono::Local::now().naive_local()).await;

    if let Some(resumed_station) = tuner.registry().resolve(resume_channel) {
        if last_crawl.is_some() && !eas.is_exempt(resumed_station) {
            state.set_crawl_active(true).await;
            player
                .add_filter(CRAWL_FILTER_LABEL, &crawl_filter_spec(paths))
                .await;
        }
    }

    prune_generated(&paths.generated_alerts_dir()).await;
}

fn crawl_filter_spec(paths: &broadcast_config::Paths) -> String {
    let font = paths.crawl_font();
    format!(
        "drawbox=y=0:h=40:color=red@0.8:t=fill,drawtext=fontfile={}:text='${{eas_crawl_text}}':x=w-mod(t*80\\,w+tw):y=50",
        font.display()
    )
}

/// Re-applies the crawl filter idempotently until expiry (§4.9). Runs at
/// its own slow cadence (every ~3 s is enough, per §5); the caller owns
/// the sleep between calls so tests can drive a single pass.
pub async fn crawl_keeper_tick(player: &dyn PlayerControl, state: &RuntimeState, paths: &broadcast_config::Paths) {
    if !state.is_crawl_active().await {
        return;
    }
    let expired = match state.eas_crawl().await {
        Some((_, expiry)) => Utc::now().timestamp() >= expiry,
        None => true,
    };
    if expired {
        player.remove_filter(CRAWL_FILTER_LABEL).await;
        state.clear_eas_crawl().await;
    } else {
        player
            .add_filter(CRAWL_FILTER_LABEL, &crawl_filter_spec(paths))
            .await;
    }
}
