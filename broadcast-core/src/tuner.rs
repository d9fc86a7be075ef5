//! C8: the tuner. Single entry point `tune(channel)`, dispatching to the
//! right content source in priority order and resetting transient,
//! per-station state up front (§4.7).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use broadcast_config::models::{ParentalConfig, ScheduleConfig};
use broadcast_contracts::ids::{ChannelNumber, Station};
use broadcast_contracts::player::PlayerControl;
use chrono::NaiveDateTime;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::channel_registry::ChannelRegistry;
use crate::error::ControllerError;
use crate::index_store::StationIndex;
use crate::state::RuntimeState;
use crate::{epoch_picker, mtv_picker, schedule, scheduled_picker};

/// The labeled video filter that obscures a parentally-locked channel:
/// hue rotation + noise + RGB shift (§4.7, glossary "Scramble").
pub const SCRAMBLE_FILTER_LABEL: &str = "scramble";
const SCRAMBLE_FILTER_SPEC: &str = "hue=h=90,noise=alls=20:allf=t,lutrgb=r=255-val:g=val:b=255-val";

/// Starts/stops background music on the EPG channel. Implemented by a
/// second player-process lifecycle (§5: "Music playback on the EPG
/// channel uses a second player instance").
#[async_trait]
pub trait EpgAudio: Send + Sync {
    async fn start(&self);
    async fn stop(&self);
}

/// Starts/stops the EPG renderer's own refresh loop; out of scope beyond
/// lifecycle ownership (§4.7 step 1).
#[async_trait]
pub trait EpgRenderer: Send + Sync {
    async fn start_refresh(&self);
    async fn stop_refresh(&self);
}

/// Resolves a YouTube-configured station to a live stream URL (§4.7 step 4).
#[async_trait]
pub trait YoutubeResolver: Send + Sync {
    async fn resolve_live_url(&self, station: &Station) -> Option<String>;
}

/// Loads a station's index from wherever it lives on disk (§4.3's "the
/// controller re-reads on demand"). Implemented by the server binary over
/// `broadcast_config::Paths`.
pub trait IndexLoader: Send + Sync {
    fn load(&self, station: &Station) -> StationIndex;
}

/// Static asset paths the tuner loads directly (snow placeholder, sign-off
/// test pattern, off-air animation) and per-station configuration that
/// isn't part of the schedule/parental/EAS documents (weather URLs,
/// YouTube-configured stations).
#[derive(Debug, Clone, Default)]
pub struct TunerAssets {
    pub snow_placeholder: String,
    pub test_pattern_image: String,
    pub off_air_animation: String,
    pub weather_urls: HashMap<Station, String>,
    /// Stations dispatched to the YouTube resolver collaborator (§4.7
    /// step 4); the resolver owns its own station -> source mapping.
    pub youtube_stations: HashMap<Station, ()>,
}

pub struct Tuner {
    player: Arc<dyn PlayerControl>,
    state: Arc<RuntimeState>,
    registry: ChannelRegistry,
    schedule: RwLock<ScheduleConfig>,
    parental: RwLock<ParentalConfig>,
    assets: TunerAssets,
    index_loader: Arc<dyn IndexLoader>,
    epg_renderer: Arc<dyn EpgRenderer>,
    epg_audio: Arc<dyn EpgAudio>,
    youtube: Arc<dyn YoutubeResolver>,
}

impl Tuner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        player: Arc<dyn PlayerControl>,
        state: Arc<RuntimeState>,
        registry: ChannelRegistry,
        schedule: ScheduleConfig,
        parental: ParentalConfig,
        assets: TunerAssets,
        index_loader: Arc<dyn IndexLoader>,
        epg_renderer: Arc<dyn EpgRenderer>,
        epg_audio: Arc<dyn EpgAudio>,
        youtube: Arc<dyn YoutubeResolver>,
    ) -> Self {
        Self {
            player,
            state,
            registry,
            schedule: RwLock::new(schedule),
            parental: RwLock::new(parental),
            assets,
            index_loader,
            epg_renderer,
            epg_audio,
            youtube,
        }
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub async fn is_locked(&self, channel: ChannelNumber) -> bool {
        self.parental.read().await.locked.contains(&channel)
    }

    /// Swaps in a freshly-loaded schedule, picked up by the config-reload
    /// watcher on the next mtime change (§9 "reload on file-mtime change").
    pub async fn reload_schedule(&self, schedule: ScheduleConfig) {
        *self.schedule.write().await = schedule;
    }

    /// Swaps in a freshly-loaded parental policy. A channel already
    /// unlocked for the session stays unlocked; only the locked/auto-lock
    /// channel sets and the PIN change.
    pub async fn reload_parental(&self, parental: ParentalConfig) {
        *self.parental.write().await = parental;
    }

    /// Pre-transition teardown shared by every call (§4.7): clear the
    /// session unlock flag, drop the scramble filter, reset OSD, clear MTV
    /// metadata, and re-lock auto-lock channels other than the one we're
    /// tuning to. Re-locking is modeled by clearing those channels'
    /// off-air flag, the only other per-channel runtime-state slot,
    /// since the spec ties "re-locking auto-lock channels" to the same
    /// teardown step as "delete per-channel off-air flags for other
    /// channels" (see DESIGN.md for the reasoning).
    async fn pre_transition_teardown(&self, target: ChannelNumber) {
        self.state.set_parental_unlocked(false).await;
        self.player.remove_filter(SCRAMBLE_FILTER_LABEL).await;
        self.player.command(&["osd-msg1", ""]).await;
        self.state.clear_mtv_metadata().await;

        let auto_lock = self.parental.read().await.auto_lock.clone();
        for &channel in auto_lock.iter() {
            if channel != target {
                self.state.set_off_air(channel, false).await;
            }
        }

        self.epg_renderer.stop_refresh().await;
        self.epg_audio.stop().await;
    }

    /// The single entry point: tune to `channel` at wall-clock `now`.
    pub async fn tune(&self, channel: ChannelNumber, now: NaiveDateTime) {
        self.pre_transition_teardown(channel).await;

        let Some(station) = self.registry.resolve(channel).cloned() else {
            warn!(%channel, "tune requested for unresolvable channel");
            return;
        };

        self.state.set_current_channel(channel).await;

        if station.0 == "EPG" {
            self.epg_renderer.start_refresh().await;
            self.epg_audio.start().await;
        } else if station.0 == "WEATHER" {
            let url = self.assets.weather_urls.get(&station).cloned();
            match url {
                Some(url) => {
                    let _ = self.player.load(&url, 0.0).await;
                }
                None => {
                    warn!(%station, "no weather URL configured");
                    let _ = self.player.load(&self.assets.snow_placeholder, 0.0).await;
                }
            }
        } else if station.is_mtv_family() {
            self.tune_mtv(&station, now).await;
        } else if self.assets.youtube_stations.contains_key(&station) {
            self.tune_youtube(&station).await;
        } else {
            self.tune_scheduled_or_fallback(channel, &station, now).await;
        }

        self.apply_parental_lock(channel).await;
    }

    /// Advances within the currently-scheduled show to its next item at
    /// offset 0 via C6's `pick_next_same_show` (§4.5, §4.8 "advance to next
    /// episode"), instead of re-resolving the schedule from scratch the way
    /// a full `tune` would. Falls back to `tune` when the schedule no
    /// longer resolves to a directory-backed show at `now` (sign-off,
    /// sign-on, or an unscheduled gap) — a case `pick_next_same_show` has
    /// no show to advance within.
    pub async fn advance_to_next_episode(&self, channel: ChannelNumber, now: NaiveDateTime) {
        let Some(station) = self.registry.resolve(channel).cloned() else {
            self.tune(channel, now).await;
            return;
        };

        let directory = {
            let schedule = self.schedule.read().await;
            schedule::resolve(&schedule, channel, now).and_then(|show| show.directory)
        };

        if let Some(directory) = directory {
            let index = self.index_loader.load(&station);
            let now_seconds = now.and_utc().timestamp().max(0) as u64;
            if let Some(pick) = scheduled_picker::pick_next_same_show(&index, &directory, now_seconds) {
                let _ = self.player.load(&pick.path, pick.offset_seconds as f64).await;
                return;
            }
        }

        self.tune(channel, now).await;
    }

    async fn tune_mtv(&self, station: &Station, now: NaiveDateTime) {
        let index = self.index_loader.load(station);
        let now_seconds = now.and_utc().timestamp().max(0) as u64;
        match mtv_picker::pick(&index, now_seconds) {
            Some(pick) => {
                let _ = self.player.load(&pick.path, pick.offset_seconds as f64).await;
                let metadata = json!({ "path": pick.path, "offset_seconds": pick.offset_seconds });
                self.state.set_mtv_metadata(&metadata.to_string()).await;
            }
            None => {
                let err = ControllerError::MissingContent(station.to_string());
                warn!(error = %err, "falling back to snow");
                let _ = self.player.load(&self.assets.snow_placeholder, 0.0).await;
            }
        }
    }

    async fn tune_youtube(&self, station: &Station) {
        match self.youtube.resolve_live_url(station).await {
            Some(url) => {
                if let Err(err) = self.player.load(&url, 0.0).await.map_err(ControllerError::from) {
                    warn!(error = %err, %station, "failed to load resolved YouTube stream");
                }
            }
            None => {
                let err = ControllerError::InvalidCommand(format!("youtube resolution failed for {station}"));
                warn!(error = %err, "falling back to snow");
                let _ = self.player.load(&self.assets.snow_placeholder, 0.0).await;
            }
        }
    }

    async fn tune_scheduled_or_fallback(&self, channel: ChannelNumber, station: &Station, now: NaiveDateTime) {
        let resolved = {
            let schedule = self.schedule.read().await;
            schedule::resolve(&schedule, channel, now)
        };

        match resolved {
            Some(show) if show.show_id.is_signoff() => {
                if self.state.is_off_air(channel).await {
                    let _ = self.player.load(&self.assets.test_pattern_image, 0.0).await;
                } else {
                    let _ = self.player.load(&self.assets.off_air_animation, 0.0).await;
                    self.state.set_off_air(channel, true).await;
                }
                return;
            }
            Some(show) if show.show_id.is_signon() => {
                self.state.set_off_air(channel, false).await;
                let _ = self.player.load(&self.assets.off_air_animation, 0.0).await;
                return;
            }
            Some(show) => {
                if let Some(directory) = &show.directory {
                    let index = self.index_loader.load(station);
                    let now_seconds = now.and_utc().timestamp().max(0) as u64;
                    if let Some(pick) = scheduled_picker::pick_in_show(&index, directory, now_seconds) {
                        let _ = self.player.load(&pick.path, pick.offset_seconds as f64).await;
                        return;
                    }
                }
            }
            None => {}
        }

        self.epoch_fallback(station, now).await;
    }

    async fn epoch_fallback(&self, station: &Station, now: NaiveDateTime) {
        let index = self.index_loader.load(station);
        let now_seconds = now.and_utc().timestamp().max(0) as u64;
        match epoch_picker::pick(&index, now_seconds) {
            Some(pick) => {
                let _ = self.player.load(&pick.path, pick.offset_seconds as f64).await;
            }
            None => {
                let err = ControllerError::MissingContent(station.to_string());
                warn!(error = %err, "epoch fallback found no content; falling back to snow");
                let _ = self.player.load(&self.assets.snow_placeholder, 0.0).await;
            }
        }
    }

    async fn apply_parental_lock(&self, channel: ChannelNumber) {
        if !self.parental.read().await.locked.contains(&channel) {
            return;
        }
        if self.state.is_parental_unlocked().await {
            return;
        }
        info!(%channel, "channel is parentally locked; applying scramble");
        self.player
            .add_filter(SCRAMBLE_FILTER_LABEL, SCRAMBLE_FILTER_SPEC)
            .await;
        self.player.set_property("mute", json!(true)).await;
    }
}
