//! C11: command dispatch. Three independent polls (§4.10): channel
//! command (with PIN-unlock handling), mute toggle, volume delta. Each
//! is a single tick function; the 10 Hz loop around each belongs to the
//! caller (`broadcast-server`'s watcher tasks) so the ticks stay
//! independently testable.

use broadcast_contracts::ids::ChannelNumber;
use broadcast_contracts::player::PlayerControl;
use chrono::NaiveDateTime;
use serde_json::json;
use tracing::info;

use crate::state::RuntimeState;
use crate::tuner::{Tuner, SCRAMBLE_FILTER_LABEL};

/// One channel-command tick (§4.10). Digit strings against a locked,
/// not-yet-unlocked current channel are compared to the PIN first; a
/// match unlocks in place (no retune), a mismatch falls through to a
/// direct channel-number tune attempt (literal boundary scenario 6, §8).
pub async fn channel_command_tick(
    player: &dyn PlayerControl,
    state: &RuntimeState,
    tuner: &Tuner,
    pin: &str,
    now: NaiveDateTime,
) {
    let Some(raw) = state.take_channel_cmd().await else {
        return;
    };

    let current = state.current_channel().await;
    let is_locked_and_unlockable = match current {
        Some(channel) => tuner.is_locked(channel).await && !state.is_parental_unlocked().await,
        None => false,
    };

    if is_locked_and_unlockable && raw == pin {
        info!("parental PIN matched; unlocking in place");
        state.set_parental_unlocked(true).await;
        player.remove_filter(SCRAMBLE_FILTER_LABEL).await;
        return;
    }

    let target = match raw.as_str() {
        "up" => current.and_then(|c| tuner.registry().up(c)),
        "down" => current.and_then(|c| tuner.registry().down(c)),
        digits => digits.parse::<u32>().ok().map(ChannelNumber),
    };

    if let Some(channel) = target {
        tuner.tune(channel, now).await;
        if let Some(station) = tuner.registry().resolve(channel) {
            player
                .command(&["show-text", &format!("{channel} {station}"), "3000"])
                .await;
        }
    }
}

/// One mute-file tick (§4.10): presence toggles mute.
pub async fn mute_tick(player: &dyn PlayerControl, state: &RuntimeState) {
    if !state.take_mute_cmd().await {
        return;
    }
    let currently_muted = player.get_property("mute").await.as_bool().unwrap_or(false);
    player.set_property("mute", json!(!currently_muted)).await;
}

/// One volume-file tick (§4.10): a signed delta, applied after unmuting.
pub async fn volume_tick(player: &dyn PlayerControl, state: &RuntimeState) {
    let Some(delta) = state.take_volume_cmd().await else {
        return;
    };
    player.set_property("mute", json!(false)).await;
    let current = player.get_property("volume").await.as_f64().unwrap_or(0.0);
    let next = (current + delta as f64).clamp(0.0, 100.0);
    player.set_property("volume", json!(next)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel_registry::ChannelRegistry;
    use crate::index_store::StationIndex;
    use crate::test_support::{FakePlayer, PlayerCall};
    use crate::tuner::{EpgAudio, EpgRenderer, TunerAssets, YoutubeResolver};
    use async_trait::async_trait;
    use broadcast_config::models::channel::Channel;
    use broadcast_config::models::{ChannelTable, ParentalConfig, ScheduleConfig};
    use broadcast_config::Paths;
    use broadcast_contracts::ids::Station;
    use broadcast_contracts::player::PlayerValue;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;

    struct NoopCollaborators;
    #[async_trait]
    impl EpgRenderer for NoopCollaborators {
        async fn start_refresh(&self) {}
        async fn stop_refresh(&self) {}
    }
    #[async_trait]
    impl EpgAudio for NoopCollaborators {
        async fn start(&self) {}
        async fn stop(&self) {}
    }
    #[async_trait]
    impl YoutubeResolver for NoopCollaborators {
        async fn resolve_live_url(&self, _station: &Station) -> Option<String> {
            None
        }
    }

    struct FixedIndex(StationIndex);
    impl crate::tuner::IndexLoader for FixedIndex {
        fn load(&self, _station: &Station) -> StationIndex {
            self.0.clone()
        }
    }

    fn build(locked: HashSet<ChannelNumber>) -> (Tuner, Arc<FakePlayer>, Arc<RuntimeState>) {
        let tmp = tempfile::tempdir().unwrap();
        let state = Arc::new(RuntimeState::new(Paths::new(tmp.path())));
        let channels = vec![
            Channel { number: ChannelNumber(1), station: Station::from("A"), enabled: true },
            Channel { number: ChannelNumber(999), station: Station::from("LOCKED"), enabled: true },
            Channel { number: ChannelNumber(42069), station: Station::from("B"), enabled: true },
        ];
        let registry = ChannelRegistry::new(ChannelTable { channels });
        let parental = ParentalConfig {
            pin: "4242".into(),
            locked,
            auto_lock: HashSet::new(),
            always_mute: HashSet::new(),
        };
        let assets = TunerAssets {
            snow_placeholder: "/assets/snow.mp4".into(),
            test_pattern_image: "/assets/test_pattern.png".into(),
            off_air_animation: "/assets/off_air.mp4".into(),
            weather_urls: HashMap::new(),
            youtube_stations: HashMap::new(),
        };
        let player = Arc::new(FakePlayer::default());
        let noop = Arc::new(NoopCollaborators);
        let index = FixedIndex(StationIndex::parse("/a.mp4\t30\n"));
        let tuner = Tuner::new(
            player.clone(),
            state.clone(),
            registry,
            ScheduleConfig::default(),
            parental,
            assets,
            Arc::new(index),
            noop.clone(),
            noop.clone(),
            noop,
        );
        (tuner, player, state)
    }

    fn now() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2026, 7, 27).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    /// Literal boundary scenario 6 (§8): PIN match unlocks in place with
    /// no retune; the *next* command with the same digits is then treated
    /// as a channel number.
    #[tokio::test]
    async fn pin_match_unlocks_in_place_then_next_same_digits_is_a_channel() {
        let (tuner, player, state) = build(HashSet::from([ChannelNumber(999)]));
        state.set_current_channel(ChannelNumber(999)).await;
        tokio::fs::create_dir_all(state.paths().state_dir()).await.unwrap();
        tokio::fs::write(state.paths().channel_cmd(), "42069").await.unwrap();

        channel_command_tick(player.as_ref(), &state, &tuner, "42069", now()).await;
        assert!(state.is_parental_unlocked().await);
        assert_eq!(state.current_channel().await, Some(ChannelNumber(999)));
        assert!(player
            .calls
            .lock()
            .unwrap()
            .iter()
            .any(|c| matches!(c, PlayerCall::RemoveFilter(l) if l == "scramble")));

        player.calls.lock().unwrap().clear();
        tokio::fs::write(state.paths().channel_cmd(), "42069").await.unwrap();
        channel_command_tick(player.as_ref(), &state, &tuner, "4242", now()).await;
        assert_eq!(state.current_channel().await, Some(ChannelNumber(42069)));
    }

    #[tokio::test]
    async fn pin_mismatch_falls_through_to_channel_tune() {
        let (tuner, _player, state) = build(HashSet::from([ChannelNumber(999)]));
        state.set_current_channel(ChannelNumber(999)).await;
        tokio::fs::create_dir_all(state.paths().state_dir()).await.unwrap();
        tokio::fs::write(state.paths().channel_cmd(), "1").await.unwrap();

        let dummy_player = FakePlayer::default();
        channel_command_tick(&dummy_player, &state, &tuner, "4242", now()).await;
        assert!(!state.is_parental_unlocked().await);
        assert_eq!(state.current_channel().await, Some(ChannelNumber(1)));
    }

    #[tokio::test]
    async fn up_and_down_commands_navigate_enabled_channels() {
        let (tuner, _player, state) = build(HashSet::new());
        state.set_current_channel(ChannelNumber(1)).await;
        tokio::fs::create_dir_all(state.paths().state_dir()).await.unwrap();
        tokio::fs::write(state.paths().channel_cmd(), "up").await.unwrap();

        let dummy_player = FakePlayer::default();
        channel_command_tick(&dummy_player, &state, &tuner, "4242", now()).await;
        assert_eq!(state.current_channel().await, Some(ChannelNumber(999)));
    }

    #[tokio::test]
    async fn mute_tick_toggles_property() {
        let player = FakePlayer::default();
        player.set_reply("mute", PlayerValue::Bool(false));
        let tmp = tempfile::tempdir().unwrap();
        let state = RuntimeState::new(Paths::new(tmp.path()));
        tokio::fs::create_dir_all(state.paths().state_dir()).await.unwrap();
        tokio::fs::write(state.paths().mute_cmd(), "").await.unwrap();

        mute_tick(&player, &state).await;
        assert!(player
            .calls
            .lock()
            .unwrap()
            .iter()
            .any(|c| matches!(c, PlayerCall::SetProperty(name, v) if name == "mute" && v == &json!(true))));
    }

    #[tokio::test]
    async fn volume_tick_unmutes_and_applies_delta() {
        let player = FakePlayer::default();
        player.set_reply("volume", PlayerValue::Number(50.0));
        let tmp = tempfile::tempdir().unwrap();
        let state = RuntimeState::new(Paths::new(tmp.path()));
        tokio::fs::create_dir_all(state.paths().state_dir()).await.unwrap();
        tokio::fs::write(state.paths().volume_cmd(), "-10").await.unwrap();

        volume_tick(&player, &state).await;
        let calls = player.calls.lock().unwrap();
        assert!(calls.iter().any(|c| matches!(c, PlayerCall::SetProperty(n, v) if n == "mute" && v == &json!(false))));
        assert!(calls.iter().any(|c| matches!(c, PlayerCall::SetProperty(n, v) if n == "volume" && v == &json!(40.0))));
    }
}
