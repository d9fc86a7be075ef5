//! C9: interstitial state machine. Pure transition core (`Machine::step`)
//! so the half-hour countdown math and the k-counter policy can be tested
//! without a player or clock; a thin async driver applies the actions it
//! emits (§4.8, §9 "implement as two components sharing a small state
//! value by reference/handle").

use crate::tuner::Tuner;
use broadcast_contracts::ids::ChannelNumber;
use broadcast_contracts::player::PlayerControl;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterstitialState {
    Content,
    Interstitial,
    Countdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationTag {
    Mtv,
    Epg,
    Weather,
    SignOff,
    SignOn,
    Normal,
}

/// One second's worth of observations fed into the machine. Everything
/// here is read by the driver from the player/config/schedule, never
/// computed by the machine itself.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub eof_reached: bool,
    pub idle_active: bool,
    pub station_tag: StationTag,
    pub eas_active: bool,
    pub interstitials_allowed: bool,
    pub schedule_active: bool,
    pub seconds_to_next_half_hour: u64,
    pub mtv_position_seconds: Option<u64>,
    pub mtv_duration_seconds: Option<u64>,
    /// Result of an external fair-coin flip, supplied by the caller so the
    /// machine itself stays deterministic and testable (§4.8 unscheduled
    /// k=2 policy).
    pub coin_flip_heads: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PickNextMtv,
    ShowMtvOverlay,
    LoadTestPattern,
    AdvanceNextEpisode,
    Retune,
    PlayBumper,
    PlayCommercial,
    EnterCountdown { seek_seconds: u64 },
    ExitToContentAndAdvance,
}

/// The countdown artifact is a fixed 61-second video numbering 61->0
/// (§4.8, §9 Open Question 3): `seek = clamp(61 - remaining, 0, 60)`.
pub fn countdown_seek(remaining_seconds: u64) -> u64 {
    61u64.saturating_sub(remaining_seconds).min(60)
}

#[derive(Debug, Clone)]
pub struct Machine {
    state: InterstitialState,
    k: u32,
    mtv_stuck_ticks: u32,
    last_mtv_position: Option<u64>,
}

impl Default for Machine {
    fn default() -> Self {
        Self {
            state: InterstitialState::Content,
            k: 0,
            mtv_stuck_ticks: 0,
            last_mtv_position: None,
        }
    }
}

/// Consecutive unchanged-integer-second ticks before MTV playback is
/// considered stuck (§4.8, §9 Open Question 2).
const MTV_STUCK_TICKS: u32 = 5;
/// Re-show the MTV overlay once this many seconds remain in the item.
const MTV_OVERLAY_WINDOW_SECONDS: u64 = 7;

impl Machine {
    pub fn state(&self) -> InterstitialState {
        self.state
    }

    pub fn step(&mut self, tick: &Tick) -> Vec<Action> {
        let mut actions = Vec::new();

        if tick.eas_active {
            return actions;
        }
        if matches!(tick.station_tag, StationTag::Epg | StationTag::Weather) {
            return actions;
        }

        if tick.station_tag == StationTag::Mtv {
            if let (Some(pos), Some(dur)) = (tick.mtv_position_seconds, tick.mtv_duration_seconds) {
                if dur > 0 && pos + MTV_OVERLAY_WINDOW_SECONDS >= dur {
                    actions.push(Action::ShowMtvOverlay);
                }
            }

            let stuck = match (self.last_mtv_position, tick.mtv_position_seconds) {
                (Some(last), Some(cur)) if last == cur => {
                    self.mtv_stuck_ticks += 1;
                    self.mtv_stuck_ticks >= MTV_STUCK_TICKS
                }
                // First observed position for this item: seed the counter
                // at 1 rather than 0, so it's already "stuck for one tick"
                // rather than requiring an extra unchanged comparison to
                // start counting.
                (None, Some(_)) => {
                    self.mtv_stuck_ticks = 1;
                    false
                }
                _ => {
                    self.mtv_stuck_ticks = 0;
                    false
                }
            };
            self.last_mtv_position = tick.mtv_position_seconds;

            if stuck || tick.eof_reached || tick.idle_active {
                actions.push(Action::PickNextMtv);
                self.mtv_stuck_ticks = 0;
                self.last_mtv_position = None;
            }
            return actions;
        }

        match self.state {
            InterstitialState::Content => {
                if !(tick.eof_reached || tick.idle_active) {
                    return actions;
                }
                match tick.station_tag {
                    StationTag::SignOff => actions.push(Action::LoadTestPattern),
                    StationTag::SignOn => actions.push(Action::AdvanceNextEpisode),
                    _ if tick.interstitials_allowed => {
                        self.k = 0;
                        self.state = InterstitialState::Interstitial;
                        actions.push(Action::PlayBumper);
                    }
                    _ => actions.push(Action::Retune),
                }
            }
            InterstitialState::Interstitial => {
                if !tick.eof_reached {
                    return actions;
                }
                if tick.schedule_active {
                    if tick.seconds_to_next_half_hour <= 60 {
                        let seek = countdown_seek(tick.seconds_to_next_half_hour);
                        self.state = InterstitialState::Countdown;
                        actions.push(Action::EnterCountdown { seek_seconds: seek });
                    } else if self.k < 4 {
                        self.k += 1;
                        if self.k % 2 == 1 {
                            actions.push(Action::PlayCommercial);
                        } else {
                            actions.push(Action::PlayBumper);
                        }
                    } else {
                        self.state = InterstitialState::Content;
                        actions.push(Action::ExitToContentAndAdvance);
                    }
                } else {
                    self.k += 1;
                    match self.k {
                        1 => actions.push(Action::PlayCommercial),
                        2 => {
                            if tick.coin_flip_heads {
                                actions.push(Action::PlayCommercial);
                            } else {
                                self.state = InterstitialState::Content;
                                actions.push(Action::ExitToContentAndAdvance);
                            }
                        }
                        _ => {
                            self.state = InterstitialState::Content;
                            actions.push(Action::ExitToContentAndAdvance);
                        }
                    }
                }
            }
            InterstitialState::Countdown => {
                if tick.eof_reached {
                    self.state = InterstitialState::Content;
                    actions.push(Action::ExitToContentAndAdvance);
                }
            }
        }

        actions
    }
}

/// Applies one tick's actions against the real player/tuner. Kept thin:
/// all the decision logic lives in `Machine::step`, which is what the
/// unit tests exercise.
pub async fn apply(
    player: &dyn PlayerControl,
    tuner: &Tuner,
    current_channel: ChannelNumber,
    now: NaiveDateTime,
    actions: &[Action],
) {
    for action in actions {
        match action {
            Action::PickNextMtv | Action::Retune => tuner.tune(current_channel, now).await,
            Action::ShowMtvOverlay => {
                player.command(&["show-text", "${metadata}", "3000"]).await;
            }
            Action::LoadTestPattern => {
                tuner.tune(current_channel, now).await;
            }
            Action::AdvanceNextEpisode | Action::ExitToContentAndAdvance => {
                tuner.advance_to_next_episode(current_channel, now).await;
            }
            Action::PlayBumper => {
                player.command(&["loadfile", "/assets/bumper.mp4", "replace"]).await;
            }
            Action::PlayCommercial => {
                player.command(&["loadfile", "/assets/commercial.mp4", "replace"]).await;
            }
            Action::EnterCountdown { seek_seconds } => {
                let _ = player.load("/assets/countdown_61.mp4", *seek_seconds as f64).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_tick() -> Tick {
        Tick {
            eof_reached: false,
            idle_active: false,
            station_tag: StationTag::Normal,
            eas_active: false,
            interstitials_allowed: true,
            schedule_active: true,
            seconds_to_next_half_hour: 600,
            mtv_position_seconds: None,
            mtv_duration_seconds: None,
            coin_flip_heads: false,
        }
    }

    #[test]
    fn eas_active_yields_no_actions() {
        let mut m = Machine::default();
        let tick = Tick { eas_active: true, eof_reached: true, ..base_tick() };
        assert!(m.step(&tick).is_empty());
    }

    #[test]
    fn epg_and_weather_yield() {
        let mut m = Machine::default();
        let tick = Tick { station_tag: StationTag::Epg, eof_reached: true, ..base_tick() };
        assert!(m.step(&tick).is_empty());
    }

    #[test]
    fn content_eof_enters_interstitial_and_plays_bumper() {
        let mut m = Machine::default();
        let tick = Tick { eof_reached: true, ..base_tick() };
        let actions = m.step(&tick);
        assert_eq!(actions, vec![Action::PlayBumper]);
        assert_eq!(m.state(), InterstitialState::Interstitial);
    }

    #[test]
    fn content_eof_without_interstitials_allowed_retunes() {
        let mut m = Machine::default();
        let tick = Tick { eof_reached: true, interstitials_allowed: false, ..base_tick() };
        assert_eq!(m.step(&tick), vec![Action::Retune]);
        assert_eq!(m.state(), InterstitialState::Content);
    }

    /// Literal boundary scenario 3 (§8): content EOF 16s before a
    /// half-hour boundary enters COUNTDOWN seeked to 61-16=45; after the
    /// countdown's own EOF, exits to content and advances.
    #[test]
    fn literal_boundary_scenario_3_countdown_math() {
        let mut m = Machine::default();
        let enter = Tick { eof_reached: true, ..base_tick() };
        assert_eq!(m.step(&enter), vec![Action::PlayBumper]);

        let countdown_entry = Tick {
            eof_reached: true,
            seconds_to_next_half_hour: 16,
            ..base_tick()
        };
        let actions = m.step(&countdown_entry);
        assert_eq!(actions, vec![Action::EnterCountdown { seek_seconds: 45 }]);
        assert_eq!(m.state(), InterstitialState::Countdown);

        let countdown_eof = Tick { eof_reached: true, ..base_tick() };
        assert_eq!(m.step(&countdown_eof), vec![Action::ExitToContentAndAdvance]);
        assert_eq!(m.state(), InterstitialState::Content);
    }

    /// Literal boundary scenario 4 (§8): scheduled mode, remaining=600,
    /// k already at 4 -> exit to content and advance, no fifth interstitial.
    #[test]
    fn literal_boundary_scenario_4_interstitial_cap() {
        let mut m = Machine::default();
        m.step(&Tick { eof_reached: true, ..base_tick() }); // enters INTERSTITIAL, k=0, bumper
        for expected_k in 1..=4u32 {
            let actions = m.step(&Tick { eof_reached: true, ..base_tick() });
            if expected_k % 2 == 1 {
                assert_eq!(actions, vec![Action::PlayCommercial]);
            } else {
                assert_eq!(actions, vec![Action::PlayBumper]);
            }
        }
        // k is now 4; the next end-of-item must exit rather than play a 5th.
        let actions = m.step(&Tick { eof_reached: true, ..base_tick() });
        assert_eq!(actions, vec![Action::ExitToContentAndAdvance]);
        assert_eq!(m.state(), InterstitialState::Content);
    }

    #[test]
    fn unscheduled_policy_k1_commercial_k2_coin_k3_exit() {
        let mut m = Machine::default();
        let unscheduled = Tick { schedule_active: false, ..base_tick() };
        m.step(&Tick { eof_reached: true, ..unscheduled });
        assert_eq!(
            m.step(&Tick { eof_reached: true, ..unscheduled }),
            vec![Action::PlayCommercial]
        );
        assert_eq!(
            m.step(&Tick { eof_reached: true, coin_flip_heads: false, ..unscheduled }),
            vec![Action::ExitToContentAndAdvance]
        );
    }

    #[test]
    fn unscheduled_k2_heads_plays_another_commercial() {
        let mut m = Machine::default();
        let unscheduled = Tick { schedule_active: false, ..base_tick() };
        m.step(&Tick { eof_reached: true, ..unscheduled });
        m.step(&Tick { eof_reached: true, ..unscheduled });
        let actions = m.step(&Tick { eof_reached: true, coin_flip_heads: true, ..unscheduled });
        assert_eq!(actions, vec![Action::PlayCommercial]);
        assert_eq!(m.state(), InterstitialState::Interstitial);
    }

    #[test]
    fn mtv_stuck_detection_forces_next_pick_after_five_ticks() {
        let mut m = Machine::default();
        let mut tick = Tick {
            station_tag: StationTag::Mtv,
            mtv_position_seconds: Some(10),
            mtv_duration_seconds: Some(120),
            ..base_tick()
        };
        for _ in 0..4 {
            assert!(m.step(&tick).is_empty());
        }
        tick.mtv_position_seconds = Some(10);
        assert_eq!(m.step(&tick), vec![Action::PickNextMtv]);
    }

    #[test]
    fn mtv_overlay_shows_in_final_seven_seconds() {
        let mut m = Machine::default();
        let tick = Tick {
            station_tag: StationTag::Mtv,
            mtv_position_seconds: Some(114),
            mtv_duration_seconds: Some(120),
            ..base_tick()
        };
        assert_eq!(m.step(&tick), vec![Action::ShowMtvOverlay]);
    }

    #[test]
    fn countdown_seek_clamps_to_valid_range() {
        assert_eq!(countdown_seek(61), 0);
        assert_eq!(countdown_seek(0), 60);
        assert_eq!(countdown_seek(16), 45);
        assert_eq!(countdown_seek(1000), 0);
    }
}
