use std::collections::HashMap;
use std::path::{Path, PathBuf};

use broadcast_contracts::ids::{ChannelNumber, ShowId};
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// Day of week, matching the lowercase keys used in the schedule JSON
/// (§6: "a default weekly schedule keyed by lowercase day names").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn from_chrono(day: chrono::Weekday) -> Self {
        use chrono::Weekday as C;
        match day {
            C::Mon => Weekday::Monday,
            C::Tue => Weekday::Tuesday,
            C::Wed => Weekday::Wednesday,
            C::Thu => Weekday::Thursday,
            C::Fri => Weekday::Friday,
            C::Sat => Weekday::Saturday,
            C::Sun => Weekday::Sunday,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Weekday::Monday => Weekday::Tuesday,
            Weekday::Tuesday => Weekday::Wednesday,
            Weekday::Wednesday => Weekday::Thursday,
            Weekday::Thursday => Weekday::Friday,
            Weekday::Friday => Weekday::Saturday,
            Weekday::Saturday => Weekday::Sunday,
            Weekday::Sunday => Weekday::Monday,
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "monday" => Weekday::Monday,
            "tuesday" => Weekday::Tuesday,
            "wednesday" => Weekday::Wednesday,
            "thursday" => Weekday::Thursday,
            "friday" => Weekday::Friday,
            "saturday" => Weekday::Saturday,
            "sunday" => Weekday::Sunday,
            _ => return None,
        })
    }
}

/// A single `HHMM` wall-clock time-of-day, stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DayMinute(pub u32);

impl DayMinute {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != 4 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let hh: u32 = raw[0..2].parse().ok()?;
        let mm: u32 = raw[2..4].parse().ok()?;
        if hh > 23 || mm > 59 {
            return None;
        }
        Some(DayMinute(hh * 60 + mm))
    }
}

/// One scheduled slot: `(start_hhmm, end_hhmm, show_id)`. `end <= start`
/// wraps into the following day (§3).
#[derive(Debug, Clone)]
pub struct Slot {
    pub start: DayMinute,
    pub end: DayMinute,
    pub show: ShowId,
}

impl Slot {
    /// Whether `minute_of_day` (on the slot's nominal day) falls inside
    /// this slot, accounting for midnight wrap.
    pub fn contains(&self, minute_of_day: u32) -> bool {
        if self.end.0 <= self.start.0 {
            minute_of_day >= self.start.0 || minute_of_day < self.end.0
        } else {
            minute_of_day >= self.start.0 && minute_of_day < self.end.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShowDef {
    pub id: ShowId,
    pub title: String,
    pub directory: PathBuf,
    pub station: broadcast_contracts::ids::Station,
    pub channel: ChannelNumber,
    pub runtime_minutes: u32,
    pub episodes: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleConfig {
    pub shows: Vec<ShowDef>,
    /// `channel -> day -> ordered, non-overlapping slots`.
    pub weekly: HashMap<ChannelNumber, HashMap<Weekday, Vec<Slot>>>,
}

impl ScheduleConfig {
    pub fn show(&self, id: &ShowId) -> Option<&ShowDef> {
        self.shows.iter().find(|s| &s.id == id)
    }

    pub fn slots_for(&self, channel: ChannelNumber, day: Weekday) -> &[Slot] {
        self.weekly
            .get(&channel)
            .and_then(|days| days.get(&day))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Deserialize)]
struct RawShow {
    id: String,
    title: String,
    path: String,
    station: String,
    channel: u32,
    runtime_min: u32,
    episodes: Option<u32>,
}

#[derive(Deserialize)]
struct RawSlot {
    start: String,
    end: String,
    show: String,
}

#[derive(Deserialize)]
struct RawScheduleDoc {
    shows: Vec<RawShow>,
    /// `{ "<channel-number>": { "<day>": [ {start,end,show}, ... ] } }`
    schedule: HashMap<String, HashMap<String, Vec<RawSlot>>>,
}

pub fn load(path: &Path) -> ConfigResult<ScheduleConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawScheduleDoc = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let shows = raw
        .shows
        .into_iter()
        .map(|s| ShowDef {
            id: ShowId(s.id),
            title: s.title,
            directory: PathBuf::from(s.path),
            station: broadcast_contracts::ids::Station::from(s.station.as_str()),
            channel: ChannelNumber(s.channel),
            runtime_minutes: s.runtime_min,
            episodes: s.episodes,
        })
        .collect();

    let mut weekly: HashMap<ChannelNumber, HashMap<Weekday, Vec<Slot>>> = HashMap::new();
    for (channel_key, days) in raw.schedule {
        let channel = channel_key
            .parse::<u32>()
            .map(ChannelNumber)
            .map_err(|_| ConfigError::ChannelTable {
                path: path.to_path_buf(),
                line: 0,
                reason: format!("invalid channel key {channel_key:?} in schedule"),
            })?;
        let mut day_map = HashMap::new();
        for (day_key, slots) in days {
            let Some(day) = Weekday::from_key(&day_key.to_ascii_lowercase()) else {
                continue;
            };
            let parsed = slots
                .into_iter()
                .filter_map(|s| {
                    Some(Slot {
                        start: DayMinute::parse(&s.start)?,
                        end: DayMinute::parse(&s.end)?,
                        show: ShowId(s.show),
                    })
                })
                .collect();
            day_map.insert(day, parsed);
        }
        weekly.insert(channel, day_map);
    }

    Ok(ScheduleConfig { shows, weekly })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_wraps_midnight() {
        let slot = Slot {
            start: DayMinute(23 * 60),
            end: DayMinute(60),
            show: ShowId("LATE".into()),
        };
        assert!(slot.contains(23 * 60 + 30));
        assert!(slot.contains(30));
        assert!(!slot.contains(12 * 60));
    }

    #[test]
    fn day_minute_rejects_malformed() {
        assert!(DayMinute::parse("2400").is_none());
        assert!(DayMinute::parse("99").is_none());
        assert_eq!(DayMinute::parse("0130").unwrap().0, 90);
    }
}
