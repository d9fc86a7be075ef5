//! C5: schedule resolver. Given `(channel, now)`, selects the slot whose
//! day-of-week and local time window contain `now`, accounting for slots
//! that wrap past midnight (§4.4).

use broadcast_config::models::{ScheduleConfig, Weekday};
use broadcast_contracts::ids::{ChannelNumber, ShowId};
use chrono::{Datelike, NaiveDateTime, Timelike};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedShow {
    pub show_id: ShowId,
    /// `None` for the `SIGNOFF`/`SIGNON` pseudo-shows, which have no
    /// backing directory (§4.4).
    pub directory: Option<String>,
}

/// Local wall-clock time is taken as given; the controller does not
/// interpret timezone offsets beyond what the host provides (§4.4).
pub fn resolve(schedule: &ScheduleConfig, channel: ChannelNumber, now: NaiveDateTime) -> Option<ResolvedShow> {
    let minute_of_day = now.hour() * 60 + now.minute();
    let today = Weekday::from_chrono(now.weekday());

    let slots = schedule.slots_for(channel, today);
    for slot in slots {
        let is_wrapping = slot.end.0 <= slot.start.0;
        if is_wrapping {
            continue; // handled via yesterday's entry below, once per instant
        }
        if slot.contains(minute_of_day) {
            return Some(to_resolved(schedule, &slot.show));
        }
    }

    // A wrapping slot scheduled "yesterday" may still be playing now.
    let yesterday = previous_weekday(today);
    for slot in schedule.slots_for(channel, yesterday) {
        let is_wrapping = slot.end.0 <= slot.start.0;
        if is_wrapping && minute_of_day < slot.end.0 {
            return Some(to_resolved(schedule, &slot.show));
        }
    }

    // A wrapping slot that started *today* is still active later today,
    // for the portion before midnight.
    for slot in slots {
        let is_wrapping = slot.end.0 <= slot.start.0;
        if is_wrapping && minute_of_day >= slot.start.0 {
            return Some(to_resolved(schedule, &slot.show));
        }
    }

    None
}

fn to_resolved(schedule: &ScheduleConfig, show_id: &ShowId) -> ResolvedShow {
    if show_id.is_signoff() || show_id.is_signon() {
        return ResolvedShow {
            show_id: show_id.clone(),
            directory: None,
        };
    }
    let directory = schedule
        .show(show_id)
        .map(|s| s.directory.to_string_lossy().into_owned());
    ResolvedShow {
        show_id: show_id.clone(),
        directory,
    }
}

fn previous_weekday(day: Weekday) -> Weekday {
    use Weekday::*;
    match day {
        Monday => Sunday,
        Tuesday => Monday,
        Wednesday => Tuesday,
        Thursday => Wednesday,
        Friday => Thursday,
        Saturday => Friday,
        Sunday => Saturday,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadcast_config::models::schedule::{DayMinute, Slot};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn show(id: &str, directory: &str) -> broadcast_config::models::schedule::ShowDef {
        broadcast_config::models::schedule::ShowDef {
            id: ShowId(id.into()),
            title: id.into(),
            directory: PathBuf::from(directory),
            station: broadcast_contracts::ids::Station::from("5"),
            channel: ChannelNumber(5),
            runtime_minutes: 30,
            episodes: None,
        }
    }

    fn schedule_with(slots: Vec<Slot>, wrap_slots_prior_day: Vec<Slot>) -> ScheduleConfig {
        let mut weekly = HashMap::new();
        let mut days = HashMap::new();
        days.insert(Weekday::Monday, slots);
        days.insert(Weekday::Sunday, wrap_slots_prior_day);
        weekly.insert(ChannelNumber(5), days);
        ScheduleConfig {
            shows: vec![show("CARTOON", "/shows/cartoon")],
            weekly,
        }
    }

    #[test]
    fn matches_plain_slot() {
        let slots = vec![Slot {
            start: DayMinute(18 * 60),
            end: DayMinute(18 * 60 + 30),
            show: ShowId("CARTOON".into()),
        }];
        let cfg = schedule_with(slots, vec![]);
        let now = chrono::NaiveDate::from_ymd_opt(2026, 7, 27) // a Monday
            .unwrap()
            .and_hms_opt(18, 10, 0)
            .unwrap();
        let resolved = resolve(&cfg, ChannelNumber(5), now).unwrap();
        assert_eq!(resolved.show_id, ShowId("CARTOON".into()));
        assert_eq!(resolved.directory.as_deref(), Some("/shows/cartoon"));
    }

    #[test]
    fn wrapping_slot_from_previous_day_still_matches_after_midnight() {
        // Sunday 23:30 -> 00:30 wraps into Monday.
        let wrap = vec![Slot {
            start: DayMinute(23 * 60 + 30),
            end: DayMinute(30),
            show: ShowId("CARTOON".into()),
        }];
        let cfg = schedule_with(vec![], wrap);
        let now = chrono::NaiveDate::from_ymd_opt(2026, 7, 27) // Monday
            .unwrap()
            .and_hms_opt(0, 10, 0)
            .unwrap();
        let resolved = resolve(&cfg, ChannelNumber(5), now).unwrap();
        assert_eq!(resolved.show_id, ShowId("CARTOON".into()));
    }

    #[test]
    fn signoff_and_signon_have_no_directory() {
        let slots = vec![Slot {
            start: DayMinute(2 * 60),
            end: DayMinute(6 * 60),
            show: ShowId("SIGNOFF".into()),
        }];
        let cfg = schedule_with(slots, vec![]);
        let now = chrono::NaiveDate::from_ymd_opt(2026, 7, 27)
            .unwrap()
            .and_hms_opt(3, 0, 0)
            .unwrap();
        let resolved = resolve(&cfg, ChannelNumber(5), now).unwrap();
        assert_eq!(resolved.show_id, ShowId("SIGNOFF".into()));
        assert!(resolved.directory.is_none());
    }

    #[test]
    fn no_match_returns_none() {
        let cfg = schedule_with(vec![], vec![]);
        let now = chrono::NaiveDate::from_ymd_opt(2026, 7, 27)
            .unwrap()
            .and_hms_opt(3, 0, 0)
            .unwrap();
        assert!(resolve(&cfg, ChannelNumber(5), now).is_none());
    }
}
