//! C2: channel registry. Resolves channel number <-> station and provides
//! wrap-around up/down navigation over enabled channels only (§4.2).

use broadcast_config::models::ChannelTable;
use broadcast_contracts::ids::{ChannelNumber, Station};

#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    table: ChannelTable,
}

impl ChannelRegistry {
    pub fn new(table: ChannelTable) -> Self {
        Self { table }
    }

    pub fn resolve(&self, number: ChannelNumber) -> Option<&Station> {
        self.table
            .channels
            .iter()
            .find(|c| c.number == number)
            .map(|c| &c.station)
    }

    pub fn is_enabled(&self, number: ChannelNumber) -> bool {
        self.table
            .channels
            .iter()
            .any(|c| c.number == number && c.enabled)
    }

    /// Ascending by number (§3).
    pub fn list_enabled(&self) -> Vec<ChannelNumber> {
        self.table
            .channels
            .iter()
            .filter(|c| c.enabled)
            .map(|c| c.number)
            .collect()
    }

    /// Smallest enabled number strictly greater than `from`, wrapping to
    /// the smallest enabled number. `None` if there are no enabled
    /// channels at all.
    pub fn up(&self, from: ChannelNumber) -> Option<ChannelNumber> {
        let enabled = self.list_enabled();
        if enabled.is_empty() {
            return None;
        }
        enabled
            .iter()
            .copied()
            .find(|n| *n > from)
            .or_else(|| enabled.first().copied())
    }

    /// Largest enabled number strictly less than `from`, wrapping to the
    /// largest enabled number.
    pub fn down(&self, from: ChannelNumber) -> Option<ChannelNumber> {
        let enabled = self.list_enabled();
        if enabled.is_empty() {
            return None;
        }
        enabled
            .iter()
            .rev()
            .copied()
            .find(|n| *n < from)
            .or_else(|| enabled.last().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadcast_config::models::channel::Channel;

    fn registry() -> ChannelRegistry {
        let channels = vec![
            Channel { number: ChannelNumber(1), station: Station::from("EPG"), enabled: true },
            Channel { number: ChannelNumber(2), station: Station::from("WEATHER"), enabled: false },
            Channel { number: ChannelNumber(3), station: Station::from("MTV"), enabled: true },
            Channel { number: ChannelNumber(999), station: Station::from("LOCKED"), enabled: true },
        ];
        ChannelRegistry::new(ChannelTable { channels })
    }

    #[test]
    fn up_down_skip_disabled_but_direct_resolve_still_works() {
        let reg = registry();
        assert_eq!(reg.up(ChannelNumber(1)), Some(ChannelNumber(3)));
        assert_eq!(reg.up(ChannelNumber(3)), Some(ChannelNumber(999)));
        assert_eq!(reg.up(ChannelNumber(999)), Some(ChannelNumber(1)));
        assert!(reg.resolve(ChannelNumber(2)).is_some());
        assert!(!reg.is_enabled(ChannelNumber(2)));
    }

    #[test]
    fn up_then_down_is_a_closure() {
        let reg = registry();
        for start in reg.list_enabled() {
            let mut cur = start;
            for _ in 0..5 {
                cur = reg.up(cur).unwrap();
            }
            for _ in 0..5 {
                cur = reg.down(cur).unwrap();
            }
            assert_eq!(cur, start);
        }
    }

    #[test]
    fn down_wraps_to_largest_enabled() {
        let reg = registry();
        assert_eq!(reg.down(ChannelNumber(1)), Some(ChannelNumber(999)));
    }
}
