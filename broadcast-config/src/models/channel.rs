use broadcast_contracts::ids::{ChannelNumber, Station};

/// One row of the channel table (§3, §6): `number TAB station TAB enabled`.
#[derive(Debug, Clone)]
pub struct Channel {
    pub number: ChannelNumber,
    pub station: Station,
    pub enabled: bool,
}

/// The parsed, ordered channel table. Ordering is ascending by number
/// (§3); lookups and up/down navigation are provided by
/// `broadcast-core::channel_registry`, which owns the runtime behavior —
/// this type only owns the parsed data.
#[derive(Debug, Clone, Default)]
pub struct ChannelTable {
    pub channels: Vec<Channel>,
}

impl ChannelTable {
    pub fn parse(text: &str) -> Result<Self, (usize, String)> {
        let mut channels = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for (idx, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t');
            let number = fields
                .next()
                .ok_or_else(|| (idx + 1, "missing number field".to_string()))?;
            let station = fields
                .next()
                .ok_or_else(|| (idx + 1, "missing station field".to_string()))?;
            let enabled = fields
                .next()
                .ok_or_else(|| (idx + 1, "missing enabled field".to_string()))?;

            let number: u32 = number
                .trim()
                .parse()
                .map_err(|_| (idx + 1, format!("invalid channel number {number:?}")))?;
            if !seen.insert(number) {
                return Err((idx + 1, format!("duplicate channel number {number}")));
            }
            let enabled = match enabled.trim() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => return Err((idx + 1, format!("invalid enabled flag {other:?}"))),
            };

            channels.push(Channel {
                number: ChannelNumber(number),
                station: Station::from(station.trim()),
                enabled,
            });
        }

        channels.sort_by_key(|c| c.number);
        Ok(ChannelTable { channels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_sorts_ignoring_comments() {
        let text = "# comment\n3\tMTV\t1\n1\tWEATHER\t0\n\n2\tEPG\ttrue\n";
        let table = ChannelTable::parse(text).unwrap();
        let numbers: Vec<u32> = table.channels.iter().map(|c| c.number.0).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(!table.channels[0].enabled);
        assert!(table.channels[2].enabled);
    }

    #[test]
    fn rejects_duplicate_channel_numbers() {
        let text = "1\tA\t1\n1\tB\t1\n";
        assert!(ChannelTable::parse(text).is_err());
    }
}
