//! C3: station index store. An ordered, insertion-stable sequence of
//! `(absolute_path, duration_seconds)` loaded from a station's index file
//! (§3, §6). The controller re-reads on demand; it never writes.

use std::path::Path;

/// One entry of a station index: an absolute file path and its duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexItem {
    pub path: String,
    pub duration_seconds: u64,
}

#[derive(Debug, Clone, Default)]
pub struct StationIndex {
    items: Vec<IndexItem>,
    total_seconds: u64,
}

impl StationIndex {
    pub fn items(&self) -> &[IndexItem] {
        &self.items
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    pub fn is_empty_or_zero(&self) -> bool {
        self.items.is_empty() || self.total_seconds == 0
    }

    /// Builds an index from an explicit item order (used by the MTV
    /// picker, C7, to apply its per-cycle shuffle).
    pub fn from_items(items: Vec<IndexItem>) -> StationIndex {
        let total_seconds = items.iter().map(|i| i.duration_seconds).sum();
        StationIndex {
            items,
            total_seconds,
        }
    }

    /// Subset of items whose path begins with `directory`, preserving
    /// original order (used by the scheduled picker, C6).
    pub fn filter_prefix(&self, directory: &str) -> StationIndex {
        let items: Vec<IndexItem> = self
            .items
            .iter()
            .filter(|item| item.path.starts_with(directory))
            .cloned()
            .collect();
        let total_seconds = items.iter().map(|i| i.duration_seconds).sum();
        StationIndex {
            items,
            total_seconds,
        }
    }

    pub fn parse(text: &str) -> Self {
        let mut items = Vec::new();
        let mut total_seconds = 0u64;
        for line in text.lines() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((path, duration)) = line.split_once('\t') else {
                continue;
            };
            let Ok(duration_seconds) = duration.trim().parse::<u64>() else {
                continue;
            };
            total_seconds += duration_seconds;
            items.push(IndexItem {
                path: path.to_string(),
                duration_seconds,
            });
        }
        StationIndex {
            items,
            total_seconds,
        }
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tab_separated_index_and_skips_comments() {
        let text = "# header\n/a/one.mp4\t10\n/a/two.mp4\t20\n\n/a/three.mp4\t30\n";
        let idx = StationIndex::parse(text);
        assert_eq!(idx.items().len(), 3);
        assert_eq!(idx.total_seconds(), 60);
    }

    #[test]
    fn empty_index_reports_empty_or_zero() {
        assert!(StationIndex::parse("").is_empty_or_zero());
        assert!(StationIndex::parse("/a\t0\n").is_empty_or_zero());
    }

    #[test]
    fn filter_prefix_keeps_order_and_recomputes_total() {
        let idx = StationIndex::parse("/show/a.mp4\t10\n/other/b.mp4\t5\n/show/c.mp4\t15\n");
        let filtered = idx.filter_prefix("/show/");
        let paths: Vec<&str> = filtered.items().iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["/show/a.mp4", "/show/c.mp4"]);
        assert_eq!(filtered.total_seconds(), 25);
    }
}
