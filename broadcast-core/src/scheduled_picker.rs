//! C6: scheduled picker. Restricts the epoch picker (C4) to a single
//! show's files (filtered by directory prefix) and adds an episode-
//! advance variant for interstitial boundaries (§4.5).

use crate::epoch_picker::{self, Pick};
use crate::index_store::StationIndex;

/// Epoch-pick within `show_directory`. `None` when nothing in the index
/// matches the prefix (caller falls back to C4 over the unfiltered index).
pub fn pick_in_show(index: &StationIndex, show_directory: &str, now_seconds: u64) -> Option<Pick> {
    let filtered = index.filter_prefix(show_directory);
    epoch_picker::pick(&filtered, now_seconds)
}

/// Walks the filtered subset to the item the epoch picker currently lands
/// on, then returns the *following* item at offset 0, wrapping to the
/// first item when the current one is last (§4.5).
pub fn pick_next_same_show(index: &StationIndex, show_directory: &str, now_seconds: u64) -> Option<Pick> {
    let filtered = index.filter_prefix(show_directory);
    if filtered.items().is_empty() {
        return None;
    }
    let current = epoch_picker::pick(&filtered, now_seconds)?;
    let current_idx = filtered
        .items()
        .iter()
        .position(|item| item.path == current.path)?;
    let next_idx = (current_idx + 1) % filtered.items().len();
    let next = &filtered.items()[next_idx];
    Some(Pick {
        path: next.path.clone(),
        offset_seconds: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> StationIndex {
        StationIndex::parse(
            "/show/ep1.mp4\t100\n/show/ep2.mp4\t200\n/other/x.mp4\t50\n/show/ep3.mp4\t300\n",
        )
    }

    #[test]
    fn pick_in_show_only_considers_prefixed_items() {
        let idx = index();
        let p = pick_in_show(&idx, "/show/", 50).unwrap();
        assert_eq!(p.path, "/show/ep1.mp4");
    }

    #[test]
    fn next_same_show_wraps_to_first() {
        let idx = index();
        // total of filtered subset is 100+200+300 = 600; now=599 lands in ep3 (offset 299)
        let next = pick_next_same_show(&idx, "/show/", 599).unwrap();
        assert_eq!(next.path, "/show/ep1.mp4");
        assert_eq!(next.offset_seconds, 0);
    }

    #[test]
    fn next_same_show_advances_to_following_episode() {
        let idx = index();
        // now=50 lands in ep1 (0..100); next should be ep2.
        let next = pick_next_same_show(&idx, "/show/", 50).unwrap();
        assert_eq!(next.path, "/show/ep2.mp4");
    }

    #[test]
    fn empty_filter_yields_none() {
        let idx = index();
        assert!(pick_in_show(&idx, "/missing/", 10).is_none());
        assert!(pick_next_same_show(&idx, "/missing/", 10).is_none());
    }
}
