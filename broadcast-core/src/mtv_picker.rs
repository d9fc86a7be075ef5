//! C7: MTV picker. Random order within each cycle (`now / total_duration`),
//! deterministic across the cycle so mid-video tune-ins land consistently,
//! with a safeguard against tuning into the last few seconds of a clip
//! (§4.6).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::epoch_picker::{self, Pick};
use crate::index_store::StationIndex;

/// Items within this many seconds of the end of a clip longer than the
/// same threshold are skipped back to the start (§4.6).
const END_GUARD_SECONDS: u64 = 15;

fn shuffle_key(path: &str, cycle: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    cycle.hash(&mut hasher);
    hasher.finish()
}

pub fn pick(index: &StationIndex, now_seconds: u64) -> Option<Pick> {
    if index.is_empty_or_zero() {
        return None;
    }
    let total = index.total_seconds();
    let cycle = now_seconds / total;

    let mut items = index.items().to_vec();
    items.sort_by_key(|item| shuffle_key(&item.path, cycle));
    let shuffled = StationIndex::from_items(items);

    let mut picked = epoch_picker::pick(&shuffled, now_seconds)?;

    let duration = shuffled
        .items()
        .iter()
        .find(|i| i.path == picked.path)
        .map(|i| i.duration_seconds)
        .unwrap_or(0);
    if duration > END_GUARD_SECONDS && picked.offset_seconds > duration - END_GUARD_SECONDS {
        picked.offset_seconds = 0;
    }

    Some(picked)
}
