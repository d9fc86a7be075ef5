//! C4: the epoch picker. Maps wall-clock time to `(file, offset)` inside a
//! station's index, deterministically: `pos = now mod total`, walk the
//! ordered items accumulating durations, pick the first item where
//! `acc + duration > pos` (§4.3).

use crate::index_store::StationIndex;

#[derive(Debug, Clone, PartialEq)]
pub struct Pick {
    pub path: String,
    pub offset_seconds: u64,
}

/// `None` when the index is empty or its total duration is zero (§4.3) —
/// the caller falls back (typically to the snow placeholder, per §4.7
/// step 7).
pub fn pick(index: &StationIndex, now_seconds: u64) -> Option<Pick> {
    if index.is_empty_or_zero() {
        return None;
    }
    let total = index.total_seconds();
    let pos = now_seconds % total;

    let mut acc = 0u64;
    for item in index.items() {
        if acc + item.duration_seconds > pos {
            return Some(Pick {
                path: item.path.clone(),
                offset_seconds: pos - acc,
            });
        }
        acc += item.duration_seconds;
    }
    // Unreachable when total_seconds is the true sum of durations, but
    // guards against a caller-supplied total that doesn't match.
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index_store::IndexItem;

    fn index(items: &[(&str, u64)]) -> StationIndex {
        let text: String = items
            .iter()
            .map(|(p, d)| format!("{p}\t{d}\n"))
            .collect();
        StationIndex::parse(&text)
    }

    #[test]
    fn literal_boundary_scenario_1() {
        let idx = index(&[("A", 10), ("B", 20), ("C", 30)]);

        let p = pick(&idx, 125).unwrap();
        assert_eq!(p, Pick { path: "A".into(), offset_seconds: 5 });

        let p = pick(&idx, 130).unwrap();
        assert_eq!(p, Pick { path: "B".into(), offset_seconds: 0 });

        let p = pick(&idx, 155).unwrap();
        assert_eq!(p, Pick { path: "C".into(), offset_seconds: 5 });
    }

    #[test]
    fn determinism_same_now_same_result() {
        let idx = index(&[("A", 10), ("B", 20), ("C", 30)]);
        assert_eq!(pick(&idx, 99), pick(&idx, 99));
    }

    #[test]
    fn offset_is_always_within_item_duration() {
        let idx = index(&[("A", 7), ("B", 3), ("C", 11)]);
        for now in 0..100u64 {
            let p = pick(&idx, now).unwrap();
            let duration = idx
                .items()
                .iter()
                .find(|i| i.path == p.path)
                .unwrap()
                .duration_seconds;
            assert!(p.offset_seconds < duration);
        }
    }

    #[test]
    fn empty_or_zero_duration_index_fails() {
        assert!(pick(&StationIndex::default(), 10).is_none());
        assert!(pick(&index(&[("A", 0)]), 10).is_none());
    }

    #[test]
    fn tuning_idempotence_same_instant_same_pick() {
        let idx = index(&[("A", 10), ("B", 20)]);
        let first = pick(&idx, 12345);
        let second = pick(&idx, 12345);
        assert_eq!(first, second);
    }
}
