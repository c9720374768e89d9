//! Layout table and the forward-only offset math.
//!
//! Every item owns one [`LayoutEntry`] keyed by its slot index. Offsets are
//! assigned left to right: an entry gets a `top` only once the entry before it
//! has both a `top` and a measured `height`. A `top` is never recomputed.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::window::HotRange;

/// Stable identity assigned to an item when its page arrives.
pub type SlotIndex = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutEntry {
    pub slot: SlotIndex,
    pub top: Option<u32>,
    pub height: Option<u32>,
    pub hidden: bool,
}

impl LayoutEntry {
    /// Entry for an item that has not been measured yet.
    pub const fn stub(slot: SlotIndex) -> Self {
        Self {
            slot,
            top: None,
            height: None,
            hidden: false,
        }
    }

    pub const fn is_measured(&self) -> bool {
        self.height.is_some()
    }

    /// Bottom edge of the entry, once both top and height are known.
    pub fn bottom(&self) -> Option<u32> {
        Some(self.top?.saturating_add(self.height?))
    }
}

/// Position of the "load more" marker that sits after the last item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentinelPosition {
    pub top: u32,
    pub left: u32,
}

/// Sparse, slot-ordered map of layout entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutTable {
    entries: BTreeMap<SlotIndex, LayoutEntry>,
}

impl LayoutTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: SlotIndex) -> Option<&LayoutEntry> {
        self.entries.get(&slot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayoutEntry> {
        self.entries.values()
    }

    /// Insert an unmeasured entry. Existing entries are left alone.
    pub fn insert_stub(&mut self, slot: SlotIndex) {
        self.entries
            .entry(slot)
            .or_insert_with(|| LayoutEntry::stub(slot));
    }

    /// True once every entry has a top and a height.
    pub fn is_settled(&self) -> bool {
        self.entries
            .values()
            .all(|e| e.top.is_some() && e.height.is_some())
    }

    pub fn mounted_count(&self) -> usize {
        self.entries.values().filter(|e| !e.hidden).count()
    }
}

impl FromIterator<LayoutEntry> for LayoutTable {
    fn from_iter<I: IntoIterator<Item = LayoutEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|e| (e.slot, e)).collect(),
        }
    }
}

/// Store the first measurement reported for `slot`.
///
/// A missing or zero height still counts as a measurement (height 0) so the
/// entries after it can be laid out. Repeat measurements are ignored.
pub fn record_measurement(
    mut table: LayoutTable,
    slot: SlotIndex,
    height: Option<u32>,
) -> LayoutTable {
    let entry = table
        .entries
        .entry(slot)
        .or_insert_with(|| LayoutEntry::stub(slot));
    if entry.is_measured() {
        debug!(slot, "ignoring repeat measurement");
        return table;
    }
    let height = match height {
        Some(h) if h > 0 => h,
        reported => {
            warn!(slot, ?reported, "measurement unavailable, laying out with zero height");
            0
        }
    };
    entry.height = Some(height);
    table
}

/// Assign tops to the entries starting at `from` whose predecessor is fully
/// laid out. Stops at the first entry that cannot be placed.
///
/// Entries before `from` are not visited: a measurement can only unblock the
/// entries at or after its own slot.
pub fn compute_offsets(mut table: LayoutTable, from: SlotIndex, item_gap: u32) -> LayoutTable {
    let mut predecessor = table
        .entries
        .range(..from)
        .next_back()
        .map(|(_, e)| (e.top, e.height))
        .unwrap_or((Some(0), Some(0)));

    for entry in table.entries.range_mut(from..).map(|(_, e)| e) {
        if entry.top.is_none() {
            let (Some(prev_top), Some(prev_height)) = predecessor else {
                break;
            };
            let top = prev_top
                .saturating_add(prev_height)
                .saturating_add(item_gap);
            debug!(slot = entry.slot, top, "placed entry");
            entry.top = Some(top);
        }
        predecessor = (entry.top, entry.height);
    }
    table
}

/// Recompute hidden flags for every entry with a known top.
pub fn compute_visibility(mut table: LayoutTable, hot: HotRange) -> LayoutTable {
    for entry in table.entries.values_mut() {
        if let Some(top) = entry.top {
            entry.hidden = top < hot.min_top || top >= hot.max_top;
        }
    }
    table
}

/// Where the sentinel goes once `last` is laid out: its bottom edge plus the gap.
pub fn sentinel_position(
    table: &LayoutTable,
    last: SlotIndex,
    item_gap: u32,
) -> Option<SentinelPosition> {
    let bottom = table.get(last)?.bottom()?;
    Some(SentinelPosition {
        top: bottom.saturating_add(item_gap),
        left: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stubs(slots: impl IntoIterator<Item = SlotIndex>) -> LayoutTable {
        slots.into_iter().map(LayoutEntry::stub).collect()
    }

    fn measure(table: LayoutTable, slot: SlotIndex, height: u32, gap: u32) -> LayoutTable {
        let table = record_measurement(table, slot, Some(height));
        compute_offsets(table, slot, gap)
    }

    fn entry(slot: SlotIndex, top: Option<u32>) -> LayoutEntry {
        LayoutEntry {
            slot,
            top,
            height: Some(20),
            hidden: false,
        }
    }

    #[test]
    fn first_entry_starts_at_gap() {
        let table = compute_offsets(stubs([0]), 0, 10);
        assert_eq!(table.get(0).unwrap().top, Some(10));
    }

    #[test]
    fn tops_follow_measured_heights() {
        let table = measure(stubs([0, 1]), 0, 50, 10);
        let table = measure(table, 1, 30, 10);

        assert_eq!(table.get(0).unwrap().top, Some(10));
        assert_eq!(table.get(1).unwrap().top, Some(70));
    }

    #[test]
    fn unmeasured_predecessor_blocks_layout() {
        let table = compute_offsets(stubs([0, 1, 2]), 0, 10);

        assert_eq!(table.get(0).unwrap().top, Some(10));
        assert_eq!(table.get(1).unwrap().top, None);
        assert_eq!(table.get(2).unwrap().top, None);
    }

    #[test]
    fn out_of_order_measurement_fills_in_once_gap_closes() {
        let table = measure(stubs([0, 1, 2, 3]), 2, 5, 1);
        let table = measure(table, 1, 4, 1);
        assert_eq!(table.get(1).unwrap().top, None);

        let table = measure(table, 0, 3, 1);
        assert_eq!(table.get(0).unwrap().top, Some(1));
        assert_eq!(table.get(1).unwrap().top, Some(5));
        assert_eq!(table.get(2).unwrap().top, Some(10));
        assert_eq!(table.get(3).unwrap().top, Some(16));
    }

    #[test]
    fn tops_are_never_recomputed() {
        let table = measure(stubs([0, 1]), 0, 50, 10);
        let table = measure(table, 1, 30, 10);
        // A later, different height for slot 0 is dropped.
        let table = record_measurement(table, 0, Some(500));
        let table = compute_offsets(table, 0, 10);

        assert_eq!(table.get(0).unwrap().height, Some(50));
        assert_eq!(table.get(1).unwrap().top, Some(70));
    }

    #[test]
    fn zero_or_missing_height_lays_out_as_zero() {
        let table = record_measurement(stubs([0, 1, 2]), 0, None);
        let table = compute_offsets(table, 0, 10);
        let table = record_measurement(table, 1, Some(0));
        let table = compute_offsets(table, 1, 10);

        assert_eq!(table.get(0).unwrap().height, Some(0));
        assert_eq!(table.get(1).unwrap().top, Some(20));
        assert_eq!(table.get(2).unwrap().top, Some(30));
    }

    #[test]
    fn measurement_creates_missing_entry() {
        let table = record_measurement(LayoutTable::new(), 4, Some(7));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(4).unwrap().height, Some(7));
    }

    #[test]
    fn seeded_slots_have_no_predecessor() {
        let table = measure(stubs([100, 101]), 100, 8, 2);
        assert_eq!(table.get(100).unwrap().top, Some(2));
        assert_eq!(table.get(101).unwrap().top, Some(12));
    }

    #[test]
    fn visibility_against_hot_range() {
        let table: LayoutTable = [entry(0, Some(10)), entry(1, Some(70)), entry(2, Some(250))]
            .into_iter()
            .collect();
        let hot = HotRange {
            min_top: 0,
            max_top: 200,
        };

        let table = compute_visibility(table, hot);
        let hidden: Vec<bool> = table.iter().map(|e| e.hidden).collect();
        assert_eq!(hidden, vec![false, false, true]);
    }

    #[test]
    fn visibility_bounds_are_half_open() {
        let table: LayoutTable = [entry(0, Some(99)), entry(1, Some(100)), entry(2, Some(300))]
            .into_iter()
            .collect();
        let hot = HotRange {
            min_top: 100,
            max_top: 300,
        };

        let table = compute_visibility(table, hot);
        assert!(table.get(0).unwrap().hidden);
        assert!(!table.get(1).unwrap().hidden);
        assert!(table.get(2).unwrap().hidden);
    }

    #[test]
    fn unknown_top_is_never_hidden() {
        let table: LayoutTable = [entry(0, None)].into_iter().collect();
        let hot = HotRange {
            min_top: 500,
            max_top: 600,
        };
        let table = compute_visibility(table, hot);
        assert!(!table.get(0).unwrap().hidden);
    }

    #[test]
    fn sentinel_sits_after_last_bottom() {
        let table = measure(stubs([0]), 0, 50, 10);
        assert_eq!(
            sentinel_position(&table, 0, 10),
            Some(SentinelPosition { top: 70, left: 0 })
        );
    }

    #[test]
    fn sentinel_unknown_until_last_is_measured() {
        let table = compute_offsets(stubs([0]), 0, 10);
        assert_eq!(sentinel_position(&table, 0, 10), None);
        assert_eq!(sentinel_position(&table, 9, 10), None);
    }

    #[test]
    fn huge_gap_saturates_instead_of_overflowing() {
        let gap = u32::MAX / 2 + 1;
        let table = measure(stubs([0, 1, 2]), 0, 1, gap);
        let table = measure(table, 1, 1, gap);
        let table = measure(table, 2, 1, gap);

        assert_eq!(table.get(0).unwrap().top, Some(gap));
        assert_eq!(table.get(1).unwrap().top, Some(u32::MAX));
        assert_eq!(table.get(1).unwrap().bottom(), Some(u32::MAX));
        assert_eq!(table.get(2).unwrap().top, Some(u32::MAX));
        assert_eq!(
            sentinel_position(&table, 2, gap),
            Some(SentinelPosition {
                top: u32::MAX,
                left: 0
            })
        );
    }

    #[test]
    fn settled_and_mounted_counts() {
        let table = measure(stubs([0, 1]), 0, 5, 1);
        assert!(!table.is_settled());
        let table = measure(table, 1, 5, 1);
        assert!(table.is_settled());

        let table = compute_visibility(
            table,
            HotRange {
                min_top: 0,
                max_top: 5,
            },
        );
        assert_eq!(table.mounted_count(), 1);
    }

    fn heights_and_order() -> impl Strategy<Value = (Vec<u32>, Vec<usize>)> {
        proptest::collection::vec(0u32..200, 1..40).prop_flat_map(|heights| {
            let order: Vec<usize> = (0..heights.len()).collect();
            (Just(heights), Just(order).prop_shuffle())
        })
    }

    proptest! {
        #[test]
        fn layout_is_forward_only((heights, order) in heights_and_order(), gap in 0u32..20) {
            let mut table = stubs(0..heights.len() as SlotIndex);
            for idx in order {
                table = measure(table, idx as SlotIndex, heights[idx], gap);
            }

            let placed: Vec<&LayoutEntry> = table.iter().collect();
            prop_assert!(placed.iter().all(|e| e.top.is_some()));
            for pair in placed.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                let expected = a.top.unwrap() + a.height.unwrap() + gap;
                prop_assert_eq!(b.top.unwrap(), expected);
            }
            for (i, a) in placed.iter().enumerate() {
                for b in &placed[i + 1..] {
                    prop_assert!(b.top.unwrap() >= a.top.unwrap() + a.height.unwrap() + gap);
                }
            }
        }

        #[test]
        fn visibility_is_pure(
            tops in proptest::collection::vec(proptest::option::of(0u32..2_000), 0..30),
            min_top in 0u32..1_000,
            span in 0u32..1_000,
        ) {
            let hot = HotRange { min_top, max_top: min_top + span };
            let table: LayoutTable = tops
                .iter()
                .enumerate()
                .map(|(i, top)| LayoutEntry { slot: i as SlotIndex, top: *top, height: Some(1), hidden: false })
                .collect();

            let table = compute_visibility(table, hot);
            for entry in table.iter() {
                match entry.top {
                    Some(top) => prop_assert_eq!(entry.hidden, top < hot.min_top || top >= hot.max_top),
                    None => prop_assert!(!entry.hidden),
                }
            }
        }
    }
}
