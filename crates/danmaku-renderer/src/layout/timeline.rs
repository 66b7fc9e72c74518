//! Tick-indexed occupancy lists

use ahash::AHashMap;
use smallvec::SmallVec;

/// Comment indices bucketed by vpos tick
#[derive(Debug, Clone, Default)]
pub struct TickIndex {
    buckets: AHashMap<i64, SmallVec<[usize; 4]>>,
}

impl TickIndex {
    /// Empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `index` to the bucket at `vpos`
    pub fn push(&mut self, vpos: i64, index: usize) {
        self.buckets.entry(vpos).or_default().push(index);
    }

    /// Indices at `vpos` in insertion order
    pub fn get(&self, vpos: i64) -> &[usize] {
        self.buckets.get(&vpos).map_or(&[], |bucket| bucket.as_slice())
    }

    /// Number of non-empty ticks
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// No tick holds anything
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Occupied ticks in ascending order
    pub fn ticks(&self) -> Vec<i64> {
        let mut ticks: Vec<i64> = self.buckets.keys().copied().collect();
        ticks.sort_unstable();
        ticks
    }

    /// Stable partition of every bucket with `first` indices moved ahead
    pub fn partition_stable(&mut self, first: impl Fn(usize) -> bool) {
        for bucket in self.buckets.values_mut() {
            bucket.sort_by_key(|&index| !first(index));
        }
    }
}

/// Occupancy used for collision tests
#[derive(Debug, Clone, Default)]
pub struct CollisionLanes {
    /// Top fixed comments
    pub top: TickIndex,
    /// Bottom fixed comments
    pub bottom: TickIndex,
    /// Scrolling comments crossing the left boundary
    pub left: TickIndex,
    /// Scrolling comments crossing the right boundary
    pub right: TickIndex,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partition_keeps_relative_order() {
        let mut index = TickIndex::new();
        for i in [0, 1, 2, 3, 4] {
            index.push(7, i);
        }
        index.push(8, 9);
        index.partition_stable(|i| i % 2 == 1);
        assert_eq!(index.get(7), &[1, 3, 0, 2, 4]);
        assert_eq!(index.get(8), &[9]);
        assert!(index.get(6).is_empty());
        assert_eq!(index.ticks(), vec![7, 8]);
    }
}
