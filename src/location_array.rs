// SPDX-License-Identifier: MIT OR Apache-2.0

//! Location array (§3, §4.3): an append-only, growable sequence of
//! `(line, field)` pairs, one per worker per address. Growth is
//! deliberately conservative once the array is large, so that a single
//! address recurring hundreds of millions of times cannot blow up memory.

use parking_lot::Mutex;

/// Below this capacity, growth doubles; at or above it, growth is +25%.
/// See §4.3 "Growth policy".
const DOUBLING_CEILING: usize = 1_048_576;

/// Floor for `new`'s initial capacity.
const MIN_CAPACITY: usize = 64;

/// A single `(line, field)` occurrence of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: u64,
    pub field: u16,
}

impl Location {
    pub fn new(line: u64, field: u16) -> Self {
        Self { line, field }
    }
}

struct Inner {
    entries: Vec<Location>,
    /// Hard ceiling past which `grow` refuses to allocate further; the
    /// caller (the worker, per §4.3 "Hard limits") then drops the location
    /// and logs a warning instead of treating this as a correctness bug.
    capacity_ceiling: usize,
}

/// An append-only, growable vector of locations, written by exactly one
/// worker thread and read only after that worker has joined (§4.3
/// "Concurrency"). The mutex exists to make `grow` safe under the general
/// contract rather than because output genuinely races with appends.
pub struct LocationArray {
    inner: Mutex<Inner>,
}

/// Default hard cap on entries per array: 2^31, per §4.3 "Hard limits".
pub const DEFAULT_CAPACITY_CEILING: usize = 1 << 31;

impl LocationArray {
    pub fn new(initial_capacity: usize) -> Self {
        Self::with_ceiling(initial_capacity, DEFAULT_CAPACITY_CEILING)
    }

    pub fn with_ceiling(initial_capacity: usize, capacity_ceiling: usize) -> Self {
        let capacity = initial_capacity.max(MIN_CAPACITY);
        Self {
            inner: Mutex::new(Inner {
                entries: Vec::with_capacity(capacity),
                capacity_ceiling,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one location, growing the backing storage first if full.
    /// Returns `false` only when the array has hit its hard capacity
    /// ceiling and cannot grow further; the caller then drops the location
    /// (documented graceful degradation, §4.3/§7).
    pub fn append(&self, location: Location) -> bool {
        let mut inner = self.inner.lock();
        if inner.entries.len() >= inner.capacity_ceiling {
            return false;
        }
        if inner.entries.len() == inner.entries.capacity() {
            let current = inner.entries.capacity();
            let target = next_capacity(current).min(inner.capacity_ceiling);
            if target <= current {
                return false;
            }
            inner.entries.reserve_exact(target - current);
        }
        inner.entries.push(location);
        true
    }

    /// Sort the entries in place by `(line, field)` ascending, for output
    /// (§4.3 `iter_sorted_in_place`, feeding §4.8's N-way merge).
    pub fn sort_for_output(&self) {
        let mut inner = self.inner.lock();
        inner.entries.sort_unstable_by_key(|l| (l.line, l.field));
    }

    /// Consume the array, returning its entries. Called only from the
    /// single-threaded output stage after every worker has joined.
    pub fn into_entries(self) -> Vec<Location> {
        self.inner.into_inner().entries
    }

    /// Clone out the current entries without consuming the array. Used by
    /// the output stage, which only ever borrows a `PerAddressData`.
    pub fn snapshot(&self) -> Vec<Location> {
        self.inner.lock().entries.clone()
    }
}

/// §4.3 "Growth policy": double below `DOUBLING_CEILING`, then grow by 25%.
fn next_capacity(current: usize) -> usize {
    if current == 0 {
        return MIN_CAPACITY;
    }
    if current < DOUBLING_CEILING {
        current.saturating_mul(2)
    } else {
        current + current / 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_initial_capacity() {
        let arr = LocationArray::new(4);
        assert_eq!(arr.inner.lock().entries.capacity(), MIN_CAPACITY);
    }

    #[test]
    fn append_and_read_back() {
        let arr = LocationArray::new(64);
        for i in 0..200u64 {
            assert!(arr.append(Location::new(i, 1)));
        }
        assert_eq!(arr.len(), 200);
    }

    #[test]
    fn growth_switches_from_doubling_to_quarter_step() {
        assert_eq!(next_capacity(1024), 2048);
        assert_eq!(next_capacity(DOUBLING_CEILING), DOUBLING_CEILING + DOUBLING_CEILING / 4);
        assert_eq!(next_capacity(DOUBLING_CEILING * 2), DOUBLING_CEILING * 2 + DOUBLING_CEILING / 2);
    }

    #[test]
    fn hard_ceiling_stops_growth_gracefully() {
        let arr = LocationArray::with_ceiling(64, 100);
        for i in 0..100u64 {
            assert!(arr.append(Location::new(i, 1)));
        }
        assert!(!arr.append(Location::new(100, 1)));
        assert_eq!(arr.len(), 100);
    }

    #[test]
    fn sort_for_output_orders_by_line_then_field() {
        let arr = LocationArray::new(64);
        arr.append(Location::new(5, 2));
        arr.append(Location::new(1, 9));
        arr.append(Location::new(1, 3));
        arr.sort_for_output();
        let entries = arr.into_entries();
        assert_eq!(
            entries,
            vec![Location::new(1, 3), Location::new(1, 9), Location::new(5, 2)]
        );
    }
}
