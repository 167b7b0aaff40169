// SPDX-License-Identifier: MIT OR Apache-2.0

//! Address dictionary (§3 "AddressDictionary", §3 "PerAddressData", §4.4):
//! the mapping from canonical address string to per-address location data,
//! read concurrently by workers under a shared lock and mutated
//! exclusively by the single writer thread.

use std::hash::{BuildHasher, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use ahash::RandomState;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::hash_table::{HashTable, RehashOutcome};
use crate::location_array::{Location, LocationArray};

/// Load-factor/rehash checks run every `K` inserts rather than every
/// insert, per §4.4 "Growth-check amortization".
const REHASH_CHECK_INTERVAL: usize = 4_096;

/// Default DoS cap on distinct addresses (§4.4 "Growth table", `MAX_ENTRIES`).
pub const DEFAULT_MAX_ENTRIES: usize = 64_000_000;

/// Initial capacity handed to a freshly allocated per-worker
/// `LocationArray`; small, since most addresses are seen by only a few
/// workers and the array grows on demand (§4.3).
const INITIAL_LOCATION_CAPACITY: usize = 64;

static HASHER_STATE: OnceLock<RandomState> = OnceLock::new();

/// The seed every thread's hasher is built from. `entry.hash` is cached by
/// the writer and later compared by workers (`HashTable::get`) and used to
/// pick a bucket on both sides, so every thread must derive the same hash
/// for the same key — a fresh `RandomState::new()` per call reseeds on
/// every invocation and per-thread state reseeds per thread, either of
/// which would make the cached hash useless off the thread that wrote it.
/// `with_seeds` pins one fixed seed for the whole process.
fn hasher_state() -> &'static RandomState {
    HASHER_STATE.get_or_init(|| {
        RandomState::with_seeds(0x5bd1_e995_9e37_79b9, 0x85eb_ca6b_c2b2_ae35, 0x27d4_eb2f_1656_67c5, 0x1656_67c5_cc9e_2d51)
    })
}

/// Non-cryptographic 64-bit hash of a canonical address string, computed
/// once per address and cached in the dictionary entry (§4.4 "Hash
/// function"). `ahash` is the teacher's own hashing dependency (`node/db`
/// uses `ahash::HashMap` throughout); it is fast and has good
/// distribution, which is all the dictionary needs, and `hasher_state`'s
/// fixed seed keeps it stable across every thread that calls this.
pub fn hash_address(addr: &str) -> u64 {
    let mut hasher = hasher_state().build_hasher();
    hasher.write(addr.as_bytes());
    hasher.finish()
}

/// One worker's location data for one address: a lazily created
/// `LocationArray` plus a cheap atomic count (§3 "PerAddressData",
/// `ThreadLocations`).
pub struct ThreadSlot {
    locations: std::sync::OnceLock<LocationArray>,
    count: AtomicU64,
}

impl ThreadSlot {
    fn new() -> Self {
        Self {
            locations: std::sync::OnceLock::new(),
            count: AtomicU64::new(0),
        }
    }

    pub fn locations(&self) -> Option<&LocationArray> {
        self.locations.get()
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Per-address metadata: one `ThreadSlot` per worker, plus a cheap
/// eagerly-maintained total (§3 "PerAddressData").
pub struct PerAddressData {
    thread_data: Vec<ThreadSlot>,
    total_count: AtomicU64,
    /// Diagnostics only, never authoritative and never part of the output
    /// (§9 "Open question": `last_seen`/`access_count` are non-authoritative).
    access_count: AtomicU64,
}

impl PerAddressData {
    fn new(max_threads: usize) -> Self {
        Self {
            thread_data: (0..max_threads).map(|_| ThreadSlot::new()).collect(),
            total_count: AtomicU64::new(0),
            access_count: AtomicU64::new(0),
        }
    }

    /// Append one location to `worker_id`'s array, lazily creating it.
    /// Returns `false` if the per-array hard cap was hit, in which case the
    /// caller drops the location and logs a warning (§4.3, §7).
    pub fn append_location(&self, worker_id: usize, location: Location) -> bool {
        let arr = self.thread_data[worker_id]
            .locations
            .get_or_init(|| LocationArray::new(INITIAL_LOCATION_CAPACITY));
        let ok = arr.append(location);
        if ok {
            self.thread_data[worker_id].count.fetch_add(1, Ordering::Relaxed);
            self.total_count.fetch_add(1, Ordering::Relaxed);
        }
        ok
    }

    /// Cheap, relaxed readout; authoritative total is derived at output
    /// time from the sum of per-thread arrays (§3, §5 "Shared-resource
    /// policy").
    pub fn total_count(&self) -> u64 {
        self.total_count.load(Ordering::Relaxed)
    }

    pub fn thread_data(&self) -> &[ThreadSlot] {
        &self.thread_data
    }

    fn record_access(&self) {
        self.access_count.fetch_add(1, Ordering::Relaxed);
    }
}

struct DictInner {
    table: HashTable<Arc<PerAddressData>>,
    inserts_since_check: usize,
}

/// The shared address dictionary (§3, §4.4). Workers call `lookup` under a
/// read lock; the single writer thread calls `insert_or_update` under a
/// write lock, which both performs the insert and resolves the
/// lookup-then-insert race described in §4.4.
pub struct AddressDictionary {
    inner: RwLock<DictInner>,
    max_entries: usize,
}

impl AddressDictionary {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: RwLock::new(DictInner {
                table: HashTable::new(),
                inserts_since_check: 0,
            }),
            max_entries,
        }
    }

    /// §4.4 `lookup`: shared read lock, probe by hash, clone the `Arc` out
    /// so the caller can keep using it after the guard drops.
    pub fn lookup(&self, addr: &str) -> Option<Arc<PerAddressData>> {
        let hash = hash_address(addr);
        let inner = self.inner.read();
        let data = inner.table.get(hash, addr)?.clone();
        data.record_access();
        Some(data)
    }

    /// §4.4 `insert` + §4.7 steps 2-4: the writer's sole mutating
    /// operation. Re-checks for the key under the same write-lock
    /// critical section the insert happens in, which is what makes the
    /// worker-lookup/writer-insert race in §4.4 safe: by the time two
    /// racing `InsertionRequest`s reach here, the second always observes
    /// the first's entry and is routed as an update instead of a duplicate
    /// insert.
    ///
    /// Returns `(data, was_new)`.
    pub fn insert_or_update(
        &self,
        addr: &Arc<str>,
        worker_id: usize,
        max_threads: usize,
        location: Location,
    ) -> Result<(Arc<PerAddressData>, bool)> {
        let hash = hash_address(addr);
        let mut inner = self.inner.write();

        if let Some(existing) = inner.table.get(hash, addr) {
            let existing = existing.clone();
            existing.append_location(worker_id, location);
            return Ok((existing, false));
        }

        if inner.table.len() >= self.max_entries {
            return Err(Error::EntryCapExceeded(self.max_entries));
        }

        let data = Arc::new(PerAddressData::new(max_threads));
        data.append_location(worker_id, location);
        inner.table.insert(hash, addr.clone(), data.clone());

        inner.inserts_since_check += 1;
        if inner.inserts_since_check >= REHASH_CHECK_INTERVAL {
            inner.inserts_since_check = 0;
            match inner.table.rehash_if_needed() {
                RehashOutcome::Grew => {
                    tracing::debug!(
                        new_size = inner.table.size(),
                        "dictionary rehashed"
                    );
                }
                RehashOutcome::AtMaxTableSize => {
                    tracing::warn!(
                        entries = inner.table.len(),
                        "dictionary at MAX_TABLE_SIZE, continuing with degraded load factor"
                    );
                }
                RehashOutcome::NotNeeded => {}
            }
        }

        Ok((data, true))
    }

    pub fn len(&self) -> usize {
        self.inner.read().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_chain_depth(&self) -> usize {
        self.inner.read().table.max_chain_depth()
    }

    /// Consume the dictionary, yielding every `(address, data)` pair for
    /// the sorted output stage (§4.8 step 1).
    pub fn into_entries(self) -> Vec<(Arc<str>, Arc<PerAddressData>)> {
        self.inner.into_inner().table.drain_values().collect()
    }
}
