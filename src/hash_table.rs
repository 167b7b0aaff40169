// SPDX-License-Identifier: MIT OR Apache-2.0

//! The open-chained, prime-sized hash table backing the address dictionary
//! (§3 "AddressDictionary", §4.4). Kept separate from `dictionary.rs` so the
//! table mechanics (growth table, chaining, rehash) are independent of what
//! value type it stores.

use std::sync::Arc;

/// A fixed sequence of primes approximately doubling, per §4.4 "Growth
/// table". The largest entry is `MAX_TABLE_SIZE`.
const PRIME_GROWTH_TABLE: &[u64] = &[
    53, 97, 193, 389, 769, 1_543, 3_079, 6_151, 12_289, 24_593, 49_157, 98_317, 196_613, 393_241,
    786_433, 1_572_869, 3_145_739, 6_291_469, 12_582_917, 25_165_843, 50_331_653, 100_663_319,
    201_326_611, 402_653_189, 805_306_457, 1_610_612_741,
];

/// §4.4: largest allowed prime; past this, rehash stops growing the table
/// and processing continues with a degraded load factor.
pub fn max_table_size() -> u64 {
    *PRIME_GROWTH_TABLE.last().unwrap()
}

fn next_prime_after(current: u64) -> Option<u64> {
    PRIME_GROWTH_TABLE.iter().copied().find(|&p| p > current)
}

/// One chain entry: the address's hash (cached so rehash never re-hashes
/// strings, per §4.4 "Hash function"), its canonical key, and the stored
/// value.
struct Entry<V> {
    hash: u64,
    key: Arc<str>,
    value: V,
}

/// Outcome of an `insert`/growth-check pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RehashOutcome {
    NotNeeded,
    Grew,
    /// Load factor exceeded 0.8 but the table is already at
    /// `MAX_TABLE_SIZE`; processing continues with a degraded load factor.
    AtMaxTableSize,
}

/// An open-chained hash table whose bucket count is always a prime from
/// `PRIME_GROWTH_TABLE`, per §3 "AddressDictionary" invariants (b)-(d).
pub struct HashTable<V> {
    buckets: Vec<Vec<Entry<V>>>,
    prime_index: usize,
    total_records: usize,
    max_chain_depth: usize,
}

impl<V> HashTable<V> {
    pub fn new() -> Self {
        let size = PRIME_GROWTH_TABLE[0] as usize;
        Self {
            buckets: (0..size).map(|_| Vec::new()).collect(),
            prime_index: 0,
            total_records: 0,
            max_chain_depth: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.total_records
    }

    pub fn size(&self) -> usize {
        self.buckets.len()
    }

    pub fn max_chain_depth(&self) -> usize {
        self.max_chain_depth
    }

    pub fn prime_index(&self) -> usize {
        self.prime_index
    }

    fn bucket_index(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    /// §4.4 `lookup`: probe the chain by hash, return a reference on hit.
    pub fn get(&self, hash: u64, key: &str) -> Option<&V> {
        let idx = self.bucket_index(hash);
        self.buckets[idx]
            .iter()
            .find(|e| e.hash == hash && &*e.key == key)
            .map(|e| &e.value)
    }

    /// §4.4 `insert`: chain at the bucket head (push; order within a chain
    /// is not observable). The caller (writer-only, per §4.4/§4.7) must
    /// have already confirmed the key is absent via `get`.
    pub fn insert(&mut self, hash: u64, key: Arc<str>, value: V) {
        let idx = self.bucket_index(hash);
        self.buckets[idx].push(Entry { hash, key, value });
        self.total_records += 1;
        self.max_chain_depth = self.max_chain_depth.max(self.buckets[idx].len());
    }

    fn load_factor(&self) -> f64 {
        self.total_records as f64 / self.buckets.len() as f64
    }

    /// §4.4 `rehash`: move every entry to a freshly sized bucket array by
    /// its already-computed hash, without touching the stored strings.
    /// Caller holds the dictionary's write lock for the duration.
    pub fn rehash_if_needed(&mut self) -> RehashOutcome {
        if self.load_factor() <= 0.8 {
            return RehashOutcome::NotNeeded;
        }
        let mut grew = false;
        loop {
            let current_size = self.buckets.len() as u64;
            if current_size >= max_table_size() {
                return if grew {
                    RehashOutcome::Grew
                } else {
                    RehashOutcome::AtMaxTableSize
                };
            }
            let Some(new_size) = next_prime_after(current_size) else {
                return if grew {
                    RehashOutcome::Grew
                } else {
                    RehashOutcome::AtMaxTableSize
                };
            };
            self.rehash_to(new_size);
            grew = true;
            if self.load_factor() <= 0.8 {
                return RehashOutcome::Grew;
            }
        }
    }

    fn rehash_to(&mut self, new_size: u64) {
        let old_buckets = std::mem::replace(
            &mut self.buckets,
            (0..new_size).map(|_| Vec::new()).collect(),
        );
        self.max_chain_depth = 0;
        for chain in old_buckets {
            for entry in chain {
                let idx = (entry.hash % new_size) as usize;
                self.buckets[idx].push(entry);
                self.max_chain_depth = self.max_chain_depth.max(self.buckets[idx].len());
            }
        }
        self.prime_index += 1;
    }

    /// Iterate all stored values (for the sorted output stage, §4.8).
    pub fn drain_values(self) -> impl Iterator<Item = (Arc<str>, V)> {
        self.buckets
            .into_iter()
            .flat_map(|chain| chain.into_iter().map(|e| (e.key, e.value)))
    }
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::new()
    }
}
