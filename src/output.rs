// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sorted output writer (§4.8). Runs single-threaded after the writer
//! joins: collects the dictionary into a vector, sorts it by
//! `(total_count desc, address asc)`, then for each address performs an
//! N-way merge of its per-thread sorted `LocationArray`s and writes one
//! `ADDRESS,COUNT,LINE:FIELD,...` record.

use std::io::Write;

use crate::dictionary::AddressDictionary;
use crate::error::{Error, Result};
use crate::location_array::Location;

/// Consume `dictionary` and write its sorted index to `out` (§4.8 steps
/// 1-4). `out` is whatever the caller resolved per §6 — stdout or
/// `<input>.lpi`.
pub fn write_sorted_index(dictionary: AddressDictionary, out: &mut impl Write) -> Result<()> {
    let mut entries = dictionary.into_entries();

    // §4.8 step 2: (total_count desc, address asc byte-lex). `sort_by`
    // is stable, which is what guarantees the tie-break is deterministic
    // regardless of hash-table traversal order.
    entries.sort_by(|(addr_a, data_a), (addr_b, data_b)| {
        data_b
            .total_count()
            .cmp(&data_a.total_count())
            .then_with(|| addr_a.as_bytes().cmp(addr_b.as_bytes()))
    });

    let mut line = String::with_capacity(128);
    for (address, data) in entries {
        let total_count = data.total_count();

        let mut cursors: Vec<Vec<Location>> = data
            .thread_data()
            .iter()
            .filter_map(|slot| slot.locations())
            .map(|arr| {
                arr.sort_for_output();
                arr.snapshot()
            })
            .collect();
        cursors.retain(|v| !v.is_empty());

        line.clear();
        line.push_str(&address);
        line.push(',');
        line.push_str(&total_count.to_string());

        let mut positions = vec![0usize; cursors.len()];
        let mut emitted: u64 = 0;
        loop {
            let mut best: Option<(usize, Location)> = None;
            for (i, cursor) in cursors.iter().enumerate() {
                let Some(&loc) = cursor.get(positions[i]) else {
                    continue;
                };
                match best {
                    Some((_, best_loc)) if (loc.line, loc.field) >= (best_loc.line, best_loc.field) => {}
                    _ => best = Some((i, loc)),
                }
            }
            let Some((i, loc)) = best else { break };
            positions[i] += 1;

            line.push(',');
            line.push_str(&(loc.line + 1).to_string());
            line.push(':');
            line.push_str(&loc.field.to_string());
            emitted += 1;
        }
        line.push('\n');

        debug_assert_eq!(emitted, total_count, "COUNT must equal emitted location pairs");

        out.write_all(line.as_bytes()).map_err(Error::Write)?;
    }

    out.flush().map_err(Error::Write)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::DEFAULT_MAX_ENTRIES;
    use std::sync::Arc;

    fn write_to_string(dict: AddressDictionary) -> String {
        let mut buf = Vec::new();
        write_sorted_index(dict, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn tiny_ipv4_serial_scenario() {
        let dict = AddressDictionary::new(DEFAULT_MAX_ENTRIES);
        let addr: Arc<str> = Arc::from("10.0.0.1");
        dict.insert_or_update(&addr, 0, 1, Location::new(0, 2)).unwrap();
        dict.insert_or_update(&addr, 0, 1, Location::new(1, 2)).unwrap();
        let out = write_to_string(dict);
        assert_eq!(out, "10.0.0.1,2,1:2,2:2\n");
    }

    #[test]
    fn frequency_then_address_ordering() {
        let dict = AddressDictionary::new(DEFAULT_MAX_ENTRIES);
        let a: Arc<str> = Arc::from("192.168.1.1");
        let b: Arc<str> = Arc::from("aa:bb:cc:dd:ee:ff");
        let c: Arc<str> = Arc::from("::1");
        dict.insert_or_update(&a, 0, 1, Location::new(0, 2)).unwrap();
        dict.insert_or_update(&a, 0, 1, Location::new(1, 2)).unwrap();
        dict.insert_or_update(&b, 0, 1, Location::new(0, 4)).unwrap();
        dict.insert_or_update(&c, 0, 1, Location::new(0, 6)).unwrap();
        let out = write_to_string(dict);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "192.168.1.1,2,1:2,2:2",
                "::1,1,1:6",
                "aa:bb:cc:dd:ee:ff,1,1:4",
            ]
        );
    }

    #[test]
    fn frequency_tie_breaks_by_address_ascending() {
        let dict = AddressDictionary::new(DEFAULT_MAX_ENTRIES);
        let a: Arc<str> = Arc::from("zzzz::1");
        let b: Arc<str> = Arc::from("10.0.0.1");
        dict.insert_or_update(&a, 0, 1, Location::new(0, 1)).unwrap();
        dict.insert_or_update(&b, 0, 1, Location::new(0, 1)).unwrap();
        let out = write_to_string(dict);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec!["10.0.0.1,1,1:1", "zzzz::1,1,1:1"]);
    }

    #[test]
    fn merges_locations_across_multiple_threads() {
        let dict = AddressDictionary::new(DEFAULT_MAX_ENTRIES);
        let addr: Arc<str> = Arc::from("203.0.113.5");
        dict.insert_or_update(&addr, 0, 3, Location::new(5, 1)).unwrap();
        dict.insert_or_update(&addr, 1, 3, Location::new(2, 1)).unwrap();
        dict.insert_or_update(&addr, 2, 3, Location::new(8, 1)).unwrap();
        dict.insert_or_update(&addr, 1, 3, Location::new(3, 1)).unwrap();
        let out = write_to_string(dict);
        assert_eq!(out, "203.0.113.5,4,3:1,4:1,6:1,9:1\n");
    }

    #[test]
    fn empty_dictionary_produces_empty_output() {
        let dict = AddressDictionary::new(DEFAULT_MAX_ENTRIES);
        let out = write_to_string(dict);
        assert!(out.is_empty());
    }
}
