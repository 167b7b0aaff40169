// SPDX-License-Identifier: MIT OR Apache-2.0

//! Writer (§4.7): the single thread authorized to mutate the address
//! dictionary. Drains the insertion queue, resolving the
//! lookup-then-insert race by re-checking under the dictionary's write
//! lock before inserting (`AddressDictionary::insert_or_update`).

use std::sync::Arc;

use flume::Receiver;

use crate::context::IndexerContext;
use crate::error::Result;
use crate::pipeline::worker::InsertionRequest;

/// Drains `rx` until every worker has dropped its `Sender` clone (i.e.
/// the channel disconnects, mirroring §3 InsertionQueue's
/// `active_producers` reaching zero) and the queue is empty.
pub fn run(ctx: Arc<IndexerContext>, max_threads: usize, rx: Receiver<InsertionRequest>) -> Result<()> {
    for req in rx.iter() {
        ctx.dictionary
            .insert_or_update(&req.address, req.worker_id, max_threads, req.location)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexerConfig;
    use crate::location_array::Location;

    #[test]
    fn drains_queue_and_resolves_duplicate_inserts() {
        let ctx = IndexerContext::new(IndexerConfig::default());
        let (tx, rx) = flume::unbounded();

        let addr: Arc<str> = Arc::from("10.0.0.1");
        tx.send(InsertionRequest {
            address: addr.clone(),
            location: Location::new(0, 2),
            worker_id: 0,
        })
        .unwrap();
        tx.send(InsertionRequest {
            address: addr.clone(),
            location: Location::new(1, 2),
            worker_id: 1,
        })
        .unwrap();
        drop(tx);

        run(ctx.clone(), 2, rx).unwrap();

        let data = ctx.dictionary.lookup(&addr).unwrap();
        assert_eq!(data.total_count(), 2);
    }

    #[test]
    fn entry_cap_exceeded_propagates_as_error() {
        let mut config = IndexerConfig::default();
        config.max_entries = 1;
        let ctx = IndexerContext::new(config);
        let (tx, rx) = flume::unbounded();

        tx.send(InsertionRequest {
            address: Arc::from("a"),
            location: Location::new(0, 1),
            worker_id: 0,
        })
        .unwrap();
        tx.send(InsertionRequest {
            address: Arc::from("b"),
            location: Location::new(0, 1),
            worker_id: 0,
        })
        .unwrap();
        drop(tx);

        let err = run(ctx, 1, rx).unwrap_err();
        assert!(matches!(err, crate::error::Error::EntryCapExceeded(1)));
    }
}
