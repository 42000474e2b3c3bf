//! Splitting records into size-bounded bulk messages

use std::collections::BTreeMap;

use prost::Message;

use crate::constants::MAX_BYTES_PER_BULK_RECORD;
use crate::proto::{BulkRecord, Record};

use super::convert::now_timestamp;

/// Number of records that fit in one bulk message
///
/// The total serialized size decides how many messages are needed; the
/// records are then spread evenly across them.
pub fn num_chunks(records: &[Record]) -> usize {
    if records.is_empty() {
        return 0;
    }
    let total_bytes: usize = records.iter().map(Message::encoded_len).sum();
    let num_of_bulk = total_bytes.div_ceil(MAX_BYTES_PER_BULK_RECORD).max(1);
    records.len().div_ceil(num_of_bulk)
}

/// Slice records into consecutive ranges of `num_chunks` records
pub fn bundle_records(records: Vec<Record>) -> BTreeMap<(usize, usize), Vec<Record>> {
    let per_msg = num_chunks(&records);
    let mut bundles = BTreeMap::new();
    if per_msg == 0 {
        return bundles;
    }

    let len = records.len();
    let mut iter = records.into_iter();
    for start in (0..len).step_by(per_msg) {
        let chunk: Vec<Record> = iter.by_ref().take(per_msg).collect();
        bundles.insert((start, start + per_msg), chunk);
    }
    bundles
}

/// Wrap each bundle in a `BulkRecord` envelope
pub fn get_bulk_records(
    space_key: &str,
    model_id: &str,
    model_version: Option<&str>,
    bundles: BTreeMap<(usize, usize), Vec<Record>>,
) -> Vec<BulkRecord> {
    let timestamp = now_timestamp();
    bundles
        .into_values()
        .map(|records| BulkRecord {
            space_key: space_key.to_string(),
            model_id: model_id.to_string(),
            model_version: model_version.unwrap_or_default().to_string(),
            timestamp: Some(timestamp.clone()),
            records,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: usize, payload: usize) -> Record {
        Record {
            prediction_id: format!("{}-{}", id, "x".repeat(payload)),
            ..Default::default()
        }
    }

    #[test]
    fn test_small_batch_single_bundle() {
        let records: Vec<_> = (0..10).map(|i| record(i, 10)).collect();
        assert_eq!(num_chunks(&records), 10);

        let bundles = bundle_records(records);
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[&(0, 10)].len(), 10);
    }

    #[test]
    fn test_large_batch_respects_budget() {
        let records: Vec<_> = (0..100).map(|i| record(i, 5_000)).collect();
        let per_msg = num_chunks(&records);
        assert!(per_msg < 100);

        let bundles = bundle_records(records);
        assert!(bundles.len() > 1);
        let total: usize = bundles.values().map(Vec::len).sum();
        assert_eq!(total, 100);
        for chunk in bundles.values() {
            let bytes: usize = chunk.iter().map(Message::encoded_len).sum();
            assert!(bytes <= MAX_BYTES_PER_BULK_RECORD + 5_100);
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(num_chunks(&[]), 0);
        assert!(bundle_records(Vec::new()).is_empty());
    }

    #[test]
    fn test_bulk_envelope() {
        let bundles = bundle_records(vec![record(0, 1), record(1, 1)]);
        let bulk = get_bulk_records("space", "model", Some("v1"), bundles);
        assert_eq!(bulk.len(), 1);
        assert_eq!(bulk[0].space_key, "space");
        assert_eq!(bulk[0].model_id, "model");
        assert_eq!(bulk[0].model_version, "v1");
        assert!(bulk[0].timestamp.is_some());
        assert_eq!(bulk[0].records.len(), 2);
    }
}
