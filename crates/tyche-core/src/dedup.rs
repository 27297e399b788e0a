use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{CanonicalRecord, RecordKey};

/// Collapse records sharing `(game, date, numbers + bonus)`.
///
/// The survivor of each group has the highest extraction-method rank; among
/// equals the first one seen wins. Output keeps first-seen key order.
pub fn deduplicate(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let mut index: HashMap<RecordKey, usize> = HashMap::with_capacity(records.len());
    let mut kept: Vec<CanonicalRecord> = Vec::with_capacity(records.len());

    for record in records {
        let key = record.key();
        match index.get(&key) {
            Some(&slot) => {
                if record.extraction_method.rank() > kept[slot].extraction_method.rank() {
                    kept[slot] = record;
                }
            }
            None => {
                index.insert(key, kept.len());
                kept.push(record);
            }
        }
    }

    kept
}

/// Publication order: newest first, then game name, then balls and source
/// so equal-date, equal-game records still order the same on every run.
pub fn sort_records(records: &mut [CanonicalRecord]) {
    records.sort_by(publication_order);
}

fn publication_order(a: &CanonicalRecord, b: &CanonicalRecord) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| a.game.name().cmp(b.game.name()))
        .then_with(|| a.all_numbers().cmp(&b.all_numbers()))
        .then_with(|| a.source_url.cmp(&b.source_url))
}
