//! Health score calculation
//!
//! The score is a pure function of one snapshot plus the static threshold
//! table: start at 100, subtract the configured penalty for every violated
//! threshold, clamp to [0, 100]. It is recomputed fresh on demand and never
//! stored, so it is reproducible from a serialized snapshot alone.

use crate::snapshot::Snapshot;
use crate::thresholds::ThresholdTable;

/// Compute the 0-100 health score for a snapshot
pub fn score(snapshot: &Snapshot, table: &ThresholdTable) -> u8 {
    let mut total = 100i64;

    for spec in table.specs() {
        let Some(value) = snapshot.value(spec.category, &spec.metric) else {
            continue;
        };
        if spec.is_breached(value) {
            total -= i64::from(spec.penalty);
        }
    }

    total.clamp(0, 100) as u8
}
