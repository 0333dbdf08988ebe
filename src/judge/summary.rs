use std::collections::BTreeMap;

use crate::tally::ScoreTally;

/// Result component name -> weight per tally field.
pub type ResultWeights = BTreeMap<String, BTreeMap<String, f64>>;

/// Summarize a tally as weighted sums, one per result component.
///
/// Fields missing from the tally contribute nothing.
pub fn weighted_sum(weights: &ResultWeights, tally: &ScoreTally) -> BTreeMap<String, f64> {
    weights
        .iter()
        .map(|(key, field_weights)| {
            let total = field_weights
                .iter()
                .map(|(schema, weight)| tally.get(schema).copied().unwrap_or(0.0) * weight)
                .sum::<f64>();
            (key.clone(), total)
        })
        .collect()
}

/// Report every tally field unchanged. Used when a judge type declares no
/// result components.
pub fn passthrough(tally: &ScoreTally) -> BTreeMap<String, f64> {
    tally.clone()
}
