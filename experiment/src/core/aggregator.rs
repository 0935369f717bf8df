//! Reduction of repeated measurement maps into per-key samples and means

use std::collections::BTreeMap;

use shared::{component_debug, mean, AggregateResult, Component};

/// Collect every present value per key, in input order, and average it
///
/// Input maps may disagree on their keys; a key missing from one map simply
/// contributes nothing for that map.
pub fn reduce<'a, I>(maps: I) -> AggregateResult
where
    I: IntoIterator<Item = &'a BTreeMap<String, f64>>,
{
    let mut samples_by_key: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut inputs = 0usize;
    for map in maps {
        inputs += 1;
        for (key, value) in map {
            samples_by_key.entry(key.clone()).or_default().push(*value);
        }
    }

    let average_by_key = samples_by_key
        .iter()
        .map(|(key, values)| (key.clone(), mean(values)))
        .collect();

    component_debug!(
        Component::Aggregator,
        "Reduced {} maps into {} keys",
        inputs,
        samples_by_key.len()
    );

    AggregateResult {
        samples_by_key,
        average_by_key,
    }
}
