use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::{reduce, reduce_with_method, Reduction, SampleSeries, Threshold};

/// Reduces independent series in parallel, one reduction per series. The
/// output is in the same order as the input.
pub fn reduce_many(series: &[SampleSeries], threshold: impl Into<Threshold>) -> Vec<SampleSeries> {
    let threshold = threshold.into();
    series.par_iter().map(|s| reduce(s, threshold)).collect()
}

// Keyed variant, e.g. one series per device.
pub fn reduce_keyed<K>(
    series: BTreeMap<K, SampleSeries>,
    threshold: impl Into<Threshold>,
) -> BTreeMap<K, Reduction>
where
    K: Ord + Send,
{
    let threshold = threshold.into();
    series
        .into_par_iter()
        .map(|(key, s)| (key, reduce_with_method(&s, threshold)))
        .collect()
}
