// Uniform stride sampling, the fallback when a series is not fit for LTTB.
//
// Every ceil(n / threshold)-th index is kept starting at 0. The last index is
// only kept when the stride happens to land on it; callers that need the
// final sample must take the geometric path.

/// Indices selected out of `n` items for the given `threshold`. A zero
/// threshold, or one that already fits `n`, selects everything.
pub fn select(n: usize, threshold: usize) -> Vec<usize> {
    if threshold == 0 || n <= threshold {
        return (0..n).collect();
    }
    let stride = (n + threshold - 1) / threshold;
    (0..n).step_by(stride).collect()
}

pub fn sample<T: Clone>(items: &[T], threshold: usize) -> Vec<T> {
    select(items.len(), threshold)
        .into_iter()
        .map(|i| items[i].clone())
        .collect()
}
