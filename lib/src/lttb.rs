/// Largest Triangle Three Buckets (LTTB) point selection.
///
/// Picks at most `threshold` indices out of a sorted slice of (x, y) points
/// while preserving the visual shape of the curve. The first and last points
/// are always selected. Each of the `threshold - 2` interior buckets
/// contributes the point forming the largest triangle with the previously
/// selected point and the average of the following bucket.
///
/// Returns `None` when no geometric selection applies: `threshold < 3`,
/// `threshold >= points.len()`, or a bucket turns out to be empty.
pub fn select(points: &[(f64, f64)], threshold: usize) -> Option<Vec<usize>> {
    let n = points.len();
    if threshold >= n || threshold < 3 {
        return None;
    }

    let mut sampled = Vec::with_capacity(threshold);
    sampled.push(0);

    let every = (n - 2) as f64 / (threshold - 2) as f64;

    let mut a_idx = 0usize;

    for i in 0..(threshold - 2) {
        // Average of next bucket for the triangle area calculation.
        let next_start = bucket_bound(i + 1, every);
        let next_end = bucket_bound(i + 2, every).min(n);
        if next_start >= next_end {
            return None;
        }
        let next_len = (next_end - next_start) as f64;
        let mut avg_x = 0.0f64;
        let mut avg_y = 0.0f64;
        for &(x, y) in &points[next_start..next_end] {
            avg_x += x;
            avg_y += y;
        }
        avg_x /= next_len;
        avg_y /= next_len;

        let bucket_start = bucket_bound(i, every);
        let bucket_end = next_start.min(n);
        if bucket_start >= bucket_end {
            return None;
        }

        let (ax, ay) = points[a_idx];
        let mut max_area = -1.0f64;
        let mut max_idx = bucket_start;

        for (j, &(x, y)) in points
            .iter()
            .enumerate()
            .take(bucket_end)
            .skip(bucket_start)
        {
            let area = 0.5 * ((ax - avg_x) * (y - ay) - (ax - x) * (avg_y - ay)).abs();
            // Strict comparison keeps the lowest index on ties.
            if area > max_area {
                max_area = area;
                max_idx = j;
            }
        }

        sampled.push(max_idx);
        a_idx = max_idx;
    }

    sampled.push(n - 1);
    Some(sampled)
}

/// Downsamples plain (x, y) pairs, returning the input unchanged when
/// [`select`] declines.
pub fn downsample(points: &[(f64, f64)], threshold: usize) -> Vec<(f64, f64)> {
    match select(points, threshold) {
        Some(indices) => indices.into_iter().map(|i| points[i]).collect(),
        None => points.to_vec(),
    }
}

// First index of bucket i; the fixed first point occupies index 0.
fn bucket_bound(i: usize, every: f64) -> usize {
    (i as f64 * every).floor() as usize + 1
}
