use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::{lttb, stride, Error, Result, Sample, SampleSeries, Threshold};

// Method records which path produced a Reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    // The input already fit the budget, or no budget was given.
    PassThrough,
    Lttb,
    Stride,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Method::PassThrough => "pass_through",
            Method::Lttb => "lttb",
            Method::Stride => "stride",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reduction {
    pub samples: SampleSeries,
    pub method: Method,
}

/// Reduces `series` to at most `threshold` samples.
///
/// Series where every sample has a finite value go through LTTB, which keeps
/// the first and last samples and the local extremes in between. Anything
/// else (absent or non-finite values, or a threshold below 3) is stride
/// sampled instead. A zero or negative threshold returns the input as is.
///
/// The input is trusted to be sorted by timestamp; see [`reduce_checked`].
pub fn reduce(series: &[Sample], threshold: impl Into<Threshold>) -> SampleSeries {
    reduce_with_method(series, threshold).samples
}

/// Same selection as [`reduce`], also reporting which path was taken.
pub fn reduce_with_method(series: &[Sample], threshold: impl Into<Threshold>) -> Reduction {
    let threshold = threshold.into();
    let n = series.len();

    if threshold.is_pass_through() || n <= threshold.get() {
        return Reduction {
            samples: series.to_vec(),
            method: Method::PassThrough,
        };
    }

    let threshold = threshold.get();
    if threshold < 3 {
        debug!(n, threshold, "threshold too small for lttb, stride sampling");
        return stride_reduction(series, threshold);
    }

    let mut points = Vec::with_capacity(n);
    for (index, sample) in series.iter().enumerate() {
        match sample.ordinate() {
            Some(point) => points.push(point),
            None => {
                debug!(n, threshold, index, value = ?sample.value, "non-numeric sample, stride sampling");
                return stride_reduction(series, threshold);
            }
        }
    }

    match lttb::select(&points, threshold) {
        Some(indices) => Reduction {
            samples: indices.into_iter().map(|i| series[i]).collect(),
            method: Method::Lttb,
        },
        None => {
            debug!(n, threshold, "empty lttb bucket, stride sampling");
            stride_reduction(series, threshold)
        }
    }
}

/// Like [`reduce_with_method`] but rejects series whose timestamps are not
/// strictly ascending.
pub fn reduce_checked(series: &[Sample], threshold: impl Into<Threshold>) -> Result<Reduction> {
    check_order(series)?;
    Ok(reduce_with_method(series, threshold))
}

pub fn check_order(series: &[Sample]) -> Result<()> {
    match series
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        Some(i) => Err(Error::Unordered { index: i + 1 }),
        None => Ok(()),
    }
}

fn stride_reduction(series: &[Sample], threshold: usize) -> Reduction {
    Reduction {
        samples: stride::sample(series, threshold),
        method: Method::Stride,
    }
}
