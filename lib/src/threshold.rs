use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Maximum number of samples a reduction may emit.
///
/// Zero is the pass-through sentinel: no reduction is requested. Negative
/// requests are clamped to zero rather than rejected, so a caller passing
/// through an unchecked signed query parameter gets its input back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Threshold(usize);

impl Threshold {
    pub const PASS_THROUGH: Threshold = Threshold(0);
    pub const DEFAULT: Threshold = Threshold(500);

    pub fn new(points: usize) -> Self {
        Threshold(points)
    }

    pub fn get(self) -> usize {
        self.0
    }

    pub fn is_pass_through(self) -> bool {
        self.0 == 0
    }
}

impl From<usize> for Threshold {
    fn from(points: usize) -> Self {
        Threshold(points)
    }
}

impl From<i64> for Threshold {
    fn from(points: i64) -> Self {
        Threshold(usize::try_from(points).unwrap_or(0))
    }
}

impl From<i32> for Threshold {
    fn from(points: i32) -> Self {
        Threshold::from(i64::from(points))
    }
}

impl FromStr for Threshold {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(points) = s.parse::<usize>() {
            return Ok(Threshold(points));
        }
        // Out of range positives are not clamped, only negatives are.
        match s.parse::<i64>() {
            Ok(points) if points < 0 => Ok(Threshold::PASS_THROUGH),
            _ => Err(Error::InvalidThreshold(s.to_string())),
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
