//! Query time spans and overlap arithmetic.

use thiserror::Error;

/// Errors constructing a [`QuerySpan`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpanError {
    #[error("span start {start} is after end {end}")]
    Inverted { start: f64, end: f64 },
    #[error("span endpoints must not be NaN")]
    NotANumber,
}

/// A closed `[start, end]` interval in unix-epoch seconds.
///
/// Infinite endpoints mean "unbounded"; all arithmetic is plain IEEE
/// comparison, so no special-casing is needed anywhere downstream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuerySpan {
    start: f64,
    end: f64,
}

impl QuerySpan {
    /// Creates a span, rejecting inverted or NaN endpoints.
    pub fn new(start: f64, end: f64) -> Result<Self, SpanError> {
        if start.is_nan() || end.is_nan() {
            return Err(SpanError::NotANumber);
        }
        if start > end {
            return Err(SpanError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// The span covering all of time.
    pub const fn unbounded() -> Self {
        Self {
            start: f64::NEG_INFINITY,
            end: f64::INFINITY,
        }
    }

    pub const fn start(&self) -> f64 {
        self.start
    }

    pub const fn end(&self) -> f64 {
        self.end
    }

    /// Whether `ts` falls inside the closed interval.
    pub fn contains(&self, ts: f64) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// The length of `[a, b] ∩ [start, end]`, clamped to be non-negative.
    pub fn overlap(&self, a: f64, b: f64) -> f64 {
        let lo = a.max(self.start);
        let hi = b.min(self.end);
        (hi - lo).max(0.0)
    }
}

impl Default for QuerySpan {
    fn default() -> Self {
        Self::unbounded()
    }
}
