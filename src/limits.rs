//! Execution limits and cursor configuration
//!
//! Limits are immutable value objects handed down from the caller. Cursors
//! consume skip/limit by decrementing internal counters; the caller's
//! request is never mutated mid-scan. A combinator that has fully applied
//! skip and return-limit itself clears them before delegating to children,
//! so they are never applied twice.

use std::time::Duration;

/// Limits applied to a single cursor execution.
///
/// `skip` and `return_limit` bound what is yielded to the consumer;
/// `byte_limit` and `time_limit` are store-side scan budgets enforced by
/// leaf cursors, which report them as `ScanLimitReached`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionLimits {
    skip: usize,
    return_limit: Option<usize>,
    byte_limit: Option<u64>,
    time_limit: Option<Duration>,
}

impl ExecutionLimits {
    /// Limits that allow an execution to run to source exhaustion
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Discard this many elements before the first yielded element
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Yield at most this many elements, then stop with `ReturnLimitReached`
    pub fn with_return_limit(mut self, limit: usize) -> Self {
        self.return_limit = Some(limit);
        self
    }

    /// Store-side byte budget for the underlying scan
    pub fn with_byte_limit(mut self, bytes: u64) -> Self {
        self.byte_limit = Some(bytes);
        self
    }

    /// Store-side time budget for the underlying scan
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Elements to discard before the first yielded element
    pub fn skip(&self) -> usize {
        self.skip
    }

    /// Maximum elements to yield, if bounded
    pub fn return_limit(&self) -> Option<usize> {
        self.return_limit
    }

    /// Store-side byte budget, if bounded
    pub fn byte_limit(&self) -> Option<u64> {
        self.byte_limit
    }

    /// Store-side time budget, if bounded
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    /// A copy of these limits with skip and return-limit cleared.
    ///
    /// Used by combinators that apply skip/limit themselves before
    /// delegating the rest of the limits to child cursors.
    pub fn without_skip_and_limit(&self) -> Self {
        Self {
            skip: 0,
            return_limit: None,
            byte_limit: self.byte_limit,
            time_limit: self.time_limit,
        }
    }
}

/// Externally-sourced cursor configuration.
///
/// Holds knobs that are properties of the deployment rather than of one
/// execution, currently the filter pipeline depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorConfig {
    pipeline_depth: usize,
}

/// Default bound on concurrently in-flight predicate evaluations
pub const DEFAULT_PIPELINE_DEPTH: usize = 10;

impl CursorConfig {
    /// Configuration with the default pipeline depth
    pub fn new() -> Self {
        Self {
            pipeline_depth: DEFAULT_PIPELINE_DEPTH,
        }
    }

    /// Set the bound on concurrently in-flight predicate evaluations.
    ///
    /// A depth of 1 disables pipelining (strictly serial evaluation);
    /// zero is rejected.
    pub fn with_pipeline_depth(mut self, depth: usize) -> crate::errors::CursorResult<Self> {
        if depth == 0 {
            return Err(crate::errors::CursorError::invalid_argument(
                "pipeline depth must be at least 1",
            ));
        }
        self.pipeline_depth = depth;
        Ok(self)
    }

    /// Bound on concurrently in-flight predicate evaluations
    pub fn pipeline_depth(&self) -> usize {
        self.pipeline_depth
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self::new()
    }
}
