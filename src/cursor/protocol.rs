//! The asynchronous, resumable cursor contract
//!
//! Every source and combinator implements [`Cursor`]: a lazy, finite,
//! ordered producer of elements. `advance` suspends while waiting on the
//! store or on child cursors; `continuation` captures exactly the
//! remaining sequence so a fresh cursor instance can resume it after the
//! owning transaction is gone.
//!
//! Cursors are not restartable in place: once stopped, a new instance
//! (optionally seeded with a continuation) must be constructed to
//! continue. Dropping a cursor mid-stream is always safe; in-flight child
//! operations complete and their results are discarded.

use async_trait::async_trait;

use crate::continuation::Continuation;
use crate::errors::CursorResult;

/// Why a cursor stopped producing elements.
///
/// Computed once a cursor determines it has no next element and immutable
/// afterward. Fatal errors are not a stop reason; they propagate through
/// `Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoNextReason {
    /// The underlying source has no more elements; do not resume
    SourceExhausted,
    /// The return limit was consumed; resume from the continuation
    ReturnLimitReached,
    /// A store-side scan budget (bytes, time, keys) was consumed;
    /// resume from the continuation
    ScanLimitReached,
}

impl NoNextReason {
    /// True for resource-imposed stops, false for plain exhaustion
    pub fn is_limit_reached(&self) -> bool {
        matches!(
            self,
            NoNextReason::ReturnLimitReached | NoNextReason::ScanLimitReached
        )
    }

    /// True when the source itself ran out of elements
    pub fn is_source_exhausted(&self) -> bool {
        matches!(self, NoNextReason::SourceExhausted)
    }

    /// Stable name for log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            NoNextReason::SourceExhausted => "source_exhausted",
            NoNextReason::ReturnLimitReached => "return_limit_reached",
            NoNextReason::ScanLimitReached => "scan_limit_reached",
        }
    }
}

/// The result of one `advance` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorOutcome<T> {
    /// The cursor produced its next element
    Next(T),
    /// The cursor stopped, with the reason why
    NoNext(NoNextReason),
}

impl<T> CursorOutcome<T> {
    /// True when this outcome carries an element
    pub fn has_next(&self) -> bool {
        matches!(self, CursorOutcome::Next(_))
    }

    /// The element, if one was produced
    pub fn into_element(self) -> Option<T> {
        match self {
            CursorOutcome::Next(element) => Some(element),
            CursorOutcome::NoNext(_) => None,
        }
    }

    /// The stop reason, if the cursor stopped
    pub fn no_next_reason(&self) -> Option<NoNextReason> {
        match self {
            CursorOutcome::Next(_) => None,
            CursorOutcome::NoNext(reason) => Some(*reason),
        }
    }
}

/// A resumable, asynchronous producer of an ordered element sequence
#[async_trait]
pub trait Cursor: Send {
    /// The element type produced by this cursor
    type Item: Send;

    /// Produce the next outcome.
    ///
    /// May suspend while awaiting store I/O or child cursors, and may run
    /// multiple children concurrently internally; all such concurrency
    /// completes before the returned future resolves (except the filter
    /// cursor's pipeline, which carries evaluations across calls).
    async fn advance(&mut self) -> CursorResult<CursorOutcome<Self::Item>>;

    /// The token that resumes the remaining sequence.
    ///
    /// Valid to call only after the most recent `advance` has resolved.
    /// Returns `None` exactly when the sequence is exhausted with
    /// `SourceExhausted`. A `Some` token, fed into the same cursor
    /// definition's constructor, reproduces the exact remaining sequence.
    fn continuation(&self) -> Option<Continuation>;
}

/// A type-erased cursor, as handed out by planner-supplied factories
pub type BoxedCursor<T> = Box<dyn Cursor<Item = T> + Send>;

#[async_trait]
impl<C> Cursor for Box<C>
where
    C: Cursor + ?Sized,
{
    type Item = C::Item;

    async fn advance(&mut self) -> CursorResult<CursorOutcome<Self::Item>> {
        (**self).advance().await
    }

    fn continuation(&self) -> Option<Continuation> {
        (**self).continuation()
    }
}

/// Drive a cursor to its stop point, collecting every element.
///
/// Intended for consumers (and tests) that want the whole remaining
/// sequence of an already-bounded cursor.
pub async fn drain<C: Cursor>(cursor: &mut C) -> CursorResult<(Vec<C::Item>, NoNextReason)> {
    let mut elements = Vec::new();
    loop {
        match cursor.advance().await? {
            CursorOutcome::Next(element) => elements.push(element),
            CursorOutcome::NoNext(reason) => return Ok((elements, reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_classification() {
        assert!(!NoNextReason::SourceExhausted.is_limit_reached());
        assert!(NoNextReason::ReturnLimitReached.is_limit_reached());
        assert!(NoNextReason::ScanLimitReached.is_limit_reached());
        assert!(NoNextReason::SourceExhausted.is_source_exhausted());
    }

    #[test]
    fn test_outcome_accessors() {
        let next: CursorOutcome<i64> = CursorOutcome::Next(5);
        assert!(next.has_next());
        assert_eq!(next.no_next_reason(), None);
        assert_eq!(next.into_element(), Some(5));

        let stopped: CursorOutcome<i64> = CursorOutcome::NoNext(NoNextReason::ScanLimitReached);
        assert!(!stopped.has_next());
        assert_eq!(
            stopped.no_next_reason(),
            Some(NoNextReason::ScanLimitReached)
        );
        assert_eq!(stopped.into_element(), None);
    }
}
