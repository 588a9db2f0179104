//! Leaf cursor over a transactional range scan
//!
//! The storage boundary: a [`ScanSource`] is one key-range scan tied to
//! one transaction instance, yielding decoded elements together with the
//! store's own resume tokens. [`ScanCursor`] adapts it to the cursor
//! protocol, passing the store's limit signals through as limit stops
//! (never as exhaustion) and applying caller skip/return-limit on top.

use async_trait::async_trait;

use crate::continuation::Continuation;
use crate::cursor::protocol::{Cursor, CursorOutcome, NoNextReason};
use crate::errors::{CursorError, CursorResult};
use crate::limits::ExecutionLimits;

/// One step of an underlying range scan
#[derive(Debug)]
pub enum ScanStep<T> {
    /// The scan produced an element; `continuation` resumes after it
    Item {
        element: T,
        continuation: Continuation,
    },
    /// The scan stopped on a store-side budget (bytes, time, keys) or its
    /// own row limit; `reason` must be a limit reason
    Limit {
        reason: NoNextReason,
        continuation: Continuation,
    },
    /// The key range is finished
    End,
}

/// A transactional scan over one key range, in one direction.
///
/// Implemented by the storage layer; constructed against a single
/// transaction, optionally positioned by a continuation from an earlier
/// scan of the same range. Byte and time budgets from
/// [`ExecutionLimits`] are enforced by the implementation and surface as
/// `ScanStep::Limit`.
#[async_trait]
pub trait ScanSource: Send {
    /// The decoded element type
    type Item: Send;

    /// Fetch the next step of the scan
    async fn next(&mut self) -> CursorResult<ScanStep<Self::Item>>;
}

/// Cursor over a [`ScanSource`]
pub struct ScanCursor<S: ScanSource> {
    source: S,
    /// Resume point before the next undelivered element
    last: Option<Continuation>,
    remaining_skip: usize,
    remaining_limit: Option<usize>,
    done: Option<NoNextReason>,
}

impl<S: ScanSource> ScanCursor<S> {
    /// Wrap a scan, applying the caller's skip and return-limit.
    ///
    /// `origin` is the continuation the scan itself was positioned by, so
    /// that a consumer stopping before the first element can still resume.
    pub fn new(source: S, limits: &ExecutionLimits, origin: Option<Continuation>) -> Self {
        Self {
            source,
            last: origin,
            remaining_skip: limits.skip(),
            remaining_limit: limits.return_limit(),
            done: None,
        }
    }
}

#[async_trait]
impl<S: ScanSource> Cursor for ScanCursor<S> {
    type Item = S::Item;

    async fn advance(&mut self) -> CursorResult<CursorOutcome<S::Item>> {
        if let Some(reason) = self.done {
            return Ok(CursorOutcome::NoNext(reason));
        }
        loop {
            // Check the return limit before pulling, so the element past
            // the limit stays in the store and in the continuation.
            if self.remaining_limit == Some(0) {
                self.done = Some(NoNextReason::ReturnLimitReached);
                return Ok(CursorOutcome::NoNext(NoNextReason::ReturnLimitReached));
            }
            match self.source.next().await? {
                ScanStep::End => {
                    self.done = Some(NoNextReason::SourceExhausted);
                    self.last = None;
                    return Ok(CursorOutcome::NoNext(NoNextReason::SourceExhausted));
                }
                ScanStep::Limit {
                    reason,
                    continuation,
                } => {
                    if !reason.is_limit_reached() {
                        return Err(CursorError::invalid_argument(
                            "scan source reported a non-limit stop as a limit",
                        ));
                    }
                    self.done = Some(reason);
                    self.last = Some(continuation);
                    return Ok(CursorOutcome::NoNext(reason));
                }
                ScanStep::Item {
                    element,
                    continuation,
                } => {
                    self.last = Some(continuation);
                    if self.remaining_skip > 0 {
                        self.remaining_skip -= 1;
                        continue;
                    }
                    if let Some(remaining) = self.remaining_limit.as_mut() {
                        *remaining -= 1;
                    }
                    return Ok(CursorOutcome::Next(element));
                }
            }
        }
    }

    fn continuation(&self) -> Option<Continuation> {
        match self.done {
            Some(NoNextReason::SourceExhausted) => None,
            _ => self.last.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::continuation::encode_position;
    use crate::cursor::protocol::drain;

    /// Scripted scan used to stand in for the storage layer
    struct ScriptedScan {
        steps: std::vec::IntoIter<ScanStep<i64>>,
    }

    impl ScriptedScan {
        fn new(steps: Vec<ScanStep<i64>>) -> Self {
            Self {
                steps: steps.into_iter(),
            }
        }
    }

    #[async_trait]
    impl ScanSource for ScriptedScan {
        type Item = i64;

        async fn next(&mut self) -> CursorResult<ScanStep<i64>> {
            Ok(self.steps.next().unwrap_or(ScanStep::End))
        }
    }

    fn item(element: i64, position: usize) -> ScanStep<i64> {
        ScanStep::Item {
            element,
            continuation: encode_position(position),
        }
    }

    #[tokio::test]
    async fn test_passes_elements_through() {
        let scan = ScriptedScan::new(vec![item(1, 1), item(2, 2)]);
        let mut cursor = ScanCursor::new(scan, &ExecutionLimits::unlimited(), None);
        let (elements, reason) = drain(&mut cursor).await.unwrap();
        assert_eq!(elements, vec![1, 2]);
        assert_eq!(reason, NoNextReason::SourceExhausted);
        assert!(cursor.continuation().is_none());
    }

    #[tokio::test]
    async fn test_store_limit_signal_is_not_exhaustion() {
        let scan = ScriptedScan::new(vec![
            item(1, 1),
            ScanStep::Limit {
                reason: NoNextReason::ScanLimitReached,
                continuation: encode_position(1),
            },
        ]);
        let mut cursor = ScanCursor::new(scan, &ExecutionLimits::unlimited(), None);
        let (elements, reason) = drain(&mut cursor).await.unwrap();
        assert_eq!(elements, vec![1]);
        assert_eq!(reason, NoNextReason::ScanLimitReached);
        assert!(cursor.continuation().is_some());
    }

    #[tokio::test]
    async fn test_return_limit_leaves_next_element_resumable() {
        let scan = ScriptedScan::new(vec![item(1, 1), item(2, 2), item(3, 3)]);
        let limits = ExecutionLimits::unlimited().with_return_limit(2);
        let mut cursor = ScanCursor::new(scan, &limits, None);
        let (elements, reason) = drain(&mut cursor).await.unwrap();
        assert_eq!(elements, vec![1, 2]);
        assert_eq!(reason, NoNextReason::ReturnLimitReached);
        // Continuation points after element 2; element 3 was never pulled
        let token = cursor.continuation().unwrap();
        assert_eq!(crate::continuation::decode_position(&token).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_skip_counts_only_scanned_elements() {
        let scan = ScriptedScan::new(vec![item(1, 1), item(2, 2), item(3, 3)]);
        let limits = ExecutionLimits::unlimited().with_skip(2);
        let mut cursor = ScanCursor::new(scan, &limits, None);
        let (elements, reason) = drain(&mut cursor).await.unwrap();
        assert_eq!(elements, vec![3]);
        assert_eq!(reason, NoNextReason::SourceExhausted);
    }

    #[tokio::test]
    async fn test_rejects_non_limit_stop_signal() {
        let scan = ScriptedScan::new(vec![ScanStep::Limit {
            reason: NoNextReason::SourceExhausted,
            continuation: encode_position(0),
        }]);
        let mut cursor = ScanCursor::new(scan, &ExecutionLimits::unlimited(), None);
        assert!(matches!(
            cursor.advance().await.unwrap_err(),
            CursorError::InvalidArgument(_)
        ));
    }
}
