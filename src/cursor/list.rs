//! In-memory list cursor
//!
//! The simplest leaf: iterates an ordered in-memory sequence, applying
//! skip and return-limit itself and handing out position tokens. Serves
//! callers with already-materialized sequences and is the reference leaf
//! for exercising combinators.

use async_trait::async_trait;

use crate::continuation::{decode_position, encode_position, Continuation};
use crate::cursor::protocol::{Cursor, CursorOutcome, NoNextReason};
use crate::errors::{CursorError, CursorResult};
use crate::limits::ExecutionLimits;

/// A cursor over an in-memory ordered sequence
#[derive(Debug)]
pub struct ListCursor<T> {
    items: Vec<T>,
    position: usize,
    remaining_limit: Option<usize>,
    done: Option<NoNextReason>,
}

impl<T: Clone + Send> ListCursor<T> {
    /// Create a cursor over `items`, optionally resuming from a position
    /// token produced by an earlier instance over the same sequence.
    ///
    /// Skip is consumed here, before the first yielded element; on resume
    /// the caller passes whatever skip remains unapplied (usually none).
    pub fn new(
        items: Vec<T>,
        limits: &ExecutionLimits,
        continuation: Option<&Continuation>,
    ) -> CursorResult<Self> {
        let start = match continuation {
            Some(token) => decode_position(token)?,
            None => 0,
        };
        if start > items.len() {
            return Err(CursorError::invalid_continuation(format!(
                "position {} beyond sequence of length {}",
                start,
                items.len()
            )));
        }
        let position = start.saturating_add(limits.skip()).min(items.len());
        Ok(Self {
            items,
            position,
            remaining_limit: limits.return_limit(),
            done: None,
        })
    }

    /// Cursor over `items` with no limits and no resume point
    pub fn unlimited(items: Vec<T>) -> Self {
        Self {
            items,
            position: 0,
            remaining_limit: None,
            done: None,
        }
    }
}

#[async_trait]
impl<T: Clone + Send> Cursor for ListCursor<T> {
    type Item = T;

    async fn advance(&mut self) -> CursorResult<CursorOutcome<T>> {
        if let Some(reason) = self.done {
            return Ok(CursorOutcome::NoNext(reason));
        }
        // Exhaustion wins over an exactly-consumed limit: if the sequence
        // ends right where the limit does, there is nothing to resume.
        if self.position >= self.items.len() {
            self.done = Some(NoNextReason::SourceExhausted);
            return Ok(CursorOutcome::NoNext(NoNextReason::SourceExhausted));
        }
        if self.remaining_limit == Some(0) {
            self.done = Some(NoNextReason::ReturnLimitReached);
            return Ok(CursorOutcome::NoNext(NoNextReason::ReturnLimitReached));
        }
        let element = self.items[self.position].clone();
        self.position += 1;
        if let Some(remaining) = self.remaining_limit.as_mut() {
            *remaining -= 1;
        }
        Ok(CursorOutcome::Next(element))
    }

    fn continuation(&self) -> Option<Continuation> {
        match self.done {
            Some(NoNextReason::SourceExhausted) => None,
            _ => Some(encode_position(self.position)),
        }
    }
}
