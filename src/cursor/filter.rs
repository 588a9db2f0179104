//! Order-preserving filter cursor with a bounded evaluation pipeline
//!
//! Wraps an inner cursor and a predicate evaluator. Up to
//! `pipeline_depth` predicate evaluations may be in flight at once,
//! overlapping the inner cursor's store I/O with predicate computation,
//! but filtered output is delivered in exactly the inner cursor's order:
//! an element whose predicate resolved first is never surfaced before an
//! earlier element still awaiting its own verdict.
//!
//! Verdicts follow three-valued logic: `True` passes, `False` and
//! `Unknown` both suppress. After filtering, skip and return-limit are
//! applied counting only elements that passed; callers delegating limits
//! to the inner cursor should hand it `without_skip_and_limit`.
//!
//! The continuation delegates to the inner cursor at the last element
//! whose verdict this cursor consumed. Evaluations still in flight when
//! the consumer stops are discarded and the continuation rewinds to
//! before their elements, so nothing is lost.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesOrdered, StreamExt};

use crate::continuation::Continuation;
use crate::cursor::protocol::{BoxedCursor, Cursor, CursorOutcome, NoNextReason};
use crate::errors::{CursorError, CursorResult};
use crate::limits::{CursorConfig, ExecutionLimits};
use crate::observability::{Logger, MetricsRegistry};
use crate::predicate::{PredicateEvaluator, Tristate};

/// A completed (or failed) predicate evaluation, in submission order
type Evaluation<T> = (CursorResult<Tristate>, T, Option<Continuation>);

enum InnerState {
    Pumping,
    Done(NoNextReason),
}

enum ResumePoint {
    /// Nothing consumed yet; resume from the token this cursor started at
    Origin(Option<Continuation>),
    /// Resume after the last element whose verdict was consumed
    At(Continuation),
    /// The inner sequence is plainly exhausted
    Exhausted,
}

/// A cursor that filters an inner cursor through an asynchronous
/// predicate without reordering it
pub struct FilterCursor<T> {
    inner: BoxedCursor<T>,
    evaluator: Arc<dyn PredicateEvaluator<T>>,
    pipeline_depth: usize,
    in_flight: FuturesOrdered<BoxFuture<'static, Evaluation<T>>>,
    inner_state: InnerState,
    /// Where the inner cursor's own stop rewinds to; applied only once
    /// every queued verdict has been consumed
    stop_resume: Option<ResumePoint>,
    resume: ResumePoint,
    remaining_skip: usize,
    remaining_limit: Option<usize>,
    done: Option<NoNextReason>,
    failed: Option<String>,
    metrics: Arc<MetricsRegistry>,
}

impl<T: Send + Sync + 'static> FilterCursor<T> {
    /// Wrap `inner` with a predicate pipeline.
    ///
    /// `origin` is the continuation `inner` was constructed from, so a
    /// consumer stopping before anything is delivered can still resume.
    /// Skip and return-limit from `limits` are applied here, counting
    /// only elements that pass the predicate.
    pub fn new(
        inner: BoxedCursor<T>,
        evaluator: Arc<dyn PredicateEvaluator<T>>,
        limits: &ExecutionLimits,
        config: &CursorConfig,
        origin: Option<Continuation>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            inner,
            evaluator,
            pipeline_depth: config.pipeline_depth(),
            in_flight: FuturesOrdered::new(),
            inner_state: InnerState::Pumping,
            stop_resume: None,
            resume: ResumePoint::Origin(origin),
            remaining_skip: limits.skip(),
            remaining_limit: limits.return_limit(),
            done: None,
            failed: None,
            metrics,
        }
    }

    /// Pump the inner cursor until the pipeline is full or the inner
    /// cursor stops
    async fn fill_pipeline(&mut self) -> CursorResult<()> {
        while matches!(self.inner_state, InnerState::Pumping)
            && self.in_flight.len() < self.pipeline_depth
        {
            match self.inner.advance().await? {
                CursorOutcome::Next(element) => {
                    self.metrics.increment_filter_given();
                    self.metrics.increment_filter_during();
                    let post = self.inner.continuation();
                    let evaluator = self.evaluator.clone();
                    self.in_flight.push_back(Box::pin(async move {
                        let verdict = evaluator.evaluate(&element).await;
                        (verdict, element, post)
                    }));
                }
                CursorOutcome::NoNext(reason) => {
                    self.inner_state = InnerState::Done(reason);
                    self.stop_resume = Some(if reason.is_source_exhausted() {
                        ResumePoint::Exhausted
                    } else {
                        match self.inner.continuation() {
                            Some(token) => ResumePoint::At(token),
                            None => ResumePoint::Exhausted,
                        }
                    });
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Cursor for FilterCursor<T> {
    type Item = T;

    async fn advance(&mut self) -> CursorResult<CursorOutcome<T>> {
        if let Some(message) = &self.failed {
            return Err(CursorError::predicate(message.clone()));
        }
        if let Some(reason) = self.done {
            return Ok(CursorOutcome::NoNext(reason));
        }
        loop {
            // The element past the limit stays undelivered and the
            // continuation stays before it.
            if self.remaining_limit == Some(0) {
                self.done = Some(NoNextReason::ReturnLimitReached);
                return Ok(CursorOutcome::NoNext(NoNextReason::ReturnLimitReached));
            }
            self.fill_pipeline().await?;
            match self.in_flight.next().await {
                None => {
                    let reason = match self.inner_state {
                        InnerState::Done(reason) => reason,
                        // fill_pipeline leaves the pipeline non-empty
                        // whenever the inner cursor is still pumping
                        InnerState::Pumping => NoNextReason::SourceExhausted,
                    };
                    if let Some(stop) = self.stop_resume.take() {
                        self.resume = stop;
                    }
                    self.done = Some(reason);
                    return Ok(CursorOutcome::NoNext(reason));
                }
                Some((verdict, element, post)) => {
                    let verdict = match verdict {
                        Ok(verdict) => verdict,
                        Err(error) => {
                            // Abort the pipeline; in-flight evaluations
                            // are dropped, not retried.
                            let message = error.to_string();
                            Logger::error(
                                "filter_pipeline_aborted",
                                &[("error", message.as_str())],
                            );
                            self.failed = Some(message);
                            return Err(error);
                        }
                    };
                    self.resume = match post {
                        Some(token) => ResumePoint::At(token),
                        None => ResumePoint::Exhausted,
                    };
                    if verdict.is_true() {
                        self.metrics.increment_filter_passed();
                        if self.remaining_skip > 0 {
                            self.remaining_skip -= 1;
                            continue;
                        }
                        if let Some(remaining) = self.remaining_limit.as_mut() {
                            *remaining -= 1;
                        }
                        return Ok(CursorOutcome::Next(element));
                    }
                    self.metrics.increment_filter_discarded();
                }
            }
        }
    }

    fn continuation(&self) -> Option<Continuation> {
        match &self.resume {
            ResumePoint::Origin(token) => token.clone(),
            ResumePoint::At(token) => Some(token.clone()),
            ResumePoint::Exhausted => None,
        }
    }
}
