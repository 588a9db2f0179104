//! Ordered merge ("union") of compatibly-ordered child cursors
//!
//! Combines two or more child cursors, each individually ordered by the
//! same comparison key, into one ordered output stream. Ties are not
//! deduplicated: a key present in two children yields two elements, one
//! per child, in child-index order. Deduplication, if desired, is the
//! responsibility of a consumer layered on top.
//!
//! Each round advances every stale child concurrently and waits for all
//! of them, so the true extreme key is known before any output decision.
//! If any child stops on a resource limit the whole merge stops with that
//! reason: only a uniform stop boundary across all children keeps the
//! composite continuation replayable without skips or duplicates. Plain
//! exhaustion of one child just drops it from the merge.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join_all;

use crate::continuation::{decode_union, encode_union, ChildResume, Continuation};
use crate::cursor::protocol::{BoxedCursor, Cursor, CursorOutcome, NoNextReason};
use crate::errors::{CursorError, CursorResult};
use crate::key::{compare_in_direction, ComparisonKey};
use crate::observability::{Logger, MetricsRegistry};

/// Constructs a fresh child cursor from a continuation fragment.
///
/// Supplied by the planner; must be pure, so that reconstructing a child
/// from a saved fragment deterministically reproduces its remaining
/// output.
pub type ChildFactory<T> =
    Box<dyn Fn(Option<Continuation>) -> CursorResult<BoxedCursor<T>> + Send>;

/// Derives the comparison key from an element.
///
/// Must be pure and deterministic; children must produce elements in
/// ascending (descending when reversed) order of this key.
pub type KeyFunction<T> = Arc<dyn Fn(&T) -> ComparisonKey + Send + Sync>;

/// A fetched-but-undelivered element of one child
struct CachedElement<T> {
    element: T,
    key: ComparisonKey,
    /// The child's continuation captured right after this element was
    /// fetched; becomes the child's resume point once it is delivered
    post: Option<Continuation>,
}

/// Book-keeping for one child, owned exclusively by the merge
struct ChildState<T> {
    cursor: Option<BoxedCursor<T>>,
    cached: Option<CachedElement<T>>,
    /// Resume point that replays everything not yet delivered. Rolls
    /// forward only when an element is delivered, so a cached element is
    /// never lost to a stop.
    resume: ChildResume,
    done: Option<NoNextReason>,
}

impl<T: Send> ChildState<T> {
    fn needs_fetch(&self) -> bool {
        self.done.is_none() && self.cached.is_none() && self.cursor.is_some()
    }

    async fn fetch(&mut self, key_function: KeyFunction<T>) -> CursorResult<()> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(());
        };
        match cursor.advance().await? {
            CursorOutcome::Next(element) => {
                let key = (key_function)(&element);
                let post = cursor.continuation();
                self.cached = Some(CachedElement { element, key, post });
            }
            CursorOutcome::NoNext(reason) => {
                self.done = Some(reason);
                self.resume = if reason.is_source_exhausted() {
                    ChildResume::Exhausted
                } else {
                    match cursor.continuation() {
                        Some(token) => ChildResume::Active(token),
                        None => ChildResume::Exhausted,
                    }
                };
                self.cursor = None;
            }
        }
        Ok(())
    }
}

/// A cursor merging several compatibly-ordered child cursors into one
/// ordered, resumable stream
pub struct UnionCursor<T> {
    key_function: KeyFunction<T>,
    reverse: bool,
    children: Vec<ChildState<T>>,
    done: Option<NoNextReason>,
    metrics: Arc<MetricsRegistry>,
}

impl<T> std::fmt::Debug for UnionCursor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnionCursor")
            .field("reverse", &self.reverse)
            .field("children", &self.children.len())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> UnionCursor<T> {
    /// Create a union over two or more child cursors.
    ///
    /// `factories` build each child from its continuation fragment; the
    /// whole-union `continuation`, if present, is split into those
    /// fragments. Fewer than two children is an `InvalidArgument`; a
    /// continuation that does not match this topology is an
    /// `InvalidContinuation`.
    pub fn new(
        key_function: KeyFunction<T>,
        reverse: bool,
        factories: Vec<ChildFactory<T>>,
        continuation: Option<&Continuation>,
        metrics: Arc<MetricsRegistry>,
    ) -> CursorResult<Self> {
        if factories.len() < 2 {
            return Err(CursorError::invalid_argument(format!(
                "union requires at least two child cursors, got {}",
                factories.len()
            )));
        }
        let resumes = match continuation {
            Some(token) => {
                let resumes = decode_union(token, factories.len())?;
                metrics.increment_continuations_decoded();
                resumes
            }
            None => vec![ChildResume::Start; factories.len()],
        };
        let mut children = Vec::with_capacity(factories.len());
        for (factory, resume) in factories.iter().zip(resumes) {
            let state = match &resume {
                ChildResume::Exhausted => ChildState {
                    cursor: None,
                    cached: None,
                    resume,
                    done: Some(NoNextReason::SourceExhausted),
                },
                ChildResume::Start => ChildState {
                    cursor: Some(factory(None)?),
                    cached: None,
                    resume,
                    done: None,
                },
                ChildResume::Active(fragment) => ChildState {
                    cursor: Some(factory(Some(fragment.clone()))?),
                    cached: None,
                    resume,
                    done: None,
                },
            };
            children.push(state);
        }
        let child_count = children.len().to_string();
        Logger::trace(
            "union_created",
            &[
                ("children", child_count.as_str()),
                ("reverse", if reverse { "true" } else { "false" }),
                ("resumed", if continuation.is_some() { "true" } else { "false" }),
            ],
        );
        Ok(Self {
            key_function,
            reverse,
            children,
            done: None,
            metrics,
        })
    }

    /// Take the cached element holding the extreme key, ties going to the
    /// lowest child index; `None` when no child has anything cached
    fn take_next(&mut self) -> Option<(usize, CachedElement<T>)> {
        let mut best: Option<(usize, &ComparisonKey)> = None;
        for (index, child) in self.children.iter().enumerate() {
            let Some(cached) = child.cached.as_ref() else {
                continue;
            };
            let better = match best {
                None => true,
                Some((_, best_key)) => {
                    compare_in_direction(&cached.key, best_key, self.reverse) == Ordering::Less
                }
            };
            if better {
                best = Some((index, &cached.key));
            }
        }
        let (index, _) = best?;
        let cached = self.children[index].cached.take()?;
        Some((index, cached))
    }

    /// First resource-imposed stop among the children, in child order
    fn limit_stop(&self) -> Option<NoNextReason> {
        self.children
            .iter()
            .filter_map(|child| child.done)
            .find(NoNextReason::is_limit_reached)
    }
}

#[async_trait]
impl<T: Send + 'static> Cursor for UnionCursor<T> {
    type Item = T;

    async fn advance(&mut self) -> CursorResult<CursorOutcome<T>> {
        if let Some(reason) = self.done {
            return Ok(CursorOutcome::NoNext(reason));
        }
        self.metrics.increment_union_rounds();

        // Full-width fan-out: advance every stale child and wait for all
        // of them before deciding anything.
        let key_function = self.key_function.clone();
        let fetches: Vec<_> = self
            .children
            .iter_mut()
            .filter(|child| child.needs_fetch())
            .map(|child| child.fetch(key_function.clone()))
            .collect();
        try_join_all(fetches).await?;

        // A resource-imposed stop on any child stops the whole merge, even
        // if other children still hold cached elements.
        if let Some(reason) = self.limit_stop() {
            self.done = Some(reason);
            self.metrics.increment_union_limit_stops();
            Logger::trace("union_limit_stop", &[("reason", reason.as_str())]);
            return Ok(CursorOutcome::NoNext(reason));
        }

        let Some((index, cached)) = self.take_next() else {
            self.done = Some(NoNextReason::SourceExhausted);
            return Ok(CursorOutcome::NoNext(NoNextReason::SourceExhausted));
        };
        // The element is delivered, so the child's resume point rolls
        // forward past it.
        self.children[index].resume = match cached.post {
            Some(token) => ChildResume::Active(token),
            None => ChildResume::Exhausted,
        };
        self.metrics.increment_union_elements();
        Ok(CursorOutcome::Next(cached.element))
    }

    fn continuation(&self) -> Option<Continuation> {
        if self
            .children
            .iter()
            .all(|child| child.resume == ChildResume::Exhausted)
        {
            return None;
        }
        let resumes: Vec<ChildResume> = self
            .children
            .iter()
            .map(|child| child.resume.clone())
            .collect();
        self.metrics.increment_continuations_encoded();
        Some(encode_union(&resumes))
    }
}
