//! Three-valued predicate logic for filter cursors
//!
//! Predicates evaluate to `True`, `False`, or `Unknown` (Kleene logic).
//! A filter passes an element only on `True`; both `False` and `Unknown`
//! suppress it. `Unknown` propagates through negation, which is why this
//! is a three-state type rather than a nullable boolean.

use async_trait::async_trait;

use crate::errors::CursorResult;

/// The result of evaluating a predicate against one element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tristate {
    /// The predicate holds; the element passes
    True,
    /// The predicate does not hold; the element is suppressed
    False,
    /// The predicate could not be decided; the element is suppressed
    Unknown,
}

impl Tristate {
    /// Lift a two-valued result into three-valued logic
    pub fn from_bool(value: bool) -> Self {
        if value {
            Tristate::True
        } else {
            Tristate::False
        }
    }

    /// True exactly for `True`; the only verdict that passes a filter
    pub fn is_true(&self) -> bool {
        matches!(self, Tristate::True)
    }

    /// Kleene negation: `Unknown` stays `Unknown`
    pub fn not(&self) -> Self {
        match self {
            Tristate::True => Tristate::False,
            Tristate::False => Tristate::True,
            Tristate::Unknown => Tristate::Unknown,
        }
    }

    /// Kleene conjunction
    pub fn and(&self, other: Tristate) -> Self {
        match (self, other) {
            (Tristate::False, _) | (_, Tristate::False) => Tristate::False,
            (Tristate::True, Tristate::True) => Tristate::True,
            _ => Tristate::Unknown,
        }
    }

    /// Kleene disjunction
    pub fn or(&self, other: Tristate) -> Self {
        match (self, other) {
            (Tristate::True, _) | (_, Tristate::True) => Tristate::True,
            (Tristate::False, Tristate::False) => Tristate::False,
            _ => Tristate::Unknown,
        }
    }
}

/// An asynchronous predicate over cursor elements.
///
/// Evaluation may suspend (for example, to consult the store). Failures
/// propagate as fatal errors through the filter cursor and abort its
/// pipeline.
#[async_trait]
pub trait PredicateEvaluator<T>: Send + Sync {
    /// Evaluate the predicate against one element
    async fn evaluate(&self, element: &T) -> CursorResult<Tristate>;
}

/// Adapter for synchronous predicates expressed as plain closures
pub struct SyncPredicate<F> {
    predicate: F,
}

impl<F> SyncPredicate<F> {
    /// Wrap a synchronous predicate function
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

#[async_trait]
impl<T, F> PredicateEvaluator<T> for SyncPredicate<F>
where
    T: Sync,
    F: Fn(&T) -> Tristate + Send + Sync,
{
    async fn evaluate(&self, element: &T) -> CursorResult<Tristate> {
        Ok((self.predicate)(element))
    }
}
