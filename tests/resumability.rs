//! Resumability Invariant Tests
//!
//! For any prefix stop point, reconstructing a cursor from its
//! continuation and concatenating the outputs must reproduce exactly the
//! sequence an uninterrupted run would have produced: no duplicate, no
//! loss.

use std::sync::Arc;

use serde_json::json;
use windrow::continuation::Continuation;
use windrow::cursor::{
    drain, BoxedCursor, ChildFactory, Cursor, CursorOutcome, KeyFunction, ListCursor,
    NoNextReason, UnionCursor,
};
use windrow::errors::CursorError;
use windrow::limits::ExecutionLimits;
use windrow::observability::MetricsRegistry;

// =============================================================================
// Helper Functions
// =============================================================================

fn identity_key() -> KeyFunction<i64> {
    Arc::new(|n: &i64| vec![json!(n)])
}

fn list_child(items: Vec<i64>, limits: ExecutionLimits) -> ChildFactory<i64> {
    Box::new(move |continuation| {
        Ok(Box::new(ListCursor::new(
            items.clone(),
            &limits,
            continuation.as_ref(),
        )?) as BoxedCursor<i64>)
    })
}

fn fresh_union(continuation: Option<&Continuation>) -> UnionCursor<i64> {
    UnionCursor::new(
        identity_key(),
        false,
        vec![
            list_child(vec![1, 3, 5, 7], ExecutionLimits::unlimited()),
            list_child(vec![2, 3, 6], ExecutionLimits::unlimited()),
            list_child(vec![3, 9], ExecutionLimits::unlimited()),
        ],
        continuation,
        Arc::new(MetricsRegistry::new()),
    )
    .unwrap()
}

async fn take(cursor: &mut UnionCursor<i64>, count: usize) -> Vec<i64> {
    let mut taken = Vec::new();
    for _ in 0..count {
        match cursor.advance().await.unwrap() {
            CursorOutcome::Next(element) => taken.push(element),
            CursorOutcome::NoNext(_) => break,
        }
    }
    taken
}

// =============================================================================
// Prefix-Stop Sweep
// =============================================================================

/// Stopping after every possible prefix and resuming from the
/// continuation reproduces the uninterrupted sequence exactly.
#[tokio::test]
async fn test_resume_at_every_prefix() {
    let expected = vec![1, 2, 3, 3, 3, 5, 6, 7, 9];

    let mut full = fresh_union(None);
    let (all, reason) = drain(&mut full).await.unwrap();
    assert_eq!(all, expected);
    assert_eq!(reason, NoNextReason::SourceExhausted);

    for stop_after in 1..expected.len() {
        let mut first = fresh_union(None);
        let prefix = take(&mut first, stop_after).await;
        assert_eq!(prefix, expected[..stop_after], "prefix at {stop_after}");

        let token = first
            .continuation()
            .expect("mid-stream stop must be resumable");
        let mut second = fresh_union(Some(&token));
        let (suffix, reason) = drain(&mut second).await.unwrap();
        assert_eq!(suffix, expected[stop_after..], "suffix at {stop_after}");
        assert_eq!(reason, NoNextReason::SourceExhausted);
    }
}

/// Resuming repeatedly, two elements at a time, still loses and
/// duplicates nothing.
#[tokio::test]
async fn test_chained_resumption() {
    let expected = vec![1, 2, 3, 3, 3, 5, 6, 7, 9];
    let mut collected = Vec::new();
    let mut token: Option<Continuation> = None;

    loop {
        let mut cursor = fresh_union(token.as_ref());
        let chunk = take(&mut cursor, 2).await;
        let finished = chunk.len() < 2;
        collected.extend(chunk);
        match cursor.continuation() {
            Some(next) => token = Some(next),
            None => break,
        }
        if finished {
            break;
        }
    }
    assert_eq!(collected, expected);
}

// =============================================================================
// Resumption Across Limit Stops
// =============================================================================

/// After a limit-forced stop, resuming with fresh limits continues from
/// the uniform stop boundary: the undelivered cached element of the
/// unlimited child is replayed, not skipped.
#[tokio::test]
async fn test_resume_after_limit_stop() {
    let limited = |limit| {
        UnionCursor::new(
            identity_key(),
            false,
            vec![
                list_child(vec![1, 3, 5, 7], ExecutionLimits::unlimited()),
                list_child(
                    vec![2, 3, 6],
                    match limit {
                        Some(n) => ExecutionLimits::unlimited().with_return_limit(n),
                        None => ExecutionLimits::unlimited(),
                    },
                ),
            ],
            None,
            Arc::new(MetricsRegistry::new()),
        )
        .unwrap()
    };

    let mut first = limited(Some(2));
    let (prefix, reason) = drain(&mut first).await.unwrap();
    assert_eq!(prefix, vec![1, 2, 3, 3]);
    assert_eq!(reason, NoNextReason::ReturnLimitReached);

    let token = first.continuation().unwrap();
    let mut second = UnionCursor::new(
        identity_key(),
        false,
        vec![
            list_child(vec![1, 3, 5, 7], ExecutionLimits::unlimited()),
            list_child(vec![2, 3, 6], ExecutionLimits::unlimited()),
        ],
        Some(&token),
        Arc::new(MetricsRegistry::new()),
    )
    .unwrap();
    let (suffix, reason) = drain(&mut second).await.unwrap();
    assert_eq!(suffix, vec![5, 6, 7]);
    assert_eq!(reason, NoNextReason::SourceExhausted);
}

// =============================================================================
// Continuation Validation
// =============================================================================

/// Garbage bytes are rejected at construction, producing no output.
#[tokio::test]
async fn test_malformed_continuation_rejected() {
    let bad = Continuation::new(vec![0x00, 0xde, 0xad]);
    let result = UnionCursor::new(
        identity_key(),
        false,
        vec![
            list_child(vec![1], ExecutionLimits::unlimited()),
            list_child(vec![2], ExecutionLimits::unlimited()),
        ],
        Some(&bad),
        Arc::new(MetricsRegistry::new()),
    );
    assert!(matches!(
        result.unwrap_err(),
        CursorError::InvalidContinuation(_)
    ));
}

/// A continuation from a three-child union does not fit a two-child one.
#[tokio::test]
async fn test_topology_mismatch_rejected() {
    let mut three = fresh_union(None);
    let _ = take(&mut three, 2).await;
    let token = three.continuation().unwrap();

    let result = UnionCursor::new(
        identity_key(),
        false,
        vec![
            list_child(vec![1, 3, 5, 7], ExecutionLimits::unlimited()),
            list_child(vec![2, 3, 6], ExecutionLimits::unlimited()),
        ],
        Some(&token),
        Arc::new(MetricsRegistry::new()),
    );
    assert!(matches!(
        result.unwrap_err(),
        CursorError::InvalidContinuation(_)
    ));
}

/// A leaf continuation fed to the wrong cursor definition fails loudly
/// instead of silently restarting.
#[tokio::test]
async fn test_leaf_token_not_a_union_token() {
    let limits = ExecutionLimits::unlimited().with_return_limit(1);
    let mut leaf = ListCursor::new(vec![1, 2, 3], &limits, None).unwrap();
    let (_, reason) = drain(&mut leaf).await.unwrap();
    assert_eq!(reason, NoNextReason::ReturnLimitReached);
    let token = leaf.continuation().unwrap();

    let result = UnionCursor::new(
        identity_key(),
        false,
        vec![
            list_child(vec![1], ExecutionLimits::unlimited()),
            list_child(vec![2], ExecutionLimits::unlimited()),
        ],
        Some(&token),
        Arc::new(MetricsRegistry::new()),
    );
    assert!(matches!(
        result.unwrap_err(),
        CursorError::InvalidContinuation(_)
    ));
}
