//! windrow - resumable asynchronous cursors over ordered key-value scans
//!
//! A query-execution layer for stores with bounded transactions: cursors
//! produce large ordered result sequences in short-lived slices, hand out
//! continuations that resume exactly where a prior slice stopped, and
//! compose into ordered merges and order-preserving filters without
//! materializing results in memory.

pub mod continuation;
pub mod cursor;
pub mod errors;
pub mod key;
pub mod limits;
pub mod observability;
pub mod predicate;
