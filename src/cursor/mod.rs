//! Cursor protocol, leaf cursors, and combinators
//!
//! # Composition
//!
//! Leaf cursors ([`ListCursor`], [`ScanCursor`]) produce ordered elements
//! from one source. [`UnionCursor`] merges several compatibly-ordered
//! children into one ordered stream; [`FilterCursor`] evaluates a
//! predicate over an inner cursor with bounded concurrency while
//! preserving its order. Every layer is resumable through the
//! continuation it hands out.

mod filter;
mod list;
mod protocol;
mod scan;
mod union;

pub use filter::FilterCursor;
pub use list::ListCursor;
pub use protocol::{drain, BoxedCursor, Cursor, CursorOutcome, NoNextReason};
pub use scan::{ScanCursor, ScanSource, ScanStep};
pub use union::{ChildFactory, KeyFunction, UnionCursor};
