//! Continuation tokens and their codec
//!
//! A continuation is an opaque byte sequence that deterministically
//! reconstructs a cursor's remaining output. Encodings are flat, versioned
//! JSON documents:
//! - A leaf position token records how far an in-memory sequence advanced
//! - A union token records, per child, either an exhausted marker or that
//!   child's own continuation (nested bytes are base64)
//!
//! Malformed input is rejected with `InvalidContinuation`; decoding never
//! falls back to "start over".

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;
use serde_json::json;

use crate::errors::{CursorError, CursorResult};

/// Current continuation encoding version
pub const CONTINUATION_VERSION: u32 = 1;

/// An opaque resumption token capturing exactly the remaining state of a
/// cursor. Absence of a continuation (`None` at the API level) denotes
/// "fully exhausted, do not resume".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation(Vec<u8>);

impl Continuation {
    /// Wrap raw continuation bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Continuation(bytes)
    }

    /// The raw token bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the token, returning its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Resume state of one child inside a composite continuation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildResume {
    /// The child has not yet delivered anything; start it fresh
    Start,
    /// Resume the child from its own continuation
    Active(Continuation),
    /// The child is plainly exhausted; do not reconstruct it
    Exhausted,
}

// ============================================================================
// Leaf position tokens
// ============================================================================

#[derive(Deserialize)]
struct PositionTokenRepr {
    version: u32,
    position: usize,
}

/// Encode a leaf cursor's position into a continuation
pub fn encode_position(position: usize) -> Continuation {
    let token = json!({
        "version": CONTINUATION_VERSION,
        "position": position,
    });
    Continuation::new(token.to_string().into_bytes())
}

/// Decode a leaf position token
pub fn decode_position(continuation: &Continuation) -> CursorResult<usize> {
    let token: PositionTokenRepr = serde_json::from_slice(continuation.as_bytes())
        .map_err(|e| CursorError::invalid_continuation(format!("malformed position token: {e}")))?;
    check_version(token.version)?;
    Ok(token.position)
}

// ============================================================================
// Composite union tokens
// ============================================================================

#[derive(Deserialize)]
struct UnionTokenRepr {
    version: u32,
    children: Vec<ChildTokenRepr>,
}

#[derive(Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
enum ChildTokenRepr {
    Start,
    Active { continuation: String },
    Exhausted,
}

/// Encode the per-child resume states of a union into one continuation
pub fn encode_union(children: &[ChildResume]) -> Continuation {
    let entries: Vec<serde_json::Value> = children
        .iter()
        .map(|child| match child {
            ChildResume::Start => json!({ "state": "start" }),
            ChildResume::Active(c) => json!({
                "state": "active",
                "continuation": URL_SAFE_NO_PAD.encode(c.as_bytes()),
            }),
            ChildResume::Exhausted => json!({ "state": "exhausted" }),
        })
        .collect();
    let token = json!({
        "version": CONTINUATION_VERSION,
        "children": entries,
    });
    Continuation::new(token.to_string().into_bytes())
}

/// Decode a union continuation into per-child resume states.
///
/// The child count must match the cursor definition the token is fed into;
/// a mismatch means the token belongs to a different topology.
pub fn decode_union(
    continuation: &Continuation,
    expected_children: usize,
) -> CursorResult<Vec<ChildResume>> {
    let token: UnionTokenRepr = serde_json::from_slice(continuation.as_bytes())
        .map_err(|e| CursorError::invalid_continuation(format!("malformed union token: {e}")))?;
    check_version(token.version)?;
    if token.children.len() != expected_children {
        return Err(CursorError::invalid_continuation(format!(
            "union token has {} children, cursor has {}",
            token.children.len(),
            expected_children
        )));
    }
    token
        .children
        .into_iter()
        .map(|child| match child {
            ChildTokenRepr::Start => Ok(ChildResume::Start),
            ChildTokenRepr::Exhausted => Ok(ChildResume::Exhausted),
            ChildTokenRepr::Active { continuation } => {
                let bytes = URL_SAFE_NO_PAD.decode(continuation.as_bytes()).map_err(|e| {
                    CursorError::invalid_continuation(format!("bad child continuation: {e}"))
                })?;
                Ok(ChildResume::Active(Continuation::new(bytes)))
            }
        })
        .collect()
}

fn check_version(version: u32) -> CursorResult<()> {
    if version != CONTINUATION_VERSION {
        return Err(CursorError::invalid_continuation(format!(
            "unsupported continuation version {version}"
        )));
    }
    Ok(())
}
