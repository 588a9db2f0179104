//! Comparison keys for ordered merges
//!
//! A comparison key is an ordered sequence of JSON values derived from an
//! element by a caller-supplied, pure, deterministic function. Children of
//! a merge must produce elements in ascending (or, when reversed,
//! descending) order of this key; equal keys are treated as equal for
//! ordering and tie purposes regardless of element identity.

use std::cmp::Ordering;

use serde_json::Value;

/// An ordered sequence of comparable values derived from an element
pub type ComparisonKey = Vec<Value>;

/// Compares two JSON values with a deterministic total order.
///
/// Ordering rules:
/// - By type first: null < bool < number < string < array < object
/// - Within a type, natural ordering; integers compare exactly,
///   mixed integer/float comparisons go through f64
/// - Arrays compare lexicographically by element, then by length
/// - Objects compare by their serialized form (a stable last resort;
///   comparison keys are expected to hold primitives)
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    let type_order = |v: &Value| -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    };

    let a_type = type_order(a);
    let b_type = type_order(b);
    if a_type != b_type {
        return a_type.cmp(&b_type);
    }

    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(a_b), Value::Bool(b_b)) => a_b.cmp(b_b),
        (Value::Number(a_n), Value::Number(b_n)) => {
            if let (Some(a_i), Some(b_i)) = (a_n.as_i64(), b_n.as_i64()) {
                return a_i.cmp(&b_i);
            }
            if let (Some(a_u), Some(b_u)) = (a_n.as_u64(), b_n.as_u64()) {
                return a_u.cmp(&b_u);
            }
            let a_f = a_n.as_f64().unwrap_or(0.0);
            let b_f = b_n.as_f64().unwrap_or(0.0);
            a_f.partial_cmp(&b_f).unwrap_or(Ordering::Equal)
        }
        (Value::String(a_s), Value::String(b_s)) => a_s.cmp(b_s),
        (Value::Array(a_v), Value::Array(b_v)) => {
            for (a_e, b_e) in a_v.iter().zip(b_v.iter()) {
                let ord = compare_values(a_e, b_e);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a_v.len().cmp(&b_v.len())
        }
        (a_o, b_o) => a_o.to_string().cmp(&b_o.to_string()),
    }
}

/// Compares two comparison keys lexicographically, component by component
pub fn compare_keys(a: &[Value], b: &[Value]) -> Ordering {
    for (a_v, b_v) in a.iter().zip(b.iter()) {
        let ord = compare_values(a_v, b_v);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

/// Compares two keys in output order: ascending normally, descending when
/// `reverse` is set. `Less` means "comes first in the output stream".
pub fn compare_in_direction(a: &[Value], b: &[Value], reverse: bool) -> Ordering {
    let ord = compare_keys(a, b);
    if reverse {
        ord.reverse()
    } else {
        ord
    }
}
