use crate::types::value::Value;
use std::cmp::Ordering;

/// Orders two values of compatible types. Integers of either width and
/// floats compare numerically; NULL and mixed kinds are incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int32(x), Value::Int32(y)) => Some(x.cmp(y)),
        (Value::Int64(x), Value::Int64(y)) => Some(x.cmp(y)),
        (Value::Int32(x), Value::Int64(y)) => Some(i64::from(*x).cmp(y)),
        (Value::Int64(x), Value::Int32(y)) => Some(x.cmp(&i64::from(*y))),
        (Value::Float64(x), Value::Float64(y)) => x.partial_cmp(y),
        (Value::Float64(x), Value::Int32(y)) => x.partial_cmp(&f64::from(*y)),
        (Value::Float64(x), Value::Int64(y)) => x.partial_cmp(&(*y as f64)),
        (Value::Int32(x), Value::Float64(y)) => f64::from(*x).partial_cmp(y),
        (Value::Int64(x), Value::Float64(y)) => (*x as f64).partial_cmp(y),
        (Value::Boolean(x), Value::Boolean(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
