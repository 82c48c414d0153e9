use crate::{
    compile::Operator,
    report::{Error, INCOMPATIBLE_TYPES},
};
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Return true if the given [`Value`] is truthy.
///
/// Numbers are truthy when they are not zero, and strings and containers
/// when they are not empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(bo) => *bo,
        Value::Number(nu) => nu.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(st) => !st.is_empty(),
        Value::Array(ar) => !ar.is_empty(),
        Value::Object(ob) => !ob.is_empty(),
        Value::Null => false,
    }
}

/// Compare the two [`Value`] instances with the given comparison [`Operator`].
///
/// Any two values may be tested with `==` and `!=`. Ordering operators
/// require both sides to share a type, and containers are ordered by length.
///
/// # Errors
///
/// Returns an [`Error`] if the two types cannot be ordered, or the `Operator`
/// is not a comparison.
pub fn compare_values(left: &Value, operator: Operator, right: &Value) -> Result<bool, Error> {
    let result = match (left, right) {
        (Value::Number(left), Value::Number(right)) => {
            let ordering = order_numbers(left, right);
            match operator {
                Operator::Greater => ordering == Some(Ordering::Greater),
                Operator::Lesser => ordering == Some(Ordering::Less),
                Operator::Equal => ordering == Some(Ordering::Equal),
                Operator::NotEqual => ordering != Some(Ordering::Equal),
                Operator::GreaterOrEqual => {
                    matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
                }
                Operator::LesserOrEqual => {
                    matches!(ordering, Some(Ordering::Less | Ordering::Equal))
                }
                unsupported => return Err(not_comparison(unsupported)),
            }
        }
        (Value::String(left), Value::String(right)) => match operator {
            Operator::Greater => left > right,
            Operator::Lesser => left < right,
            Operator::Equal => left == right,
            Operator::NotEqual => left != right,
            Operator::GreaterOrEqual => left >= right,
            Operator::LesserOrEqual => left <= right,
            unsupported => return Err(not_comparison(unsupported)),
        },
        (Value::Bool(left), Value::Bool(right)) => match operator {
            Operator::Greater => left > right,
            Operator::Lesser => left < right,
            Operator::Equal => left == right,
            Operator::NotEqual => left != right,
            Operator::GreaterOrEqual => left >= right,
            Operator::LesserOrEqual => left <= right,
            unsupported => return Err(not_comparison(unsupported)),
        },
        (Value::Array(left_array), Value::Array(right_array)) => match operator {
            Operator::Greater => left_array.len() > right_array.len(),
            Operator::Lesser => left_array.len() < right_array.len(),
            Operator::Equal => left == right,
            Operator::NotEqual => left != right,
            Operator::GreaterOrEqual => left_array.len() >= right_array.len(),
            Operator::LesserOrEqual => left_array.len() <= right_array.len(),
            unsupported => return Err(not_comparison(unsupported)),
        },
        (Value::Object(left_object), Value::Object(right_object)) => match operator {
            Operator::Greater => left_object.len() > right_object.len(),
            Operator::Lesser => left_object.len() < right_object.len(),
            Operator::Equal => left == right,
            Operator::NotEqual => left != right,
            Operator::GreaterOrEqual => left_object.len() >= right_object.len(),
            Operator::LesserOrEqual => left_object.len() <= right_object.len(),
            unsupported => return Err(not_comparison(unsupported)),
        },
        (left, right) => match operator {
            Operator::Equal => false,
            Operator::NotEqual => true,
            _ => {
                return Err(Error::build(INCOMPATIBLE_TYPES).with_help(format!(
                    "types `{}` and `{}` cannot be compared",
                    left, right
                )))
            }
        },
    };

    Ok(result)
}

/// Order two numbers, exactly when both are integers.
fn order_numbers(left: &Number, right: &Number) -> Option<Ordering> {
    if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
        return Some(left.cmp(&right));
    }
    if let (Some(left), Some(right)) = (left.as_u64(), right.as_u64()) {
        return Some(left.cmp(&right));
    }

    left.as_f64()?.partial_cmp(&right.as_f64()?)
}

/// Return an [`Error`] explaining that the [`Operator`] does not compare.
fn not_comparison(operator: Operator) -> Error {
    Error::build(INCOMPATIBLE_TYPES)
        .with_help(format!("operator `{operator}` does not compare values"))
}
