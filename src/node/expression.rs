use super::Node;
use crate::{
    compile::Operator,
    region::Region,
    render::{compare_values, is_truthy, stringify, RenderingContext},
    report::{Error, INCOMPATIBLE_TYPES},
};
use serde_json::{json, Number, Value};
use std::fmt::Display;

/// Target type of a cast expression such as `count as string`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastType {
    String,
    Integer,
    Float,
    Boolean,
    Array,
}

impl CastType {
    /// Return the [`CastType`] with the given name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(CastType::String),
            "integer" | "int" => Some(CastType::Integer),
            "float" | "double" => Some(CastType::Float),
            "boolean" | "bool" => Some(CastType::Boolean),
            "array" => Some(CastType::Array),
            _ => None,
        }
    }
}

impl Display for CastType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CastType::String => write!(f, "string"),
            CastType::Integer => write!(f, "integer"),
            CastType::Float => write!(f, "float"),
            CastType::Boolean => write!(f, "boolean"),
            CastType::Array => write!(f, "array"),
        }
    }
}

/// The operation an [`ExpressionNode`] applies to its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `+`, `-`, `*`, `/` or `%` on two operands.
    Math(Operator),
    /// `==`, `!=`, `>`, `<`, `>=` or `<=` on two operands.
    Compare(Operator),
    /// `&&` on two operands.
    And,
    /// `||` on two operands.
    Or,
    /// `!` or `not` on one operand.
    Not,
    /// `condition ? then : else` on three operands.
    Ternary,
    /// `value as type` on one operand.
    Cast(CastType),
}

/// Applies an [`Operation`] to the values of its children.
///
/// A failure is handed to the error handler of the context, which may
/// substitute text for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionNode {
    operation: Operation,
    children: Vec<Node>,
    region: Region,
}

impl ExpressionNode {
    pub fn new(operation: Operation, children: Vec<Node>, region: Region) -> Self {
        Self {
            operation,
            children,
            region,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn set_children(&mut self, children: Vec<Node>) {
        self.children = children;
    }

    pub fn execute(&self, context: &mut RenderingContext) -> Result<Value, Error> {
        match self.evaluate(context) {
            Ok(value) => Ok(value),
            Err(error) if error.is_child_not_found() => Err(error),
            Err(error) => context
                .error_handler()
                .handle_expression_error(error.with_region(self.region)),
        }
    }

    fn evaluate(&self, context: &mut RenderingContext) -> Result<Value, Error> {
        match (self.operation, self.children.as_slice()) {
            (Operation::Math(operator), [left, right]) => {
                let left = left.execute(context)?;
                let right = right.execute(context)?;

                math(&left, operator, &right)
            }
            (Operation::Compare(operator), [left, right]) => {
                let left = left.execute(context)?;
                let right = right.execute(context)?;

                Ok(Value::Bool(compare_values(&left, operator, &right)?))
            }
            (Operation::And, [left, right]) => {
                if !is_truthy(&left.execute(context)?) {
                    return Ok(Value::Bool(false));
                }

                Ok(Value::Bool(is_truthy(&right.execute(context)?)))
            }
            (Operation::Or, [left, right]) => {
                if is_truthy(&left.execute(context)?) {
                    return Ok(Value::Bool(true));
                }

                Ok(Value::Bool(is_truthy(&right.execute(context)?)))
            }
            (Operation::Not, [operand]) => Ok(Value::Bool(!is_truthy(&operand.execute(context)?))),
            (Operation::Ternary, [condition, then, otherwise]) => {
                if is_truthy(&condition.execute(context)?) {
                    then.execute(context)
                } else {
                    otherwise.execute(context)
                }
            }
            (Operation::Cast(target), [operand]) => cast(operand.execute(context)?, target),
            (operation, children) => Err(Error::build("invalid expression").with_help(format!(
                "`{operation:?}` cannot be applied to {} operands",
                children.len()
            ))),
        }
    }
}

/// Apply the math [`Operator`] to the two values.
///
/// Integers stay integers unless the operation overflows, `/` always
/// divides as floats, `null` counts as zero and `+` joins two strings.
fn math(left: &Value, operator: Operator, right: &Value) -> Result<Value, Error> {
    if let (Value::String(left), Operator::Add, Value::String(right)) = (left, operator, right) {
        return Ok(Value::String(format!("{left}{right}")));
    }

    let (left, right) = match (as_number(left), as_number(right)) {
        (Some(left), Some(right)) => (left, right),
        _ => {
            return Err(Error::build(INCOMPATIBLE_TYPES).with_help(format!(
                "operator `{operator}` cannot be applied to `{left}` and `{right}`"
            )))
        }
    };

    if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
        let result = match operator {
            Operator::Add => l.checked_add(r),
            Operator::Subtract => l.checked_sub(r),
            Operator::Multiply => l.checked_mul(r),
            Operator::Modulo if r == 0 => return Err(division_by_zero()),
            Operator::Modulo => l.checked_rem(r),
            _ => None,
        };
        if let Some(result) = result {
            return Ok(json!(result));
        }
    }

    let l = left.as_f64().unwrap_or_default();
    let r = right.as_f64().unwrap_or_default();
    let result = match operator {
        Operator::Add => l + r,
        Operator::Subtract => l - r,
        Operator::Multiply => l * r,
        Operator::Divide | Operator::Modulo if r == 0.0 => return Err(division_by_zero()),
        Operator::Divide => l / r,
        Operator::Modulo => l % r,
        other => {
            return Err(Error::build(INCOMPATIBLE_TYPES)
                .with_help(format!("operator `{other}` is not a math operator")))
        }
    };

    float(result)
}

/// Return the number a value counts as in math, where `null` is zero.
fn as_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(number) => Some(number.clone()),
        Value::Null => Some(Number::from(0)),
        _ => None,
    }
}

/// Return a [`Value`] for the float, using an integer when nothing is lost.
fn float(result: f64) -> Result<Value, Error> {
    if result.fract() == 0.0 && result.abs() < i64::MAX as f64 {
        return Ok(json!(result as i64));
    }

    Number::from_f64(result).map(Value::Number).ok_or_else(|| {
        Error::build("invalid number").with_help(format!("`{result}` is not a finite number"))
    })
}

fn division_by_zero() -> Error {
    Error::build("division by zero").with_help("the right side of `/` and `%` must not be zero")
}

/// Convert the value to the [`CastType`].
fn cast(value: Value, target: CastType) -> Result<Value, Error> {
    let incompatible = |value: &Value| {
        Error::build(INCOMPATIBLE_TYPES)
            .with_help(format!("`{value}` cannot be cast to {target}"))
    };

    let result = match target {
        CastType::String => Value::String(stringify(&value)),
        CastType::Boolean => Value::Bool(is_truthy(&value)),
        CastType::Integer => match &value {
            Value::Null => json!(0),
            Value::Bool(b) => json!(*b as i64),
            Value::Number(number) => match number.as_i64() {
                Some(integer) => json!(integer),
                None => json!(number.as_f64().unwrap_or_default().trunc() as i64),
            },
            Value::String(string) => {
                let trimmed = string.trim();
                match trimmed.parse::<i64>() {
                    Ok(integer) => json!(integer),
                    Err(_) => json!(trimmed.parse::<f64>().map(|f| f.trunc() as i64).unwrap_or(0)),
                }
            }
            other => return Err(incompatible(other)),
        },
        CastType::Float => match &value {
            Value::Null => json!(0.0),
            Value::Bool(b) => json!(if *b { 1.0 } else { 0.0 }),
            Value::Number(number) => json!(number.as_f64().unwrap_or_default()),
            Value::String(string) => json!(string.trim().parse::<f64>().unwrap_or(0.0)),
            other => return Err(incompatible(other)),
        },
        CastType::Array => match value {
            Value::Null => json!([]),
            Value::Array(array) => Value::Array(array),
            Value::Object(object) => Value::Array(object.into_iter().map(|(_, v)| v).collect()),
            Value::String(string) => Value::Array(
                string
                    .split(',')
                    .map(|part| Value::String(part.trim().to_owned()))
                    .collect(),
            ),
            other => Value::Array(vec![other]),
        },
    };

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::{CastType, ExpressionNode, Operation};
    use crate::{
        compile::Operator,
        node::{LiteralNode, Node},
        region::Region,
        render::{RenderingContext, TolerantErrorHandler},
        report::ErrorKind,
    };
    use serde_json::{json, Value};

    fn literal(value: Value) -> Node {
        LiteralNode::new(value).into()
    }

    fn evaluate(operation: Operation, operands: Vec<Value>) -> Result<Value, crate::Error> {
        let node = ExpressionNode::new(
            operation,
            operands.into_iter().map(literal).collect(),
            Region::default(),
        );

        node.execute(&mut RenderingContext::new())
    }

    #[test]
    fn test_integer_math() {
        let math = |operator, l, r| evaluate(Operation::Math(operator), vec![json!(l), json!(r)]);

        assert_eq!(math(Operator::Add, 2, 3), Ok(json!(5)));
        assert_eq!(math(Operator::Subtract, 2, 3), Ok(json!(-1)));
        assert_eq!(math(Operator::Multiply, 4, 3), Ok(json!(12)));
        assert_eq!(math(Operator::Modulo, 7, 3), Ok(json!(1)));
        assert_eq!(math(Operator::Divide, 8, 2), Ok(json!(4)));
        assert_eq!(math(Operator::Divide, 7, 2), Ok(json!(3.5)));
    }

    #[test]
    fn test_float_and_null_math() {
        assert_eq!(
            evaluate(Operation::Math(Operator::Add), vec![json!(1.5), json!(2)]),
            Ok(json!(3.5))
        );
        assert_eq!(
            evaluate(Operation::Math(Operator::Add), vec![json!(null), json!(1)]),
            Ok(json!(1))
        );
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(
            evaluate(Operation::Math(Operator::Add), vec![json!("ab"), json!("cd")]),
            Ok(json!("abcd"))
        );
        assert!(evaluate(Operation::Math(Operator::Subtract), vec![json!("ab"), json!("cd")]).is_err());
    }

    #[test]
    fn test_division_by_zero() {
        let result = evaluate(Operation::Math(Operator::Divide), vec![json!(1), json!(0)]);

        assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Evaluation));
        assert!(evaluate(Operation::Math(Operator::Modulo), vec![json!(1), json!(0)]).is_err());
    }

    #[test]
    fn test_logic_short_circuits() {
        // The right side would fail if it were evaluated.
        let failing = ExpressionNode::new(
            Operation::Math(Operator::Divide),
            vec![literal(json!(1)), literal(json!(0))],
            Region::default(),
        );
        let node = ExpressionNode::new(
            Operation::Or,
            vec![literal(json!(true)), failing.into()],
            Region::default(),
        );

        assert_eq!(node.execute(&mut RenderingContext::new()), Ok(json!(true)));
        assert_eq!(
            evaluate(Operation::And, vec![json!(1), json!("")]),
            Ok(json!(false))
        );
        assert_eq!(evaluate(Operation::Not, vec![json!(0)]), Ok(json!(true)));
    }

    #[test]
    fn test_ternary() {
        assert_eq!(
            evaluate(Operation::Ternary, vec![json!(true), json!("yes"), json!("no")]),
            Ok(json!("yes"))
        );
        assert_eq!(
            evaluate(Operation::Ternary, vec![json!([]), json!("yes"), json!("no")]),
            Ok(json!("no"))
        );
    }

    #[test]
    fn test_casts() {
        let cast = |target, value| evaluate(Operation::Cast(target), vec![value]);

        assert_eq!(cast(CastType::String, json!(12)), Ok(json!("12")));
        assert_eq!(cast(CastType::Integer, json!(" 42 ")), Ok(json!(42)));
        assert_eq!(cast(CastType::Integer, json!(3.9)), Ok(json!(3)));
        assert_eq!(cast(CastType::Integer, json!("abc")), Ok(json!(0)));
        assert_eq!(cast(CastType::Float, json!("1.5")), Ok(json!(1.5)));
        assert_eq!(cast(CastType::Boolean, json!("")), Ok(json!(false)));
        assert_eq!(cast(CastType::Array, json!("a, b")), Ok(json!(["a", "b"])));
        assert_eq!(cast(CastType::Array, json!(null)), Ok(json!([])));
        assert!(cast(CastType::Integer, json!([1])).is_err());
    }

    #[test]
    fn test_wrong_arity() {
        assert!(evaluate(Operation::Not, vec![json!(1), json!(2)]).is_err());
    }

    #[test]
    fn test_failure_goes_through_handler() {
        let node = ExpressionNode::new(
            Operation::Math(Operator::Divide),
            vec![literal(json!(1)), literal(json!(0))],
            Region::default(),
        );
        let mut context = RenderingContext::new().with_error_handler(TolerantErrorHandler);

        assert_eq!(
            node.execute(&mut context),
            Ok(json!("Expression error: division by zero"))
        );
    }
}
