use super::{Arguments, Helper, HelperResolver};
use crate::{render::stringify, render::RenderingContext, report::Error};
use serde_json::{json, Value};

/// Owner name used by `cycle` in the variable container.
const CYCLE_OWNER: &str = "cycle";

/// Register every built-in helper.
pub(super) fn register(resolver: &mut HelperResolver) {
    resolver.add_helper_must("raw", Raw);
    resolver.add_helper_must("upper", upper);
    resolver.add_helper_must("lower", lower);
    resolver.add_helper_must("trim", trim);
    resolver.add_helper_must("default", default);
    resolver.add_helper_must("length", length);
    resolver.add_helper_must("join", join);
    resolver.add_helper_must("cycle", Cycle);
}

/// Return the input of a pipe call, or the first anonymous argument of a
/// call without input.
fn subject<'a>(input: &'a Value, arguments: &'a Arguments) -> &'a Value {
    match input {
        Value::Null => arguments.get("1").unwrap_or(&Value::Null),
        input => input,
    }
}

/// Pass the input through without escaping it.
struct Raw;

impl Helper for Raw {
    fn invoke(
        &self,
        input: &Value,
        arguments: &Arguments,
        _: &mut RenderingContext,
    ) -> Result<Value, Error> {
        Ok(subject(input, arguments).clone())
    }

    fn escapes_output(&self) -> bool {
        false
    }
}

fn upper(input: &Value, arguments: &Arguments) -> Result<Value, Error> {
    Ok(json!(stringify(subject(input, arguments)).to_uppercase()))
}

fn lower(input: &Value, arguments: &Arguments) -> Result<Value, Error> {
    Ok(json!(stringify(subject(input, arguments)).to_lowercase()))
}

fn trim(input: &Value, arguments: &Arguments) -> Result<Value, Error> {
    Ok(json!(stringify(subject(input, arguments)).trim()))
}

/// Return the input, or the fallback when the input is `null` or an empty
/// string.
///
/// The fallback is the first anonymous argument, or the argument named
/// `value`.
fn default(input: &Value, arguments: &Arguments) -> Result<Value, Error> {
    match input {
        Value::Null => {}
        Value::String(string) if string.is_empty() => {}
        input => return Ok(input.clone()),
    }

    arguments
        .get("1")
        .or_else(|| arguments.get("value"))
        .cloned()
        .ok_or_else(|| {
            Error::build("helper `default` expects a fallback argument")
                .with_help("pass the fallback like `name | default \"guest\"`")
        })
}

/// Return the number of characters in a string, or items in a container.
fn length(input: &Value, arguments: &Arguments) -> Result<Value, Error> {
    match subject(input, arguments) {
        Value::Null => Ok(json!(0)),
        Value::String(string) => Ok(json!(string.chars().count())),
        Value::Array(array) => Ok(json!(array.len())),
        Value::Object(object) => Ok(json!(object.len())),
        other => Err(Error::build(format!(
            "helper `length` expects a string or container, received `{other}`"
        ))),
    }
}

/// Join the items of an array with the argument named `glue`, or the
/// anonymous argument following the array.
fn join(input: &Value, arguments: &Arguments) -> Result<Value, Error> {
    let (items, glue) = match input {
        Value::Null => (arguments.get("1"), arguments.get("2")),
        input => (Some(input), arguments.get("1")),
    };
    let glue = arguments
        .get("glue")
        .or(glue)
        .map(stringify)
        .unwrap_or_else(|| ", ".into());

    match items {
        Some(Value::Array(array)) => Ok(json!(array
            .iter()
            .map(stringify)
            .collect::<Vec<String>>()
            .join(&glue))),
        Some(Value::Null) | None => Ok(json!("")),
        Some(other) => Err(Error::build(format!(
            "helper `join` expects an array, received `{other}`"
        ))),
    }
}

/// Return the next item of the `values` argument each time it is called.
///
/// The position is kept in the variable container, under the name given
/// with the `as` argument, or the values themselves.
struct Cycle;

impl Helper for Cycle {
    fn invoke(
        &self,
        input: &Value,
        arguments: &Arguments,
        context: &mut RenderingContext,
    ) -> Result<Value, Error> {
        let values = match arguments.get("values").or_else(|| arguments.get("1")) {
            Some(Value::Array(values)) if !values.is_empty() => values,
            Some(Value::Array(_)) | None => return Ok(input.clone()),
            Some(other) => {
                return Err(Error::build(format!(
                    "helper `cycle` expects an array of values, received `{other}`"
                )))
            }
        };
        let key = match arguments.get("as") {
            Some(name) => stringify(name),
            None => Value::Array(values.clone()).to_string(),
        };

        let container = context.view_helper_variable_container_mut();
        let position = container
            .get(CYCLE_OWNER, &key)
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;
        container.add(CYCLE_OWNER, &key, json!((position + 1) % values.len()));

        Ok(values[position % values.len()].clone())
    }
}
