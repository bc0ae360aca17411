//! Tree-walking interpreter over a parameter namespace.

use std::cmp::Ordering;

use serde_json::{Map, Value as JsonValue};

use super::ExprError;
use super::parser::{BinaryOp, Expr, Literal, LogicalOp, UnaryOp};
use super::value::Value;

/// The identifiers visible to an expression.
///
/// Only the supplied parameter map is reachable; there is no global object and
/// nothing persists between evaluations.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'p> {
    vars: Option<&'p Map<String, JsonValue>>,
}

impl<'p> Scope<'p> {
    /// Builds a scope from a parameter set. Non-object sets expose nothing.
    pub fn new(params: &'p JsonValue) -> Self {
        Self {
            vars: params.as_object(),
        }
    }

    fn lookup(&self, name: &str) -> Value<'p> {
        self.vars
            .and_then(|vars| vars.get(name))
            .map(Value::from_json)
            .unwrap_or(Value::Undefined)
    }
}

/// Evaluates a parsed expression.
pub fn eval<'p>(expr: &Expr, scope: &Scope<'p>) -> Result<Value<'p>, ExprError> {
    match expr {
        Expr::Literal(literal) => Ok(match literal {
            Literal::Number(n) => Value::Number(*n),
            Literal::Str(s) => Value::string(s.clone()),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Null => Value::Null,
            Literal::Undefined => Value::Undefined,
        }),
        Expr::Ident(name) => Ok(scope.lookup(name)),
        Expr::Member { object, property } => {
            let object = eval(object, scope)?;
            let key = eval(property, scope)?;
            member(&object, &key)
        }
        Expr::Call { callee, args } => call(callee, args, scope),
        Expr::Unary { op, operand } => {
            let value = eval(operand, scope)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!value.truthy()),
                UnaryOp::Neg => Value::Number(-value.to_number()),
                UnaryOp::Plus => Value::Number(value.to_number()),
                UnaryOp::TypeOf => Value::string(value.type_of()),
            })
        }
        Expr::Binary { op, left, right } => {
            let left = eval(left, scope)?;
            let right = eval(right, scope)?;
            Ok(binary(*op, &left, &right))
        }
        Expr::Logical { op, left, right } => {
            let left = eval(left, scope)?;
            let take_left = match op {
                LogicalOp::And => !left.truthy(),
                LogicalOp::Or => left.truthy(),
                LogicalOp::Nullish => !left.is_nullish(),
            };
            if take_left {
                Ok(left)
            } else {
                eval(right, scope)
            }
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            if eval(test, scope)?.truthy() {
                eval(consequent, scope)
            } else {
                eval(alternate, scope)
            }
        }
    }
}

fn member<'p>(object: &Value<'p>, key: &Value<'p>) -> Result<Value<'p>, ExprError> {
    let name = key.to_js_string();
    match object {
        Value::Undefined | Value::Null => Err(ExprError::Runtime(format!(
            "cannot read property '{}' of {}",
            name,
            object.to_js_string()
        ))),
        Value::Object(map) => {
            let map: &'p Map<String, JsonValue> = *map;
            Ok(map
                .get(name.as_ref())
                .map(Value::from_json)
                .unwrap_or(Value::Undefined))
        }
        Value::Array(items) => {
            let items: &'p [JsonValue] = *items;
            if name == "length" {
                return Ok(Value::Number(items.len() as f64));
            }
            Ok(array_index(&name)
                .and_then(|index| items.get(index))
                .map(Value::from_json)
                .unwrap_or(Value::Undefined))
        }
        Value::Str(s) => {
            if name == "length" {
                return Ok(Value::Number(s.encode_utf16().count() as f64));
            }
            Ok(array_index(&name)
                .and_then(|index| s.chars().nth(index))
                .map(|ch| Value::string(ch.to_string()))
                .unwrap_or(Value::Undefined))
        }
        Value::Bool(_) | Value::Number(_) => Ok(Value::Undefined),
    }
}

fn array_index(name: &str) -> Option<usize> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Calls are limited to a fixed set of pure string and array methods.
fn call<'p>(callee: &Expr, args: &[Expr], scope: &Scope<'p>) -> Result<Value<'p>, ExprError> {
    let Expr::Member { object, property } = callee else {
        return Err(ExprError::Runtime("only method calls are supported".to_string()));
    };
    let receiver = eval(object, scope)?;
    let method = eval(property, scope)?.to_js_string().into_owned();
    let args = args
        .iter()
        .map(|arg| eval(arg, scope))
        .collect::<Result<Vec<_>, _>>()?;
    let arg_string = |index: usize| -> String {
        args.get(index)
            .map(|value| value.to_js_string().into_owned())
            .unwrap_or_else(|| "undefined".to_string())
    };

    let result = match (&receiver, method.as_str()) {
        (Value::Str(s), "toUpperCase") => Value::string(s.to_uppercase()),
        (Value::Str(s), "toLowerCase") => Value::string(s.to_lowercase()),
        (Value::Str(s), "trim") => Value::string(s.trim()),
        (Value::Str(s), "includes") => Value::Bool(s.contains(arg_string(0).as_str())),
        (Value::Str(s), "startsWith") => Value::Bool(s.starts_with(arg_string(0).as_str())),
        (Value::Str(s), "endsWith") => Value::Bool(s.ends_with(arg_string(0).as_str())),
        (Value::Str(s), "replace") => Value::string(s.replacen(&arg_string(0), &arg_string(1), 1)),
        (Value::Number(n), "toFixed") => {
            let digits = args.first().map(Value::to_number).unwrap_or(0.0);
            if !(0.0..=100.0).contains(&digits) {
                return Err(ExprError::Runtime("toFixed() digits out of range".to_string()));
            }
            Value::string(format!("{:.*}", digits as usize, n))
        }
        (Value::Array(items), "includes") => {
            let needle = args.first().cloned().unwrap_or(Value::Undefined);
            Value::Bool(
                items
                    .iter()
                    .any(|item| Value::from_json(item).strict_equals(&needle)),
            )
        }
        (Value::Array(items), "join") => {
            let separator = if args.is_empty() {
                ",".to_string()
            } else {
                arg_string(0)
            };
            Value::string(
                items
                    .iter()
                    .map(|item| Value::from_json(item).to_output_string().into_owned())
                    .collect::<Vec<_>>()
                    .join(&separator),
            )
        }
        (receiver, method) => {
            return Err(ExprError::Runtime(format!(
                "{}.{} is not a function",
                receiver.type_of(),
                method
            )));
        }
    };
    Ok(result)
}

fn binary<'p>(op: BinaryOp, left: &Value<'p>, right: &Value<'p>) -> Value<'p> {
    match op {
        BinaryOp::Add => {
            let l = left.to_primitive();
            let r = right.to_primitive();
            if matches!(l, Value::Str(_)) || matches!(r, Value::Str(_)) {
                let mut joined = l.to_js_string().into_owned();
                joined.push_str(&r.to_js_string());
                Value::string(joined)
            } else {
                Value::Number(l.to_number() + r.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Lt => Value::Bool(left.compare(right) == Some(Ordering::Less)),
        BinaryOp::Gt => Value::Bool(left.compare(right) == Some(Ordering::Greater)),
        BinaryOp::Le => Value::Bool(matches!(
            left.compare(right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Ge => Value::Bool(matches!(
            left.compare(right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::LooseEq => Value::Bool(left.loose_equals(right)),
        BinaryOp::LooseNe => Value::Bool(!left.loose_equals(right)),
        BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
        BinaryOp::StrictNe => Value::Bool(!left.strict_equals(right)),
    }
}
