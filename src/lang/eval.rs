//! Tree-walking expression evaluator: identifier resolution (DBF field,
//! then variable, then legacy empty-string fallback) and binary/unary
//! operator semantics.

use crate::dbf::cursor::Dbf;
use crate::error::{ErrorKind, XbaseError, XbaseResult};
use crate::funcs;
use crate::lang::ast::{BinOp, Expr, UnOp};
use crate::value::Value;
use crate::vars::VarStore;

/// Evaluation context: a borrowed cursor (if a database is open), the
/// variable store, and a record of the last non-fatal error (currently
/// only `DivisionByZero` — the evaluator yields 0 and records the error
/// kind rather than aborting).
pub struct EvalContext<'a> {
    pub dbf: Option<&'a Dbf>,
    pub vars: &'a VarStore,
    pub last_error: Option<ErrorKind>,
}

impl<'a> EvalContext<'a> {
    pub fn new(dbf: Option<&'a Dbf>, vars: &'a VarStore) -> EvalContext<'a> {
        EvalContext { dbf, vars, last_error: None }
    }
}

pub struct Evaluator;

impl Evaluator {
    pub fn eval(expr: &Expr, ctx: &mut EvalContext) -> XbaseResult<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::DateLiteral(raw) => Ok(Value::normalize_date_literal(raw)),
            Expr::Logical(b) => Ok(Value::Logical(*b)),
            Expr::Ident(name) => Ok(Self::resolve_ident(name, ctx)),
            Expr::AliasField(alias, field) => Ok(Self::resolve_alias_field(alias, field, ctx)),
            Expr::Macro(name) => Ok(Value::String(Self::resolve_ident(name, ctx).to_display_string())),
            Expr::Call(name, arg_exprs) => {
                let mut args = Vec::with_capacity(arg_exprs.len());
                for a in arg_exprs {
                    args.push(Self::eval(a, ctx)?);
                }
                funcs::call(name, &args, ctx.dbf)
            }
            Expr::Index(base, index_expr) => {
                let base_val = Self::eval(base, ctx)?;
                let idx = Self::eval(index_expr, ctx)?.to_number() as i64;
                match base_val {
                    Value::Array(items) => {
                        if idx >= 1 && (idx as usize) <= items.len() {
                            Ok(items[(idx - 1) as usize].clone())
                        } else {
                            Err(XbaseError::new(ErrorKind::InvalidRecord, "array index out of range"))
                        }
                    }
                    _ => Err(XbaseError::new(ErrorKind::TypeMismatch, "indexing a non-array value")),
                }
            }
            Expr::Unary(op, operand) => {
                let v = Self::eval(operand, ctx)?;
                Ok(match op {
                    UnOp::Neg => Value::Number(-v.to_number()),
                    UnOp::Plus => Value::Number(v.to_number()),
                    UnOp::Not => Value::Logical(!v.to_logical()),
                })
            }
            Expr::Binary(op, lhs, rhs) => {
                let l = Self::eval(lhs, ctx)?;
                let r = Self::eval(rhs, ctx)?;
                Self::apply_binary(op, l, r, ctx)
            }
        }
    }

    fn resolve_ident(name: &str, ctx: &EvalContext) -> Value {
        if let Some(dbf) = ctx.dbf {
            if let Some(idx) = dbf.field_index(name) {
                if let Ok(v) = dbf.get(idx) {
                    return v;
                }
            }
        }
        if let Some(v) = ctx.vars.get(name) {
            return v.clone();
        }
        // dBASE tradition: an unknown name quietly reads as empty string
        // rather than erroring.
        Value::String(String::new())
    }

    fn resolve_alias_field(alias: &str, field: &str, ctx: &EvalContext) -> Value {
        match ctx.dbf {
            Some(dbf) if dbf.alias.eq_ignore_ascii_case(alias) => {
                match dbf.field_index(field).and_then(|idx| dbf.get(idx).ok()) {
                    Some(v) => v,
                    None => Value::Nil,
                }
            }
            _ => Value::Nil,
        }
    }

    fn apply_binary(op: &BinOp, l: Value, r: Value, ctx: &mut EvalContext) -> XbaseResult<Value> {
        use BinOp::*;
        Ok(match op {
            Add => match (&l, &r) {
                (Value::String(a), Value::String(b)) => Value::String(format!("{a}{b}")),
                (Value::Date(_), _) | (_, Value::Date(_)) if l.as_julian().is_some() || r.as_julian().is_some() => {
                    Self::date_arith(l, r, true)?
                }
                _ => Value::Number(l.to_number() + r.to_number()),
            },
            Sub => match (&l, &r) {
                (Value::String(a), Value::String(b)) => Value::String(format!("{}{b}", a.trim_end())),
                (Value::Date(_), Value::Date(_)) => {
                    let (a, b) = (l.as_julian(), r.as_julian());
                    match (a, b) {
                        (Some(a), Some(b)) => Value::Number((a - b) as f64),
                        _ => Value::Number(0.0),
                    }
                }
                (Value::Date(_), _) => Self::date_arith(l, r, false)?,
                _ => Value::Number(l.to_number() - r.to_number()),
            },
            Mul => Value::Number(l.to_number() * r.to_number()),
            Div => {
                let rn = r.to_number();
                if rn == 0.0 {
                    ctx.last_error = Some(ErrorKind::DivisionByZero);
                    Value::Number(0.0)
                } else {
                    Value::Number(l.to_number() / rn)
                }
            }
            Mod => {
                let rn = r.to_number();
                if rn == 0.0 {
                    ctx.last_error = Some(ErrorKind::DivisionByZero);
                    Value::Number(0.0)
                } else {
                    Value::Number(l.to_number() % rn)
                }
            }
            Pow => Value::Number(l.to_number().powf(r.to_number())),
            Eq => Value::Logical(compare(&l, &r)? == std::cmp::Ordering::Equal),
            Ne => Value::Logical(compare(&l, &r)? != std::cmp::Ordering::Equal),
            Lt => Value::Logical(compare(&l, &r)? == std::cmp::Ordering::Less),
            Le => Value::Logical(compare(&l, &r)? != std::cmp::Ordering::Greater),
            Gt => Value::Logical(compare(&l, &r)? == std::cmp::Ordering::Greater),
            Ge => Value::Logical(compare(&l, &r)? != std::cmp::Ordering::Less),
            And => Value::Logical(l.to_logical() && r.to_logical()),
            Or => Value::Logical(l.to_logical() || r.to_logical()),
            In => {
                let needle = l.to_display_string();
                let haystack = r.to_display_string();
                Value::Logical(haystack.contains(&needle))
            }
        })
    }

    fn date_arith(l: Value, r: Value, add: bool) -> XbaseResult<Value> {
        let (date_val, num_val) = if matches!(l, Value::Date(_)) { (&l, &r) } else { (&r, &l) };
        let j = date_val
            .as_julian()
            .ok_or_else(|| XbaseError::new(ErrorKind::TypeMismatch, "invalid date in date arithmetic"))?;
        let n = num_val.to_number() as i64;
        Ok(Value::from_julian(if add { j + n } else { j - n }))
    }
}

/// Comparisons fall back to numeric coercion across mismatched types, a
/// legacy quirk; same-type string/date comparisons use byte order, not
/// locale folding.
fn compare(l: &Value, r: &Value) -> XbaseResult<std::cmp::Ordering> {
    match (l, r) {
        (Value::String(a), Value::String(b)) => Ok(a.as_bytes().cmp(b.as_bytes())),
        (Value::Date(a), Value::Date(b)) => Ok(a.cmp(b)),
        (Value::Logical(a), Value::Logical(b)) => Ok(a.cmp(b)),
        (Value::Array(_), _) | (_, Value::Array(_)) => {
            Err(XbaseError::new(ErrorKind::TypeMismatch, "arrays are not comparable"))
        }
        _ => l
            .to_number()
            .partial_cmp(&r.to_number())
            .ok_or_else(|| XbaseError::new(ErrorKind::TypeMismatch, "values are not comparable")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_str(src: &str) -> Value {
        let mut parser = crate::lang::parser::Parser::new(src);
        let expr = parser.parse_expression().unwrap();
        let vars = VarStore::new();
        let mut ctx = EvalContext::new(None, &vars);
        Evaluator::eval(&expr, &mut ctx).unwrap()
    }

    #[test]
    fn string_concat_and_subtract() {
        assert_eq!(eval_str(r#""HI" + " " + "YOU""#), Value::String("HI YOU".into()));
        assert_eq!(eval_str(r#""AB  " - "CD""#), Value::String("ABCD".into()));
    }

    #[test]
    fn arithmetic_and_power() {
        assert_eq!(eval_str("2 + 3 * 4"), Value::Number(14.0));
        assert_eq!(eval_str("2 ^ 10"), Value::Number(1024.0));
    }

    #[test]
    fn division_by_zero_yields_zero_and_records_error() {
        let mut parser = crate::lang::parser::Parser::new("1 / 0");
        let expr = parser.parse_expression().unwrap();
        let vars = VarStore::new();
        let mut ctx = EvalContext::new(None, &vars);
        let v = Evaluator::eval(&expr, &mut ctx).unwrap();
        assert_eq!(v, Value::Number(0.0));
        assert_eq!(ctx.last_error, Some(ErrorKind::DivisionByZero));
    }

    #[test]
    fn date_plus_number() {
        assert_eq!(eval_str("{12/31/2024} + 1"), Value::Date("20250101".into()));
    }

    #[test]
    fn dollar_substring_containment() {
        assert_eq!(eval_str(r#""cat" $ "concatenate""#), Value::Logical(true));
    }

    #[test]
    fn unknown_identifier_reads_as_empty_string() {
        assert_eq!(eval_str("UNDECLARED"), Value::String(String::new()));
    }

    #[test]
    fn function_call_dispatches_to_catalogue() {
        assert_eq!(eval_str(r#"UPPER("hi")"#), Value::String("HI".into()));
    }
}
