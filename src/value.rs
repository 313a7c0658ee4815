//! The evaluator's dynamic value type.
//!
//! A dynamic universe over the DBF field types plus nil and array: number,
//! string, date, logical and array, with total coercion rules so operators
//! never need to error on a type mismatch.

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Canonical empty date: eight spaces.
pub const EMPTY_DATE: &str = "        ";

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Number(f64),
    String(String),
    /// Always exactly 8 bytes: `YYYYMMDD`, or `EMPTY_DATE` for "no date".
    Date(String),
    Logical(bool),
    Array(Vec<Value>),
}

/// Julian day number of the Gregorian epoch used for date arithmetic.
/// Matches the offset `chrono::NaiveDate::num_days_from_ce` uses internally,
/// just shifted so day arithmetic on `Value::Date` stays inside this module.
fn date_to_julian(d: &NaiveDate) -> i64 {
    d.num_days_from_ce() as i64
}

fn julian_to_date(j: i64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(j as i32)
}

fn parse_canonical_date(s: &str) -> Option<NaiveDate> {
    if s == EMPTY_DATE || s.trim().is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y%m%d").ok()
}

fn format_canonical_date(d: &NaiveDate) -> String {
    format!("{:04}{:02}{:02}", d.year(), d.month(), d.day())
}

impl Value {
    pub fn empty_date() -> Value {
        Value::Date(EMPTY_DATE.to_string())
    }

    pub fn date_from_ymd(y: i32, m: u32, d: u32) -> Value {
        match NaiveDate::from_ymd_opt(y, m, d) {
            Some(date) => Value::Date(format_canonical_date(&date)),
            None => Value::empty_date(),
        }
    }

    /// Normalises raw date-literal text (`MM/DD/YYYY` or already-canonical
    /// `YYYYMMDD`) the way the evaluator does on first use of a date brace
    /// literal. Invalid text collates to the empty date.
    pub fn normalize_date_literal(raw: &str) -> Value {
        let raw = raw.trim();
        if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
            if parse_canonical_date(raw).is_some() {
                return Value::Date(raw.to_string());
            }
            return Value::empty_date();
        }
        if let Some((m, d, y)) = split_mdy(raw) {
            if let (Ok(m), Ok(d), Ok(y)) = (m.parse::<u32>(), d.parse::<u32>(), y.parse::<i32>()) {
                return Value::date_from_ymd(y, m, d);
            }
        }
        Value::empty_date()
    }

    pub fn as_julian(&self) -> Option<i64> {
        match self {
            Value::Date(s) => parse_canonical_date(s).map(|d| date_to_julian(&d)),
            _ => None,
        }
    }

    pub fn from_julian(j: i64) -> Value {
        match julian_to_date(j) {
            Some(d) => Value::Date(format_canonical_date(&d)),
            None => Value::empty_date(),
        }
    }

    /// Coerce to a number: numeric parsing for numbers/strings, julian-day
    /// for dates, 1.0/0.0 for logical, 0.0 otherwise.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Nil => 0.0,
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                let prefix: String = trimmed
                    .chars()
                    .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-' || *c == '+')
                    .collect();
                prefix.parse::<f64>().unwrap_or(0.0)
            }
            Value::Date(_) => self.as_julian().unwrap_or(0) as f64,
            Value::Logical(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Array(_) => 0.0,
        }
    }

    /// Coerce to logical: non-zero / non-empty / non-blank.
    pub fn to_logical(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.trim().is_empty(),
            Value::Date(s) => parse_canonical_date(s).is_some(),
            Value::Logical(b) => *b,
            Value::Array(a) => !a.is_empty(),
        }
    }

    /// Canonical string representation: numeric via `%g`-like shortest
    /// form, date via `YYYYMMDD`, logical via `.T.`/`.F.`, array via
    /// `ARRAY[n]`.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Nil => String::new(),
            Value::Number(n) => format_number_g(*n),
            Value::String(s) => s.clone(),
            Value::Date(s) => s.clone(),
            Value::Logical(b) => if *b { ".T.".to_string() } else { ".F.".to_string() },
            Value::Array(a) => format!("ARRAY[{}]", a.len()),
        }
    }

    pub fn type_code(&self) -> &'static str {
        match self {
            Value::Nil => "U",
            Value::Number(_) => "N",
            Value::String(_) => "C",
            Value::Date(_) => "D",
            Value::Logical(_) => "L",
            Value::Array(_) => "A",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

/// `%g`-style formatting: integral values print without a fractional part,
/// others print the shortest round-tripping decimal.
fn format_number_g(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        let mut s = format!("{}", n);
        if !s.contains('.') && !s.contains('e') {
            s.push_str(".0");
        }
        s
    }
}

fn split_mdy(raw: &str) -> Option<(&str, &str, &str)> {
    let mut parts = raw.splitn(3, '/');
    let m = parts.next()?;
    let d = parts.next()?;
    let y = parts.next()?;
    Some((m, d, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_coercion() {
        assert_eq!(Value::String("42abc".into()).to_number(), 42.0);
        assert_eq!(Value::Logical(true).to_number(), 1.0);
    }

    #[test]
    fn logical_coercion() {
        assert!(!Value::String("   ".into()).to_logical());
        assert!(Value::Number(1.0).to_logical());
    }

    #[test]
    fn date_normalisation_mdy() {
        let v = Value::normalize_date_literal("12/31/2024");
        assert_eq!(v, Value::Date("20241231".to_string()));
    }

    #[test]
    fn date_normalisation_invalid() {
        let v = Value::normalize_date_literal("not a date");
        assert_eq!(v, Value::empty_date());
    }

    #[test]
    fn date_arithmetic_leap_year() {
        let v = Value::normalize_date_literal("02/28/2024");
        let j = v.as_julian().unwrap();
        let next = Value::from_julian(j + 1);
        assert_eq!(next, Value::Date("20240229".to_string()));
    }

    #[test]
    fn date_arithmetic_year_boundary() {
        let v = Value::normalize_date_literal("12/31/2024");
        let j = v.as_julian().unwrap();
        let next = Value::from_julian(j + 1);
        assert_eq!(next, Value::Date("20250101".to_string()));
    }

    #[test]
    fn display_logical_and_array() {
        assert_eq!(Value::Logical(true).to_display_string(), ".T.");
        assert_eq!(Value::Array(vec![Value::Nil, Value::Nil]).to_display_string(), "ARRAY[2]");
    }
}
