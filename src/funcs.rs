//! Built-in function catalogue, the evaluator's external collaborator
//! (`resolve_function(name, args, ctx)`).

use crate::dbf::cursor::Dbf;
use crate::error::{ErrorKind, XbaseError, XbaseResult};
use crate::value::Value;
use chrono::{Datelike, Local};

fn arity_error(name: &str) -> XbaseError {
    XbaseError::new(ErrorKind::Syntax, format!("wrong number of arguments for {name}()"))
}

fn as_str(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

/// Looks up and calls `name(args)`. `dbf` is the currently open cursor, if
/// any, needed by the database-state functions (RECNO, EOF, BOF, ...).
pub fn call(name: &str, args: &[Value], dbf: Option<&Dbf>) -> XbaseResult<Value> {
    let name_upper = name.to_ascii_uppercase();
    let n = args.len();

    macro_rules! need {
        ($min:expr, $max:expr) => {
            if n < $min || n > $max {
                return Err(arity_error(name));
            }
        };
    }

    Ok(match name_upper.as_str() {
        "LEN" => {
            need!(1, 1);
            Value::Number(as_str(&args[0]).len() as f64)
        }
        "TRIM" | "ALLTRIM" => {
            need!(1, 1);
            Value::String(as_str(&args[0]).trim().to_string())
        }
        "LTRIM" => {
            need!(1, 1);
            Value::String(as_str(&args[0]).trim_start().to_string())
        }
        "RTRIM" => {
            need!(1, 1);
            Value::String(as_str(&args[0]).trim_end().to_string())
        }
        "UPPER" => {
            need!(1, 1);
            Value::String(as_str(&args[0]).to_uppercase())
        }
        "LOWER" => {
            need!(1, 1);
            Value::String(as_str(&args[0]).to_lowercase())
        }
        "SUBSTR" => {
            need!(2, 3);
            let s = as_str(&args[0]);
            let chars: Vec<char> = s.chars().collect();
            let slen = chars.len() as i64;
            let mut start = args[1].to_number() as i64 - 1;
            let mut len = if n >= 3 { args[2].to_number() as i64 } else { slen };
            if start < 0 {
                start = 0;
            }
            if start >= slen {
                Value::String(String::new())
            } else {
                if len < 0 {
                    len = 0;
                }
                if start + len > slen {
                    len = slen - start;
                }
                Value::String(chars[start as usize..(start + len) as usize].iter().collect())
            }
        }
        "LEFT" => {
            need!(2, 2);
            let s = as_str(&args[0]);
            let chars: Vec<char> = s.chars().collect();
            let mut len = args[1].to_number() as i64;
            if len <= 0 {
                Value::String(String::new())
            } else {
                if len > chars.len() as i64 {
                    len = chars.len() as i64;
                }
                Value::String(chars[..len as usize].iter().collect())
            }
        }
        "RIGHT" => {
            need!(2, 2);
            let s = as_str(&args[0]);
            let chars: Vec<char> = s.chars().collect();
            let mut len = args[1].to_number() as i64;
            if len <= 0 {
                Value::String(String::new())
            } else {
                if len > chars.len() as i64 {
                    len = chars.len() as i64;
                }
                Value::String(chars[chars.len() - len as usize..].iter().collect())
            }
        }
        "AT" => {
            need!(2, 2);
            let needle = as_str(&args[0]);
            let haystack = as_str(&args[1]);
            match haystack.find(&needle) {
                Some(byte_pos) => Value::Number((haystack[..byte_pos].chars().count() + 1) as f64),
                None => Value::Number(0.0),
            }
        }
        "SPACE" => {
            need!(1, 1);
            let len = args[0].to_number() as i64;
            Value::String(if len <= 0 { String::new() } else { " ".repeat(len as usize) })
        }
        "REPLICATE" => {
            need!(2, 2);
            let s = as_str(&args[0]);
            let count = args[1].to_number() as i64;
            Value::String(if count <= 0 || s.is_empty() { String::new() } else { s.repeat(count as usize) })
        }
        "STUFF" => {
            need!(4, 4);
            let s: Vec<char> = as_str(&args[0]).chars().collect();
            let mut start = args[1].to_number() as i64 - 1;
            let mut del = args[2].to_number() as i64;
            let insert = as_str(&args[3]);
            let slen = s.len() as i64;
            if start < 0 {
                start = 0;
            }
            if start > slen {
                start = slen;
            }
            if del < 0 {
                del = 0;
            }
            if start + del > slen {
                del = slen - start;
            }
            let mut out: String = s[..start as usize].iter().collect();
            out.push_str(&insert);
            out.extend(&s[(start + del) as usize..]);
            Value::String(out)
        }
        "CHR" => {
            need!(1, 1);
            let code = args[0].to_number() as i64;
            let byte = if (0..=255).contains(&code) { code as u8 } else { 0 };
            Value::String((byte as char).to_string())
        }
        "ASC" => {
            need!(1, 1);
            let s = as_str(&args[0]);
            Value::Number(s.bytes().next().map(|b| b as f64).unwrap_or(0.0))
        }
        "ABS" => {
            need!(1, 1);
            Value::Number(args[0].to_number().abs())
        }
        "INT" => {
            need!(1, 1);
            Value::Number(args[0].to_number().floor())
        }
        "ROUND" => {
            need!(1, 2);
            let val = args[0].to_number();
            let decimals = if n >= 2 { args[1].to_number() as i32 } else { 0 };
            let factor = 10f64.powi(decimals);
            Value::Number((val * factor).round() / factor)
        }
        "SQRT" => {
            need!(1, 1);
            let val = args[0].to_number();
            Value::Number(if val < 0.0 { 0.0 } else { val.sqrt() })
        }
        "MOD" => {
            need!(2, 2);
            let b = args[1].to_number();
            Value::Number(if b == 0.0 { 0.0 } else { args[0].to_number() % b })
        }
        "MAX" => {
            need!(2, 2);
            Value::Number(args[0].to_number().max(args[1].to_number()))
        }
        "MIN" => {
            need!(2, 2);
            Value::Number(args[0].to_number().min(args[1].to_number()))
        }
        "LOG" => {
            need!(1, 1);
            let val = args[0].to_number();
            Value::Number(if val <= 0.0 { 0.0 } else { val.ln() })
        }
        "EXP" => {
            need!(1, 1);
            Value::Number(args[0].to_number().exp())
        }
        "STR" => {
            need!(1, 3);
            let val = args[0].to_number();
            let mut width = if n >= 2 { args[1].to_number() as i64 } else { 10 };
            let mut decimals = if n >= 3 { args[2].to_number() as i64 } else { 0 };
            if width < 1 {
                width = 1;
            }
            if width > 100 {
                width = 100;
            }
            if decimals < 0 {
                decimals = 0;
            }
            Value::String(format!("{:>width$.decimals$}", val, width = width as usize, decimals = decimals as usize))
        }
        "VAL" => {
            need!(1, 1);
            Value::Number(args[0].to_number())
        }
        "DATE" => {
            need!(0, 0);
            let today = Local::now().date_naive();
            Value::date_from_ymd(today.year(), today.month(), today.day())
        }
        "YEAR" => {
            need!(1, 1);
            Value::Number(date_part(&args[0], 0..4).unwrap_or(0) as f64)
        }
        "MONTH" => {
            need!(1, 1);
            Value::Number(date_part(&args[0], 4..6).unwrap_or(0) as f64)
        }
        "DAY" => {
            need!(1, 1);
            Value::Number(date_part(&args[0], 6..8).unwrap_or(0) as f64)
        }
        "DOW" => {
            need!(1, 1);
            Value::Number(day_of_week(&args[0]).map(|d| d as f64).unwrap_or(0.0))
        }
        "CDOW" => {
            need!(1, 1);
            match day_of_week(&args[0]) {
                Some(d) => Value::String(DOW_NAMES[(d - 1) as usize].to_string()),
                None => Value::String(String::new()),
            }
        }
        "CMONTH" => {
            need!(1, 1);
            match date_part(&args[0], 4..6) {
                Some(m) if (1..=12).contains(&m) => Value::String(MONTH_NAMES[(m - 1) as usize].to_string()),
                _ => Value::String(String::new()),
            }
        }
        "DTOC" => {
            need!(1, 1);
            match &args[0] {
                Value::Date(s) if s.len() == 8 => {
                    Value::String(format!("{}/{}/{}", &s[4..6], &s[6..8], &s[2..4]))
                }
                _ => Value::String(String::new()),
            }
        }
        "CTOD" => {
            need!(1, 1);
            Value::normalize_date_literal(&as_str(&args[0]))
        }
        "TYPE" => {
            need!(1, 1);
            Value::String(args[0].type_code().to_string())
        }
        "EMPTY" => {
            need!(1, 1);
            Value::Logical(!args[0].to_logical())
        }
        "ISALPHA" => {
            need!(1, 1);
            Value::Logical(as_str(&args[0]).chars().next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false))
        }
        "ISDIGIT" => {
            need!(1, 1);
            Value::Logical(as_str(&args[0]).chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false))
        }
        "ISUPPER" => {
            need!(1, 1);
            Value::Logical(as_str(&args[0]).chars().next().map(|c| c.is_ascii_uppercase()).unwrap_or(false))
        }
        "ISLOWER" => {
            need!(1, 1);
            Value::Logical(as_str(&args[0]).chars().next().map(|c| c.is_ascii_lowercase()).unwrap_or(false))
        }
        "RECNO" => {
            need!(0, 0);
            Value::Number(dbf.map(|d| d.recno()).unwrap_or(0) as f64)
        }
        "RECCOUNT" | "LASTREC" => {
            need!(0, 0);
            Value::Number(dbf.map(|d| d.reccount()).unwrap_or(0) as f64)
        }
        "EOF" => {
            need!(0, 0);
            Value::Logical(dbf.map(|d| d.eof()).unwrap_or(true))
        }
        "BOF" => {
            need!(0, 0);
            Value::Logical(dbf.map(|d| d.bof()).unwrap_or(true))
        }
        "DELETED" => {
            need!(0, 0);
            Value::Logical(dbf.map(|d| d.deleted()).unwrap_or(false))
        }
        "FCOUNT" => {
            need!(0, 0);
            Value::Number(dbf.map(|d| d.field_count()).unwrap_or(0) as f64)
        }
        "FIELD" => {
            need!(1, 1);
            let idx = args[0].to_number() as i64 - 1;
            match dbf.and_then(|d| if idx >= 0 { d.fields.get(idx as usize) } else { None }) {
                Some(f) => Value::String(f.name.clone()),
                None => Value::String(String::new()),
            }
        }
        "IIF" => {
            need!(3, 3);
            if args[0].to_logical() { args[1].clone() } else { args[2].clone() }
        }
        "TIME" => {
            need!(0, 0);
            Value::String(Local::now().format("%H:%M:%S").to_string())
        }
        _ => return Err(XbaseError::new(ErrorKind::UndefinedFunction, format!("{name}()"))),
    })
}

fn date_part(v: &Value, range: std::ops::Range<usize>) -> Option<u32> {
    match v {
        Value::Date(s) if s.len() == 8 => s[range].parse::<u32>().ok(),
        _ => None,
    }
}

/// 1 (Sunday) .. 7 (Saturday).
fn day_of_week(v: &Value) -> Option<i64> {
    // `num_days_from_ce` counts 0001-01-01 (a Monday) as day 1, so
    // `j mod 7 == 1` on a Monday; shifting by +1 then wrapping lands
    // Sunday on 1, matching `DOW_NAMES`.
    v.as_julian().map(|j| ((j % 7 + 7) % 7) + 1)
}

const DOW_NAMES: [&str; 7] =
    ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];
const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_and_str() {
        assert_eq!(call("UPPER", &[Value::String("hi".into())], None).unwrap(), Value::String("HI".into()));
        assert_eq!(call("STR", &[Value::Number(50.0), Value::Number(2.0)], None).unwrap(), Value::String("50".into()));
    }

    #[test]
    fn iif_picks_branch() {
        assert_eq!(
            call("IIF", &[Value::Logical(true), Value::Number(1.0), Value::Number(2.0)], None).unwrap(),
            Value::Number(1.0)
        );
    }

    #[test]
    fn substr_matches_reference_semantics() {
        assert_eq!(
            call("SUBSTR", &[Value::String("Hello World".into()), Value::Number(7.0)], None).unwrap(),
            Value::String("World".into())
        );
    }

    #[test]
    fn unknown_function_is_an_error() {
        assert!(call("NOPE", &[], None).is_err());
    }

    #[test]
    fn dtoc_formats_mm_dd_yy() {
        assert_eq!(call("DTOC", &[Value::Date("20240305".into())], None).unwrap(), Value::String("03/05/24".into()));
    }
}
