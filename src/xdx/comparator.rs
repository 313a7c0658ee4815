//! Key comparator: CHAR (memcmp), NUMERIC (parse-as-double), DATE (memcmp
//! of the 8-byte `YYYYMMDD` form), with the DESCENDING header flag negating
//! the result.

use crate::xdx::header::KeyType;
use std::cmp::Ordering;

pub fn compare(key_type: KeyType, descending: bool, a: &[u8], b: &[u8]) -> Ordering {
    let ord = match key_type {
        KeyType::Numeric => {
            let da = parse_key_f64(a);
            let db = parse_key_f64(b);
            da.partial_cmp(&db).unwrap_or(Ordering::Equal)
        }
        KeyType::Date => a[..8.min(a.len())].cmp(&b[..8.min(b.len())]),
        KeyType::Char => a.cmp(b),
    };
    if descending {
        ord.reverse()
    } else {
        ord
    }
}

fn parse_key_f64(buf: &[u8]) -> f64 {
    let s = String::from_utf8_lossy(buf);
    s.trim().parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_compare_is_byte_order() {
        assert_eq!(compare(KeyType::Char, false, b"Alice", b"Bob"), Ordering::Less);
    }

    #[test]
    fn numeric_compare_is_numeric_not_lexical() {
        assert_eq!(compare(KeyType::Numeric, false, b"9", b"10"), Ordering::Less);
    }

    #[test]
    fn descending_negates() {
        assert_eq!(compare(KeyType::Char, true, b"Alice", b"Bob"), Ordering::Greater);
    }
}
