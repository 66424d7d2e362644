//! Field value model — the semantic type of every proxy field.
//!
//! Change detection compares these by value, never by identity.
//! Numeric comparison crosses the `Int`/`Uint` width boundary, so a
//! count copied in as `Uint(42)` equals a rule-written `Int(42)`.
//!
//! `Unset` is the sentinel for a field that was never populated.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single field value, as seen by proxies and rule scripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Unset,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Str(String),
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// Short type name for fault messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Unset => "unset",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Uint(_) => "uint",
            FieldValue::Str(_) => "string",
            FieldValue::Bytes(_) => "bytes",
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, FieldValue::Unset)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Widen either integer variant to i128 for arithmetic and ordering.
    pub fn as_num(&self) -> Option<i128> {
        match self {
            FieldValue::Int(n) => Some(*n as i128),
            FieldValue::Uint(n) => Some(*n as i128),
            _ => None,
        }
    }

    /// Narrow an i128 back to a field value. `Int` wins when the value
    /// fits; values above `i64::MAX` become `Uint`; out-of-range is None.
    pub fn from_num(n: i128) -> Option<FieldValue> {
        if let Ok(v) = i64::try_from(n) {
            Some(FieldValue::Int(v))
        } else if let Ok(v) = u64::try_from(n) {
            Some(FieldValue::Uint(v))
        } else {
            None
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Unset, FieldValue::Unset) => true,
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::Str(a), FieldValue::Str(b)) => a == b,
            (FieldValue::Bytes(a), FieldValue::Bytes(b)) => a == b,
            (a, b) => match (a.as_num(), b.as_num()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Unset => write!(f, "unset"),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(n) => write!(f, "{}", n),
            FieldValue::Uint(n) => write!(f, "{}", n),
            FieldValue::Str(s) => write!(f, "{}", s),
            FieldValue::Bytes(b) => {
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_value() {
        assert_eq!(
            FieldValue::Str("abc".to_string()),
            FieldValue::Str("abc".to_string())
        );
        assert_ne!(
            FieldValue::Str("abc".to_string()),
            FieldValue::Str("abd".to_string())
        );
        assert_eq!(FieldValue::Unset, FieldValue::Unset);
        assert_ne!(FieldValue::Unset, FieldValue::Int(0));
    }

    #[test]
    fn numeric_equality_crosses_width() {
        assert_eq!(FieldValue::Int(42), FieldValue::Uint(42));
        assert_ne!(FieldValue::Int(-1), FieldValue::Uint(u64::MAX));
    }

    #[test]
    fn from_num_prefers_int() {
        assert_eq!(FieldValue::from_num(7), Some(FieldValue::Int(7)));
        assert_eq!(
            FieldValue::from_num(i64::MAX as i128 + 1),
            Some(FieldValue::Uint(i64::MAX as u64 + 1))
        );
        assert_eq!(FieldValue::from_num(u64::MAX as i128 + 1), None);
    }

    #[test]
    fn json_round_trip() {
        let v = FieldValue::Str("hello".to_string());
        let json = serde_json::to_value(&v).unwrap();
        let back: FieldValue = serde_json::from_value(json).unwrap();
        assert_eq!(v, back);

        let unset = serde_json::to_value(FieldValue::Unset).unwrap();
        assert!(unset.is_null());
    }
}
