//! Tagged scalar values: the unit of data every operator passes around.

use std::cmp::Ordering;
use std::fmt;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A runtime value carrying its own kind.
///
/// There is no three-valued logic here: `Null` compares unequal to
/// everything under `==`, and any ordering comparison against it is
/// handled explicitly by callers (predicates treat it as "false",
/// `ORDER BY` treats it as an extreme).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Text(String),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Ordering used by `ORDER BY`. Integers compare numerically, strings
    /// by code point; mixed-kind comparisons fall back to a stable but
    /// otherwise arbitrary kind ordering (this never happens for a single
    /// well-typed column in practice, since the analyzer enforces that
    /// columns have one declared type).
    pub fn cmp_for_order(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Int(_), Value::Text(_)) => Ordering::Less,
            (Value::Text(_), Value::Int(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Text(s) => write!(f, "{}", s),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Null => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        match raw {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .ok_or_else(|| DeError::custom("value is not representable as i64")),
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            other => Err(DeError::custom(format!("unsupported page value: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmp_for_order_numeric() {
        assert_eq!(Value::Int(1).cmp_for_order(&Value::Int(2)), Ordering::Less);
    }

    #[test]
    fn test_cmp_for_order_null_is_smallest() {
        assert_eq!(Value::Null.cmp_for_order(&Value::Int(-100)), Ordering::Less);
        assert_eq!(Value::Int(-100).cmp_for_order(&Value::Null), Ordering::Greater);
    }

    #[test]
    fn test_serde_roundtrip() {
        for v in [Value::Int(42), Value::Text("hi".into()), Value::Null] {
            let json = serde_json::to_string(&v).unwrap();
            let back: Value = serde_json::from_str(&json).unwrap();
            assert_eq!(v, back);
        }
    }
}
