//! Row: an ordered column-name → value mapping, the currency every
//! operator passes to its parent.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::value::Value;

/// An ordered mapping from column name to value.
///
/// Keys may be bare (`id`) or qualified (`s.id`) when produced by a join.
/// [`Row::get`] transparently resolves a bare lookup against a qualified
/// key whose suffix matches, so downstream operators don't need to know
/// whether they're looking at a joined row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(IndexMap<String, Value>);

impl Row {
    pub fn new() -> Self {
        Row(IndexMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Exact key lookup, no qualifier resolution.
    pub fn get_exact(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Resolve `name` against this row: first by exact key match, then
    /// (for an unqualified `name`) by suffix match against any qualified
    /// key `qualifier.name`. Returns `None` on a miss — callers treat a
    /// miss as `Value::Null` per the predicate/projection rules.
    pub fn get(&self, name: &str) -> Option<&Value> {
        if let Some(v) = self.0.get(name) {
            return Some(v);
        }
        if !name.contains('.') {
            let suffix = format!(".{name}");
            for (k, v) in self.0.iter() {
                if k.ends_with(&suffix) {
                    return Some(v);
                }
            }
        }
        None
    }

    /// Merge `other` into a new row, prefixing each side's keys with its
    /// alias (when given) to avoid collisions. Used by `Join`.
    pub fn merge_qualified(left: &Row, left_alias: Option<&str>, right: &Row, right_alias: Option<&str>) -> Row {
        let mut out = Row::new();
        for (k, v) in left.iter() {
            let key = match left_alias {
                Some(alias) => format!("{alias}.{k}"),
                None => k.clone(),
            };
            out.insert(key, v.clone());
        }
        for (k, v) in right.iter() {
            let key = match right_alias {
                Some(alias) => format!("{alias}.{k}"),
                None => k.clone(),
            };
            out.insert(key, v.clone());
        }
        out
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Row(iter.into_iter().collect())
    }
}

impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in self.0.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = Row;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object representing a row")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Row, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut row = IndexMap::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            row.insert(key, value);
        }
        Ok(Row(row))
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RowVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_exact() {
        let mut row = Row::new();
        row.insert("id", Value::Int(1));
        assert_eq!(row.get("id"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_get_by_suffix_on_qualified_key() {
        let mut row = Row::new();
        row.insert("s.id", Value::Int(7));
        assert_eq!(row.get("id"), Some(&Value::Int(7)));
        assert_eq!(row.get("s.id"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_get_miss_returns_none() {
        let row = Row::new();
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_merge_qualified() {
        let mut left = Row::new();
        left.insert("id", Value::Int(1));
        let mut right = Row::new();
        right.insert("id", Value::Int(2));

        let merged = Row::merge_qualified(&left, Some("s"), &right, Some("c"));
        assert_eq!(merged.get_exact("s.id"), Some(&Value::Int(1)));
        assert_eq!(merged.get_exact("c.id"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_row_serde_roundtrip_preserves_values() {
        let mut row = Row::new();
        row.insert("id", Value::Int(1));
        row.insert("name", Value::Text("Alice".into()));
        row.insert("nickname", Value::Null);

        let json = serde_json::to_string(&row).unwrap();
        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(row, back);
    }
}
