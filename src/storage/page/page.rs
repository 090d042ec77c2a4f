//! Page - the fixed-size unit of on-disk and in-cache storage.
//!
//! A [`Page`] holds an ordered collection of rows, each optionally
//! tombstoned, serialized as a self-describing JSON envelope and padded
//! with zero bytes out to [`PAGE_SIZE`].

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, Result, Row};

const TOMBSTONE_KEY: &str = "__deleted__";
const ENVELOPE_VERSION: u32 = 1;

/// A row plus its tombstone flag, as stored inside a page.
#[derive(Debug, Clone, PartialEq)]
struct StoredRow {
    row: Row,
    deleted: bool,
}

impl Serialize for StoredRow {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let extra = usize::from(self.deleted);
        let mut map = serializer.serialize_map(Some(self.row.len() + extra))?;
        for (k, v) in self.row.iter() {
            map.serialize_entry(k, v)?;
        }
        if self.deleted {
            map.serialize_entry(TOMBSTONE_KEY, &true)?;
        }
        map.end()
    }
}

struct StoredRowVisitor;

impl<'de> Visitor<'de> for StoredRowVisitor {
    type Value = StoredRow;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object representing a stored row")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<StoredRow, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut row = Row::new();
        let mut deleted = false;
        while let Some((key, value)) = map.next_entry::<String, crate::common::Value>()? {
            if key == TOMBSTONE_KEY {
                deleted = matches!(value, crate::common::Value::Int(1)) || value_is_truthy(&value);
            } else {
                row.insert(key, value);
            }
        }
        Ok(StoredRow { row, deleted })
    }
}

fn value_is_truthy(v: &crate::common::Value) -> bool {
    matches!(v, crate::common::Value::Int(n) if *n != 0)
}

impl<'de> Deserialize<'de> for StoredRow {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(StoredRowVisitor)
    }
}

#[derive(Serialize, Deserialize)]
struct PageEnvelope {
    version: u32,
    rows: Vec<StoredRow>,
}

/// A page of data, at most [`PAGE_SIZE`] bytes once serialized.
///
/// # Example
/// ```
/// use pageforge::storage::page::Page;
/// use pageforge::common::{Row, Value};
///
/// let mut page = Page::new();
/// let mut row = Row::new();
/// row.insert("id", Value::Int(1));
/// assert!(page.try_append_row(row).unwrap());
/// assert_eq!(page.iter_live_rows().count(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct Page {
    rows: Vec<StoredRow>,
}

impl Page {
    /// Create a new, empty page.
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// The page's fixed on-disk size.
    #[inline]
    pub const fn size() -> usize {
        PAGE_SIZE
    }

    /// Attempt to append `row`. Trial-serializes the page with the row
    /// added; if the result would exceed [`PAGE_SIZE`] the page is left
    /// unmodified and `Ok(false)` is returned so the caller can retry on
    /// a fresh page.
    pub fn try_append_row(&mut self, row: Row) -> Result<bool> {
        let mut candidate = self.rows.clone();
        candidate.push(StoredRow { row, deleted: false });
        match Self::encode(&candidate) {
            Ok(_) => {
                self.rows = candidate;
                Ok(true)
            }
            Err(Error::Runtime(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Mark every live row matching `predicate` as tombstoned. Returns
    /// the number of rows newly tombstoned.
    pub fn mark_deleted(&mut self, predicate: impl Fn(&Row) -> bool) -> usize {
        let mut count = 0;
        for stored in &mut self.rows {
            if !stored.deleted && predicate(&stored.row) {
                stored.deleted = true;
                count += 1;
            }
        }
        count
    }

    /// Apply `assign` to every live row matching `predicate`. Returns the
    /// number of rows updated.
    pub fn update_where(&mut self, predicate: impl Fn(&Row) -> bool, assign: impl Fn(&mut Row)) -> usize {
        let mut count = 0;
        for stored in &mut self.rows {
            if !stored.deleted && predicate(&stored.row) {
                assign(&mut stored.row);
                count += 1;
            }
        }
        count
    }

    /// Iterate live (non-tombstoned) rows in insertion order.
    pub fn iter_live_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|r| !r.deleted).map(|r| &r.row)
    }

    fn encode(rows: &[StoredRow]) -> Result<Vec<u8>> {
        let envelope = PageEnvelope {
            version: ENVELOPE_VERSION,
            rows: rows.to_vec(),
        };
        let json = serde_json::to_vec(&envelope)?;
        if json.len() > PAGE_SIZE {
            return Err(Error::runtime(format!(
                "serialized page is {} bytes, exceeds PAGE_SIZE ({})",
                json.len(),
                PAGE_SIZE
            )));
        }
        Ok(json)
    }

    /// Serialize into a zero-padded, exactly `PAGE_SIZE`-byte buffer.
    pub fn to_bytes(&self) -> Result<[u8; PAGE_SIZE]> {
        let json = Self::encode(&self.rows)?;
        let mut buf = [0u8; PAGE_SIZE];
        buf[..json.len()].copy_from_slice(&json);
        Ok(buf)
    }

    /// Deserialize from a `PAGE_SIZE`-byte buffer, stripping the trailing
    /// zero padding. An all-zero buffer (a freshly allocated, never
    /// written page) decodes to an empty page.
    pub fn from_bytes(data: &[u8]) -> Result<Page> {
        let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        if end == 0 {
            return Ok(Page::new());
        }
        let envelope: PageEnvelope = serde_json::from_slice(&data[..end])?;
        Ok(Page { rows: envelope.rows })
    }
}
