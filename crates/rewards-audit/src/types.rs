use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

use crate::utils::format_instant;

/// A single field value read from an export.
///
/// JSON numbers keep their literal form so that samples are reported exactly
/// as they appear in the source. Dates become [`FieldValue::Instant`] only after
/// normalization; until then they are text or `{"$date": ...}` objects.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// Absent, JSON `null`, or a value that failed normalization.
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    /// Timezone-naive instant produced by date normalization.
    Instant(NaiveDateTime),
    Array(Vec<Value>),
    Object(Map<String, Value>),
}

static NULL_VALUE: FieldValue = FieldValue::Null;

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_instant(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Instant(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Reduce the value to a comparable identifier key.
    ///
    /// `None` is the key shared by all null values. Extended JSON object ids
    /// (`{"$oid": "..."}`) collapse to the bare id so they compare equal to the
    /// plain string form used by foreign keys. Every other kind is tagged, so
    /// the number `1` and the string `"1"` stay distinct.
    pub fn key(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Text(s) => Some(format!("str:{}", s)),
            FieldValue::Object(map) if map.len() == 1 => match map.get("$oid") {
                Some(Value::String(oid)) => Some(format!("str:{}", oid)),
                _ => Some(format!("object:{}", self)),
            },
            FieldValue::Bool(b) => Some(format!("bool:{}", b)),
            FieldValue::Number(n) => Some(format!("number:{}", n)),
            FieldValue::Instant(dt) => Some(format!("instant:{}", dt)),
            FieldValue::Array(_) => Some(format!("array:{}", self)),
            FieldValue::Object(_) => Some(format!("object:{}", self)),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => FieldValue::Number(n),
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) => FieldValue::Array(items),
            Value::Object(map) => FieldValue::Object(map),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Instant(dt) => write!(f, "{}", format_instant(dt)),
            FieldValue::Array(items) => {
                write!(f, "{}", Value::Array(items.clone()))
            }
            FieldValue::Object(map) => write!(f, "{}", Value::Object(map.clone())),
        }
    }
}

/// One row of a collection. Fields keep the order they had in the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a parsed JSON object.
    pub fn from_json_object(object: Map<String, Value>) -> Self {
        Self {
            fields: object
                .into_iter()
                .map(|(k, v)| (k, FieldValue::from(v)))
                .collect(),
        }
    }

    /// Look up a field. Missing keys read as [`FieldValue::Null`].
    pub fn get(&self, field: &str) -> &FieldValue {
        self.fields.get(field).unwrap_or(&NULL_VALUE)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), value);
    }

    /// Builder-style insert, mostly for assembling records in code.
    pub fn with(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.insert(field, value);
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// A named, ordered sequence of records.
///
/// `columns` is the union of all field names in first-appearance order. A
/// field counts as present in the collection when any record carries it; the
/// records that don't carry it read it as null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    name: String,
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Create a collection from records, deriving the column order.
    pub fn from_records(name: impl Into<String>, records: Vec<Record>) -> Self {
        let mut collection = Self::new(name);
        for record in records {
            collection.push(record);
        }
        collection
    }

    pub fn push(&mut self, record: Record) {
        for field in record.field_names() {
            if !self.has_column(field) {
                self.columns.push(field.to_string());
            }
        }
        self.records.push(record);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, field: &str) -> bool {
        self.columns.iter().any(|c| c == field)
    }

    /// Iterate over one field across all records (nulls included).
    pub fn column_values<'a, 'f>(
        &'a self,
        field: &'f str,
    ) -> impl Iterator<Item = &'a FieldValue> + use<'a, 'f> {
        self.records.iter().map(move |r| r.get(field))
    }

    /// Return a copy with `f` applied to every value of `field`.
    ///
    /// Records missing the field get the mapped null value, which keeps the
    /// column dense the same way a data frame would.
    pub fn map_column<F>(&self, field: &str, f: F) -> Collection
    where
        F: Fn(&FieldValue) -> FieldValue,
    {
        let records = self
            .records
            .iter()
            .map(|record| {
                let mut updated = record.clone();
                updated.insert(field, f(record.get(field)));
                updated
            })
            .collect();
        Collection {
            name: self.name.clone(),
            columns: self.columns.clone(),
            records,
        }
    }
}

/// Category of a finding, mostly useful for JSON consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    NullValues,
    FutureDates,
    DateSequence,
    OrphanedReceipts,
    NegativeValues,
    ConversionError,
    DuplicateRecords,
    StatusDistribution,
    ZeroSpend,
}

/// One detected data-quality issue.
///
/// `details` are sub-lines (per-field counts, samples) rendered indented below
/// the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl Finding {
    pub fn new(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }

    /// Render the finding as text lines: the message, then each detail
    /// indented by two spaces.
    pub fn lines(&self) -> Vec<String> {
        std::iter::once(self.message.clone())
            .chain(self.details.iter().map(|d| format!("  {}", d)))
            .collect()
    }
}

static_assertions::assert_impl_all!(Collection: Send, Sync);
static_assertions::assert_impl_all!(Finding: Send, Sync);
