use crate::nba::error::{DashError, Result};

use indexmap::IndexMap;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::iter::FromIterator;

/// One cell of a fetched row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Null => None,
        }
    }

    /// Renders the value as an inline SQL literal. Quotes inside text are doubled.
    pub fn sql_literal(&self) -> String {
        match self {
            Scalar::Null => "NULL".to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) if f.is_finite() => f.to_string(),
            Scalar::Float(_) => "NULL".to_string(),
            Scalar::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<&Value> for Scalar {
    fn from(v: &Value) -> Self {
        if v.is_null() {
            Scalar::Null
        } else if let Some(i) = v.as_i64() {
            Scalar::Int(i)
        } else if let Some(f) = v.as_f64() {
            Scalar::Float(f)
        } else if let Some(s) = v.as_str() {
            Scalar::Text(s.to_string())
        } else if let Some(b) = v.as_bool() {
            Scalar::Int(b as i64)
        } else {
            Scalar::Text(v.to_string())
        }
    }
}

impl<'a> From<ValueRef<'a>> for Scalar {
    fn from(v: ValueRef<'a>) -> Self {
        match v {
            ValueRef::Null | ValueRef::Blob(_) => Scalar::Null,
            ValueRef::Integer(i) => Scalar::Int(i),
            ValueRef::Real(f) => Scalar::Float(f),
            ValueRef::Text(t) => Scalar::Text(String::from_utf8_lossy(t).into_owned()),
        }
    }
}

impl ToSql for Scalar {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Scalar::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Scalar::Int(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Scalar::Float(f) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*f)),
            Scalar::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::Float(f)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

/// A row keyed by column name. Column order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Scalar>,
}

impl Record {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Scalar>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.fields.get(column)
    }

    pub fn require(&self, column: &str) -> Result<&Scalar> {
        self.fields.get(column).ok_or_else(|| DashError::missing(column))
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Scalar> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Same column set, in any order.
    pub fn same_columns(&self, other: &Record) -> bool {
        self.len() == other.len() && self.columns().all(|c| other.contains(c))
    }

    /// True when `column` holds `expected` rendered as text.
    pub fn matches(&self, column: &str, expected: &str) -> bool {
        self.get(column)
            .map(|v| v.to_string() == expected)
            .unwrap_or(false)
    }

    pub fn from_json_object(obj: &serde_json::Map<String, Value>) -> Self {
        obj.iter()
            .map(|(k, v)| (k.clone(), Scalar::from(v)))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Scalar)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Scalar)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Parses a JSON array of flat objects. Non-object elements are rejected
/// and an empty array is `EmptyInput`.
pub fn records_from_json(text: &str) -> Result<Vec<Record>> {
    let json: Value = serde_json::from_str(text)?;
    records_from_value(&json)
}

pub fn records_from_value(json: &Value) -> Result<Vec<Record>> {
    let rows = match json.as_array() {
        Some(rows) if rows.is_empty() => return Err(DashError::EmptyInput),
        Some(rows) => rows,
        None => {
            return Err(DashError::SchemaMismatch {
                row: 0,
                expected: "array".to_string(),
                found: json_kind(json).to_string(),
            })
        }
    };
    rows.iter()
        .enumerate()
        .map(|(row, v)| match v.as_object() {
            Some(obj) => Ok(Record::from_json_object(obj)),
            None => Err(DashError::SchemaMismatch {
                row,
                expected: "object".to_string(),
                found: v.to_string(),
            }),
        })
        .collect()
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Drops exact duplicates, keeping the first occurrence.
pub fn dedup_records(records: Vec<Record>) -> Vec<Record> {
    let mut seen: HashSet<String> = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(format!("{:?}", r.fields)))
        .collect()
}

#[cfg(test)]
pub(crate) fn rec(pairs: &[(&str, Scalar)]) -> Record {
    pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
}
