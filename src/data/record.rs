use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// One typed cell. Cells start as `Text` and are retyped by datatype rules.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Name of the cell's type, as written in datatype rules.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "string",
            Self::Integer(_) => "int",
            Self::Decimal(_) => "float",
            Self::Boolean(_) => "bool",
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Decimal(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Integer(value) => serializer.serialize_i64(*value),
            Self::Decimal(value) if value.is_finite() => serializer.serialize_f64(*value),
            Self::Decimal(_) => serializer.serialize_none(),
            Self::Boolean(value) => serializer.serialize_bool(*value),
        }
    }
}

/// One row of retained cells, positionally aligned with the store's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub cells: Vec<CellValue>,
}

/// A record paired with its column names; serializes as a JSON object in column order.
#[derive(Debug, Clone, Copy)]
pub struct RecordRef<'a> {
    pub columns: &'a [String],
    pub record: &'a Record,
}

impl<'a> RecordRef<'a> {
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        let index = self.columns.iter().position(|name| name == column)?;
        self.record.cells.get(index)
    }
}

impl Serialize for RecordRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(&self.record.cells) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}
