//! In-memory dataset store. Built once by running the cleaning pipeline over the
//! source file, read-only afterwards.

use std::fs;
use std::path::PathBuf;

use encoding_rs::Encoding;
use thiserror::Error;
use tracing::info;

use crate::data::loader::read_table;
use crate::data::record::{Record, RecordRef};
use crate::data::rules::{CleaningRules, ColumnStep, TransformError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed csv: {0}")]
    Csv(#[source] csv::Error),
    #[error("row {row} is not valid {encoding}")]
    Encoding { encoding: &'static str, row: usize },
    #[error("column '{0}' not found in source")]
    MissingColumn(String),
    #[error("cannot convert '{value}' in column '{column}' row {row} to {target}")]
    Coerce {
        column: String,
        row: usize,
        value: String,
        target: &'static str,
    },
    #[error("column '{column}' holds {found} values; text rules need string values")]
    NotText { column: String, found: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Pincode {0} not found")]
pub struct NotFound(pub i64);

/// Where the dataset lives and how its bytes are encoded.
#[derive(Debug, Clone)]
pub struct DatasetSource {
    pub path: PathBuf,
    pub encoding: &'static Encoding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStore {
    columns: Vec<String>,
    records: Vec<Record>,
    key_index: usize,
}

impl DatasetStore {
    /// Load `source` and apply `rules`. Any failure aborts; no partial store is returned.
    pub fn setup(source: &DatasetSource, rules: &CleaningRules) -> Result<Self, LoadError> {
        let bytes = fs::read(&source.path).map_err(|err| LoadError::Read {
            path: source.path.clone(),
            source: err,
        })?;
        let store = Self::setup_from_bytes(&bytes, source.encoding, rules)?;
        info!(
            path = %source.path.display(),
            records = store.len(),
            "dataset ready"
        );
        Ok(store)
    }

    pub fn setup_from_bytes(
        bytes: &[u8],
        encoding: &'static Encoding,
        rules: &CleaningRules,
    ) -> Result<Self, LoadError> {
        let table = read_table(bytes, encoding, rules.columns.as_deref())?;
        info!(
            columns = table.columns.len(),
            records = table.records.len(),
            "file loaded"
        );

        let mut store = Self {
            key_index: column_index(&table.columns, &rules.key_column)?,
            columns: table.columns,
            records: table.records,
        };
        for step in &rules.steps {
            store.apply_step(step)?;
            info!(column = %step.column, "{} applied", step.transform);
        }
        Ok(store)
    }

    fn apply_step(&mut self, step: &ColumnStep) -> Result<(), LoadError> {
        let index = column_index(&self.columns, &step.column)?;
        for (offset, record) in self.records.iter_mut().enumerate() {
            let cell = std::mem::take(&mut record.cells[index]);
            record.cells[index] = step.transform.apply(cell).map_err(|err| match err {
                TransformError::Coerce { value, target } => LoadError::Coerce {
                    column: step.column.clone(),
                    row: offset + 1,
                    value,
                    target: target.as_str(),
                },
                TransformError::NotText { found } => LoadError::NotText {
                    column: step.column.clone(),
                    found,
                },
            })?;
        }
        Ok(())
    }

    /// Every record whose key column equals `value`, in file order.
    pub fn filter_by_key(&self, value: i64) -> Result<Vec<RecordRef<'_>>, NotFound> {
        let matches: Vec<RecordRef<'_>> = self
            .records
            .iter()
            .filter(|record| record.cells[self.key_index].as_integer() == Some(value))
            .map(|record| RecordRef {
                columns: &self.columns,
                record,
            })
            .collect();
        if matches.is_empty() {
            return Err(NotFound(value));
        }
        Ok(matches)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> impl Iterator<Item = RecordRef<'_>> {
        self.records.iter().map(|record| RecordRef {
            columns: &self.columns,
            record,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn column_index(columns: &[String], name: &str) -> Result<usize, LoadError> {
    columns
        .iter()
        .position(|column| column == name)
        .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
}
