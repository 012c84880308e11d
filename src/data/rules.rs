//! Cleaning rules compiled into an ordered list of per-column transform steps.
//! Coercions run first, then pattern strips, then case formats; within a kind,
//! steps are ordered by column name.

use std::fmt;

use regex::Regex;
use serde::Deserialize;

use crate::config::{CleaningConfig, ConfigError};
use crate::data::record::CellValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum DataType {
    #[serde(rename = "string", alias = "str", alias = "text")]
    Text,
    #[serde(rename = "int", alias = "integer")]
    Integer,
    #[serde(rename = "float", alias = "decimal")]
    Decimal,
    #[serde(rename = "bool", alias = "boolean")]
    Boolean,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::Integer => "int",
            Self::Decimal => "float",
            Self::Boolean => "bool",
        }
    }

    /// Parse a raw text cell into this type. Coercion is the first step for a
    /// column, so only text cells are accepted.
    pub fn coerce(&self, cell: CellValue) -> Result<CellValue, TransformError> {
        let text = match cell {
            CellValue::Text(text) => text,
            other => {
                return Err(TransformError::NotText {
                    found: other.type_name(),
                })
            }
        };
        let parsed = match self {
            Self::Text => return Ok(CellValue::Text(text)),
            Self::Integer => text.trim().parse::<i64>().ok().map(CellValue::Integer),
            Self::Decimal => text.trim().parse::<f64>().ok().map(CellValue::Decimal),
            Self::Boolean => parse_bool(&text).map(CellValue::Boolean),
        };
        parsed.ok_or(TransformError::Coerce {
            value: text,
            target: *self,
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum FormatMode {
    #[serde(alias = "title")]
    Title,
    #[serde(alias = "upper")]
    Upper,
    #[serde(alias = "lower")]
    Lower,
    #[serde(alias = "capitalize")]
    Capitalize,
}

impl FormatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Upper => "Upper",
            Self::Lower => "Lower",
            Self::Capitalize => "Capitalize",
        }
    }

    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::Title => title_case(text),
            Self::Upper => text.to_uppercase(),
            Self::Lower => text.to_lowercase(),
            Self::Capitalize => capitalize(text),
        }
    }
}

impl fmt::Display for FormatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper-case the first letter of every run of letters, lower-case the rest.
/// `"o'NEIL-east godavari"` becomes `"O'Neil-East Godavari"`.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    Coerce { value: String, target: DataType },
    NotText { found: &'static str },
}

/// A pure cell-to-cell function.
#[derive(Debug, Clone)]
pub enum Transform {
    Coerce(DataType),
    StripPattern(Regex),
    Format(FormatMode),
}

impl Transform {
    pub fn apply(&self, cell: CellValue) -> Result<CellValue, TransformError> {
        match self {
            Self::Coerce(target) => target.coerce(cell),
            Self::StripPattern(pattern) => match cell {
                CellValue::Text(text) => {
                    Ok(CellValue::Text(pattern.replace_all(&text, "").into_owned()))
                }
                other => Err(TransformError::NotText {
                    found: other.type_name(),
                }),
            },
            Self::Format(mode) => match cell {
                CellValue::Text(text) => Ok(CellValue::Text(mode.apply(&text))),
                other => Err(TransformError::NotText {
                    found: other.type_name(),
                }),
            },
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coerce(target) => write!(f, "datatype {target}"),
            Self::StripPattern(pattern) => write!(f, "regex {}", pattern.as_str()),
            Self::Format(mode) => write!(f, "format {mode}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnStep {
    pub column: String,
    pub transform: Transform,
}

/// Validated, immutable cleaning rule set.
#[derive(Debug, Clone)]
pub struct CleaningRules {
    /// Columns to retain; output keeps the file's order. `None` keeps every column.
    pub columns: Option<Vec<String>>,
    pub key_column: String,
    pub steps: Vec<ColumnStep>,
}

impl CleaningRules {
    pub fn compile(config: &CleaningConfig, key_column: &str) -> Result<Self, ConfigError> {
        let columns = config.columns.clone();
        let check_column = |column: &str| -> Result<(), ConfigError> {
            match &columns {
                Some(retained) if !retained.iter().any(|name| name == column) => {
                    Err(ConfigError::UnknownColumn(column.to_string()))
                }
                _ => Ok(()),
            }
        };

        check_column(key_column)?;
        let mut datatypes = config.datatypes.clone();
        match datatypes.get(key_column) {
            Some(DataType::Integer) => {}
            Some(_) => return Err(ConfigError::KeyNotInteger(key_column.to_string())),
            None => {
                datatypes.insert(key_column.to_string(), DataType::Integer);
            }
        }

        let mut steps = Vec::new();
        for (column, target) in &datatypes {
            check_column(column)?;
            steps.push(ColumnStep {
                column: column.clone(),
                transform: Transform::Coerce(*target),
            });
        }
        for (column, pattern) in &config.patterns {
            check_column(column)?;
            let regex = Regex::new(pattern).map_err(|source| ConfigError::Pattern {
                column: column.clone(),
                source,
            })?;
            steps.push(ColumnStep {
                column: column.clone(),
                transform: Transform::StripPattern(regex),
            });
        }
        for (column, mode) in &config.formats {
            check_column(column)?;
            steps.push(ColumnStep {
                column: column.clone(),
                transform: Transform::Format(*mode),
            });
        }

        Ok(Self {
            columns,
            key_column: key_column.to_string(),
            steps,
        })
    }
}
