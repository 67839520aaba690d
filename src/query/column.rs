//! Queryable columns and bound values
//!
//! `FaceColumn` is the allow-list of face-table columns that may appear in
//! a query. Field names supplied by callers are parsed into this enum
//! before any SQL is built, so an unknown or hostile field name is
//! rejected as `InvalidInput` instead of reaching the database.

use crate::{Error, Result};
use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, Value};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Columns of the face table that queries may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceColumn {
    /// Content hash of the face image (primary key)
    Hash,
    /// Snapshot display name
    Name,
    /// Text-encoded embedding vector
    Eigen,
    /// Photo file path
    ImgPath,
    /// Identity class the face belongs to
    ClassId,
}

impl FaceColumn {
    /// Get the column name as it appears in the schema
    pub fn as_str(&self) -> &'static str {
        match self {
            FaceColumn::Hash => "hash",
            FaceColumn::Name => "name",
            FaceColumn::Eigen => "eigen",
            FaceColumn::ImgPath => "img_path",
            FaceColumn::ClassId => "class_id",
        }
    }

    /// All queryable columns, in schema order
    pub fn all() -> &'static [FaceColumn] {
        &[
            FaceColumn::Hash,
            FaceColumn::Name,
            FaceColumn::Eigen,
            FaceColumn::ImgPath,
            FaceColumn::ClassId,
        ]
    }
}

impl FromStr for FaceColumn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hash" => Ok(FaceColumn::Hash),
            "name" => Ok(FaceColumn::Name),
            "eigen" => Ok(FaceColumn::Eigen),
            "img_path" => Ok(FaceColumn::ImgPath),
            "class_id" => Ok(FaceColumn::ClassId),
            _ => Err(Error::InvalidInput(format!("unknown query column: {:?}", s))),
        }
    }
}

impl std::fmt::Display for FaceColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value to match in an equality filter.
///
/// Values are handed to the database as bound parameters, never spliced
/// into command text.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Real(f64),
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            FieldValue::Text(s) => Ok(ToSqlOutput::Borrowed(s.as_str().into())),
            FieldValue::Integer(i) => Ok(ToSqlOutput::Owned(Value::Integer(*i))),
            FieldValue::Real(r) => Ok(ToSqlOutput::Owned(Value::Real(*r))),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(r: f64) -> Self {
        FieldValue::Real(r)
    }
}
