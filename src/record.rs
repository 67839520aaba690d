//! Record types - faces and identity classes
//!
//! A catalog holds two kinds of rows:
//! - `FaceRecord`: one detected face, keyed by the content hash of its
//!   photo, carrying the embedding vector and a snapshot of the identity
//!   name it was filed under
//! - `ClassRecord`: one identity (named person) that faces are associated
//!   with

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A face record in the catalog.
///
/// `name` is a snapshot of the class name at the time the record was
/// written; renaming a class does not rewrite existing face rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRecord {
    /// Content-derived identifier of the face image (primary key)
    pub hash: String,
    /// Display name, mirroring the class name at time of write
    pub name: String,
    /// Embedding vector produced by the recognition pipeline
    pub eigen: Vec<f64>,
    /// Filesystem path of the photo this record describes
    pub img_path: String,
    /// Identity class this face belongs to
    pub class_id: i64,
}

impl FaceRecord {
    /// Create a new face record
    pub fn new(
        hash: impl Into<String>,
        name: impl Into<String>,
        eigen: Vec<f64>,
        img_path: impl Into<String>,
        class_id: i64,
    ) -> Self {
        Self {
            hash: hash.into(),
            name: name.into(),
            eigen,
            img_path: img_path.into(),
            class_id,
        }
    }

    /// Encode the embedding as stored in the database: comma-separated
    /// decimal numbers, no brackets
    pub fn eigen_text(&self) -> String {
        self.eigen
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Check that the record is storable: non-empty keys and an embedding
    /// that survives the decimal text encoding
    pub fn validate(&self) -> Result<()> {
        if self.hash.is_empty() {
            return Err(Error::InvalidInput("face record with empty hash".into()));
        }
        if self.img_path.is_empty() {
            return Err(Error::InvalidInput(format!(
                "face record {} has an empty img_path",
                self.hash
            )));
        }
        if self.eigen.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "face record {} has a non-finite eigen component",
                self.hash
            )));
        }
        Ok(())
    }
}

/// Decode an embedding from its database text encoding
pub fn parse_eigen(text: &str) -> Result<Vec<f64>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| Error::InvalidInput(format!("bad eigen component: {:?}", part)))
        })
        .collect()
}

/// An identity class: a named person one or more faces are filed under.
///
/// `class_id` is caller-assigned and stable; `name` may change over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRecord {
    /// Stable identity-class identifier (primary key)
    pub class_id: i64,
    /// Display name for the class
    pub name: String,
}

impl ClassRecord {
    /// Create a new class record
    pub fn new(class_id: i64, name: impl Into<String>) -> Self {
        Self {
            class_id,
            name: name.into(),
        }
    }
}
