//! # Facedb - Face Recognition Catalog Store
//!
//! Persistence layer for a face-recognition catalog.
//!
//! Facedb provides:
//! - Face records keyed by content hash, with embedding vectors and the
//!   identity class each face belongs to
//! - Identity classes (named persons) with replace-or-insert semantics
//! - SQLite-backed storage with batch upsert in a single transaction
//! - Allow-listed, parameter-bound queries for filtering, distinct
//!   projection, and per-class counts
//! - Photo-file coupling: removing or re-identifying a face keeps the
//!   database row and the photo file in lockstep, with degraded outcomes
//!   surfaced instead of swallowed

pub mod config;
pub mod query;
pub mod record;
pub mod storage;

// Re-exports for convenient access
pub use query::{FaceColumn, FieldRow, FieldValue, QueryEngine};
pub use record::{ClassRecord, FaceRecord};
pub use storage::{FaceStore, MissingPhoto, SqliteStore, StoreStats};

/// Result type alias for Facedb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Facedb operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The face row was deleted but the photo file could not be removed.
    /// The row is gone; the file at `img_path` is orphaned.
    #[error("Degraded delete for {hash}: row removed but photo {img_path} remains: {source}")]
    DegradedDelete {
        hash: String,
        img_path: String,
        source: std::io::Error,
    },

    /// The face row was updated but the photo file could not be renamed.
    /// The row already points at `img_path`; the file is still at its old path.
    #[error("Degraded update for {hash}: row updated but photo was not renamed to {img_path}: {source}")]
    DegradedUpdate {
        hash: String,
        img_path: String,
        source: std::io::Error,
    },
}
