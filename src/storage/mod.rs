//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - face_table(hash, name, eigen, img_path, class_id)
//! - class_table(class_id, name)
//!
//! Face rows are coupled to photo files on disk: removing or
//! re-identifying a face mutates the row first, then the file, and a file
//! step that fails after the row is committed surfaces as a degraded
//! outcome instead of a silent success.

pub mod schema;
pub mod sqlite;
pub mod traits;

pub use sqlite::{MissingPhoto, SqliteStore, StoreStats};
pub use traits::FaceStore;
