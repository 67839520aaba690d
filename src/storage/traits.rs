//! Storage abstraction trait
//!
//! Defines the interface for catalog persistence. Any storage engine
//! implementation must provide the full operation set; there are no
//! partial backends.

use crate::Result;
use crate::query::{FieldRow, FieldValue};
use crate::record::{ClassRecord, FaceRecord};

/// Catalog storage contract: face repository, class repository, and the
/// photo-file coupling on mutations.
pub trait FaceStore {
    /// Total number of face records
    fn count(&self) -> Result<usize>;

    /// Every column of every face row, as ordered field->value mappings
    fn list_all(&self) -> Result<Vec<FieldRow>>;

    /// Replace-or-insert each record by hash, all in one transaction.
    /// Records are validated before anything is written; a batch with a
    /// malformed record is rejected whole.
    fn upsert_many(&mut self, records: &[FaceRecord]) -> Result<()>;

    /// Look up a single face by hash
    fn get_face(&self, hash: &str) -> Result<Option<FaceRecord>>;

    /// Equality filter on one allow-listed column, capped at `limit` rows
    fn search_by_field(
        &self,
        field: &str,
        value: FieldValue,
        limit: usize,
    ) -> Result<Vec<FieldRow>>;

    /// Delete the face row, then its photo file. Fails with `NotFound` if
    /// the hash is absent; a file removal failure after the row is gone
    /// surfaces as `DegradedDelete`.
    fn remove_by_hash(&self, hash: &str) -> Result<bool>;

    /// Re-file a face under another class: re-sync `name` and `class_id`,
    /// rewrite the identity segment of `img_path`, then rename the photo
    /// on disk. A rename failure after the row is committed surfaces as
    /// `DegradedUpdate`.
    fn update_identity(&self, hash: &str, new_class_id: i64) -> Result<bool>;

    /// Distinct combinations of the given columns, ordered by `order_field`
    fn distinct_search(&self, fields: &[&str], order_field: &str) -> Result<Vec<FieldRow>>;

    /// Face rows per class, grouped by `class_id`
    fn class_counts(&self) -> Result<Vec<FieldRow>>;

    /// Upsert an identity class keyed by `class_id`
    fn add_or_replace_person(&self, class_id: i64, name: &str) -> Result<()>;

    /// Look up a single class by id
    fn get_class(&self, class_id: i64) -> Result<Option<ClassRecord>>;

    /// All identity classes
    fn list_classes(&self) -> Result<Vec<ClassRecord>>;
}
