//! SQLite storage implementation

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use super::schema;
use super::traits::FaceStore;
use crate::query::engine::collect_field_rows;
use crate::query::{FieldRow, FieldValue, QueryEngine};
use crate::record::{ClassRecord, FaceRecord, parse_eigen};
use crate::{Error, Result};

/// The identity segment of a photo path: a name immediately preceding a
/// `_<token>.jpg` tail, e.g. `alice` in `/photos/alice_h1.jpg`
static IDENTITY_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/([A-Za-z]+)(_[A-Za-z0-9]+\.jpg)").expect("identity segment pattern"));

/// SQLite-backed catalog store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates it, and missing parent directories,
    /// if absent). Any schema failure is fatal to construction.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        info!(path = %path.display(), "opened face catalog");
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    // ========== Face Operations ==========

    /// Count all face records
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM face_table", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Every column of every face row, in schema column order
    pub fn list_all(&self) -> Result<Vec<FieldRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT hash, name, eigen, img_path, class_id FROM face_table")?;
        collect_field_rows(&mut stmt, [])
    }

    /// Replace-or-insert each record by hash, all in one transaction.
    ///
    /// Every record is validated before anything is written; a batch with
    /// a malformed record is rejected whole and the database is untouched.
    pub fn upsert_many(&mut self, records: &[FaceRecord]) -> Result<()> {
        for record in records {
            record.validate()?;
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO face_table (hash, name, eigen, img_path, class_id) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for record in records {
                debug!(hash = %record.hash, name = %record.name, "upsert face");
                stmt.execute(params![
                    record.hash,
                    record.name,
                    record.eigen_text(),
                    record.img_path,
                    record.class_id,
                ])?;
            }
        }
        tx.commit()?;

        info!(count = records.len(), "upserted face records");
        Ok(())
    }

    /// Get a face record by hash
    pub fn get_face(&self, hash: &str) -> Result<Option<FaceRecord>> {
        self.conn
            .query_row(
                "SELECT hash, name, eigen, img_path, class_id FROM face_table WHERE hash = ?1",
                [hash],
                row_to_face,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Equality filter on one allow-listed column
    pub fn search_by_field(
        &self,
        field: &str,
        value: FieldValue,
        limit: usize,
    ) -> Result<Vec<FieldRow>> {
        QueryEngine::new(self).search_by_field(field, value, limit)
    }

    /// Distinct combinations of the given columns, ordered by `order_field`
    pub fn distinct_search(&self, fields: &[&str], order_field: &str) -> Result<Vec<FieldRow>> {
        QueryEngine::new(self).distinct_search(fields, order_field)
    }

    /// Face rows per class, grouped by `class_id`
    pub fn class_counts(&self) -> Result<Vec<FieldRow>> {
        QueryEngine::new(self).class_counts()
    }

    /// Delete a face row, then its photo file.
    ///
    /// Ordering is row first, file second. The file step is outside the
    /// transaction boundary; if it fails after the row is gone the call
    /// returns `DegradedDelete` carrying the orphaned path. A crash
    /// between the two steps leaves the same orphan, silently.
    pub fn remove_by_hash(&self, hash: &str) -> Result<bool> {
        let face = self
            .get_face(hash)?
            .ok_or_else(|| Error::NotFound(format!("face {}", hash)))?;

        self.conn
            .execute("DELETE FROM face_table WHERE hash = ?1", [hash])?;
        info!(hash, img_path = %face.img_path, "removed face row");

        match std::fs::remove_file(&face.img_path) {
            Ok(()) => Ok(true),
            Err(source) => Err(Error::DegradedDelete {
                hash: hash.to_string(),
                img_path: face.img_path,
                source,
            }),
        }
    }

    /// Re-file a face under another class.
    ///
    /// Looks up the face and the target class (`NotFound` for either),
    /// rewrites the identity segment of the photo path to the class name,
    /// updates `name`, `class_id` and `img_path` on the row, then renames
    /// the photo on disk. A rename failure after the row is committed
    /// returns `DegradedUpdate`: the row already points at the new path
    /// while the file is still at the old one.
    pub fn update_identity(&self, hash: &str, new_class_id: i64) -> Result<bool> {
        let face = self
            .get_face(hash)?
            .ok_or_else(|| Error::NotFound(format!("face {}", hash)))?;
        let class = self
            .get_class(new_class_id)?
            .ok_or_else(|| Error::NotFound(format!("class {}", new_class_id)))?;

        let new_path = renamed_photo_path(&face.img_path, &class.name);
        self.conn.execute(
            "UPDATE face_table SET name = ?1, class_id = ?2, img_path = ?3 WHERE hash = ?4",
            params![class.name, new_class_id, new_path, hash],
        )?;
        info!(hash, class_id = new_class_id, img_path = %new_path, "re-filed face");

        match std::fs::rename(&face.img_path, &new_path) {
            Ok(()) => Ok(true),
            Err(source) => Err(Error::DegradedUpdate {
                hash: hash.to_string(),
                img_path: new_path,
                source,
            }),
        }
    }

    // ========== Class Operations ==========

    /// Upsert an identity class keyed by `class_id`; replaces the name if
    /// the id already exists
    pub fn add_or_replace_person(&self, class_id: i64, name: &str) -> Result<()> {
        info!(class_id, name, "adding person");
        self.conn.execute(
            "INSERT OR REPLACE INTO class_table (class_id, name) VALUES (?1, ?2)",
            params![class_id, name],
        )?;
        Ok(())
    }

    /// Get a class record by id
    pub fn get_class(&self, class_id: i64) -> Result<Option<ClassRecord>> {
        self.conn
            .query_row(
                "SELECT class_id, name FROM class_table WHERE class_id = ?1",
                [class_id],
                |row| {
                    Ok(ClassRecord {
                        class_id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// All identity classes
    pub fn list_classes(&self) -> Result<Vec<ClassRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT class_id, name FROM class_table")?;

        let classes = stmt
            .query_map([], |row| {
                Ok(ClassRecord {
                    class_id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(classes)
    }

    // ========== Maintenance ==========

    /// Reconciliation sweep: report face rows whose photo file no longer
    /// exists on disk
    pub fn missing_photos(&self) -> Result<Vec<MissingPhoto>> {
        let mut stmt = self
            .conn
            .prepare("SELECT hash, img_path FROM face_table")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let missing = rows
            .into_iter()
            .filter(|(_, img_path)| !Path::new(img_path).exists())
            .map(|(hash, img_path)| MissingPhoto { hash, img_path })
            .collect();

        Ok(missing)
    }

    /// Get catalog statistics
    pub fn stats(&self) -> Result<StoreStats> {
        let classes: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM class_table", [], |row| row.get(0))?;
        Ok(StoreStats {
            faces: self.count()?,
            classes: classes as usize,
        })
    }
}

impl FaceStore for SqliteStore {
    fn count(&self) -> Result<usize> {
        SqliteStore::count(self)
    }

    fn list_all(&self) -> Result<Vec<FieldRow>> {
        SqliteStore::list_all(self)
    }

    fn upsert_many(&mut self, records: &[FaceRecord]) -> Result<()> {
        SqliteStore::upsert_many(self, records)
    }

    fn get_face(&self, hash: &str) -> Result<Option<FaceRecord>> {
        SqliteStore::get_face(self, hash)
    }

    fn search_by_field(
        &self,
        field: &str,
        value: FieldValue,
        limit: usize,
    ) -> Result<Vec<FieldRow>> {
        SqliteStore::search_by_field(self, field, value, limit)
    }

    fn remove_by_hash(&self, hash: &str) -> Result<bool> {
        SqliteStore::remove_by_hash(self, hash)
    }

    fn update_identity(&self, hash: &str, new_class_id: i64) -> Result<bool> {
        SqliteStore::update_identity(self, hash, new_class_id)
    }

    fn distinct_search(&self, fields: &[&str], order_field: &str) -> Result<Vec<FieldRow>> {
        SqliteStore::distinct_search(self, fields, order_field)
    }

    fn class_counts(&self) -> Result<Vec<FieldRow>> {
        SqliteStore::class_counts(self)
    }

    fn add_or_replace_person(&self, class_id: i64, name: &str) -> Result<()> {
        SqliteStore::add_or_replace_person(self, class_id, name)
    }

    fn get_class(&self, class_id: i64) -> Result<Option<ClassRecord>> {
        SqliteStore::get_class(self, class_id)
    }

    fn list_classes(&self) -> Result<Vec<ClassRecord>> {
        SqliteStore::list_classes(self)
    }
}

/// Helper to convert a row to a FaceRecord
fn row_to_face(row: &rusqlite::Row) -> rusqlite::Result<FaceRecord> {
    let eigen_text: String = row.get(2)?;
    let eigen = parse_eigen(&eigen_text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(FaceRecord {
        hash: row.get(0)?,
        name: row.get(1)?,
        eigen,
        img_path: row.get(3)?,
        class_id: row.get(4)?,
    })
}

/// Substitute the identity segment of a photo path with `new_name`.
/// A path without an identity segment is returned unchanged; the row
/// update still re-syncs name and class, and the rename becomes a
/// same-path no-op.
fn renamed_photo_path(img_path: &str, new_name: &str) -> String {
    IDENTITY_SEGMENT
        .replace_all(img_path, |caps: &regex::Captures| {
            format!("/{}{}", new_name, &caps[2])
        })
        .into_owned()
}

/// A face row whose photo file is gone from disk
#[derive(Debug, Clone, PartialEq)]
pub struct MissingPhoto {
    pub hash: String,
    pub img_path: String,
}

/// Catalog statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub faces: usize,
    pub classes: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Catalog Statistics:")?;
        writeln!(f, "  Faces: {}", self.faces)?;
        writeln!(f, "  Classes: {}", self.classes)
    }
}
