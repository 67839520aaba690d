//! Query engine implementation
//!
//! Shared helper behind `search_by_field`, `distinct_search` and
//! `class_counts`: validates column names against the `FaceColumn`
//! allow-list, builds parameterized statements, and maps result rows into
//! ordered field->value mappings for uniform consumption by callers.

use crate::query::column::{FaceColumn, FieldValue};
use crate::storage::SqliteStore;
use crate::{Error, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Params, Statement, params};
use tracing::debug;

/// One result row as an ordered field->value mapping.
///
/// Pair order follows the statement's column order (schema order for
/// `SELECT` lists written in schema order), not alphabetical.
pub type FieldRow = Vec<(String, serde_json::Value)>;

/// Query engine for catalog listing and filtering operations
pub struct QueryEngine<'a> {
    store: &'a SqliteStore,
}

impl<'a> QueryEngine<'a> {
    /// Create a new query engine
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    /// Equality filter on a single allow-listed column, capped at `limit`
    /// results
    pub fn search_by_field(
        &self,
        field: &str,
        value: FieldValue,
        limit: usize,
    ) -> Result<Vec<FieldRow>> {
        let column: FaceColumn = field.parse()?;
        let sql = format!(
            "SELECT hash, name, eigen, img_path, class_id FROM face_table WHERE {} = ?1 LIMIT ?2",
            column.as_str()
        );
        debug!(%sql, field = column.as_str(), "search_by_field");

        let mut stmt = self.store.conn().prepare(&sql)?;
        collect_field_rows(&mut stmt, params![value, limit as i64])
    }

    /// Distinct combinations of the given columns, ordered by `order_field`
    pub fn distinct_search(&self, fields: &[&str], order_field: &str) -> Result<Vec<FieldRow>> {
        if fields.is_empty() {
            return Err(Error::InvalidInput("distinct search with no fields".into()));
        }
        let columns = fields
            .iter()
            .map(|f| f.parse::<FaceColumn>())
            .collect::<Result<Vec<_>>>()?;
        let order: FaceColumn = order_field.parse()?;

        let projection = columns
            .iter()
            .map(FaceColumn::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT DISTINCT {} FROM face_table ORDER BY {}",
            projection,
            order.as_str()
        );
        debug!(%sql, "distinct_search");

        let mut stmt = self.store.conn().prepare(&sql)?;
        collect_field_rows(&mut stmt, [])
    }

    /// Number of face rows per class, grouped by `class_id`
    pub fn class_counts(&self) -> Result<Vec<FieldRow>> {
        let sql = "SELECT class_id, COUNT(class_id) AS count FROM face_table GROUP BY class_id";
        debug!(%sql, "class_counts");

        let mut stmt = self.store.conn().prepare(sql)?;
        collect_field_rows(&mut stmt, [])
    }
}

/// Execute a prepared statement and map every row into a `FieldRow`,
/// preserving the statement's column order
pub(crate) fn collect_field_rows<P: Params>(
    stmt: &mut Statement<'_>,
    params: P,
) -> Result<Vec<FieldRow>> {
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut mapped = FieldRow::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            mapped.push((column.clone(), json_value(row.get_ref(idx)?)));
        }
        out.push(mapped);
    }
    Ok(out)
}

fn json_value(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(r) => serde_json::Number::from_f64(r)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(t) => serde_json::Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => {
            serde_json::Value::Array(b.iter().map(|byte| serde_json::Value::from(*byte)).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FaceRecord;

    fn seeded_store() -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.add_or_replace_person(1, "alice").unwrap();
        store.add_or_replace_person(2, "bob").unwrap();
        store
            .upsert_many(&[
                FaceRecord::new("h1", "alice", vec![0.1, 0.2], "/photos/alice_h1.jpg", 1),
                FaceRecord::new("h2", "alice", vec![0.3, 0.4], "/photos/alice_h2.jpg", 1),
                FaceRecord::new("h3", "bob", vec![0.5, 0.6], "/photos/bob_h3.jpg", 2),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_search_by_field() {
        let store = seeded_store();
        let engine = QueryEngine::new(&store);

        let rows = engine
            .search_by_field("name", FieldValue::from("alice"), 10)
            .unwrap();
        assert_eq!(rows.len(), 2);

        // Column order follows the schema
        let first = &rows[0];
        assert_eq!(first[0].0, "hash");
        assert_eq!(first[1].0, "name");
        assert_eq!(first[2].0, "eigen");
        assert_eq!(first[3].0, "img_path");
        assert_eq!(first[4].0, "class_id");
    }

    #[test]
    fn test_search_by_integer_field() {
        let store = seeded_store();
        let engine = QueryEngine::new(&store);

        let rows = engine
            .search_by_field("class_id", FieldValue::from(2i64), 10)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0].1, serde_json::Value::from("h3"));
    }

    #[test]
    fn test_search_limit_caps_results() {
        let store = seeded_store();
        let engine = QueryEngine::new(&store);

        let rows = engine
            .search_by_field("name", FieldValue::from("alice"), 1)
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_hostile_field_name_rejected() {
        let store = seeded_store();
        let engine = QueryEngine::new(&store);

        let result =
            engine.search_by_field("name=1; DROP TABLE face_table;--", FieldValue::from("x"), 1);
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        // The table must still be intact
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_distinct_search() {
        let store = seeded_store();
        let engine = QueryEngine::new(&store);

        let rows = engine
            .distinct_search(&["name", "class_id"], "class_id")
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0].1, serde_json::Value::from("alice"));
        assert_eq!(rows[1][0].1, serde_json::Value::from("bob"));
    }

    #[test]
    fn test_distinct_search_validates_every_field() {
        let store = seeded_store();
        let engine = QueryEngine::new(&store);

        assert!(matches!(
            engine.distinct_search(&["name", "1;--"], "name"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            engine.distinct_search(&["name"], "1;--"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            engine.distinct_search(&[], "name"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_class_counts() {
        let store = seeded_store();
        let engine = QueryEngine::new(&store);

        let rows = engine.class_counts().unwrap();
        assert_eq!(rows.len(), 2);

        let mut counts: Vec<(i64, i64)> = rows
            .iter()
            .map(|row| (row[0].1.as_i64().unwrap(), row[1].1.as_i64().unwrap()))
            .collect();
        counts.sort();
        assert_eq!(counts, vec![(1, 2), (2, 1)]);

        // Sum of per-class counts equals the total count
        let total: i64 = counts.iter().map(|(_, n)| n).sum();
        assert_eq!(total as usize, store.count().unwrap());
    }
}
