//! Database schema definitions

/// SQL to create the face table
pub const CREATE_FACE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS face_table (
    hash TEXT PRIMARY KEY,
    name TEXT,
    eigen TEXT,
    img_path TEXT,
    class_id INTEGER
)
"#;

/// SQL to create the class table.
/// `face_table.class_id` intentionally carries no FOREIGN KEY constraint;
/// callers own the association.
pub const CREATE_CLASS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS class_table (
    class_id INTEGER PRIMARY KEY,
    name TEXT
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_face_name ON face_table(name)",
    "CREATE INDEX IF NOT EXISTS idx_face_class_id ON face_table(class_id)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_FACE_TABLE, CREATE_CLASS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
