use shopfloor_core::ServiceError;
use shopfloor_sql::SQLStore;

/// SQL DDL statements to initialize the registry schema.
///
/// Each table stores the full JSON document in a `data` TEXT column,
/// with indexed columns extracted for filtering and uniqueness.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS machines (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        block_no INTEGER NOT NULL,
        product_no TEXT NOT NULL UNIQUE,
        completed INTEGER NOT NULL DEFAULT 0,
        completed_at TEXT,
        create_at TEXT,
        update_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS qc_forms (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        machine_id TEXT NOT NULL,
        status TEXT NOT NULL,
        pdf_path TEXT,
        create_at TEXT
    )",
    // One active machine per block; completed machines release the block.
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_machine_active_block
        ON machines(block_no) WHERE completed = 0",
    "CREATE INDEX IF NOT EXISTS idx_machine_completed ON machines(completed)",
    "CREATE INDEX IF NOT EXISTS idx_qc_machine ON qc_forms(machine_id)",
];

pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    for stmt in SCHEMA {
        sql.exec(stmt, &[])
            .map_err(|e| ServiceError::Storage(format!("schema init failed: {}", e)))?;
    }
    Ok(())
}
