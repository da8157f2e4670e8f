//! SQLite schema definitions.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{BackendError, StorageError, StorageResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        create_schema_v1(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
        tracing::info!(version = SCHEMA_VERSION, "Created node/property schema");
    } else if current_version > SCHEMA_VERSION {
        return Err(StorageError::Backend(BackendError::SchemaError {
            message: format!(
                "database schema version {} is newer than supported version {}",
                current_version, SCHEMA_VERSION
            ),
        }));
    }

    Ok(())
}

fn schema_error(what: &str, e: rusqlite::Error) -> StorageError {
    StorageError::Backend(BackendError::SchemaError {
        message: format!("{}: {}", what, e),
    })
}

/// Get the current schema version.
fn get_schema_version(conn: &Connection) -> StorageResult<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| schema_error("Failed to create schema_version table", e))?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|e| schema_error("Failed to read schema_version", e))?;

    Ok(version.unwrap_or(0))
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> StorageResult<()> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| schema_error("Failed to clear schema_version", e))?;

    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )
    .map_err(|e| schema_error("Failed to set schema_version", e))?;

    Ok(())
}

/// Create the initial schema (version 1).
fn create_schema_v1(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "BEGIN;

        CREATE TABLE IF NOT EXISTS types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS nodes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            type_id INTEGER NOT NULL REFERENCES types(id),
            name TEXT NOT NULL,
            external_id TEXT,
            create_time_since_epoch INTEGER NOT NULL,
            last_update_time_since_epoch INTEGER NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_nodes_type_name
            ON nodes(type_id, name);

        CREATE UNIQUE INDEX IF NOT EXISTS idx_nodes_type_external_id
            ON nodes(type_id, external_id) WHERE external_id IS NOT NULL;

        CREATE INDEX IF NOT EXISTS idx_nodes_type_create_time
            ON nodes(type_id, create_time_since_epoch, id);

        CREATE INDEX IF NOT EXISTS idx_nodes_type_update_time
            ON nodes(type_id, last_update_time_since_epoch, id);

        CREATE TABLE IF NOT EXISTS node_properties (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            node_id INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            is_custom INTEGER NOT NULL,
            value_kind TEXT NOT NULL,
            string_value TEXT,
            int_value INTEGER,
            double_value REAL,
            bool_value INTEGER,
            byte_value BLOB,
            struct_value TEXT
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_node_properties_key
            ON node_properties(node_id, name, is_custom);

        CREATE INDEX IF NOT EXISTS idx_node_properties_name_string
            ON node_properties(name, is_custom, string_value);

        CREATE INDEX IF NOT EXISTS idx_node_properties_name_int
            ON node_properties(name, is_custom, int_value);

        COMMIT;",
    )
    .map_err(|e| schema_error("Failed to create node/property tables", e))
}
