//! NodeStore implementation for SQLite.

use std::collections::HashMap;

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};

use crate::context::RequestContext;
use crate::core::{NodeQuery, NodeStore};
use crate::error::{BackendError, ResourceError, StorageError, StorageResult};
use crate::types::{Node, PropertyRow, PropertyValue, ValueKind};

use super::SqliteBackend;
use super::query::{NODE_COLUMNS, build_scan};

/// Upper bound on node ids bound into one `IN (...)` list.
const PROPERTY_BATCH: usize = 500;

/// Generic entity label used in store errors; repositories substitute
/// their kind name.
const NODE_ENTITY: &str = "node";

#[async_trait]
impl NodeStore for SqliteBackend {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn ensure_type(&self, ctx: &RequestContext, type_name: &str) -> StorageResult<i64> {
        if let Some(id) = self.type_cache.read().get(type_name) {
            return Ok(*id);
        }

        let name = type_name.to_string();
        let id = self
            .run(ctx, "ensure_type", move |conn, _| {
                conn.execute("INSERT OR IGNORE INTO types (name) VALUES (?1)", [&name])?;
                let id: i64 =
                    conn.query_row("SELECT id FROM types WHERE name = ?1", [&name], |row| {
                        row.get(0)
                    })?;
                Ok(id)
            })
            .await?;

        self.type_cache.write().insert(type_name.to_string(), id);
        tracing::debug!(type_name, type_id = id, "Resolved entity type");
        Ok(id)
    }

    async fn save_node(
        &self,
        ctx: &RequestContext,
        node: Node,
        properties: Vec<PropertyRow>,
    ) -> StorageResult<i64> {
        let is_insert = node.id.is_none();
        let type_id = node.type_id;
        let property_count = properties.len();

        let id = self
            .run(ctx, "save_node", move |conn, ctx| {
                let tx = conn.transaction()?;
                let id = write_node(&tx, &node).map_err(|e| map_write_error(e, &node))?;
                ctx.check()?;
                replace_properties(&tx, id, &properties, ctx)
                    .map_err(|e| map_write_error(e, &node))?;
                ctx.check()?;
                tx.commit()?;
                Ok(id)
            })
            .await?;

        tracing::debug!(
            id,
            type_id,
            is_insert,
            properties = property_count,
            "Saved node"
        );
        Ok(id)
    }

    async fn node_by_id(
        &self,
        ctx: &RequestContext,
        type_id: i64,
        id: i64,
    ) -> StorageResult<Option<Node>> {
        self.run(ctx, "node_by_id", move |conn, _| {
            let sql = format!(
                "SELECT {} FROM nodes n WHERE n.type_id = ?1 AND n.id = ?2",
                NODE_COLUMNS
            );
            Ok(conn
                .query_row(&sql, params![type_id, id], node_from_row)
                .optional()?)
        })
        .await
    }

    async fn node_by_name(
        &self,
        ctx: &RequestContext,
        type_id: i64,
        name: &str,
    ) -> StorageResult<Option<Node>> {
        let name = name.to_string();
        self.run(ctx, "node_by_name", move |conn, _| {
            let sql = format!(
                "SELECT {} FROM nodes n WHERE n.type_id = ?1 AND n.name = ?2",
                NODE_COLUMNS
            );
            Ok(conn
                .query_row(&sql, params![type_id, name], node_from_row)
                .optional()?)
        })
        .await
    }

    async fn scan_nodes(&self, ctx: &RequestContext, query: &NodeQuery) -> StorageResult<Vec<Node>> {
        let fragment = build_scan(query);
        tracing::debug!(sql = %fragment.sql, params = fragment.params.len(), "Scanning nodes");

        self.run(ctx, "scan_nodes", move |conn, _| {
            let mut stmt = conn.prepare(&fragment.sql)?;
            let rows = stmt.query_map(fragment.bind().as_slice(), node_from_row)?;
            let mut nodes = Vec::new();
            for row in rows {
                nodes.push(row?);
            }
            Ok(nodes)
        })
        .await
    }

    async fn properties_for(
        &self,
        ctx: &RequestContext,
        node_ids: &[i64],
    ) -> StorageResult<HashMap<i64, Vec<PropertyRow>>> {
        if node_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let node_ids = node_ids.to_vec();

        self.run(ctx, "properties_for", move |conn, ctx| {
            let mut out: HashMap<i64, Vec<PropertyRow>> = HashMap::new();
            for chunk in node_ids.chunks(PROPERTY_BATCH) {
                ctx.check()?;
                load_properties(conn, chunk, &mut out)?;
            }
            Ok(out)
        })
        .await
    }
}

fn node_from_row(row: &Row<'_>) -> rusqlite::Result<Node> {
    Ok(Node {
        id: Some(row.get(0)?),
        type_id: row.get(1)?,
        name: row.get(2)?,
        external_id: row.get(3)?,
        create_time_since_epoch: row.get(4)?,
        last_update_time_since_epoch: row.get(5)?,
    })
}

/// Inserts or updates the node row and returns its id.
fn write_node(tx: &Transaction<'_>, node: &Node) -> StorageResult<i64> {
    match node.id {
        None => {
            tx.execute(
                "INSERT INTO nodes (type_id, name, external_id, create_time_since_epoch, \
                 last_update_time_since_epoch) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    node.type_id,
                    node.name,
                    node.external_id,
                    node.create_time_since_epoch,
                    node.last_update_time_since_epoch,
                ],
            )?;
            Ok(tx.last_insert_rowid())
        }
        Some(id) => {
            let previous: Option<i64> = tx
                .query_row(
                    "SELECT last_update_time_since_epoch FROM nodes WHERE id = ?1 AND type_id = ?2",
                    params![id, node.type_id],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(previous) = previous else {
                return Err(ResourceError::NotFound {
                    entity: NODE_ENTITY.to_string(),
                    key: format!("id {}", id),
                }
                .into());
            };

            // Never move last_update backwards, even if the caller's clock did.
            let last_update = node.last_update_time_since_epoch.max(previous);
            tx.execute(
                "UPDATE nodes SET name = ?1, external_id = ?2, last_update_time_since_epoch = ?3 \
                 WHERE id = ?4",
                params![node.name, node.external_id, last_update, id],
            )?;
            tx.execute("DELETE FROM node_properties WHERE node_id = ?1", [id])?;
            Ok(id)
        }
    }
}

fn replace_properties(
    tx: &Transaction<'_>,
    node_id: i64,
    properties: &[PropertyRow],
    ctx: &RequestContext,
) -> StorageResult<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO node_properties (node_id, name, is_custom, value_kind, string_value, \
         int_value, double_value, bool_value, byte_value, struct_value) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;

    for property in properties {
        ctx.check()?;
        let mut string_value = None;
        let mut int_value = None;
        let mut double_value = None;
        let mut bool_value = None;
        let mut byte_value = None;
        let mut struct_value = None;
        match &property.value {
            PropertyValue::String(s) => string_value = Some(s.as_str()),
            PropertyValue::Int(i) => int_value = Some(*i),
            PropertyValue::Double(d) => double_value = Some(*d),
            PropertyValue::Bool(b) => bool_value = Some(*b),
            PropertyValue::Bytes(b) => byte_value = Some(b.as_slice()),
            PropertyValue::Struct(v) => struct_value = Some(serde_json::to_string(v)?),
        }

        stmt.execute(params![
            node_id,
            property.name,
            property.is_custom,
            property.value.kind().as_str(),
            string_value,
            int_value,
            double_value,
            bool_value,
            byte_value,
            struct_value,
        ])?;
    }
    Ok(())
}

/// Maps a uniqueness violation to `AlreadyExists`; other errors pass through.
fn map_write_error(err: StorageError, node: &Node) -> StorageError {
    let StorageError::Backend(BackendError::Internal {
        source: Some(source),
        ..
    }) = &err
    else {
        return err;
    };

    let Some(sqlite_err) = source.downcast_ref::<rusqlite::Error>() else {
        return err;
    };

    match sqlite_err {
        rusqlite::Error::SqliteFailure(e, Some(message))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && message.starts_with("UNIQUE") =>
        {
            let key = if message.contains("external_id") {
                format!("external id '{}'", node.external_id.as_deref().unwrap_or_default())
            } else if message.contains("node_properties") {
                "duplicate property name".to_string()
            } else {
                format!("name '{}'", node.name)
            };
            ResourceError::AlreadyExists {
                entity: NODE_ENTITY.to_string(),
                key,
            }
            .into()
        }
        _ => err,
    }
}

fn load_properties(
    conn: &Connection,
    node_ids: &[i64],
    out: &mut HashMap<i64, Vec<PropertyRow>>,
) -> StorageResult<()> {
    let placeholders = vec!["?"; node_ids.len()].join(", ");
    let sql = format!(
        "SELECT node_id, name, is_custom, value_kind, string_value, int_value, double_value, \
         bool_value, byte_value, struct_value FROM node_properties \
         WHERE node_id IN ({}) ORDER BY node_id, id",
        placeholders
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(node_ids.iter()))?;
    while let Some(row) = rows.next()? {
        let node_id: i64 = row.get(0)?;
        let name: String = row.get(1)?;
        let is_custom: bool = row.get(2)?;
        let kind: String = row.get(3)?;
        let value = decode_value(node_id, &name, &kind, row)?;
        out.entry(node_id).or_default().push(PropertyRow {
            name,
            is_custom,
            value,
        });
    }
    Ok(())
}

/// Reads the value column selected by the stored kind tag.
fn decode_value(node_id: i64, name: &str, kind: &str, row: &Row<'_>) -> StorageResult<PropertyValue> {
    let corrupt = |message: String| -> StorageError {
        BackendError::CorruptProperty {
            node_id,
            name: name.to_string(),
            message,
        }
        .into()
    };
    let missing = || corrupt(format!("{} value column is empty", kind));

    let kind: ValueKind = kind.parse().map_err(corrupt)?;
    let value = match kind {
        ValueKind::String => PropertyValue::String(row.get::<_, Option<String>>(4)?.ok_or_else(missing)?),
        ValueKind::Int => PropertyValue::Int(row.get::<_, Option<i64>>(5)?.ok_or_else(missing)?),
        ValueKind::Double => PropertyValue::Double(row.get::<_, Option<f64>>(6)?.ok_or_else(missing)?),
        ValueKind::Bool => PropertyValue::Bool(row.get::<_, Option<bool>>(7)?.ok_or_else(missing)?),
        ValueKind::Bytes => PropertyValue::Bytes(row.get::<_, Option<Vec<u8>>>(8)?.ok_or_else(missing)?),
        ValueKind::Struct => {
            let raw = row.get::<_, Option<String>>(9)?.ok_or_else(missing)?;
            PropertyValue::Struct(
                serde_json::from_str(&raw).map_err(|e| corrupt(format!("invalid struct JSON: {}", e)))?,
            )
        }
    };
    Ok(value)
}
