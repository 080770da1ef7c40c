// src/db/audit.rs
use rusqlite::{params, Connection};
use serde::Serialize;
use serde_json::Value;

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: i64,
    pub actor_id: Option<i64>,
    pub action: String,
    pub target_type: String,
    pub target_id: Option<String>,
    pub details: Value,
    pub created_at: i64,
}

/// Append one audit row. `actor_id` is `None` for system-originated events.
pub fn record(
    conn: &Connection,
    actor_id: Option<i64>,
    action: &str,
    target_type: &str,
    target_id: Option<&str>,
    details: &Value,
    now: i64,
) -> Result<i64, ServerError> {
    conn.execute(
        "insert into audit_log (actor_id, action, target_type, target_id, details, created_at)
         values (?, ?, ?, ?, ?, ?)",
        params![actor_id, action, target_type, target_id, details.to_string(), now],
    )
    .map_err(|e| ServerError::DbError(format!("insert audit log failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}

pub fn list_recent(conn: &Connection, limit: u32) -> Result<Vec<AuditEntry>, ServerError> {
    let mut stmt = conn.prepare(
        "select id, actor_id, action, target_type, target_id, details, created_at
         from audit_log order by id desc limit ?",
    )?;
    let entries = stmt
        .query_map(params![limit], |r| {
            let raw: String = r.get(5)?;
            Ok(AuditEntry {
                id: r.get(0)?,
                actor_id: r.get(1)?,
                action: r.get(2)?,
                target_type: r.get(3)?,
                target_id: r.get(4)?,
                details: serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
                created_at: r.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}
