// src/db/settings.rs
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::errors::ServerError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: i64,
    pub updated_by: Option<i64>,
}

pub fn list_settings(conn: &Connection) -> Result<Vec<Setting>, ServerError> {
    let mut stmt =
        conn.prepare("select key, value, updated_at, updated_by from system_settings order by key")?;
    let rows = stmt
        .query_map([], |r| {
            Ok(Setting {
                key: r.get(0)?,
                value: r.get(1)?,
                updated_at: r.get(2)?,
                updated_by: r.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn upsert_setting(
    conn: &Connection,
    key: &str,
    value: &str,
    actor_id: i64,
    now: i64,
) -> Result<(), ServerError> {
    conn.execute(
        "insert into system_settings (key, value, updated_at, updated_by) values (?1, ?2, ?3, ?4)
         on conflict(key) do update set value = excluded.value,
             updated_at = excluded.updated_at, updated_by = excluded.updated_by",
        params![key, value, now, actor_id],
    )
    .map_err(|e| ServerError::DbError(format!("upsert setting failed: {e}")))?;
    Ok(())
}
