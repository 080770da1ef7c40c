// src/db/brokerages.rs
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Brokerage {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBrokerage {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// Partial update; absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerageChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub is_active: Option<bool>,
}

const COLUMNS: &str = "id, name, phone, email, website, is_active, created_at, updated_at";

fn map_brokerage(r: &Row<'_>) -> rusqlite::Result<Brokerage> {
    Ok(Brokerage {
        id: r.get(0)?,
        name: r.get(1)?,
        phone: r.get(2)?,
        email: r.get(3)?,
        website: r.get(4)?,
        is_active: r.get(5)?,
        created_at: r.get(6)?,
        updated_at: r.get(7)?,
    })
}

pub fn list_brokerages(conn: &Connection) -> Result<Vec<Brokerage>, ServerError> {
    let mut stmt = conn.prepare(&format!("select {COLUMNS} from brokerages order by name"))?;
    let rows = stmt
        .query_map([], map_brokerage)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn find_brokerage(conn: &Connection, id: i64) -> Result<Option<Brokerage>, ServerError> {
    conn.query_row(
        &format!("select {COLUMNS} from brokerages where id = ?"),
        params![id],
        map_brokerage,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select brokerage failed: {e}")))
}

pub fn insert_brokerage(conn: &Connection, b: &NewBrokerage, now: i64) -> Result<i64, ServerError> {
    conn.execute(
        "insert into brokerages (name, phone, email, website, is_active, created_at, updated_at)
         values (?, ?, ?, ?, 1, ?, ?)",
        params![b.name.trim(), b.phone, b.email, b.website, now, now],
    )
    .map_err(|e| ServerError::DbError(format!("insert brokerage failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}

/// Returns the updated row, or `None` when no brokerage has that id.
pub fn update_brokerage(
    conn: &Connection,
    id: i64,
    changes: &BrokerageChanges,
    now: i64,
) -> Result<Option<Brokerage>, ServerError> {
    let Some(current) = find_brokerage(conn, id)? else {
        return Ok(None);
    };

    let name = changes
        .name
        .as_deref()
        .map(str::trim)
        .unwrap_or(&current.name)
        .to_string();
    let phone = changes.phone.clone().or(current.phone);
    let email = changes.email.clone().or(current.email);
    let website = changes.website.clone().or(current.website);
    let is_active = changes.is_active.unwrap_or(current.is_active);

    conn.execute(
        "update brokerages set name = ?, phone = ?, email = ?, website = ?, is_active = ?, updated_at = ?
         where id = ?",
        params![name, phone, email, website, is_active, now, id],
    )
    .map_err(|e| ServerError::DbError(format!("update brokerage failed: {e}")))?;

    find_brokerage(conn, id)
}
