// src/db/users.rs
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::errors::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Agent => "agent",
            Role::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Role::User),
            "agent" => Some(Role::Agent),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Account row without the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub email_confirmed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_login_at: Option<i64>,
}

const USER_COLUMNS: &str =
    "id, email, role, email_confirmed_at, created_at, updated_at, last_login_at";

fn map_user(r: &Row<'_>) -> rusqlite::Result<UserAccount> {
    let role: String = r.get(2)?;
    Ok(UserAccount {
        id: r.get(0)?,
        email: r.get(1)?,
        role: Role::parse(&role).unwrap_or(Role::User),
        email_confirmed_at: r.get(3)?,
        created_at: r.get(4)?,
        updated_at: r.get(5)?,
        last_login_at: r.get(6)?,
    })
}

pub fn insert_user(
    conn: &Connection,
    email: &str,
    password_hash: &str,
    role: Role,
    now: i64,
) -> Result<i64, ServerError> {
    conn.execute(
        "insert into users (email, password_hash, role, created_at, updated_at) values (?, ?, ?, ?, ?)",
        params![email, password_hash, role.as_str(), now, now],
    )
    .map_err(|e| ServerError::DbError(format!("insert user failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}

pub fn find_user_by_id(conn: &Connection, user_id: i64) -> Result<Option<UserAccount>, ServerError> {
    conn.query_row(
        &format!("select {USER_COLUMNS} from users where id = ?"),
        params![user_id],
        map_user,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select user failed: {e}")))
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserAccount>, ServerError> {
    conn.query_row(
        &format!("select {USER_COLUMNS} from users where email = ?"),
        params![email],
        map_user,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select user by email failed: {e}")))
}

pub fn email_in_use(conn: &Connection, email: &str) -> Result<bool, ServerError> {
    let count: i64 = conn
        .query_row("select count(*) from users where email = ?", params![email], |r| r.get(0))
        .map_err(|e| ServerError::DbError(format!("count users by email failed: {e}")))?;
    Ok(count > 0)
}

pub fn get_password_hash(conn: &Connection, user_id: i64) -> Result<Option<String>, ServerError> {
    conn.query_row(
        "select password_hash from users where id = ?",
        params![user_id],
        |r| r.get(0),
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select password hash failed: {e}")))
}

pub fn list_users(conn: &Connection) -> Result<Vec<UserAccount>, ServerError> {
    let mut stmt = conn.prepare(&format!("select {USER_COLUMNS} from users order by id"))?;
    let users = stmt
        .query_map([], map_user)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

pub fn is_user_admin(conn: &Connection, user_id: i64) -> Result<bool, ServerError> {
    Ok(find_user_by_id(conn, user_id)?.is_some_and(|u| u.role == Role::Admin))
}

/// Returns the number of rows touched (0 when the user does not exist).
pub fn set_role(conn: &Connection, user_id: i64, role: Role, now: i64) -> Result<usize, ServerError> {
    conn.execute(
        "update users set role = ?, updated_at = ? where id = ?",
        params![role.as_str(), now, user_id],
    )
    .map_err(|e| ServerError::DbError(format!("update role failed: {e}")))
}

/// Replace the email of record and mark it confirmed.
pub fn set_confirmed_email(
    conn: &Connection,
    user_id: i64,
    email: &str,
    now: i64,
) -> Result<usize, ServerError> {
    conn.execute(
        "update users set email = ?, email_confirmed_at = ?, updated_at = ? where id = ?",
        params![email, now, now, user_id],
    )
    .map_err(|e| ServerError::DbError(format!("update email failed: {e}")))
}

pub fn touch_last_login(conn: &Connection, user_id: i64, now: i64) -> Result<(), ServerError> {
    conn.execute(
        "update users set last_login_at = ? where id = ?",
        params![now, user_id],
    )
    .map_err(|e| ServerError::DbError(format!("update last_login_at failed: {e}")))?;
    Ok(())
}
