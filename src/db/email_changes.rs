// src/db/email_changes.rs
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::ServerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailChangeRow {
    pub id: i64,
    pub user_id: i64,
    pub current_email: String,
    pub new_email: String,
    pub verification_code: String,
    pub expires_at: i64,
    pub is_verified: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

const ROW_COLUMNS: &str = "id, user_id, current_email, new_email, verification_code,
     expires_at, is_verified, created_at, updated_at";

fn map_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<EmailChangeRow> {
    Ok(EmailChangeRow {
        id: r.get(0)?,
        user_id: r.get(1)?,
        current_email: r.get(2)?,
        new_email: r.get(3)?,
        verification_code: r.get(4)?,
        expires_at: r.get(5)?,
        is_verified: r.get(6)?,
        created_at: r.get(7)?,
        updated_at: r.get(8)?,
    })
}

/// Insert or replace the single request row for `user_id`.
/// A newer request supersedes any prior one, verified or not.
pub fn upsert_request(
    conn: &Connection,
    user_id: i64,
    current_email: &str,
    new_email: &str,
    code: &str,
    now: i64,
    expires_at: i64,
) -> Result<(), ServerError> {
    conn.execute(
        r#"
        insert into email_change_requests
            (user_id, current_email, new_email, verification_code, expires_at, is_verified, created_at, updated_at)
        values (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)
        on conflict(user_id) do update set
            current_email     = excluded.current_email,
            new_email         = excluded.new_email,
            verification_code = excluded.verification_code,
            expires_at        = excluded.expires_at,
            is_verified       = 0,
            created_at        = excluded.created_at,
            updated_at        = excluded.updated_at
        "#,
        params![user_id, current_email, new_email, code, expires_at, now],
    )
    .map_err(|e| ServerError::DbError(format!("upsert email change request failed: {e}")))?;
    Ok(())
}

pub fn find_request_for_user(
    conn: &Connection,
    user_id: i64,
) -> Result<Option<EmailChangeRow>, ServerError> {
    conn.query_row(
        &format!("select {ROW_COLUMNS} from email_change_requests where user_id = ?"),
        params![user_id],
        map_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select email change request failed: {e}")))
}

/// Find the actionable request matching every condition at once:
/// same user, exact code, not yet verified, not yet expired.
pub fn find_actionable_request(
    conn: &Connection,
    user_id: i64,
    code: &str,
    now: i64,
) -> Result<Option<EmailChangeRow>, ServerError> {
    conn.query_row(
        &format!(
            "select {ROW_COLUMNS} from email_change_requests
             where user_id = ? and verification_code = ? and is_verified = 0 and expires_at > ?"
        ),
        params![user_id, code, now],
        map_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select actionable email change failed: {e}")))
}

/// Undo an upsert whose code never reached the user. Puts `previous` back,
/// or removes the row when there was none. Only touches the row while it
/// still carries `code`, so a newer request is left alone.
pub fn revert_request(
    conn: &Connection,
    user_id: i64,
    code: &str,
    previous: Option<&EmailChangeRow>,
) -> Result<usize, ServerError> {
    let result = match previous {
        Some(prev) => conn.execute(
            r#"
            update email_change_requests set
                current_email     = ?,
                new_email         = ?,
                verification_code = ?,
                expires_at        = ?,
                is_verified       = ?,
                created_at        = ?,
                updated_at        = ?
            where user_id = ? and verification_code = ?
            "#,
            params![
                prev.current_email,
                prev.new_email,
                prev.verification_code,
                prev.expires_at,
                prev.is_verified,
                prev.created_at,
                prev.updated_at,
                user_id,
                code
            ],
        ),
        None => conn.execute(
            "delete from email_change_requests where user_id = ? and verification_code = ?",
            params![user_id, code],
        ),
    };
    result.map_err(|e| ServerError::DbError(format!("revert email change request failed: {e}")))
}

/// Flip `is_verified` (guarded so only one caller wins). Returns rows updated.
pub fn mark_verified(conn: &Connection, request_id: i64, now: i64) -> Result<usize, ServerError> {
    conn.execute(
        "update email_change_requests set is_verified = 1, updated_at = ?
         where id = ? and is_verified = 0",
        params![now, request_id],
    )
    .map_err(|e| ServerError::DbError(format!("mark email change verified failed: {e}")))
}
