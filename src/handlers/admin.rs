// src/handlers/admin.rs

//! Role-gated administration API. Every write lands in the audit log inside
//! the same transaction as the change itself.

use astra::Request;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::email_change::{looks_like_email, normalize_email};
use crate::auth::password::{hash_password, MIN_PASSWORD_LEN};
use crate::auth::sessions::SessionUser;
use crate::db::audit;
use crate::db::brokerages::{insert_brokerage, list_brokerages, update_brokerage, BrokerageChanges, NewBrokerage};
use crate::db::properties::insert_property;
use crate::db::settings::{list_settings, upsert_setting};
use crate::db::users::{email_in_use, find_user_by_id, insert_user, is_user_admin, list_users, set_role, Role};
use crate::domain::property::NewProperty;
use crate::errors::ServerError;
use crate::handlers::{bearer, now_unix, query_pairs, read_json, session_for};
use crate::responses::{json_ok, json_response, ResultResp};
use crate::state::AppState;

pub const DEFAULT_AUDIT_LIMIT: u32 = 50;
pub const MAX_AUDIT_LIMIT: u32 = 500;

/// The caller's session, provided it belongs to an admin.
fn require_admin(conn: &Connection, token: Option<&str>, now: i64) -> Result<SessionUser, ServerError> {
    let session = session_for(conn, token, now)?
        .ok_or_else(|| ServerError::Unauthorized("Authentication required".into()))?;
    if !is_user_admin(conn, session.user_id)? {
        return Err(ServerError::Forbidden);
    }
    Ok(session)
}

/// Run `f` as an admin inside one transaction.
fn as_admin<T, F>(req: &Request, state: &AppState, f: F) -> Result<T, ServerError>
where
    F: FnOnce(&Connection, &SessionUser, i64) -> Result<T, ServerError>,
{
    let now = now_unix();
    let token = bearer(req);
    state.db.with_conn(|conn| {
        let admin = require_admin(conn, token.as_deref(), now)?;
        let tx = conn.transaction()?;
        let out = f(&tx, &admin, now)?;
        tx.commit()?;
        Ok(out)
    })
}

fn parse_id(raw: &str) -> Result<i64, ServerError> {
    raw.parse().map_err(|_| ServerError::NotFound)
}

// users

#[derive(Debug, Deserialize)]
struct NewUserBody {
    email: String,
    password: String,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RoleBody {
    role: String,
}

/// GET /api/admin/users
pub fn users(req: Request, state: &AppState) -> ResultResp {
    let users = as_admin(&req, state, |conn, _, _| list_users(conn))?;
    json_ok(&json!({ "success": true, "users": users }))
}

/// POST /api/admin/users
pub fn create_user(mut req: Request, state: &AppState) -> ResultResp {
    let body: NewUserBody = read_json(&mut req)?;
    let email = normalize_email(&body.email);
    if !looks_like_email(&email) {
        return Err(ServerError::BadRequest("Invalid email address".into()));
    }
    if body.password.len() < MIN_PASSWORD_LEN {
        return Err(ServerError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let role = match body.role.as_deref() {
        Some(raw) => Role::parse(raw).ok_or_else(|| ServerError::BadRequest(format!("Unknown role: {raw}")))?,
        None => Role::User,
    };

    let user = as_admin(&req, state, |conn, admin, now| {
        if email_in_use(conn, &email)? {
            return Err(ServerError::BadRequest("Email already in use".into()));
        }
        let password_hash = hash_password(&body.password)?;
        let id = insert_user(conn, &email, &password_hash, role, now)?;
        audit::record(
            conn,
            Some(admin.user_id),
            "user_created",
            "user",
            Some(&id.to_string()),
            &json!({ "email": email, "role": role.as_str() }),
            now,
        )?;
        find_user_by_id(conn, id)?.ok_or(ServerError::InternalError)
    })?;

    info!(user_id = user.id, "admin created user");
    json_response(201, &json!({ "success": true, "user": user }))
}

/// POST /api/admin/users/{id}/role
pub fn change_role(mut req: Request, state: &AppState, id: &str) -> ResultResp {
    let user_id = parse_id(id)?;
    let body: RoleBody = read_json(&mut req)?;
    let role = Role::parse(&body.role)
        .ok_or_else(|| ServerError::BadRequest(format!("Unknown role: {}", body.role)))?;

    let user = as_admin(&req, state, |conn, admin, now| {
        if admin.user_id == user_id && role != Role::Admin {
            return Err(ServerError::BadRequest("Admins cannot demote themselves".into()));
        }
        if set_role(conn, user_id, role, now)? == 0 {
            return Err(ServerError::NotFound);
        }
        audit::record(
            conn,
            Some(admin.user_id),
            "user_role_changed",
            "user",
            Some(&user_id.to_string()),
            &json!({ "role": role.as_str() }),
            now,
        )?;
        find_user_by_id(conn, user_id)?.ok_or(ServerError::NotFound)
    })?;

    json_ok(&json!({ "success": true, "user": user }))
}

// brokerages

/// GET /api/admin/brokerages
pub fn brokerages(req: Request, state: &AppState) -> ResultResp {
    let brokerages = as_admin(&req, state, |conn, _, _| list_brokerages(conn))?;
    json_ok(&json!({ "success": true, "brokerages": brokerages }))
}

/// POST /api/admin/brokerages
pub fn create_brokerage(mut req: Request, state: &AppState) -> ResultResp {
    let body: NewBrokerage = read_json(&mut req)?;
    if body.name.trim().is_empty() {
        return Err(ServerError::BadRequest("Brokerage name is required".into()));
    }

    let id = as_admin(&req, state, |conn, admin, now| {
        let id = insert_brokerage(conn, &body, now)?;
        audit::record(
            conn,
            Some(admin.user_id),
            "brokerage_created",
            "brokerage",
            Some(&id.to_string()),
            &json!({ "name": body.name.trim() }),
            now,
        )?;
        Ok(id)
    })?;

    json_response(201, &json!({ "success": true, "id": id }))
}

/// POST /api/admin/brokerages/{id}
pub fn edit_brokerage(mut req: Request, state: &AppState, id: &str) -> ResultResp {
    let brokerage_id = parse_id(id)?;
    let raw: Value = read_json(&mut req)?;
    let changes: BrokerageChanges = serde_json::from_value(raw.clone())
        .map_err(|e| ServerError::BadRequest(format!("invalid brokerage update: {e}")))?;
    if changes.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ServerError::BadRequest("Brokerage name cannot be empty".into()));
    }

    let brokerage = as_admin(&req, state, |conn, admin, now| {
        let updated = update_brokerage(conn, brokerage_id, &changes, now)?.ok_or(ServerError::NotFound)?;
        audit::record(
            conn,
            Some(admin.user_id),
            "brokerage_updated",
            "brokerage",
            Some(&brokerage_id.to_string()),
            &raw,
            now,
        )?;
        Ok(updated)
    })?;

    json_ok(&json!({ "success": true, "brokerage": brokerage }))
}

// properties

/// POST /api/admin/properties
pub fn create_property(mut req: Request, state: &AppState) -> ResultResp {
    let body: NewProperty = read_json(&mut req)?;
    body.validate().map_err(ServerError::BadRequest)?;

    let id = as_admin(&req, state, |conn, admin, now| {
        let id = insert_property(conn, &body, now)?;
        audit::record(
            conn,
            Some(admin.user_id),
            "property_created",
            "property",
            Some(&id.to_string()),
            &json!({ "title": body.title, "city": body.city, "price": body.price }),
            now,
        )?;
        Ok(id)
    })?;

    info!(property_id = id, "admin listed property");
    json_response(201, &json!({ "success": true, "id": id }))
}

// settings

#[derive(Debug, Deserialize)]
struct SettingBody {
    key: String,
    value: String,
}

/// GET /api/admin/settings
pub fn settings(req: Request, state: &AppState) -> ResultResp {
    let settings = as_admin(&req, state, |conn, _, _| list_settings(conn))?;
    json_ok(&json!({ "success": true, "settings": settings }))
}

/// POST /api/admin/settings
pub fn put_setting(mut req: Request, state: &AppState) -> ResultResp {
    let body: SettingBody = read_json(&mut req)?;
    let key = body.key.trim();
    if key.is_empty() {
        return Err(ServerError::BadRequest("Setting key is required".into()));
    }

    as_admin(&req, state, |conn, admin, now| {
        upsert_setting(conn, key, &body.value, admin.user_id, now)?;
        audit::record(
            conn,
            Some(admin.user_id),
            "setting_updated",
            "system_setting",
            Some(key),
            &json!({ "value": body.value }),
            now,
        )
    })?;

    json_ok(&json!({ "success": true }))
}

// audit log

/// GET /api/admin/audit-log?limit=N
pub fn audit_log(req: Request, state: &AppState) -> ResultResp {
    let limit = query_pairs(&req)
        .into_iter()
        .find(|(k, _)| k == "limit")
        .and_then(|(_, v)| v.parse::<u32>().ok())
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT);

    let entries = as_admin(&req, state, |conn, _, _| audit::list_recent(conn, limit))?;
    json_ok(&json!({ "success": true, "entries": entries }))
}
