// src/handlers/mod.rs

//! Request handlers, grouped by surface. The router picks one per route.

pub mod admin;
pub mod auth;
pub mod email_change;
pub mod properties;

use std::io::Read;

use astra::Request;
use serde::de::DeserializeOwned;
use url::form_urlencoded;

use crate::auth::sessions::{bearer_token, load_user_from_session, SessionUser};
use crate::errors::ServerError;

pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

fn read_body(req: &mut Request) -> Result<String, ServerError> {
    let mut body = String::new();
    req.body_mut()
        .reader()
        .read_to_string(&mut body)
        .map_err(|e| ServerError::BadRequest(format!("unreadable request body: {e}")))?;
    Ok(body)
}

pub fn read_json<T: DeserializeOwned>(req: &mut Request) -> Result<T, ServerError> {
    let body = read_body(req)?;
    serde_json::from_str(&body).map_err(|e| ServerError::BadRequest(format!("invalid JSON body: {e}")))
}

pub fn read_form(req: &mut Request) -> Result<Vec<(String, String)>, ServerError> {
    let body = read_body(req)?;
    Ok(form_urlencoded::parse(body.as_bytes()).into_owned().collect())
}

pub fn query_pairs(req: &Request) -> Vec<(String, String)> {
    req.uri()
        .query()
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

pub fn bearer(req: &Request) -> Option<String> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());
    bearer_token(header).map(str::to_string)
}

/// Resolve the bearer token to a live session, if there is one.
pub fn session_for(
    conn: &rusqlite::Connection,
    token: Option<&str>,
    now: i64,
) -> Result<Option<SessionUser>, ServerError> {
    match token {
        Some(raw) => load_user_from_session(conn, raw, now),
        None => Ok(None),
    }
}
