// src/handlers/auth.rs
use astra::Request;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::auth::email_change::normalize_email;
use crate::auth::password::verify_password;
use crate::auth::sessions::{create_session, revoke_session};
use crate::db::users::{find_user_by_email, get_password_hash, touch_last_login};
use crate::errors::ServerError;
use crate::handlers::{bearer, now_unix, read_json, session_for};
use crate::responses::{json_ok, ResultResp};
use crate::state::AppState;

const BAD_LOGIN: &str = "Invalid email or password";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginBody {
    email: String,
    password: String,
}

/// POST /api/auth/login
pub fn login(mut req: Request, state: &AppState) -> ResultResp {
    let now = now_unix();
    let body: LoginBody = read_json(&mut req)?;
    let email = normalize_email(&body.email);
    if email.is_empty() || body.password.is_empty() {
        return Err(ServerError::BadRequest("Email and password are required".into()));
    }

    let (user_id, token) = state.db.with_conn(|conn| {
        let user = find_user_by_email(conn, &email)?
            .ok_or_else(|| ServerError::Unauthorized(BAD_LOGIN.into()))?;
        let hash = get_password_hash(conn, user.id)?
            .ok_or_else(|| ServerError::Unauthorized(BAD_LOGIN.into()))?;
        if !verify_password(&body.password, &hash) {
            return Err(ServerError::Unauthorized(BAD_LOGIN.into()));
        }
        touch_last_login(conn, user.id, now)?;
        Ok((user.id, create_session(conn, user.id, now)?))
    })?;

    info!(user_id, "user logged in");
    json_ok(&json!({
        "success": true,
        "sessionToken": token,
        "email": email,
    }))
}

/// POST /api/auth/logout
pub fn logout(req: Request, state: &AppState) -> ResultResp {
    let now = now_unix();
    let token = bearer(&req);

    state.db.with_conn(|conn| {
        let session = session_for(conn, token.as_deref(), now)?
            .ok_or_else(|| ServerError::Unauthorized("Authentication required".into()))?;
        revoke_session(conn, session.session_id, now)
    })?;

    json_ok(&json!({ "success": true }))
}
