// src/handlers/email_change.rs
use astra::Request;
use serde::Deserialize;
use serde_json::json;

use crate::auth::email_change::EmailChangeError;
use crate::errors::ServerError;
use crate::handlers::{bearer, now_unix, read_json, session_for};
use crate::responses::{json_ok, ResultResp};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RequestCodeBody {
    new_email: String,
    password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VerifyCodeBody {
    verification_code: String,
}

fn parse_body<T: serde::de::DeserializeOwned>(req: &mut Request) -> Result<T, ServerError> {
    read_json(req).map_err(|_| EmailChangeError::Validation("Invalid request body".into()).into())
}

/// POST /api/email-change/request
pub fn request_code(mut req: Request, state: &AppState) -> ResultResp {
    let now = now_unix();
    let body: RequestCodeBody = parse_body(&mut req)?;
    let token = bearer(&req);

    let issued = state.db.with_conn(|conn| {
        let session = session_for(conn, token.as_deref(), now)?;
        Ok(state.email_change.request_change(
            conn,
            session.as_ref(),
            &body.new_email,
            &body.password,
            now,
        )?)
    })?;

    json_ok(&json!({
        "success": true,
        "message": format!(
            "A verification code was sent to your current email address. It expires in {} minutes.",
            state.email_change.ttl_secs() / 60
        ),
        "expiresAt": issued.expires_at,
    }))
}

/// POST /api/email-change/verify
pub fn verify_code(mut req: Request, state: &AppState) -> ResultResp {
    let now = now_unix();
    let body: VerifyCodeBody = parse_body(&mut req)?;
    let token = bearer(&req);

    let change = state.db.with_conn(|conn| {
        let session = session_for(conn, token.as_deref(), now)?;
        Ok(state
            .email_change
            .confirm_change(conn, session.as_ref(), &body.verification_code, now)?)
    })?;

    json_ok(&json!({
        "success": true,
        "message": "Your email address has been updated.",
        "newEmail": change.new_email,
        "sessionToken": change.session_token,
    }))
}
