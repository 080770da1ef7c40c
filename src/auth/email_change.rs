// src/auth/email_change.rs

//! Two-phase email change: issue a code to the current address, then swap
//! the email of record once the code comes back.

use std::sync::Arc;

use rusqlite::{Connection, TransactionBehavior};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::auth::flow::{EmailChangeState, FailureReason, FlowEvent};
use crate::auth::password::verify_password;
use crate::auth::sessions::{refresh_session, SessionUser};
use crate::auth::token::{generate_verification_code_default, is_well_formed_code};
use crate::db::email_changes::{
    find_actionable_request, find_request_for_user, mark_verified, revert_request, upsert_request,
};
use crate::db::users::{email_in_use, find_user_by_id, get_password_hash, set_confirmed_email};
use crate::errors::ServerError;
use crate::events::{IdentityChanged, IdentityEvents};
use crate::mailer::CodeMailer;

pub const DEFAULT_CODE_TTL_SECS: i64 = 600;

const EMAIL_IN_USE: &str = "This email address is already in use";

#[derive(Debug, Error)]
pub enum EmailChangeError {
    #[error("{0}")]
    Validation(String),

    #[error("Authentication required")]
    Auth,

    #[error("Current password is incorrect")]
    InvalidCredentials,

    #[error("Failed to send verification email")]
    Delivery(String),

    #[error("Invalid or expired verification code")]
    InvalidOrExpiredCode,

    #[error("Failed to process email change request")]
    Persistence(String),
}

impl EmailChangeError {
    pub fn status(&self) -> u16 {
        match self {
            EmailChangeError::Validation(_) | EmailChangeError::InvalidOrExpiredCode => 400,
            EmailChangeError::Auth | EmailChangeError::InvalidCredentials => 401,
            EmailChangeError::Delivery(_) => 502,
            EmailChangeError::Persistence(_) => 500,
        }
    }

    pub fn reason(&self) -> FailureReason {
        match self {
            EmailChangeError::Validation(_) => FailureReason::Validation,
            EmailChangeError::Auth => FailureReason::Auth,
            EmailChangeError::InvalidCredentials => FailureReason::InvalidCredentials,
            EmailChangeError::Delivery(_) => FailureReason::Delivery,
            EmailChangeError::InvalidOrExpiredCode => FailureReason::InvalidOrExpiredCode,
            EmailChangeError::Persistence(_) => FailureReason::Persistence,
        }
    }
}

impl From<ServerError> for EmailChangeError {
    fn from(e: ServerError) -> Self {
        match e {
            ServerError::EmailChange(inner) => inner,
            other => EmailChangeError::Persistence(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for EmailChangeError {
    fn from(e: rusqlite::Error) -> Self {
        EmailChangeError::Persistence(e.to_string())
    }
}

/// Lowercased, trimmed form used for storage and comparison.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Rough shape check: `local@domain.tld`, no whitespace.
pub fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    pub user_id: i64,
    pub sent_to: String,
    pub new_email: String,
    pub expires_at: i64,
    /// Where the attempt stands once the code is out.
    pub state: EmailChangeState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedChange {
    pub user_id: i64,
    pub old_email: String,
    pub new_email: String,
    /// Replaces the token the request was made with.
    pub session_token: String,
    pub state: EmailChangeState,
}

pub struct EmailChangeService {
    ttl_secs: i64,
    mailer: Arc<dyn CodeMailer>,
    events: Arc<IdentityEvents>,
}

impl EmailChangeService {
    pub fn new(ttl_secs: i64, mailer: Arc<dyn CodeMailer>, events: Arc<IdentityEvents>) -> Self {
        Self {
            ttl_secs,
            mailer,
            events,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Re-authenticate the caller, store a fresh code and mail it to the
    /// address currently on the account. Nothing usable is kept if delivery
    /// fails.
    pub fn request_change(
        &self,
        conn: &mut Connection,
        session: Option<&SessionUser>,
        new_email: &str,
        password: &str,
        now: i64,
    ) -> Result<IssuedCode, EmailChangeError> {
        let pending = EmailChangeState::Idle.step(FlowEvent::Submit);

        match self.issue_code(conn, session, new_email, password, now) {
            Ok(mut issued) => {
                issued.state = pending.step(FlowEvent::CodeDelivered);
                info!(
                    user_id = issued.user_id,
                    expires_at = issued.expires_at,
                    state = %issued.state,
                    "email change code issued"
                );
                Ok(issued)
            }
            Err(e) => {
                let failed = pending.step(FlowEvent::Fail(e.reason()));
                warn!(user_id = session.map(|s| s.user_id), state = %failed, error = %e, "email change request failed");
                Err(e)
            }
        }
    }

    fn issue_code(
        &self,
        conn: &mut Connection,
        session: Option<&SessionUser>,
        new_email: &str,
        password: &str,
        now: i64,
    ) -> Result<IssuedCode, EmailChangeError> {
        if new_email.trim().is_empty() || password.is_empty() {
            return Err(EmailChangeError::Validation(
                "New email and current password are required".into(),
            ));
        }
        let session = session.ok_or(EmailChangeError::Auth)?;

        let new_email = normalize_email(new_email);
        if !looks_like_email(&new_email) {
            return Err(EmailChangeError::Validation("Invalid email address".into()));
        }

        let user = find_user_by_id(conn, session.user_id)?.ok_or(EmailChangeError::Auth)?;
        if normalize_email(&user.email) == new_email {
            return Err(EmailChangeError::Validation(
                "This is already your email address".into(),
            ));
        }

        let stored_hash = get_password_hash(conn, user.id)?.ok_or(EmailChangeError::Auth)?;
        if !verify_password(password, &stored_hash) {
            return Err(EmailChangeError::InvalidCredentials);
        }

        if email_in_use(conn, &new_email)? {
            return Err(EmailChangeError::Validation(EMAIL_IN_USE.into()));
        }

        let code = generate_verification_code_default();
        let expires_at = now + self.ttl_secs;

        // The write lock is released before the mail goes out.
        let previous = {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let previous = find_request_for_user(&tx, user.id)?;
            upsert_request(&tx, user.id, &user.email, &new_email, &code, now, expires_at)?;
            tx.commit()?;
            previous
        };

        // Always the address already on file, never the one being claimed.
        if let Err(e) =
            self.mailer
                .send_email_change_code(&user.email, &new_email, &code, self.ttl_secs / 60)
        {
            error!(user_id = user.id, error = %e, "verification email delivery failed");
            match revert_request(conn, user.id, &code, previous.as_ref()) {
                Ok(_) => {}
                // The undelivered code was never shown to anyone.
                Err(revert) => error!(user_id = user.id, error = %revert, "could not revert unsent email change request"),
            }
            return Err(EmailChangeError::Delivery(e.to_string()));
        }

        Ok(IssuedCode {
            user_id: user.id,
            sent_to: user.email,
            new_email,
            expires_at,
            state: EmailChangeState::RequestPending,
        })
    }

    /// Consume a code and move the account to the requested address.
    /// Wrong, expired, reused and unknown codes all fail the same way.
    pub fn confirm_change(
        &self,
        conn: &mut Connection,
        session: Option<&SessionUser>,
        code: &str,
        now: i64,
    ) -> Result<ConfirmedChange, EmailChangeError> {
        let verifying = EmailChangeState::CodeIssued.step(FlowEvent::SubmitCode);

        match self.apply_code(conn, session, code, now) {
            Ok(mut change) => {
                change.state = verifying.step(FlowEvent::Confirmed);
                info!(user_id = change.user_id, state = %change.state, "email address changed");
                if change.state == EmailChangeState::Completed {
                    self.events.publish(IdentityChanged {
                        user_id: change.user_id,
                        old_email: change.old_email.clone(),
                        new_email: change.new_email.clone(),
                        at: now,
                    });
                }
                Ok(change)
            }
            Err(e) => {
                let failed = verifying.step(FlowEvent::Fail(e.reason()));
                warn!(user_id = session.map(|s| s.user_id), state = %failed, error = %e, "email change confirmation failed");
                Err(e)
            }
        }
    }

    fn apply_code(
        &self,
        conn: &mut Connection,
        session: Option<&SessionUser>,
        code: &str,
        now: i64,
    ) -> Result<ConfirmedChange, EmailChangeError> {
        let session = session.ok_or(EmailChangeError::Auth)?;
        let code = code.trim();
        if code.is_empty() {
            return Err(EmailChangeError::Validation(
                "Verification code is required".into(),
            ));
        }
        if !is_well_formed_code(code) {
            return Err(EmailChangeError::InvalidOrExpiredCode);
        }

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let request = find_actionable_request(&tx, session.user_id, code, now)?
            .ok_or(EmailChangeError::InvalidOrExpiredCode)?;

        // Another account may have claimed the address since the code was sent.
        if email_in_use(&tx, &request.new_email)? {
            return Err(EmailChangeError::Validation(EMAIL_IN_USE.into()));
        }

        let updated = set_confirmed_email(&tx, session.user_id, &request.new_email, now)?;
        if updated == 0 {
            return Err(EmailChangeError::Persistence(format!(
                "user {} vanished during email change",
                session.user_id
            )));
        }

        // The identity change above is authoritative; the flag is bookkeeping.
        match mark_verified(&tx, request.id, now) {
            Ok(1) => {}
            Ok(n) => error!(
                user_id = session.user_id,
                request_id = request.id,
                rows = n,
                "email changed but request was not marked verified"
            ),
            Err(e) => error!(
                user_id = session.user_id,
                request_id = request.id,
                error = %e,
                "email changed but marking request verified failed"
            ),
        }

        let session_token = refresh_session(&tx, session.session_id, session.user_id, now)?;
        tx.commit()?;

        Ok(ConfirmedChange {
            user_id: session.user_id,
            old_email: request.current_email,
            new_email: request.new_email,
            session_token,
            state: EmailChangeState::Verifying,
        })
    }
}
