use std::sync::Arc;

use rusqlite::params;
use serde_json::json;

use super::{body_json, post_json, send};
use crate::db::email_changes::find_request_for_user;
use crate::db::users::find_user_by_email;
use crate::errors::ServerError;
use crate::tests::utils::{now_unix, seed_user_with_session, test_state, FailingMailer, RecordingMailer};

const PASSWORD: &str = "correct-horse";

#[test]
fn request_then_verify_changes_email_and_rotates_session() {
    let mailer = Arc::new(RecordingMailer::default());
    let state = test_state(mailer.clone());
    let events = state.events.subscribe();
    let (_, token) = state
        .db
        .with_conn(|conn| Ok(seed_user_with_session(conn, "owner@example.com", PASSWORD, now_unix())))
        .unwrap();

    let resp = send(
        post_json(
            "/api/email-change/request",
            Some(&token),
            json!({ "newEmail": "a@b.com", "password": PASSWORD }),
        ),
        &state,
    );
    assert_eq!(resp.status(), 200);
    let body = body_json(resp);
    assert_eq!(body["success"], true);
    assert!(body["message"].as_str().unwrap().contains("10 minutes"));

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "owner@example.com");

    let resp = send(
        post_json(
            "/api/email-change/verify",
            Some(&token),
            json!({ "verificationCode": sent[0].code }),
        ),
        &state,
    );
    assert_eq!(resp.status(), 200);
    let body = body_json(resp);
    assert_eq!(body["success"], true);
    assert_eq!(body["newEmail"], "a@b.com");
    let fresh = body["sessionToken"].as_str().unwrap().to_string();
    assert_ne!(fresh, token);

    let event = events.try_recv().unwrap();
    assert_eq!(event.old_email, "owner@example.com");
    assert_eq!(event.new_email, "a@b.com");

    // The old token died with the identity change.
    let resp = send(
        post_json("/api/email-change/verify", Some(&token), json!({ "verificationCode": sent[0].code })),
        &state,
    );
    assert_eq!(resp.status(), 401);

    // Reusing the code on the new session is rejected too.
    let resp = send(
        post_json("/api/email-change/verify", Some(&fresh), json!({ "verificationCode": sent[0].code })),
        &state,
    );
    assert_eq!(resp.status(), 400);
    assert_eq!(body_json(resp)["error"], "Invalid or expired verification code");

    state
        .db
        .with_conn(|conn| {
            assert!(find_user_by_email(conn, "a@b.com")?.is_some());
            assert!(find_user_by_email(conn, "owner@example.com")?.is_none());
            Ok(())
        })
        .unwrap();
}

#[test]
fn request_without_session_is_unauthorized() {
    let state = test_state(Arc::new(RecordingMailer::default()));

    let resp = send(
        post_json(
            "/api/email-change/request",
            None,
            json!({ "newEmail": "a@b.com", "password": PASSWORD }),
        ),
        &state,
    );
    assert_eq!(resp.status(), 401);
    let body = body_json(resp);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Authentication required");
}

#[test]
fn missing_fields_are_a_validation_error() {
    let state = test_state(Arc::new(RecordingMailer::default()));
    let (_, token) = state
        .db
        .with_conn(|conn| Ok(seed_user_with_session(conn, "owner@example.com", PASSWORD, now_unix())))
        .unwrap();

    let resp = send(
        post_json("/api/email-change/request", Some(&token), json!({ "newEmail": "a@b.com" })),
        &state,
    );
    assert_eq!(resp.status(), 400);
    assert_eq!(body_json(resp)["success"], false);
}

#[test]
fn wrong_password_is_rejected() {
    let mailer = Arc::new(RecordingMailer::default());
    let state = test_state(mailer.clone());
    let (_, token) = state
        .db
        .with_conn(|conn| Ok(seed_user_with_session(conn, "owner@example.com", PASSWORD, now_unix())))
        .unwrap();

    let resp = send(
        post_json(
            "/api/email-change/request",
            Some(&token),
            json!({ "newEmail": "a@b.com", "password": "nope-nope" }),
        ),
        &state,
    );
    assert_eq!(resp.status(), 401);
    assert_eq!(body_json(resp)["error"], "Current password is incorrect");
    assert!(mailer.sent().is_empty());
}

#[test]
fn failed_delivery_reports_failure_and_stores_nothing() {
    let state = test_state(Arc::new(FailingMailer));
    let (session, token) = state
        .db
        .with_conn(|conn| Ok(seed_user_with_session(conn, "owner@example.com", PASSWORD, now_unix())))
        .unwrap();

    let resp = send(
        post_json(
            "/api/email-change/request",
            Some(&token),
            json!({ "newEmail": "a@b.com", "password": PASSWORD }),
        ),
        &state,
    );
    assert_eq!(resp.status(), 502);
    assert_eq!(body_json(resp)["error"], "Failed to send verification email");

    let row = state
        .db
        .with_conn(|conn| find_request_for_user(conn, session.user_id))
        .unwrap();
    assert!(row.is_none());
}

#[test]
fn expired_code_is_rejected_with_the_same_message() {
    let mailer = Arc::new(RecordingMailer::default());
    let state = test_state(mailer.clone());
    let (session, token) = state
        .db
        .with_conn(|conn| Ok(seed_user_with_session(conn, "owner@example.com", PASSWORD, now_unix())))
        .unwrap();

    send(
        post_json(
            "/api/email-change/request",
            Some(&token),
            json!({ "newEmail": "a@b.com", "password": PASSWORD }),
        ),
        &state,
    );

    // Push the expiry into the past instead of waiting ten minutes.
    state
        .db
        .with_conn(|conn| {
            conn.execute(
                "update email_change_requests set expires_at = ? where user_id = ?",
                params![now_unix() - 1, session.user_id],
            )
            .map_err(|e| ServerError::DbError(e.to_string()))
        })
        .unwrap();

    let resp = send(
        post_json(
            "/api/email-change/verify",
            Some(&token),
            json!({ "verificationCode": mailer.last_code().unwrap() }),
        ),
        &state,
    );
    assert_eq!(resp.status(), 400);
    assert_eq!(body_json(resp)["error"], "Invalid or expired verification code");
}
