use std::sync::Arc;

use serde_json::json;

use super::{body_json, post_json, send};
use crate::tests::utils::{now_unix, seed_user_with_session, test_state, RecordingMailer};

#[test]
fn login_issues_a_working_session_and_logout_revokes_it() {
    let state = test_state(Arc::new(RecordingMailer::default()));
    state
        .db
        .with_conn(|conn| {
            seed_user_with_session(conn, "owner@example.com", "hunter22", now_unix());
            Ok(())
        })
        .unwrap();

    let resp = send(
        post_json(
            "/api/auth/login",
            None,
            json!({ "email": "Owner@Example.com", "password": "hunter22" }),
        ),
        &state,
    );
    assert_eq!(resp.status(), 200);
    let body = body_json(resp);
    assert_eq!(body["email"], "owner@example.com");
    let token = body["sessionToken"].as_str().unwrap().to_string();

    let resp = send(post_json("/api/auth/logout", Some(&token), json!({})), &state);
    assert_eq!(resp.status(), 200);

    // Second logout finds no live session.
    let resp = send(post_json("/api/auth/logout", Some(&token), json!({})), &state);
    assert_eq!(resp.status(), 401);
}

#[test]
fn bad_credentials_share_one_message() {
    let state = test_state(Arc::new(RecordingMailer::default()));
    state
        .db
        .with_conn(|conn| {
            seed_user_with_session(conn, "owner@example.com", "hunter22", now_unix());
            Ok(())
        })
        .unwrap();

    for (email, password) in [("owner@example.com", "wrong-pass"), ("nobody@example.com", "hunter22")] {
        let resp = send(
            post_json("/api/auth/login", None, json!({ "email": email, "password": password })),
            &state,
        );
        assert_eq!(resp.status(), 401);
        assert_eq!(body_json(resp)["error"], "Invalid email or password");
    }
}
