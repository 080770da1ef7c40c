use std::sync::Arc;

use serde_json::json;

use super::{body_json, get, post_json, send};
use crate::db::users::Role;
use crate::state::AppState;
use crate::tests::utils::{now_unix, seed_session_for_role, test_state, RecordingMailer};

fn admin_state() -> (AppState, i64, String) {
    let state = test_state(Arc::new(RecordingMailer::default()));
    let (session, token) = state
        .db
        .with_conn(|conn| Ok(seed_session_for_role(conn, "root@example.com", "admin-pass", Role::Admin, now_unix())))
        .unwrap();
    (state, session.user_id, token)
}

#[test]
fn admin_routes_require_a_session() {
    let (state, _, _) = admin_state();

    let resp = send(get("/api/admin/users", None), &state);
    assert_eq!(resp.status(), 401);
    assert_eq!(body_json(resp)["success"], false);
}

#[test]
fn admin_routes_reject_plain_users() {
    let (state, _, _) = admin_state();
    let (_, token) = state
        .db
        .with_conn(|conn| Ok(seed_session_for_role(conn, "user@example.com", "user-pass", Role::User, now_unix())))
        .unwrap();

    let resp = send(get("/api/admin/settings", Some(&token)), &state);
    assert_eq!(resp.status(), 403);
}

#[test]
fn creating_a_user_is_audited() {
    let (state, admin_id, token) = admin_state();

    let resp = send(
        post_json(
            "/api/admin/users",
            Some(&token),
            json!({ "email": " New.Agent@Example.com ", "password": "long-enough-pw", "role": "agent" }),
        ),
        &state,
    );
    assert_eq!(resp.status(), 201);
    let body = body_json(resp);
    assert_eq!(body["user"]["email"], "new.agent@example.com");

    // Duplicate addresses are refused.
    let resp = send(
        post_json(
            "/api/admin/users",
            Some(&token),
            json!({ "email": "new.agent@example.com", "password": "long-enough-pw" }),
        ),
        &state,
    );
    assert_eq!(resp.status(), 400);

    let resp = send(get("/api/admin/audit-log", Some(&token)), &state);
    let entries = body_json(resp)["entries"].as_array().unwrap().clone();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "user_created");
    assert_eq!(entries[0]["actorId"], admin_id);
}

#[test]
fn role_changes_are_applied_and_self_demotion_refused() {
    let (state, admin_id, token) = admin_state();
    let (other, _) = state
        .db
        .with_conn(|conn| Ok(seed_session_for_role(conn, "user@example.com", "user-pass", Role::User, now_unix())))
        .unwrap();

    let resp = send(
        post_json(
            &format!("/api/admin/users/{}/role", other.user_id),
            Some(&token),
            json!({ "role": "agent" }),
        ),
        &state,
    );
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(resp)["user"]["role"], "agent");

    let resp = send(
        post_json(
            &format!("/api/admin/users/{admin_id}/role"),
            Some(&token),
            json!({ "role": "user" }),
        ),
        &state,
    );
    assert_eq!(resp.status(), 400);

    let resp = send(
        post_json("/api/admin/users/9999/role", Some(&token), json!({ "role": "agent" })),
        &state,
    );
    assert_eq!(resp.status(), 404);
}

#[test]
fn brokerage_create_and_edit() {
    let (state, _, token) = admin_state();

    let resp = send(
        post_json(
            "/api/admin/brokerages",
            Some(&token),
            json!({ "name": "Harbour Realty", "email": "desk@harbour.example" }),
        ),
        &state,
    );
    assert_eq!(resp.status(), 201);
    let id = body_json(resp)["id"].as_i64().unwrap();

    let resp = send(
        post_json(
            &format!("/api/admin/brokerages/{id}"),
            Some(&token),
            json!({ "name": "Harbour Realty Group" }),
        ),
        &state,
    );
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(resp)["brokerage"]["name"], "Harbour Realty Group");

    let resp = send(
        post_json("/api/admin/brokerages", Some(&token), json!({ "name": "   " })),
        &state,
    );
    assert_eq!(resp.status(), 400);

    let resp = send(get("/api/admin/audit-log?limit=10", Some(&token)), &state);
    let actions: Vec<String> = body_json(resp)["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap().to_string())
        .collect();
    assert!(actions.contains(&"brokerage_created".to_string()));
    assert!(actions.contains(&"brokerage_updated".to_string()));
}

#[test]
fn settings_upsert_and_list() {
    let (state, _, token) = admin_state();

    for value in ["on", "off"] {
        let resp = send(
            post_json(
                "/api/admin/settings",
                Some(&token),
                json!({ "key": "maintenance_mode", "value": value }),
            ),
            &state,
        );
        assert_eq!(resp.status(), 200);
    }

    let resp = send(get("/api/admin/settings", Some(&token)), &state);
    let settings = body_json(resp)["settings"].as_array().unwrap().clone();
    assert_eq!(settings.len(), 1);
    assert_eq!(settings[0]["key"], "maintenance_mode");
    assert_eq!(settings[0]["value"], "off");
}

fn listing_body(title: &str, vacancy: &str) -> serde_json::Value {
    json!({
        "title": title,
        "addressLine": "1 Water St",
        "city": "Halifax",
        "province": "NS",
        "price": 420000.0,
        "units": 4,
        "grossMonthlyRent": 5200.0,
        "monthlyExpenses": 1500.0,
        "incomeType": "Actual",
        "tenancyType": "On Leases",
        "rentCategory": "Market Value",
        "vacancyStatus": vacancy
    })
}

#[test]
fn listed_property_shows_up_in_search() {
    let (state, _, token) = admin_state();

    let resp = send(
        post_json("/api/admin/properties", Some(&token), listing_body("Harbour Flats", "Occupied")),
        &state,
    );
    assert_eq!(resp.status(), 201);
    let id = body_json(resp)["id"].as_i64().unwrap();

    let resp = send(get("/api/properties?city=halifax", None), &state);
    let results = body_json(resp)["results"].as_array().unwrap().clone();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["property"]["id"], id);
    assert_eq!(results[0]["property"]["title"], "Harbour Flats");

    let resp = send(get("/api/admin/audit-log", Some(&token)), &state);
    let entries = body_json(resp)["entries"].as_array().unwrap().clone();
    assert_eq!(entries[0]["action"], "property_created");
    assert_eq!(entries[0]["targetId"], id.to_string());
}

#[test]
fn property_listing_is_validated_and_admin_only() {
    let (state, _, token) = admin_state();

    let resp = send(
        post_json("/api/admin/properties", Some(&token), listing_body("Anything", "All")),
        &state,
    );
    assert_eq!(resp.status(), 400);

    let (_, user_token) = state
        .db
        .with_conn(|conn| Ok(seed_session_for_role(conn, "user@example.com", "user-pass", Role::User, now_unix())))
        .unwrap();
    let resp = send(
        post_json("/api/admin/properties", Some(&user_token), listing_body("Sneaky", "Occupied")),
        &state,
    );
    assert_eq!(resp.status(), 403);

    let resp = send(get("/api/properties", None), &state);
    assert_eq!(body_json(resp)["results"].as_array().unwrap().len(), 0);
}

#[test]
fn demoted_admin_loses_access_on_the_same_session() {
    let (state, _, token) = admin_state();
    let (second, second_token) = state
        .db
        .with_conn(|conn| Ok(seed_session_for_role(conn, "second@example.com", "admin-pass", Role::Admin, now_unix())))
        .unwrap();

    let resp = send(get("/api/admin/users", Some(&second_token)), &state);
    assert_eq!(resp.status(), 200);

    let resp = send(
        post_json(
            &format!("/api/admin/users/{}/role", second.user_id),
            Some(&token),
            json!({ "role": "user" }),
        ),
        &state,
    );
    assert_eq!(resp.status(), 200);

    let resp = send(get("/api/admin/users", Some(&second_token)), &state);
    assert_eq!(resp.status(), 403);
}

