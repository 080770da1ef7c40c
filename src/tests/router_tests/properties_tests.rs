use std::sync::Arc;

use super::{body_json, body_string, get, location, post_form, send};
use crate::db::properties::insert_property;
use crate::state::AppState;
use crate::tests::utils::{now_unix, sample_property, test_state, RecordingMailer};

fn seeded_state() -> AppState {
    let state = test_state(Arc::new(RecordingMailer::default()));
    state
        .db
        .with_conn(|conn| {
            let now = now_unix();
            insert_property(conn, &sample_property("Harbour Flats", "Halifax", 420_000.0, 4), now)?;
            insert_property(conn, &sample_property("Quinpool Six", "Halifax", 780_000.0, 6), now)?;
            insert_property(conn, &sample_property("Main St Duplex", "Moncton", 310_000.0, 2), now)?;
            Ok(())
        })
        .unwrap();
    state
}

#[test]
fn properties_page_lists_matching_results() {
    let state = seeded_state();

    let resp = send(get("/properties?city=hali", None), &state);
    assert_eq!(resp.status(), 200);
    let html = body_string(resp);
    assert!(html.contains("Harbour Flats"));
    assert!(html.contains("Quinpool Six"));
    assert!(!html.contains("Main St Duplex"));
    assert!(html.contains("Edit filters"));
    assert!(!html.contains("/properties/filters"));
}

#[test]
fn edit_flag_opens_the_draft_editor() {
    let state = seeded_state();

    let resp = send(get("/properties?priceMax=500000&edit=1", None), &state);
    assert_eq!(resp.status(), 200);
    let html = body_string(resp);
    assert!(html.contains(r#"action="/properties/filters""#));
    assert!(html.contains(r#"name="applied" value="priceMax=500000""#));
}

#[test]
fn search_api_reports_filters_and_sorted_results() {
    let state = seeded_state();

    let resp = send(get("/api/properties?city=Halifax&sortBy=price&sortOrder=asc", None), &state);
    assert_eq!(resp.status(), 200);
    let body = body_json(resp);
    assert_eq!(body["success"], true);
    // city is shown in the search bar and never counts
    assert_eq!(body["activeFilterCount"], 2);
    assert_eq!(body["filters"]["sortBy"], "price");

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["property"]["title"], "Harbour Flats");
    assert_eq!(results[1]["property"]["title"], "Quinpool Six");
}

#[test]
fn apply_redirects_to_the_draft_query() {
    let state = seeded_state();

    let resp = send(
        post_form(
            "/properties/filters",
            &[
                ("applied", "city=Halifax"),
                ("city", "Halifax"),
                ("priceMax", "500,000"),
                ("unitsMin", "abc"),
                ("incomeType", "All"),
                ("intent", "apply"),
            ],
        ),
        &state,
    );
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/properties?priceMax=500000&city=Halifax");
}

#[test]
fn cancel_discards_the_draft() {
    let state = seeded_state();

    let resp = send(
        post_form(
            "/properties/filters",
            &[("applied", "city=Halifax"), ("priceMax", "1"), ("intent", "cancel")],
        ),
        &state,
    );
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/properties?city=Halifax");
}

#[test]
fn reset_keeps_the_applied_filters_and_clears_the_draft() {
    let state = seeded_state();

    let resp = send(
        post_form(
            "/properties/filters",
            &[("applied", "priceMax=500000"), ("priceMax", "1"), ("intent", "reset")],
        ),
        &state,
    );
    assert_eq!(resp.status(), 200);
    let html = body_string(resp);
    // Results still follow the applied filters.
    assert!(html.contains("Harbour Flats"));
    assert!(!html.contains("Quinpool Six"));
    assert!(html.contains(r#"name="applied" value="priceMax=500000""#));
    assert!(!html.contains(r#"name="priceMax" value="1""#));
}

#[test]
fn unknown_intent_is_a_bad_request() {
    let state = seeded_state();

    let resp = send(
        post_form("/properties/filters", &[("intent", "explode")]),
        &state,
    );
    assert_eq!(resp.status(), 400);
}
