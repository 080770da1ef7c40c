// src/handlers/properties.rs
use astra::Request;
use serde_json::json;
use tracing::debug;

use crate::db::properties::search_properties;
use crate::domain::draft::FilterSession;
use crate::domain::filters::{FilterField, FilterKey, FilterSpec};
use crate::errors::ServerError;
use crate::handlers::{query_pairs, read_form};
use crate::responses::{html_response, json_ok, redirect, ResultResp};
use crate::state::AppState;
use crate::templates::pages::{properties_page, PropertiesVm};

const PROPERTIES_PATH: &str = "/properties";

fn render(state: &AppState, session: &FilterSession) -> ResultResp {
    let results = search_properties(&state.db, session.applied())?;
    let vm = PropertiesVm {
        applied: session.applied(),
        draft: session.is_editing().then(|| session.draft()),
        results: &results,
    };
    html_response(properties_page(&vm))
}

/// GET /properties
pub fn page(req: Request, state: &AppState) -> ResultResp {
    let pairs = query_pairs(&req);
    let editing = pairs.iter().any(|(k, v)| k == "edit" && v == "1");

    let session = FilterSession::new(FilterSpec::from_pairs(pairs));
    let session = if editing { session.open_draft() } else { session };
    render(state, &session)
}

/// GET /api/properties
pub fn search_api(req: Request, state: &AppState) -> ResultResp {
    let spec = FilterSpec::from_pairs(query_pairs(&req));
    let results = search_properties(&state.db, &spec)?;

    json_ok(&json!({
        "success": true,
        "activeFilterCount": spec.active_filter_count(),
        "filters": spec,
        "results": results,
    }))
}

/// POST /properties/filters
///
/// The form carries the applied query, every draft field and an intent.
pub fn submit_draft(mut req: Request, state: &AppState) -> ResultResp {
    let form = read_form(&mut req)?;

    let applied = form
        .iter()
        .find(|(k, _)| k == "applied")
        .map(|(_, v)| FilterSpec::from_query(v))
        .unwrap_or_default();
    let intent = form
        .iter()
        .find(|(k, _)| k == "intent")
        .map(|(_, v)| v.as_str())
        .unwrap_or("apply");

    let session = form
        .iter()
        .filter_map(|(k, v)| FilterKey::from_param(k).map(|key| FilterField::parse(key, v)))
        .fold(FilterSession::new(applied).open_draft(), |s, field| {
            s.set_draft_field(field)
        });

    debug!(intent, draft_filters = session.draft().active_filter_count(), "filter draft submitted");

    match intent {
        "apply" => {
            let mut location = String::new();
            session.apply_draft(|spec| location = spec.to_href(PROPERTIES_PATH));
            redirect(&location)
        }
        "cancel" => {
            let session = session.cancel_draft();
            redirect(&session.applied().to_href(PROPERTIES_PATH))
        }
        "reset" => render(state, &session.reset_draft()),
        other => Err(ServerError::BadRequest(format!("unknown intent: {other}"))),
    }
}
