use crate::errors::ServerError;
use crate::handlers::{admin, auth, email_change, properties};
use crate::responses::{html_response, ResultResp};
use crate::state::AppState;
use crate::templates;
use astra::Request;

pub fn handle(req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str().to_owned();
    let path = req.uri().path().trim_end_matches('/').to_owned();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method.as_str(), segments.as_slice()) {
        ("GET", []) => html_response(templates::pages::home_page()),

        // Property search
        ("GET", ["properties"]) => properties::page(req, state),
        ("POST", ["properties", "filters"]) => properties::submit_draft(req, state),
        ("GET", ["api", "properties"]) => properties::search_api(req, state),

        // Session
        ("POST", ["api", "auth", "login"]) => auth::login(req, state),
        ("POST", ["api", "auth", "logout"]) => auth::logout(req, state),

        // Email change
        ("POST", ["api", "email-change", "request"]) => email_change::request_code(req, state),
        ("POST", ["api", "email-change", "verify"]) => email_change::verify_code(req, state),

        // Admin
        ("GET", ["api", "admin", "users"]) => admin::users(req, state),
        ("POST", ["api", "admin", "users"]) => admin::create_user(req, state),
        ("POST", ["api", "admin", "users", id, "role"]) => {
            let id = id.to_string();
            admin::change_role(req, state, &id)
        }
        ("GET", ["api", "admin", "brokerages"]) => admin::brokerages(req, state),
        ("POST", ["api", "admin", "brokerages"]) => admin::create_brokerage(req, state),
        ("POST", ["api", "admin", "brokerages", id]) => {
            let id = id.to_string();
            admin::edit_brokerage(req, state, &id)
        }
        ("POST", ["api", "admin", "properties"]) => admin::create_property(req, state),
        ("GET", ["api", "admin", "settings"]) => admin::settings(req, state),
        ("POST", ["api", "admin", "settings"]) => admin::put_setting(req, state),
        ("GET", ["api", "admin", "audit-log"]) => admin::audit_log(req, state),

        _ => Err(ServerError::NotFound),
    }
}
