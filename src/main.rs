use crate::auth::email_change::normalize_email;
use crate::auth::password::hash_password;
use crate::config::{AdminBootstrap, AppConfig};
use crate::db::connection::{init_db, Database};
use crate::db::users::{find_user_by_email, insert_user, set_role, Role};
use crate::errors::ServerError;
use crate::events::spawn_audit_listener;
use crate::mailer::{BrevoMailer, CodeMailer, LogMailer};
use crate::responses::error_to_response;
use crate::router::handle;
use crate::state::AppState;
use astra::Server;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

mod auth;
mod config;
mod db;
mod debounce;
mod domain;
mod errors;
mod events;
mod handlers;
mod mailer;
mod responses;
mod router;
mod state;
mod templates;

#[cfg(test)]
mod tests;

const DEFAULT_LOG_FILTER: &str = "info,investor_portal=debug";

/// Create the configured admin account, or promote it if it already exists.
fn bootstrap_admin(db: &Database, admin: &AdminBootstrap) -> Result<(), ServerError> {
    let email = normalize_email(&admin.email);
    let now = handlers::now_unix();
    db.with_conn(|conn| {
        match find_user_by_email(conn, &email)? {
            Some(user) if user.role == Role::Admin => {}
            Some(user) => {
                set_role(conn, user.id, Role::Admin, now)?;
                info!(user_id = user.id, "promoted bootstrap account to admin");
            }
            None => {
                let id = insert_user(conn, &email, &hash_password(&admin.password)?, Role::Admin, now)?;
                info!(user_id = id, "created bootstrap admin");
            }
        }
        Ok(())
    })
}

fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let db = Database::new(config.database_path.clone());
    if let Err(e) = init_db(&db, &config.schema_path) {
        error!(error = %e, "database initialization failed");
        std::process::exit(1);
    }

    if let Some(admin) = &config.admin {
        if let Err(e) = bootstrap_admin(&db, admin) {
            error!(error = %e, "admin bootstrap failed");
            std::process::exit(1);
        }
    }

    let mailer: Arc<dyn CodeMailer> = match &config.mail {
        Some(mail) => Arc::new(BrevoMailer::new(
            mail.api_key.clone(),
            mail.sender_email.clone(),
            mail.sender_name.clone(),
        )),
        None => {
            warn!("BREVO_API_KEY not set; verification codes will only be logged");
            Arc::new(LogMailer)
        }
    };

    let addr = config.bind_addr;
    let max_workers = config.max_workers;
    let state = AppState::new(db.clone(), config, mailer);
    let _audit = spawn_audit_listener(db, state.events.subscribe());

    info!(%addr, max_workers, "starting server");

    let server = Server::bind(&addr).max_workers(max_workers);
    let result = server.serve(move |req: astra::Request, _info| {
        let path = req.uri().path().to_owned();
        match handle(req, &state) {
            Ok(resp) => resp,
            Err(err) => error_to_response(&path, err),
        }
    });

    if let Err(e) = result {
        error!(error = %e, "server ended with error");
    }

    info!("server shut down");
}
