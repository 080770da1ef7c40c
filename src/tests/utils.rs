// src/tests/utils.rs
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::auth::password::hash_password_with_params;
use crate::auth::sessions::{create_session, load_user_from_session, SessionUser};
use crate::config::AppConfig;
use crate::db::connection::{init_db, Database};
use crate::db::users::{insert_user, Role};
use crate::domain::filters::{IncomeType, RentCategory, TenancyType, VacancyStatus};
use crate::domain::property::NewProperty;
use crate::mailer::{CodeMailer, MailerError};
use crate::state::AppState;

const SCHEMA: &str = include_str!("../../sql/schema.sql");

pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

/// In-memory connection with the production schema applied.
pub fn memory_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    conn
}

/// Fresh file-backed DB. Each call gets its own file so tests can run in parallel.
pub fn init_test_db() -> Database {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = env::temp_dir().join(format!(
        "investor_portal_test_{}_{}_{n}.sqlite3",
        std::process::id(),
        now_unix()
    ));
    let _ = std::fs::remove_file(&path);

    let db = Database::new(path.to_string_lossy().into_owned());
    init_db(&db, "sql/schema.sql").unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    db
}

/// Cheap argon2 parameters; production uses the defaults.
pub fn test_password_hash(password: &str) -> String {
    hash_password_with_params(password, 256, 1, 1).unwrap()
}

pub fn seed_user(conn: &Connection, email: &str, password: &str, role: Role, now: i64) -> i64 {
    insert_user(conn, email, &test_password_hash(password), role, now).unwrap()
}

/// Plain user plus a live session. Returns the session and its raw token.
pub fn seed_user_with_session(
    conn: &Connection,
    email: &str,
    password: &str,
    now: i64,
) -> (SessionUser, String) {
    seed_session_for_role(conn, email, password, Role::User, now)
}

pub fn seed_session_for_role(
    conn: &Connection,
    email: &str,
    password: &str,
    role: Role,
    now: i64,
) -> (SessionUser, String) {
    let uid = seed_user(conn, email, password, role, now);
    let token = create_session(conn, uid, now).unwrap();
    let session = load_user_from_session(conn, &token, now).unwrap().unwrap();
    (session, token)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCode {
    pub to: String,
    pub new_email: String,
    pub code: String,
    pub ttl_minutes: i64,
}

/// Keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentCode>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentCode> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_code(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|m| m.code.clone())
    }
}

impl CodeMailer for RecordingMailer {
    fn send_email_change_code(
        &self,
        recipient_email: &str,
        new_email: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), MailerError> {
        self.sent.lock().unwrap().push(SentCode {
            to: recipient_email.to_string(),
            new_email: new_email.to_string(),
            code: code.to_string(),
            ttl_minutes,
        });
        Ok(())
    }
}

pub struct FailingMailer;

impl CodeMailer for FailingMailer {
    fn send_email_change_code(
        &self,
        _recipient_email: &str,
        _new_email: &str,
        _code: &str,
        _ttl_minutes: i64,
    ) -> Result<(), MailerError> {
        Err(MailerError::ApiError("503 - upstream unavailable".into()))
    }
}

/// App state over a fresh file DB and the given mailer.
pub fn test_state(mailer: Arc<dyn CodeMailer>) -> AppState {
    let db = init_test_db();
    let config = AppConfig {
        database_path: db.path().to_string(),
        ..AppConfig::default()
    };
    AppState::new(db, config, mailer)
}

/// An occupied, fully leased listing with $3,000 rent and $900 expenses.
pub fn sample_property(title: &str, city: &str, price: f64, units: u32) -> NewProperty {
    NewProperty {
        title: title.to_string(),
        address_line: format!("{title} Rd"),
        city: city.to_string(),
        province: "NS".to_string(),
        price,
        units,
        year_built: Some(1985),
        gross_monthly_rent: 3_000.0,
        monthly_expenses: 900.0,
        income_type: IncomeType::Actual,
        tenancy_type: TenancyType::OnLeases,
        rent_category: RentCategory::MarketValue,
        vacancy_status: VacancyStatus::Occupied,
    }
}
