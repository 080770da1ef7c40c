// src/mailer.rs

use reqwest::blocking::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

const BREVO_SEND_URL: &str = "https://api.brevo.com/v3/smtp/email";

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("API error: {0}")]
    ApiError(String),
}

/// Out-of-band channel used to deliver email-change verification codes.
pub trait CodeMailer: Send + Sync {
    fn send_email_change_code(
        &self,
        recipient_email: &str,
        new_email: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), MailerError>;
}

pub struct BrevoMailer {
    api_key: String,
    sender_email: String,
    sender_name: String,
    client: Client,
}

#[derive(Serialize)]
struct BrevoSender<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct BrevoRecipient<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoPayload<'a> {
    sender: BrevoSender<'a>,
    to: Vec<BrevoRecipient<'a>>,
    subject: &'a str,
    html_content: String,
}

impl BrevoMailer {
    pub fn new(api_key: String, sender_email: String, sender_name: String) -> Self {
        Self {
            api_key,
            sender_email,
            sender_name,
            client: Client::new(),
        }
    }
}

pub fn email_change_html(new_email: &str, code: &str, ttl_minutes: i64) -> String {
    format!(
        r#"
        <h2>Confirm your email change</h2>
        <p>We received a request to change the email on your account to <strong>{new_email}</strong>.</p>
        <p>Your verification code is:</p>
        <p style="font-size: 28px; letter-spacing: 6px; font-weight: bold;">{code}</p>
        <p>This code expires in {ttl_minutes} minutes.</p>
        <p>If you did not request this change, you can ignore this email and your address will stay the same.</p>
        "#
    )
}

impl CodeMailer for BrevoMailer {
    fn send_email_change_code(
        &self,
        recipient_email: &str,
        new_email: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), MailerError> {
        let payload = BrevoPayload {
            sender: BrevoSender {
                name: &self.sender_name,
                email: &self.sender_email,
            },
            to: vec![BrevoRecipient {
                email: recipient_email,
            }],
            subject: "Your email change verification code",
            html_content: email_change_html(new_email, code, ttl_minutes),
        };

        let resp = self
            .client
            .post(BREVO_SEND_URL)
            .header("api-key", &self.api_key)
            .json(&payload)
            .send()
            .map_err(|e| MailerError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_else(|_| "(no body)".to_string());
            return Err(MailerError::ApiError(format!("{status} - {body}")));
        }

        debug!("verification email accepted by Brevo");
        Ok(())
    }
}

/// Development mailer: writes the message to the log instead of sending it.
pub struct LogMailer;

impl CodeMailer for LogMailer {
    fn send_email_change_code(
        &self,
        recipient_email: &str,
        new_email: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), MailerError> {
        info!(
            to = recipient_email,
            new_email,
            code,
            ttl_minutes,
            "email change code (log mailer, not sent)"
        );
        Ok(())
    }
}
