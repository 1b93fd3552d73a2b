//! Email delivery abstraction for the entry-code notification.
//!
//! The gate treats mail as a black box: build a message, hand it to an
//! [`EmailSender`], get `Ok` or an error back. Exactly one send attempt is
//! made per issuance; a failure is surfaced to the flow immediately (the
//! caller rolls the challenge cookie back) and is never retried here.
//!
//! The default sender for local dev is `LogEmailSender`, which logs and
//! returns `Ok(())`. `HttpEmailSender` posts the message as JSON to a
//! configured delivery endpoint.

use crate::APP_USER_AGENT;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use tracing::info;
use url::Url;

/// The one message this service sends: subject, plain-text body with the
/// 6-digit code, and an HTML body carrying the same code.
#[derive(Clone, Debug, Serialize)]
pub struct OtpEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl OtpEmail {
    #[must_use]
    pub fn entry_code(to: &str, code: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Your admin entry code".to_string(),
            text: format!(
                "Your one-time admin entry code is {code}. It expires in 5 minutes."
            ),
            html: format!(
                "<p>Your one-time admin entry code is <strong>{code}</strong>.</p>\
                 <p>It expires in 5 minutes.</p>"
            ),
        }
    }
}

/// Email delivery abstraction used by the gate handlers.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error so the flow can roll back.
    async fn send(&self, message: &OtpEmail) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &OtpEmail) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.text,
            "email send stub"
        );
        Ok(())
    }
}

/// Sender that posts the message as JSON to an HTTP delivery endpoint.
pub struct HttpEmailSender {
    client: Client,
    endpoint: Url,
}

impl HttpEmailSender {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(endpoint: Url) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .context("failed to build mail client")?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: &OtpEmail) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(message)
            .send()
            .await
            .context("mail endpoint unreachable")?;

        if !response.status().is_success() {
            bail!("mail endpoint returned {}", response.status());
        }
        Ok(())
    }
}

/// Basic email format check for the configured admin address.
pub(crate) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_code_bodies_carry_the_code() {
        let message = OtpEmail::entry_code("ops@example.com", "123456");
        assert_eq!(message.to, "ops@example.com");
        assert!(message.text.contains("123456"));
        assert!(message.html.contains("123456"));
        assert!(!message.subject.contains("123456"));
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[tokio::test]
    async fn log_sender_always_succeeds() {
        let message = OtpEmail::entry_code("ops@example.com", "000000");
        assert!(LogEmailSender.send(&message).await.is_ok());
    }
}
