//! Email dispatch for the weekly digest. Sends are best-effort: the
//! caller logs failures and never lets them fail the summary itself.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::env_vars;

const DEFAULT_API_URL: &str = "https://api.resend.com/emails";

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        from: &str,
        to: &[String],
        subject: &str,
        text: &str,
    ) -> Result<(), String>;
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
}

/// Client for an HTTP email provider with a JSON send endpoint.
pub struct HttpMailer {
    api_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl HttpMailer {
    pub fn new(api_key: &str) -> Self {
        let api_url = std::env::var(env_vars::EMAIL_API_URL)
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self {
            api_url,
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailSender for HttpMailer {
    async fn send(
        &self,
        from: &str,
        to: &[String],
        subject: &str,
        text: &str,
    ) -> Result<(), String> {
        let body = SendEmailRequest {
            from,
            to,
            subject,
            text,
        };

        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Failed to reach email provider: {}", e))?;

        if !resp.status().is_success() {
            return Err(format!("Email provider returned HTTP {}", resp.status()));
        }

        Ok(())
    }
}
