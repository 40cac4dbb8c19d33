use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Shared secret for cron-triggered endpoints
    pub const CRON_SECRET: &str = "CRON_SECRET";
    /// Enables the admin read endpoints
    pub const ADMIN_ENABLED: &str = "ADMIN_ENABLED";
    // Weekly summary email dispatch (all optional; dispatch is skipped
    // unless key and recipients are both present)
    pub const EMAIL_API_KEY: &str = "EMAIL_API_KEY";
    pub const EMAIL_API_URL: &str = "EMAIL_API_URL";
    pub const SUMMARY_FROM: &str = "SUMMARY_FROM";
    pub const SUMMARY_RECIPIENTS: &str = "SUMMARY_RECIPIENTS";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/wins.db";
    pub const SUMMARY_FROM: &str = "reports@realwebwins.local";
}

/// Credentials and addressing for the weekly summary email side effect.
#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub api_key: String,
    pub from: String,
    pub recipients: Vec<String>,
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Bearer secret required by /api/cron endpoints; when unset those
    /// endpoints reject every request
    pub cron_secret: Option<String>,
    pub admin_enabled: bool,
    pub email: Option<EmailConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var(env_vars::PORT)
                .unwrap_or_else(|_| defaults::PORT.to_string())
                .parse()
                .expect("PORT must be a valid number"),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            cron_secret: env::var(env_vars::CRON_SECRET).ok(),
            admin_enabled: env::var(env_vars::ADMIN_ENABLED)
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            email: email_from_env(),
        }
    }
}

/// Parse a comma-separated recipient list, dropping empty segments.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn email_from_env() -> Option<EmailConfig> {
    let api_key = env::var(env_vars::EMAIL_API_KEY).ok()?;
    let recipients = match env::var(env_vars::SUMMARY_RECIPIENTS) {
        Ok(raw) => parse_recipients(&raw),
        Err(_) => Vec::new(),
    };

    if recipients.is_empty() {
        log::debug!("No summary recipients configured - email dispatch disabled");
        return None;
    }

    let from = env::var(env_vars::SUMMARY_FROM)
        .unwrap_or_else(|_| defaults::SUMMARY_FROM.to_string());

    Some(EmailConfig {
        api_key,
        from,
        recipients,
    })
}
