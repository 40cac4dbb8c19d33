//! Weekly Summary Generator
//!
//! Builds and persists the weekly agent report for the current ISO
//! week, printing the rendered markdown to stdout. Intended to be
//! invoked out-of-band (shell script or external cron), not through
//! the HTTP server.
//!
//! Usage:
//!   DATABASE_URL=./.db/wins.db cargo run --bin weekly_summary
//!
//! Environment variables:
//!   DATABASE_URL         - SQLite database path
//!   EMAIL_API_KEY        - email provider key (optional; no key = no email)
//!   SUMMARY_RECIPIENTS   - comma-separated recipient list
//!   SUMMARY_FROM         - sender address

use chrono::Utc;
use dotenv::dotenv;
use std::sync::Arc;

use wins_backend::config::Config;
use wins_backend::db::Database;
use wins_backend::summary::{SummaryBuilder, SummaryStore};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    log::info!("Opening database at {}", config.database_url);
    let db = match Database::new(&config.database_url) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    let store: Arc<dyn SummaryStore> = db;
    let mut builder = SummaryBuilder::new(store);
    if let Some(email) = config.email.clone() {
        builder = builder.with_email(email);
    }

    match builder.run(Utc::now()).await {
        Ok(record) => {
            log::info!("Weekly summary stored for week {}", record.week_start);
            println!("{}", record.markdown);
        }
        Err(e) => {
            log::error!("Weekly summary failed: {}", e);
            std::process::exit(1);
        }
    }
}
