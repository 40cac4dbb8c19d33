//! Weekly summary builder: snapshots the top of the leaderboard and the
//! week's insights into a persisted report plus a markdown digest,
//! keyed by the Monday of the current ISO week.

pub mod mailer;

use chrono::{DateTime, Datelike, Duration, Utc};
use std::sync::Arc;

use crate::config::EmailConfig;
use crate::db::Database;
use crate::models::{
    AgentInsight, InsightDigest, LeaderboardEntry, TopAgent, WeeklyReport, WeeklySummaryRecord,
};
use self::mailer::{EmailSender, HttpMailer};

/// How many leaderboard entries the digest lists
pub const TOP_AGENT_COUNT: i64 = 5;
/// Insight window feeding the Highlights section
pub const INSIGHT_LOOKBACK_DAYS: i64 = 7;
/// Printed in place of an empty Highlights section
pub const NO_INSIGHTS_LINE: &str = "No insights recorded this week.";

/// Store operations the builder needs, constructor-injected.
pub trait SummaryStore: Send + Sync {
    fn top_agents(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, String>;
    fn recent_insights(&self, lookback_days: i64) -> Result<Vec<AgentInsight>, String>;
    fn upsert_weekly_summary(
        &self,
        week_start: &str,
        report: &serde_json::Value,
        markdown: &str,
    ) -> Result<WeeklySummaryRecord, String>;
}

impl SummaryStore for Database {
    fn top_agents(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, String> {
        self.get_leaderboard(limit)
            .map_err(|e| format!("Failed to read leaderboard: {}", e))
    }

    fn recent_insights(&self, lookback_days: i64) -> Result<Vec<AgentInsight>, String> {
        Database::recent_insights(self, lookback_days)
            .map_err(|e| format!("Failed to read insights: {}", e))
    }

    fn upsert_weekly_summary(
        &self,
        week_start: &str,
        report: &serde_json::Value,
        markdown: &str,
    ) -> Result<WeeklySummaryRecord, String> {
        Database::upsert_weekly_summary(self, week_start, report, markdown)
            .map_err(|e| format!("Failed to store weekly summary: {}", e))
    }
}

pub struct SummaryBuilder {
    store: Arc<dyn SummaryStore>,
    email: Option<(EmailConfig, Arc<dyn EmailSender>)>,
}

impl SummaryBuilder {
    pub fn new(store: Arc<dyn SummaryStore>) -> Self {
        Self { store, email: None }
    }

    pub fn with_email(self, config: EmailConfig) -> Self {
        let sender = Arc::new(HttpMailer::new(&config.api_key));
        self.with_email_sender(config, sender)
    }

    pub fn with_email_sender(mut self, config: EmailConfig, sender: Arc<dyn EmailSender>) -> Self {
        self.email = Some((config, sender));
        self
    }

    /// Build, persist, and (best-effort) mail the summary for the ISO
    /// week containing `now`. Re-running within the same week replaces
    /// the stored snapshot.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<WeeklySummaryRecord, String> {
        let week = week_start(now);

        let top = self.store.top_agents(TOP_AGENT_COUNT)?;
        let insights = self.store.recent_insights(INSIGHT_LOOKBACK_DAYS)?;

        let report = WeeklyReport {
            week_start: week.clone(),
            top_agents: top
                .iter()
                .enumerate()
                .map(|(i, entry)| TopAgent {
                    rank: i + 1,
                    agent_id: entry.agent_id.clone(),
                    rank_score: entry.rank_score,
                    impact_avg: entry.impact_avg,
                })
                .collect(),
            insights: insights
                .iter()
                .map(|insight| InsightDigest {
                    summary: insight.summary.clone(),
                    impact: insight.impact,
                })
                .collect(),
        };

        let markdown = render_markdown(&report);
        let report_value = serde_json::to_value(&report)
            .map_err(|e| format!("Failed to serialize report: {}", e))?;

        let record = self
            .store
            .upsert_weekly_summary(&week, &report_value, &markdown)?;
        log::info!("Weekly summary stored for week {}", week);

        // Email is a best-effort side effect: never fails the summary
        match &self.email {
            Some((config, sender)) => {
                let subject = format!("Weekly agent report for {}", week);
                if let Err(e) = sender
                    .send(&config.from, &config.recipients, &subject, &markdown)
                    .await
                {
                    log::warn!("Weekly summary email failed: {}", e);
                } else {
                    log::info!(
                        "Weekly summary mailed to {} recipient(s)",
                        config.recipients.len()
                    );
                }
            }
            None => log::debug!("No email credentials configured, skipping digest email"),
        }

        Ok(record)
    }
}

/// Monday of the ISO week containing `now`, formatted YYYY-MM-DD.
pub fn week_start(now: DateTime<Utc>) -> String {
    let date = now.date_naive();
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    monday.format("%Y-%m-%d").to_string()
}

/// Render the digest markdown. The structure is a consumer contract:
/// week heading, a "Top Agents" section, a "Highlights" section with a
/// placeholder line when there are no insights.
pub fn render_markdown(report: &WeeklyReport) -> String {
    let mut md = String::new();
    md.push_str(&format!(
        "# Weekly Agent Report: Week of {}\n\n",
        report.week_start
    ));

    md.push_str("## Top Agents\n\n");
    if report.top_agents.is_empty() {
        md.push_str("No ranked agents this week.\n");
    } else {
        for agent in &report.top_agents {
            md.push_str(&format!(
                "{}. {} - rank score {:.4}, avg impact {:.4}\n",
                agent.rank, agent.agent_id, agent.rank_score, agent.impact_avg
            ));
        }
    }

    md.push_str("\n## Highlights\n\n");
    if report.insights.is_empty() {
        md.push_str(NO_INSIGHTS_LINE);
        md.push('\n');
    } else {
        for insight in &report.insights {
            md.push_str(&format!("- {}\n", insight.summary));
        }
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn entry(agent_id: &str, score: f64) -> LeaderboardEntry {
        LeaderboardEntry {
            agent_id: agent_id.to_string(),
            rank_score: score,
            impact_avg: score,
            consistency_rank: 1,
            collaboration_rank: 1,
        }
    }

    fn insight(summary: &str) -> AgentInsight {
        AgentInsight {
            id: 1,
            insight_id: "i".to_string(),
            behavior_id: None,
            summary: summary.to_string(),
            impact: 0.9,
            created_at: "2026-01-05T00:00:00+00:00".to_string(),
        }
    }

    #[derive(Default)]
    struct FakeStore {
        entries: Vec<LeaderboardEntry>,
        insights: Vec<AgentInsight>,
        summaries: Mutex<HashMap<String, (serde_json::Value, String)>>,
    }

    impl SummaryStore for FakeStore {
        fn top_agents(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, String> {
            Ok(self.entries.iter().take(limit as usize).cloned().collect())
        }

        fn recent_insights(&self, _: i64) -> Result<Vec<AgentInsight>, String> {
            Ok(self.insights.clone())
        }

        fn upsert_weekly_summary(
            &self,
            week_start: &str,
            report: &serde_json::Value,
            markdown: &str,
        ) -> Result<WeeklySummaryRecord, String> {
            self.summaries.lock().unwrap().insert(
                week_start.to_string(),
                (report.clone(), markdown.to_string()),
            );
            Ok(WeeklySummaryRecord {
                week_start: week_start.to_string(),
                report: report.clone(),
                markdown: markdown.to_string(),
                created_at: "2026-01-05T00:00:00+00:00".to_string(),
            })
        }
    }

    struct FakeSender {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl EmailSender for FakeSender {
        async fn send(
            &self,
            _from: &str,
            _to: &[String],
            subject: &str,
            _text: &str,
        ) -> Result<(), String> {
            self.calls.lock().unwrap().push(subject.to_string());
            if self.fail {
                Err("simulated provider outage".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn email_config() -> EmailConfig {
        EmailConfig {
            api_key: "k".to_string(),
            from: "reports@example.com".to_string(),
            recipients: vec!["team@example.com".to_string()],
        }
    }

    #[test]
    fn test_week_start_is_iso_monday() {
        // 2026-08-23 is a Sunday; its ISO week starts 2026-08-17
        let sunday = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();
        assert_eq!(week_start(sunday), "2026-08-17");

        // A Monday maps to itself
        let monday = Utc.with_ymd_and_hms(2026, 8, 17, 0, 30, 0).unwrap();
        assert_eq!(week_start(monday), "2026-08-17");
    }

    #[test]
    fn test_markdown_with_no_insights_uses_placeholder() {
        let report = WeeklyReport {
            week_start: "2026-08-17".to_string(),
            top_agents: vec![TopAgent {
                rank: 1,
                agent_id: "agent_a".to_string(),
                rank_score: 0.87,
                impact_avg: 0.9,
            }],
            insights: vec![],
        };
        let md = render_markdown(&report);
        assert!(md.starts_with("# Weekly Agent Report: Week of 2026-08-17"));
        assert!(md.contains("## Top Agents"));
        assert!(md.contains("1. agent_a - rank score 0.8700, avg impact 0.9000"));
        assert!(md.contains("## Highlights"));
        assert!(md.contains(NO_INSIGHTS_LINE));
    }

    #[test]
    fn test_markdown_lists_insight_summaries() {
        let report = WeeklyReport {
            week_start: "2026-08-17".to_string(),
            top_agents: vec![],
            insights: vec![InsightDigest {
                summary: "Behavior x averaged 0.92 impact".to_string(),
                impact: 0.92,
            }],
        };
        let md = render_markdown(&report);
        assert!(md.contains("- Behavior x averaged 0.92 impact"));
        assert!(!md.contains(NO_INSIGHTS_LINE));
    }

    #[tokio::test]
    async fn test_run_caps_top_agents_at_five() {
        let store = Arc::new(FakeStore {
            entries: (0..8).map(|i| entry(&format!("agent_{}", i), 0.9 - 0.1 * i as f64)).collect(),
            ..Default::default()
        });
        let record = SummaryBuilder::new(store)
            .run(Utc.with_ymd_and_hms(2026, 8, 19, 9, 0, 0).unwrap())
            .await
            .unwrap();

        let report: WeeklyReport = serde_json::from_value(record.report).unwrap();
        assert_eq!(report.top_agents.len(), 5);
        assert_eq!(report.top_agents[0].rank, 1);
        assert_eq!(report.top_agents[4].rank, 5);
    }

    #[tokio::test]
    async fn test_rerun_same_week_replaces_snapshot() {
        let store = Arc::new(FakeStore {
            entries: vec![entry("agent_a", 0.9)],
            ..Default::default()
        });
        let builder = SummaryBuilder::new(store.clone());

        let wednesday = Utc.with_ymd_and_hms(2026, 8, 19, 9, 0, 0).unwrap();
        builder.run(wednesday).await.unwrap();
        let friday = Utc.with_ymd_and_hms(2026, 8, 21, 9, 0, 0).unwrap();
        builder.run(friday).await.unwrap();

        let summaries = store.summaries.lock().unwrap();
        assert_eq!(summaries.len(), 1);
        assert!(summaries.contains_key("2026-08-17"));
    }

    #[tokio::test]
    async fn test_email_failure_does_not_fail_summary() {
        let store = Arc::new(FakeStore::default());
        let sender = Arc::new(FakeSender {
            calls: Mutex::new(Vec::new()),
            fail: true,
        });
        let builder =
            SummaryBuilder::new(store.clone()).with_email_sender(email_config(), sender.clone());

        let result = builder
            .run(Utc.with_ymd_and_hms(2026, 8, 19, 9, 0, 0).unwrap())
            .await;

        assert!(result.is_ok());
        assert_eq!(sender.calls.lock().unwrap().len(), 1);
        // The snapshot still landed despite the email failure
        assert_eq!(store.summaries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_email_config_skips_dispatch() {
        let store = Arc::new(FakeStore {
            insights: vec![insight("something happened")],
            ..Default::default()
        });
        let record = SummaryBuilder::new(store)
            .run(Utc.with_ymd_and_hms(2026, 8, 19, 9, 0, 0).unwrap())
            .await
            .unwrap();
        assert!(record.markdown.contains("- something happened"));
    }
}
