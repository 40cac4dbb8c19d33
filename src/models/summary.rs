use serde::{Deserialize, Serialize};

/// One top-N line in the weekly report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopAgent {
    pub rank: usize,
    pub agent_id: String,
    pub rank_score: f64,
    pub impact_avg: f64,
}

/// One highlight line in the weekly report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightDigest {
    pub summary: String,
    pub impact: f64,
}

/// Structured weekly report, persisted as the JSON half of the snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    /// Monday of the ISO week, YYYY-MM-DD; also the upsert key
    pub week_start: String,
    pub top_agents: Vec<TopAgent>,
    pub insights: Vec<InsightDigest>,
}

/// Persisted weekly snapshot. Upsert-by-week: a re-run within the same
/// ISO week replaces report and markdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySummaryRecord {
    pub week_start: String,
    pub report: serde_json::Value,
    pub markdown: String,
    pub created_at: String,
}

/// Response for weekly summary reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySummaryResponse {
    pub success: bool,
    pub summary: Option<WeeklySummaryRecord>,
    pub error: Option<String>,
}
