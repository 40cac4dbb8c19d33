use serde::{Deserialize, Serialize};

/// One row per LLM invocation attributed to an agent. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRunMetric {
    pub id: i64,
    pub agent_id: String,
    pub provider: String,
    pub model: String,
    pub duration_ms: i64,
    pub tokens: i64,
    pub success: bool,
    pub created_at: String,
}

/// Request to record a run metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordRunRequest {
    pub agent_id: String,
    pub provider: String,
    pub model: String,
    pub duration_ms: i64,
    pub tokens: i64,
    pub success: bool,
}

/// Response for run metric operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetricResponse {
    pub success: bool,
    pub metric: Option<AgentRunMetric>,
    pub error: Option<String>,
}
