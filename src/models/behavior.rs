use serde::{Deserialize, Serialize};

/// A configured, schedulable unit of agent action. The enabled flag is
/// the only field the feedback pass ever mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentBehavior {
    pub id: i64,
    pub behavior_id: String,
    pub name: String,
    pub enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A high-impact finding recorded by the feedback pass. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInsight {
    pub id: i64,
    pub insight_id: String,
    pub behavior_id: Option<String>,
    pub summary: String,
    pub impact: f64,
    pub created_at: String,
}

/// Request to register a behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterBehaviorRequest {
    pub behavior_id: String,
    pub name: String,
}

/// Response for behavior operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorResponse {
    pub success: bool,
    pub behavior: Option<AgentBehavior>,
    pub behaviors: Option<Vec<AgentBehavior>>,
    pub error: Option<String>,
}

/// Outcome of one feedback-optimization pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSummary {
    /// Behaviors with at least one numeric impact in the window
    pub analyzed: usize,
    pub disabled: usize,
    pub boosted: usize,
    /// Per-item write failures; logged, never fatal to the batch
    #[serde(skip)]
    pub failures: Vec<String>,
}

/// Response for the cron feedback endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub success: bool,
    pub result: Option<FeedbackSummary>,
    pub error: Option<String>,
}
