use serde::{Deserialize, Serialize};

use super::AgentInsight;

/// One ranked agent. Recomputed fresh on every ranking pass; the
/// persisted table is replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub agent_id: String,
    pub rank_score: f64,
    pub impact_avg: f64,
    /// Ordinal, 1 = most consistent impact scores
    pub consistency_rank: i64,
    /// Ordinal, 1 = strongest collaboration edges
    pub collaboration_rank: i64,
}

/// Response for POST /api/agents/leaderboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecomputeResponse {
    pub success: bool,
    pub updated: Option<usize>,
    pub insights: Option<Vec<AgentInsight>>,
    pub error: Option<String>,
}

/// Response for GET /api/agents/leaderboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardReadResponse {
    pub success: bool,
    pub data: Option<Vec<LeaderboardEntry>>,
    pub insights: Option<Vec<AgentInsight>>,
    pub error: Option<String>,
}
