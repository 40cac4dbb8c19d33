use serde::{Deserialize, Serialize};

/// A self-assessment an agent produces after a batch of behavior runs.
/// The metadata map is expected to carry a numeric `impact` in [0,1],
/// but nothing enforces that at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReflection {
    pub id: i64,
    pub agent_id: String,
    pub behavior_id: Option<String>,
    pub summary: String,
    pub metadata: serde_json::Value,
    pub created_at: String,
}

impl AgentReflection {
    /// The numeric impact estimate, if the metadata carries one.
    /// Non-numeric or absent impact values yield None and must be
    /// skipped by consumers, never treated as zero.
    pub fn impact(&self) -> Option<f64> {
        self.metadata.get("impact").and_then(|v| v.as_f64())
    }
}

/// Request to record a reflection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReflectionRequest {
    pub agent_id: String,
    #[serde(default)]
    pub behavior_id: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Response for reflection operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionResponse {
    pub success: bool,
    pub reflection: Option<AgentReflection>,
    pub error: Option<String>,
}
