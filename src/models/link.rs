use serde::{Deserialize, Serialize};

/// Kind of collaboration a link records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// One agent hands work off to another
    Relay,
    /// One agent reviews another's output
    Review,
    /// Two agents work a task together
    Pairing,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Relay => "relay",
            LinkType::Review => "review",
            LinkType::Pairing => "pairing",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relay" => Some(LinkType::Relay),
            "review" => Some(LinkType::Review),
            "pairing" => Some(LinkType::Pairing),
            _ => None,
        }
    }
}

/// A directed collaboration edge between two agents, strength in [0,1].
/// Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentLink {
    pub id: i64,
    pub source_agent: String,
    pub target_agent: String,
    pub strength: f64,
    pub link_type: String,
    pub created_at: String,
}

/// Request to create a collaboration link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLinkRequest {
    pub source_agent: String,
    pub target_agent: String,
    pub strength: f64,
    pub link_type: String,
}

/// Response for link operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkResponse {
    pub success: bool,
    pub link: Option<AgentLink>,
    pub error: Option<String>,
}
