pub mod behavior;
pub mod leaderboard;
pub mod link;
pub mod metric;
pub mod reflection;
pub mod summary;

pub use behavior::{
    AgentBehavior, AgentInsight, BehaviorResponse, FeedbackResponse, FeedbackSummary,
    RegisterBehaviorRequest,
};
pub use leaderboard::{LeaderboardEntry, LeaderboardReadResponse, RecomputeResponse};
pub use link::{AgentLink, CreateLinkRequest, LinkResponse, LinkType};
pub use metric::{AgentRunMetric, RecordRunRequest, RunMetricResponse};
pub use reflection::{AgentReflection, CreateReflectionRequest, ReflectionResponse};
pub use summary::{
    InsightDigest, TopAgent, WeeklyReport, WeeklySummaryRecord, WeeklySummaryResponse,
};
