//! Ranking engine: turns raw reflection and collaboration rows into a
//! deterministic leaderboard. Recomputing over unchanged data yields
//! bit-identical scores and ordering.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::db::Database;
use crate::models::{AgentLink, AgentReflection, LeaderboardEntry};

/// Composite score weights. Only the relative ordering is contractual
/// downstream; impact dominates, the two ordinal signals refine it.
pub const IMPACT_WEIGHT: f64 = 0.6;
pub const CONSISTENCY_WEIGHT: f64 = 0.25;
pub const COLLABORATION_WEIGHT: f64 = 0.15;

/// The reads and writes the engine needs from the store. Constructor-
/// injected so tests can substitute an in-memory fake.
pub trait RankingStore: Send + Sync {
    /// Reflections in the trailing window, all of them when
    /// lookback_days is None (leaderboard use).
    fn load_reflections(&self, lookback_days: Option<i64>) -> Result<Vec<AgentReflection>, String>;
    fn load_links(&self) -> Result<Vec<AgentLink>, String>;
    fn replace_leaderboard(&self, entries: &[LeaderboardEntry]) -> Result<usize, String>;
}

impl RankingStore for Database {
    fn load_reflections(&self, lookback_days: Option<i64>) -> Result<Vec<AgentReflection>, String> {
        self.reflections_since(lookback_days, None)
            .map_err(|e| format!("Failed to load reflections: {}", e))
    }

    fn load_links(&self) -> Result<Vec<AgentLink>, String> {
        self.list_links()
            .map_err(|e| format!("Failed to load links: {}", e))
    }

    fn replace_leaderboard(&self, entries: &[LeaderboardEntry]) -> Result<usize, String> {
        Database::replace_leaderboard(self, entries)
            .map_err(|e| format!("Failed to persist leaderboard: {}", e))
    }
}

pub struct RankingEngine {
    store: Arc<dyn RankingStore>,
}

impl RankingEngine {
    pub fn new(store: Arc<dyn RankingStore>) -> Self {
        Self { store }
    }

    /// Recompute the full leaderboard and persist it. An empty result
    /// (no eligible agents) is a successful no-op: nothing is persisted
    /// and the previous snapshot is left in place.
    pub fn recompute(&self) -> Result<Vec<LeaderboardEntry>, String> {
        let reflections = self.store.load_reflections(None)?;
        let links = self.store.load_links()?;

        let entries = rank_agents(&reflections, &links);
        if entries.is_empty() {
            log::info!("No eligible agents to rank, leaving leaderboard unchanged");
            return Ok(entries);
        }

        let written = self.store.replace_leaderboard(&entries)?;
        log::info!("Leaderboard recomputed, {} agents ranked", written);
        Ok(entries)
    }
}

/// Pure ranking pass over in-memory rows.
///
/// Agents qualify only with at least one numeric impact; reflections
/// with missing or non-numeric impact never shift the mean, and rows
/// with an empty agent id are skipped rather than failing the batch.
pub fn rank_agents(reflections: &[AgentReflection], links: &[AgentLink]) -> Vec<LeaderboardEntry> {
    // BTreeMap keeps the grouping order deterministic across passes
    let mut impacts: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for reflection in reflections {
        if reflection.agent_id.is_empty() {
            log::warn!("Skipping reflection {} with missing agent id", reflection.id);
            continue;
        }
        if let Some(impact) = reflection.impact() {
            impacts
                .entry(reflection.agent_id.clone())
                .or_default()
                .push(impact);
        }
    }

    if impacts.is_empty() {
        return Vec::new();
    }

    let n = impacts.len();

    let stats: BTreeMap<String, (f64, f64)> = impacts
        .iter()
        .map(|(agent, values)| {
            let avg = values.iter().sum::<f64>() / values.len() as f64;
            let variance =
                values.iter().map(|v| (v - avg) * (v - avg)).sum::<f64>() / values.len() as f64;
            (agent.clone(), (avg, variance))
        })
        .collect();

    // Consistency: ascending variance, ties by agent id
    let mut by_variance: Vec<(&String, f64)> =
        stats.iter().map(|(a, (_, var))| (a, *var)).collect();
    by_variance.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    let consistency_rank: BTreeMap<&String, i64> = by_variance
        .iter()
        .enumerate()
        .map(|(i, (agent, _))| (*agent, (i + 1) as i64))
        .collect();

    // Collaboration: total strength over edges incident to the agent in
    // either direction, descending, ties by agent id
    let mut link_strength: BTreeMap<&String, f64> = stats.keys().map(|a| (a, 0.0)).collect();
    for link in links {
        if let Some(total) = link_strength.get_mut(&link.source_agent) {
            *total += link.strength;
        }
        if let Some(total) = link_strength.get_mut(&link.target_agent) {
            *total += link.strength;
        }
    }
    let mut by_strength: Vec<(&String, f64)> =
        link_strength.iter().map(|(a, s)| (*a, *s)).collect();
    by_strength.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let collaboration_rank: BTreeMap<&String, i64> = by_strength
        .iter()
        .enumerate()
        .map(|(i, (agent, _))| (*agent, (i + 1) as i64))
        .collect();

    let mut entries: Vec<LeaderboardEntry> = stats
        .iter()
        .map(|(agent, (impact_avg, _))| {
            let c_rank = consistency_rank[agent];
            let l_rank = collaboration_rank[agent];
            let rank_score = IMPACT_WEIGHT * impact_avg
                + CONSISTENCY_WEIGHT * normalize_rank(c_rank, n)
                + COLLABORATION_WEIGHT * normalize_rank(l_rank, n);

            LeaderboardEntry {
                agent_id: agent.clone(),
                rank_score,
                impact_avg: *impact_avg,
                consistency_rank: c_rank,
                collaboration_rank: l_rank,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.rank_score
            .total_cmp(&a.rank_score)
            .then_with(|| a.agent_id.cmp(&b.agent_id))
    });
    entries
}

/// Map an ordinal rank (1 = best) over n agents into [0,1], best = 1.
fn normalize_rank(rank: i64, n: usize) -> f64 {
    (n as i64 - rank) as f64 / std::cmp::max(n - 1, 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn reflection(id: i64, agent_id: &str, metadata: serde_json::Value) -> AgentReflection {
        AgentReflection {
            id,
            agent_id: agent_id.to_string(),
            behavior_id: None,
            summary: "r".to_string(),
            metadata,
            created_at: "2026-01-05T00:00:00+00:00".to_string(),
        }
    }

    fn link(source: &str, target: &str, strength: f64) -> AgentLink {
        AgentLink {
            id: 0,
            source_agent: source.to_string(),
            target_agent: target.to_string(),
            strength,
            link_type: "relay".to_string(),
            created_at: "2026-01-05T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_empty_input_yields_empty_leaderboard() {
        assert!(rank_agents(&[], &[]).is_empty());
    }

    #[test]
    fn test_high_impact_agent_ranks_first() {
        let reflections = vec![
            reflection(1, "agent_a", json!({"impact": 0.9})),
            reflection(2, "agent_a", json!({"impact": 0.9})),
            reflection(3, "agent_a", json!({"impact": 0.9})),
            reflection(4, "agent_b", json!({"impact": 0.1})),
        ];
        let entries = rank_agents(&reflections, &[]);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].agent_id, "agent_a");
        assert_eq!(entries[0].impact_avg, 0.9);
        assert_eq!(entries[1].agent_id, "agent_b");
        assert_eq!(entries[1].impact_avg, 0.1);
    }

    #[test]
    fn test_non_numeric_impact_does_not_shift_mean() {
        let reflections = vec![
            reflection(1, "agent_a", json!({"impact": 0.5})),
            reflection(2, "agent_a", json!({"impact": "high"})),
            reflection(3, "agent_a", json!({})),
        ];
        let entries = rank_agents(&reflections, &[]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].impact_avg, 0.5);
    }

    #[test]
    fn test_agent_without_numeric_impact_excluded() {
        let reflections = vec![
            reflection(1, "agent_a", json!({"impact": 0.5})),
            reflection(2, "agent_b", json!({"impact": "n/a"})),
        ];
        let entries = rank_agents(&reflections, &[]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].agent_id, "agent_a");
    }

    #[test]
    fn test_missing_agent_id_skipped_not_fatal() {
        let reflections = vec![
            reflection(1, "", json!({"impact": 0.9})),
            reflection(2, "agent_a", json!({"impact": 0.5})),
        ];
        let entries = rank_agents(&reflections, &[]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].agent_id, "agent_a");
    }

    #[test]
    fn test_recompute_is_deterministic() {
        let reflections = vec![
            reflection(1, "agent_c", json!({"impact": 0.4})),
            reflection(2, "agent_a", json!({"impact": 0.6})),
            reflection(3, "agent_b", json!({"impact": 0.6})),
            reflection(4, "agent_a", json!({"impact": 0.2})),
        ];
        let links = vec![link("agent_b", "agent_c", 0.7)];
        let first = rank_agents(&reflections, &links);
        let second = rank_agents(&reflections, &links);
        assert_eq!(first, second);
    }

    #[test]
    fn test_collaboration_rank_reflects_link_strength() {
        // Identical impacts and variance; agent_b carries a strong edge
        // (edges to unranked agents still count for the ranked endpoint)
        let reflections = vec![
            reflection(1, "agent_a", json!({"impact": 0.5})),
            reflection(2, "agent_b", json!({"impact": 0.5})),
        ];
        let links = vec![link("agent_b", "agent_z", 0.9)];
        let entries = rank_agents(&reflections, &links);
        let a = entries.iter().find(|e| e.agent_id == "agent_a").unwrap();
        let b = entries.iter().find(|e| e.agent_id == "agent_b").unwrap();
        assert_eq!(b.collaboration_rank, 1);
        assert_eq!(a.collaboration_rank, 2);
    }

    #[test]
    fn test_consistency_rank_prefers_low_variance() {
        let reflections = vec![
            reflection(1, "agent_steady", json!({"impact": 0.5})),
            reflection(2, "agent_steady", json!({"impact": 0.5})),
            reflection(3, "agent_swingy", json!({"impact": 0.1})),
            reflection(4, "agent_swingy", json!({"impact": 0.9})),
        ];
        let entries = rank_agents(&reflections, &[]);
        let steady = entries.iter().find(|e| e.agent_id == "agent_steady").unwrap();
        let swingy = entries.iter().find(|e| e.agent_id == "agent_swingy").unwrap();
        assert_eq!(steady.consistency_rank, 1);
        assert_eq!(swingy.consistency_rank, 2);
    }

    #[test]
    fn test_symmetric_agents_order_by_agent_id() {
        // Identical impacts, variance, and collaboration totals: the
        // ordinal tie-breaks fall back to agent id, so agent_a wins
        // every signal and the ordering stays stable across passes.
        let reflections = vec![
            reflection(1, "agent_b", json!({"impact": 0.5})),
            reflection(2, "agent_a", json!({"impact": 0.5})),
        ];
        let links = vec![link("agent_a", "agent_b", 0.4), link("agent_b", "agent_a", 0.4)];
        let entries = rank_agents(&reflections, &links);
        assert_eq!(entries[0].agent_id, "agent_a");
        assert_eq!(entries[1].agent_id, "agent_b");
    }

    struct FakeStore {
        reflections: Vec<AgentReflection>,
        links: Vec<AgentLink>,
        persisted: Mutex<Vec<Vec<LeaderboardEntry>>>,
    }

    impl RankingStore for FakeStore {
        fn load_reflections(&self, _: Option<i64>) -> Result<Vec<AgentReflection>, String> {
            Ok(self.reflections.clone())
        }
        fn load_links(&self) -> Result<Vec<AgentLink>, String> {
            Ok(self.links.clone())
        }
        fn replace_leaderboard(&self, entries: &[LeaderboardEntry]) -> Result<usize, String> {
            self.persisted.lock().unwrap().push(entries.to_vec());
            Ok(entries.len())
        }
    }

    #[test]
    fn test_engine_persists_ranked_entries() {
        let store = Arc::new(FakeStore {
            reflections: vec![reflection(1, "agent_a", json!({"impact": 0.7}))],
            links: vec![],
            persisted: Mutex::new(Vec::new()),
        });
        let engine = RankingEngine::new(store.clone());
        let entries = engine.recompute().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(store.persisted.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_engine_empty_result_persists_nothing() {
        let store = Arc::new(FakeStore {
            reflections: vec![],
            links: vec![],
            persisted: Mutex::new(Vec::new()),
        });
        let engine = RankingEngine::new(store.clone());
        let entries = engine.recompute().unwrap();
        assert!(entries.is_empty());
        assert!(store.persisted.lock().unwrap().is_empty());
    }
}
