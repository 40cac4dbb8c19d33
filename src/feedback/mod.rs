//! Feedback optimization: a two-threshold classifier over behavior
//! impact averages. Low performers are disabled, high performers
//! generate insight rows, everything in between is left alone.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::db::Database;
use crate::models::{AgentInsight, AgentReflection, FeedbackSummary};

/// Behaviors averaging strictly below this are disabled
pub const DISABLE_THRESHOLD: f64 = 0.2;
/// Behaviors averaging strictly above this generate an insight
pub const BOOST_THRESHOLD: f64 = 0.8;
/// Trailing window the pass examines
pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;

/// Store operations the optimizer needs, constructor-injected.
pub trait FeedbackStore: Send + Sync {
    fn load_reflections(&self, lookback_days: Option<i64>) -> Result<Vec<AgentReflection>, String>;
    /// Returns false when the behavior is not registered
    fn set_behavior_enabled(&self, behavior_id: &str, enabled: bool) -> Result<bool, String>;
    fn insert_insight(
        &self,
        behavior_id: Option<&str>,
        summary: &str,
        impact: f64,
    ) -> Result<AgentInsight, String>;
}

impl FeedbackStore for Database {
    fn load_reflections(&self, lookback_days: Option<i64>) -> Result<Vec<AgentReflection>, String> {
        self.reflections_since(lookback_days, None)
            .map_err(|e| format!("Failed to load reflections: {}", e))
    }

    fn set_behavior_enabled(&self, behavior_id: &str, enabled: bool) -> Result<bool, String> {
        Database::set_behavior_enabled(self, behavior_id, enabled)
            .map_err(|e| format!("Failed to update behavior {}: {}", behavior_id, e))
    }

    fn insert_insight(
        &self,
        behavior_id: Option<&str>,
        summary: &str,
        impact: f64,
    ) -> Result<AgentInsight, String> {
        Database::insert_insight(self, behavior_id, summary, impact)
            .map_err(|e| format!("Failed to insert insight: {}", e))
    }
}

pub struct FeedbackOptimizer {
    store: Arc<dyn FeedbackStore>,
    lookback_days: i64,
}

impl FeedbackOptimizer {
    pub fn new(store: Arc<dyn FeedbackStore>) -> Self {
        Self {
            store,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }

    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days;
        self
    }

    /// Run one pass. A write failure for one behavior is logged and
    /// recorded, the remaining behaviors still get processed.
    pub fn run(&self) -> Result<FeedbackSummary, String> {
        let reflections = self.store.load_reflections(Some(self.lookback_days))?;
        let averages = behavior_averages(&reflections);

        let mut summary = FeedbackSummary::default();

        for (behavior_id, avg) in &averages {
            summary.analyzed += 1;

            if *avg < DISABLE_THRESHOLD {
                match self.store.set_behavior_enabled(behavior_id, false) {
                    Ok(true) => {
                        log::info!(
                            "Disabled behavior {} (avg impact {:.2} over {} days)",
                            behavior_id,
                            avg,
                            self.lookback_days
                        );
                        summary.disabled += 1;
                    }
                    Ok(false) => {
                        log::warn!(
                            "Behavior {} averaged {:.2} but is not registered, nothing to disable",
                            behavior_id,
                            avg
                        );
                    }
                    Err(e) => {
                        log::warn!("Failed to disable behavior {}: {}", behavior_id, e);
                        summary.failures.push(e);
                    }
                }
            } else if *avg > BOOST_THRESHOLD {
                let text = format!(
                    "Behavior {} averaged {:.2} impact over the last {} days",
                    behavior_id, avg, self.lookback_days
                );
                match self.store.insert_insight(Some(behavior_id), &text, *avg) {
                    Ok(_) => {
                        log::info!("Recorded high-impact insight for behavior {}", behavior_id);
                        summary.boosted += 1;
                    }
                    Err(e) => {
                        log::warn!("Failed to record insight for behavior {}: {}", behavior_id, e);
                        summary.failures.push(e);
                    }
                }
            }
        }

        log::info!(
            "Feedback pass complete: {} analyzed, {} disabled, {} boosted, {} failures",
            summary.analyzed,
            summary.disabled,
            summary.boosted,
            summary.failures.len()
        );
        Ok(summary)
    }
}

/// Mean numeric impact per behavior. Reflections without a behavior id
/// or without a numeric impact contribute nothing; a behavior with no
/// numeric impacts at all is absent from the result.
pub fn behavior_averages(reflections: &[AgentReflection]) -> BTreeMap<String, f64> {
    let mut impacts: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for reflection in reflections {
        let behavior_id = match &reflection.behavior_id {
            Some(id) if !id.is_empty() => id,
            _ => continue,
        };
        if let Some(impact) = reflection.impact() {
            impacts.entry(behavior_id.clone()).or_default().push(impact);
        }
    }

    impacts
        .into_iter()
        .map(|(behavior, values)| {
            let avg = values.iter().sum::<f64>() / values.len() as f64;
            (behavior, avg)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn reflection(behavior_id: Option<&str>, impact: serde_json::Value) -> AgentReflection {
        AgentReflection {
            id: 0,
            agent_id: "agent_a".to_string(),
            behavior_id: behavior_id.map(|s| s.to_string()),
            summary: "r".to_string(),
            metadata: json!({ "impact": impact }),
            created_at: "2026-01-05T00:00:00+00:00".to_string(),
        }
    }

    #[derive(Default)]
    struct FakeStore {
        reflections: Vec<AgentReflection>,
        fail_behavior: Option<String>,
        disabled: Mutex<Vec<String>>,
        insights: Mutex<Vec<(Option<String>, f64)>>,
    }

    impl FeedbackStore for FakeStore {
        fn load_reflections(&self, _: Option<i64>) -> Result<Vec<AgentReflection>, String> {
            Ok(self.reflections.clone())
        }

        fn set_behavior_enabled(&self, behavior_id: &str, _enabled: bool) -> Result<bool, String> {
            if self.fail_behavior.as_deref() == Some(behavior_id) {
                return Err(format!("simulated write failure for {}", behavior_id));
            }
            self.disabled.lock().unwrap().push(behavior_id.to_string());
            Ok(true)
        }

        fn insert_insight(
            &self,
            behavior_id: Option<&str>,
            _summary: &str,
            impact: f64,
        ) -> Result<AgentInsight, String> {
            self.insights
                .lock()
                .unwrap()
                .push((behavior_id.map(|s| s.to_string()), impact));
            Ok(AgentInsight {
                id: 1,
                insight_id: "i".to_string(),
                behavior_id: behavior_id.map(|s| s.to_string()),
                summary: "s".to_string(),
                impact,
                created_at: "2026-01-05T00:00:00+00:00".to_string(),
            })
        }
    }

    fn run_over(reflections: Vec<AgentReflection>) -> (FeedbackSummary, Arc<FakeStore>) {
        let store = Arc::new(FakeStore {
            reflections,
            ..Default::default()
        });
        let summary = FeedbackOptimizer::new(store.clone()).run().unwrap();
        (summary, store)
    }

    #[test]
    fn test_low_average_disables_behavior() {
        let (summary, store) = run_over(vec![
            reflection(Some("x"), json!(0.1)),
            reflection(Some("x"), json!(0.2)),
        ]);
        // avg 0.15 < 0.2
        assert_eq!(summary.analyzed, 1);
        assert_eq!(summary.disabled, 1);
        assert_eq!(summary.boosted, 0);
        assert_eq!(*store.disabled.lock().unwrap(), vec!["x"]);
    }

    #[test]
    fn test_high_average_records_insight() {
        let (summary, store) = run_over(vec![
            reflection(Some("y"), json!(0.9)),
            reflection(Some("y"), json!(0.95)),
        ]);
        assert_eq!(summary.boosted, 1);
        assert_eq!(summary.disabled, 0);
        let insights = store.insights.lock().unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].0.as_deref(), Some("y"));
    }

    #[test]
    fn test_thresholds_are_strict() {
        // Exactly 0.2 is not disabled, exactly 0.8 is not boosted
        let (summary, store) = run_over(vec![
            reflection(Some("low"), json!(0.2)),
            reflection(Some("high"), json!(0.8)),
        ]);
        assert_eq!(summary.analyzed, 2);
        assert_eq!(summary.disabled, 0);
        assert_eq!(summary.boosted, 0);
        assert!(store.disabled.lock().unwrap().is_empty());
        assert!(store.insights.lock().unwrap().is_empty());
    }

    #[test]
    fn test_reflections_without_behavior_ignored() {
        let (summary, _) = run_over(vec![
            reflection(None, json!(0.05)),
            reflection(Some(""), json!(0.05)),
        ]);
        assert_eq!(summary.analyzed, 0);
    }

    #[test]
    fn test_non_numeric_impact_skipped() {
        let averages = behavior_averages(&[
            reflection(Some("x"), json!("broken")),
            reflection(Some("x"), json!(0.4)),
        ]);
        assert_eq!(averages["x"], 0.4);
    }

    #[test]
    fn test_one_failure_does_not_abort_batch() {
        let store = Arc::new(FakeStore {
            reflections: vec![
                reflection(Some("bad"), json!(0.1)),
                reflection(Some("worse"), json!(0.1)),
            ],
            fail_behavior: Some("bad".to_string()),
            ..Default::default()
        });
        let summary = FeedbackOptimizer::new(store.clone()).run().unwrap();
        assert_eq!(summary.analyzed, 2);
        assert_eq!(summary.disabled, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(*store.disabled.lock().unwrap(), vec!["worse"]);
    }
}
