use chrono::{Duration, Utc};
use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    AgentBehavior, AgentInsight, AgentLink, AgentReflection, AgentRunMetric, LeaderboardEntry,
    WeeklySummaryRecord,
};

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let conn = Connection::open(database_url)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS agent_run_metrics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                agent_id TEXT NOT NULL,
                provider TEXT NOT NULL,
                model TEXT NOT NULL,
                duration_ms INTEGER NOT NULL,
                tokens INTEGER NOT NULL,
                success INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS agent_reflections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                agent_id TEXT NOT NULL,
                behavior_id TEXT,
                summary TEXT NOT NULL,
                metadata TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS agent_links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_agent TEXT NOT NULL,
                target_agent TEXT NOT NULL,
                strength REAL NOT NULL,
                link_type TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS agent_behaviors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                behavior_id TEXT UNIQUE NOT NULL,
                name TEXT NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS agent_insights (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                insight_id TEXT UNIQUE NOT NULL,
                behavior_id TEXT,
                summary TEXT NOT NULL,
                impact REAL NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS leaderboard (
                agent_id TEXT PRIMARY KEY,
                rank_score REAL NOT NULL,
                impact_avg REAL NOT NULL,
                consistency_rank INTEGER NOT NULL,
                collaboration_rank INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS weekly_summaries (
                week_start TEXT PRIMARY KEY,
                report TEXT NOT NULL,
                markdown TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    // Run metric methods

    pub fn insert_run_metric(
        &self,
        agent_id: &str,
        provider: &str,
        model: &str,
        duration_ms: i64,
        tokens: i64,
        success: bool,
    ) -> SqliteResult<AgentRunMetric> {
        let conn = self.conn.lock().unwrap();
        let created_at = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO agent_run_metrics (agent_id, provider, model, duration_ms, tokens, success, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                agent_id,
                provider,
                model,
                duration_ms,
                tokens,
                if success { 1 } else { 0 },
                &created_at
            ],
        )?;

        let id = conn.last_insert_rowid();

        Ok(AgentRunMetric {
            id,
            agent_id: agent_id.to_string(),
            provider: provider.to_string(),
            model: model.to_string(),
            duration_ms,
            tokens,
            success,
            created_at,
        })
    }

    // Reflection methods

    pub fn insert_reflection(
        &self,
        agent_id: &str,
        behavior_id: Option<&str>,
        summary: &str,
        metadata: &serde_json::Value,
    ) -> SqliteResult<AgentReflection> {
        let conn = self.conn.lock().unwrap();
        let created_at = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO agent_reflections (agent_id, behavior_id, summary, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                agent_id,
                behavior_id,
                summary,
                metadata.to_string(),
                &created_at
            ],
        )?;

        let id = conn.last_insert_rowid();

        Ok(AgentReflection {
            id,
            agent_id: agent_id.to_string(),
            behavior_id: behavior_id.map(|s| s.to_string()),
            summary: summary.to_string(),
            metadata: metadata.clone(),
            created_at,
        })
    }

    /// Load reflections, optionally bounded to a trailing window in days
    /// and/or filtered to one agent. Unbounded when lookback_days is None.
    pub fn reflections_since(
        &self,
        lookback_days: Option<i64>,
        agent_id: Option<&str>,
    ) -> SqliteResult<Vec<AgentReflection>> {
        let conn = self.conn.lock().unwrap();

        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        let mut param_idx = 1;

        if let Some(days) = lookback_days {
            let cutoff = (Utc::now() - Duration::days(days)).to_rfc3339();
            clauses.push(format!("created_at >= ?{}", param_idx));
            params.push(Box::new(cutoff));
            param_idx += 1;
        }
        if let Some(agent) = agent_id {
            clauses.push(format!("agent_id = ?{}", param_idx));
            params.push(Box::new(agent.to_string()));
        }

        let mut sql = String::from(
            "SELECT id, agent_id, behavior_id, summary, metadata, created_at FROM agent_reflections",
        );
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC");

        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let reflections = stmt
            .query_map(params_ref.as_slice(), |row| {
                let metadata_str: String = row.get(4)?;

                Ok(AgentReflection {
                    id: row.get(0)?,
                    agent_id: row.get(1)?,
                    behavior_id: row.get(2)?,
                    summary: row.get(3)?,
                    metadata: serde_json::from_str(&metadata_str)
                        .unwrap_or(serde_json::Value::Null),
                    created_at: row.get(5)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(reflections)
    }

    // Link methods

    pub fn create_link(
        &self,
        source_agent: &str,
        target_agent: &str,
        strength: f64,
        link_type: &str,
    ) -> SqliteResult<AgentLink> {
        let conn = self.conn.lock().unwrap();
        let created_at = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO agent_links (source_agent, target_agent, strength, link_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![source_agent, target_agent, strength, link_type, &created_at],
        )?;

        let id = conn.last_insert_rowid();

        Ok(AgentLink {
            id,
            source_agent: source_agent.to_string(),
            target_agent: target_agent.to_string(),
            strength,
            link_type: link_type.to_string(),
            created_at,
        })
    }

    pub fn list_links(&self) -> SqliteResult<Vec<AgentLink>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, source_agent, target_agent, strength, link_type, created_at
             FROM agent_links ORDER BY id ASC",
        )?;

        let links = stmt
            .query_map([], |row| {
                Ok(AgentLink {
                    id: row.get(0)?,
                    source_agent: row.get(1)?,
                    target_agent: row.get(2)?,
                    strength: row.get(3)?,
                    link_type: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(links)
    }

    // Behavior methods

    pub fn upsert_behavior(&self, behavior_id: &str, name: &str) -> SqliteResult<AgentBehavior> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        // Try to update first
        let rows_affected = conn.execute(
            "UPDATE agent_behaviors SET name = ?1, updated_at = ?2 WHERE behavior_id = ?3",
            rusqlite::params![name, &now, behavior_id],
        )?;

        if rows_affected == 0 {
            // Insert new, enabled by default
            conn.execute(
                "INSERT INTO agent_behaviors (behavior_id, name, enabled, created_at, updated_at)
                 VALUES (?1, ?2, 1, ?3, ?4)",
                rusqlite::params![behavior_id, name, &now, &now],
            )?;
        }

        drop(conn);

        self.get_behavior(behavior_id).map(|opt| opt.unwrap())
    }

    pub fn get_behavior(&self, behavior_id: &str) -> SqliteResult<Option<AgentBehavior>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, behavior_id, name, enabled, created_at, updated_at
             FROM agent_behaviors WHERE behavior_id = ?1",
        )?;

        let behavior = stmt
            .query_row([behavior_id], |row| {
                Ok(AgentBehavior {
                    id: row.get(0)?,
                    behavior_id: row.get(1)?,
                    name: row.get(2)?,
                    enabled: row.get::<_, i32>(3)? != 0,
                    created_at: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            })
            .ok();

        Ok(behavior)
    }

    pub fn list_behaviors(&self) -> SqliteResult<Vec<AgentBehavior>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, behavior_id, name, enabled, created_at, updated_at
             FROM agent_behaviors ORDER BY behavior_id",
        )?;

        let behaviors = stmt
            .query_map([], |row| {
                Ok(AgentBehavior {
                    id: row.get(0)?,
                    behavior_id: row.get(1)?,
                    name: row.get(2)?,
                    enabled: row.get::<_, i32>(3)? != 0,
                    created_at: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(behaviors)
    }

    /// Flip a behavior's enabled flag. Returns false when no such
    /// behavior is registered.
    pub fn set_behavior_enabled(&self, behavior_id: &str, enabled: bool) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let rows_affected = conn.execute(
            "UPDATE agent_behaviors SET enabled = ?1, updated_at = ?2 WHERE behavior_id = ?3",
            rusqlite::params![if enabled { 1 } else { 0 }, &now, behavior_id],
        )?;

        Ok(rows_affected > 0)
    }

    // Insight methods

    pub fn insert_insight(
        &self,
        behavior_id: Option<&str>,
        summary: &str,
        impact: f64,
    ) -> SqliteResult<AgentInsight> {
        let conn = self.conn.lock().unwrap();
        let insight_id = Uuid::new_v4().to_string();
        let created_at = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO agent_insights (insight_id, behavior_id, summary, impact, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![&insight_id, behavior_id, summary, impact, &created_at],
        )?;

        let id = conn.last_insert_rowid();

        Ok(AgentInsight {
            id,
            insight_id,
            behavior_id: behavior_id.map(|s| s.to_string()),
            summary: summary.to_string(),
            impact,
            created_at,
        })
    }

    pub fn recent_insights(&self, lookback_days: i64) -> SqliteResult<Vec<AgentInsight>> {
        let conn = self.conn.lock().unwrap();
        let cutoff = (Utc::now() - Duration::days(lookback_days)).to_rfc3339();

        let mut stmt = conn.prepare(
            "SELECT id, insight_id, behavior_id, summary, impact, created_at
             FROM agent_insights WHERE created_at >= ?1 ORDER BY created_at DESC, id DESC",
        )?;

        let insights = stmt
            .query_map([&cutoff], |row| {
                Ok(AgentInsight {
                    id: row.get(0)?,
                    insight_id: row.get(1)?,
                    behavior_id: row.get(2)?,
                    summary: row.get(3)?,
                    impact: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(insights)
    }

    // Leaderboard methods

    /// Replace the persisted leaderboard wholesale within one
    /// transaction, so concurrent reads never observe a half-written
    /// pass. Returns the number of entries written.
    pub fn replace_leaderboard(&self, entries: &[LeaderboardEntry]) -> SqliteResult<usize> {
        let mut conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let tx = conn.transaction()?;
        tx.execute("DELETE FROM leaderboard", [])?;
        for entry in entries {
            tx.execute(
                "INSERT INTO leaderboard (agent_id, rank_score, impact_avg, consistency_rank, collaboration_rank, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    &entry.agent_id,
                    entry.rank_score,
                    entry.impact_avg,
                    entry.consistency_rank,
                    entry.collaboration_rank,
                    &now
                ],
            )?;
        }
        tx.commit()?;

        Ok(entries.len())
    }

    pub fn get_leaderboard(&self, limit: i64) -> SqliteResult<Vec<LeaderboardEntry>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT agent_id, rank_score, impact_avg, consistency_rank, collaboration_rank
             FROM leaderboard ORDER BY rank_score DESC, agent_id ASC LIMIT ?1",
        )?;

        let entries = stmt
            .query_map([limit], |row| {
                Ok(LeaderboardEntry {
                    agent_id: row.get(0)?,
                    rank_score: row.get(1)?,
                    impact_avg: row.get(2)?,
                    consistency_rank: row.get(3)?,
                    collaboration_rank: row.get(4)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(entries)
    }

    // Weekly summary methods

    /// Upsert keyed by week start. On conflict the report and markdown
    /// are replaced, not merged.
    pub fn upsert_weekly_summary(
        &self,
        week_start: &str,
        report: &serde_json::Value,
        markdown: &str,
    ) -> SqliteResult<WeeklySummaryRecord> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let report_str = report.to_string();

        // Try to update first
        let rows_affected = conn.execute(
            "UPDATE weekly_summaries SET report = ?1, markdown = ?2, created_at = ?3 WHERE week_start = ?4",
            rusqlite::params![&report_str, markdown, &now, week_start],
        )?;

        if rows_affected == 0 {
            // Insert new
            conn.execute(
                "INSERT INTO weekly_summaries (week_start, report, markdown, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![week_start, &report_str, markdown, &now],
            )?;
        }

        drop(conn);

        self.get_weekly_summary(week_start).map(|opt| opt.unwrap())
    }

    pub fn get_weekly_summary(&self, week_start: &str) -> SqliteResult<Option<WeeklySummaryRecord>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT week_start, report, markdown, created_at FROM weekly_summaries WHERE week_start = ?1",
        )?;

        let record = stmt
            .query_row([week_start], |row| {
                let report_str: String = row.get(1)?;

                Ok(WeeklySummaryRecord {
                    week_start: row.get(0)?,
                    report: serde_json::from_str(&report_str)
                        .unwrap_or(serde_json::Value::Null),
                    markdown: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })
            .ok();

        Ok(record)
    }
}
