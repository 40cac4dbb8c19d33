use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::models::{LeaderboardReadResponse, RecomputeResponse};
use crate::ranking::{RankingEngine, RankingStore};
use crate::summary::INSIGHT_LOOKBACK_DAYS;
use crate::AppState;

const DEFAULT_READ_LIMIT: i64 = 10;

/// Configure leaderboard routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/agents/leaderboard")
            .route(web::post().to(recompute_leaderboard))
            .route(web::get().to(get_leaderboard)),
    );
}

/// Recompute the full leaderboard and persist it
async fn recompute_leaderboard(state: web::Data<AppState>) -> HttpResponse {
    let store: Arc<dyn RankingStore> = state.db.clone();
    let engine = RankingEngine::new(store);

    let entries = match engine.recompute() {
        Ok(entries) => entries,
        Err(e) => {
            log::error!("Leaderboard recompute failed: {}", e);
            return HttpResponse::InternalServerError().json(RecomputeResponse {
                success: false,
                updated: None,
                insights: None,
                error: Some(e),
            });
        }
    };

    match state.db.recent_insights(INSIGHT_LOOKBACK_DAYS) {
        Ok(insights) => HttpResponse::Ok().json(RecomputeResponse {
            success: true,
            updated: Some(entries.len()),
            insights: Some(insights),
            error: None,
        }),
        Err(e) => HttpResponse::InternalServerError().json(RecomputeResponse {
            success: false,
            updated: None,
            insights: None,
            error: Some(format!("Database error: {}", e)),
        }),
    }
}

#[derive(serde::Deserialize)]
struct LimitQuery {
    limit: Option<i64>,
}

/// Read the persisted leaderboard
async fn get_leaderboard(
    state: web::Data<AppState>,
    query: web::Query<LimitQuery>,
) -> HttpResponse {
    let limit = query.limit.unwrap_or(DEFAULT_READ_LIMIT);

    let data = match state.db.get_leaderboard(limit) {
        Ok(data) => data,
        Err(e) => {
            return HttpResponse::InternalServerError().json(LeaderboardReadResponse {
                success: false,
                data: None,
                insights: None,
                error: Some(format!("Database error: {}", e)),
            });
        }
    };

    match state.db.recent_insights(INSIGHT_LOOKBACK_DAYS) {
        Ok(insights) => HttpResponse::Ok().json(LeaderboardReadResponse {
            success: true,
            data: Some(data),
            insights: Some(insights),
            error: None,
        }),
        Err(e) => HttpResponse::InternalServerError().json(LeaderboardReadResponse {
            success: false,
            data: None,
            insights: None,
            error: Some(format!("Database error: {}", e)),
        }),
    }
}
