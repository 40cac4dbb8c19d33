use actix_web::{web, HttpResponse};

use crate::models::WeeklySummaryResponse;
use crate::AppState;

/// Configure admin read routes. These only respond when admin mode is
/// enabled via configuration; otherwise they 404 like unknown routes.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin")
            .route("/weekly-summary/{week}", web::get().to(get_weekly_summary)),
    );
}

/// Fetch the persisted weekly snapshot for a week key (YYYY-MM-DD)
async fn get_weekly_summary(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    if !state.config.admin_enabled {
        return HttpResponse::NotFound().json(WeeklySummaryResponse {
            success: false,
            summary: None,
            error: Some("Not found".to_string()),
        });
    }

    let week = path.into_inner();

    match state.db.get_weekly_summary(&week) {
        Ok(Some(summary)) => HttpResponse::Ok().json(WeeklySummaryResponse {
            success: true,
            summary: Some(summary),
            error: None,
        }),
        Ok(None) => HttpResponse::NotFound().json(WeeklySummaryResponse {
            success: false,
            summary: None,
            error: Some("No summary for that week".to_string()),
        }),
        Err(e) => HttpResponse::InternalServerError().json(WeeklySummaryResponse {
            success: false,
            summary: None,
            error: Some(format!("Database error: {}", e)),
        }),
    }
}
