use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::feedback::{FeedbackOptimizer, FeedbackStore};
use crate::models::FeedbackResponse;
use crate::AppState;

/// Checks the bearer token against the shared cron secret by plain
/// string equality. An unset secret rejects everything: cron endpoints
/// are never open by accident.
fn validate_cron_secret(
    state: &web::Data<AppState>,
    req: &HttpRequest,
) -> Result<(), HttpResponse> {
    let provided = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim_start_matches("Bearer ").to_string());

    match (provided, state.config.cron_secret.as_deref()) {
        (Some(token), Some(secret)) if token == secret => Ok(()),
        _ => Err(HttpResponse::Unauthorized().json(FeedbackResponse {
            success: false,
            result: None,
            error: Some("unauthorized".to_string()),
        })),
    }
}

/// Configure cron-triggered routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/cron").route("/agents-feedback", web::post().to(run_agents_feedback)),
    );
}

/// Run one feedback-optimization pass over the trailing window
async fn run_agents_feedback(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Err(resp) = validate_cron_secret(&state, &req) {
        return resp;
    }

    let store: Arc<dyn FeedbackStore> = state.db.clone();
    let optimizer = FeedbackOptimizer::new(store);

    match optimizer.run() {
        Ok(result) => HttpResponse::Ok().json(FeedbackResponse {
            success: true,
            result: Some(result),
            error: None,
        }),
        Err(e) => {
            log::error!("Feedback pass failed: {}", e);
            HttpResponse::InternalServerError().json(FeedbackResponse {
                success: false,
                result: None,
                error: Some(e),
            })
        }
    }
}
