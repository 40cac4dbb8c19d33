use actix_web::{web, HttpResponse};

use crate::models::{
    BehaviorResponse, CreateLinkRequest, CreateReflectionRequest, LinkResponse, LinkType,
    RecordRunRequest, ReflectionResponse, RegisterBehaviorRequest, RunMetricResponse,
};
use crate::AppState;

/// Configure agent signal ingestion routes. Registered as individual
/// resources so they never shadow the /api/agents/leaderboard resource.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/agents/runs").route(web::post().to(record_run)));
    cfg.service(web::resource("/api/agents/reflections").route(web::post().to(create_reflection)));
    cfg.service(web::resource("/api/agents/links").route(web::post().to(create_link)));
    cfg.service(
        web::resource("/api/agents/behaviors")
            .route(web::post().to(register_behavior))
            .route(web::get().to(list_behaviors)),
    );
}

/// Record one LLM invocation attributed to an agent
async fn record_run(
    state: web::Data<AppState>,
    body: web::Json<RecordRunRequest>,
) -> HttpResponse {
    if body.agent_id.is_empty() {
        return HttpResponse::BadRequest().json(RunMetricResponse {
            success: false,
            metric: None,
            error: Some("agent_id is required".to_string()),
        });
    }

    match state.db.insert_run_metric(
        &body.agent_id,
        &body.provider,
        &body.model,
        body.duration_ms,
        body.tokens,
        body.success,
    ) {
        Ok(metric) => HttpResponse::Created().json(RunMetricResponse {
            success: true,
            metric: Some(metric),
            error: None,
        }),
        Err(e) => HttpResponse::InternalServerError().json(RunMetricResponse {
            success: false,
            metric: None,
            error: Some(format!("Database error: {}", e)),
        }),
    }
}

/// Record an agent reflection
async fn create_reflection(
    state: web::Data<AppState>,
    body: web::Json<CreateReflectionRequest>,
) -> HttpResponse {
    if body.agent_id.is_empty() {
        return HttpResponse::BadRequest().json(ReflectionResponse {
            success: false,
            reflection: None,
            error: Some("agent_id is required".to_string()),
        });
    }

    match state.db.insert_reflection(
        &body.agent_id,
        body.behavior_id.as_deref(),
        &body.summary,
        &body.metadata,
    ) {
        Ok(reflection) => HttpResponse::Created().json(ReflectionResponse {
            success: true,
            reflection: Some(reflection),
            error: None,
        }),
        Err(e) => HttpResponse::InternalServerError().json(ReflectionResponse {
            success: false,
            reflection: None,
            error: Some(format!("Database error: {}", e)),
        }),
    }
}

/// Create a collaboration link between two agents
async fn create_link(
    state: web::Data<AppState>,
    body: web::Json<CreateLinkRequest>,
) -> HttpResponse {
    if body.source_agent.is_empty() || body.target_agent.is_empty() {
        return HttpResponse::BadRequest().json(LinkResponse {
            success: false,
            link: None,
            error: Some("source_agent and target_agent are required".to_string()),
        });
    }

    if !(0.0..=1.0).contains(&body.strength) {
        return HttpResponse::BadRequest().json(LinkResponse {
            success: false,
            link: None,
            error: Some("strength must be in [0,1]".to_string()),
        });
    }

    let link_type = match LinkType::from_str(&body.link_type) {
        Some(t) => t,
        None => {
            return HttpResponse::BadRequest().json(LinkResponse {
                success: false,
                link: None,
                error: Some("Invalid link_type. Valid options: relay, review, pairing".to_string()),
            });
        }
    };

    match state.db.create_link(
        &body.source_agent,
        &body.target_agent,
        body.strength,
        link_type.as_str(),
    ) {
        Ok(link) => HttpResponse::Created().json(LinkResponse {
            success: true,
            link: Some(link),
            error: None,
        }),
        Err(e) => HttpResponse::InternalServerError().json(LinkResponse {
            success: false,
            link: None,
            error: Some(format!("Database error: {}", e)),
        }),
    }
}

/// Register (or rename) a behavior
async fn register_behavior(
    state: web::Data<AppState>,
    body: web::Json<RegisterBehaviorRequest>,
) -> HttpResponse {
    if body.behavior_id.is_empty() {
        return HttpResponse::BadRequest().json(BehaviorResponse {
            success: false,
            behavior: None,
            behaviors: None,
            error: Some("behavior_id is required".to_string()),
        });
    }

    match state.db.upsert_behavior(&body.behavior_id, &body.name) {
        Ok(behavior) => HttpResponse::Ok().json(BehaviorResponse {
            success: true,
            behavior: Some(behavior),
            behaviors: None,
            error: None,
        }),
        Err(e) => HttpResponse::InternalServerError().json(BehaviorResponse {
            success: false,
            behavior: None,
            behaviors: None,
            error: Some(format!("Database error: {}", e)),
        }),
    }
}

/// List all behaviors
async fn list_behaviors(state: web::Data<AppState>) -> HttpResponse {
    match state.db.list_behaviors() {
        Ok(behaviors) => HttpResponse::Ok().json(BehaviorResponse {
            success: true,
            behavior: None,
            behaviors: Some(behaviors),
            error: None,
        }),
        Err(e) => HttpResponse::InternalServerError().json(BehaviorResponse {
            success: false,
            behavior: None,
            behaviors: None,
            error: Some(format!("Database error: {}", e)),
        }),
    }
}
