use crate::auth::auth::AuthUser;
use crate::model::audit_log::{AuditAction, AuditFilter, AuditLogEntry};
use crate::model::global_config::{ConfigPatch, GlobalConfig};
use crate::state::AppState;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::IntoParams;

#[utoipa::path(
    get,
    path = "/api/admin/config",
    responses(
        (status = 200, description = "Current global config; created with defaults on first read", body = GlobalConfig),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn get_config(_auth: AuthUser, state: web::Data<AppState>) -> actix_web::Result<impl Responder> {
    let config = state.config.get_config().await?;
    Ok(HttpResponse::Ok().json(config))
}

#[utoipa::path(
    put,
    path = "/api/admin/config",
    request_body(
        content = ConfigPatch,
        description = "Fields to change; absent fields are kept",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Updated global config", body = GlobalConfig),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn update_config(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<ConfigPatch>,
) -> actix_web::Result<impl Responder> {
    let config = state
        .config
        .update_config(&auth.principal(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(config))
}

#[derive(Deserialize, IntoParams)]
pub struct LogQuery {
    /// Only entries written by this user
    pub actor_id: Option<u64>,
    /// Action tag, e.g. REIMBURSEMENT_APPROVED
    #[param(value_type = Option<String>)]
    pub action: Option<AuditAction>,
    /// Only entries about this target id
    pub target_id: Option<String>,
    /// Maximum rows; capped server-side
    pub limit: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/api/admin/logs",
    params(LogQuery),
    responses(
        (status = 200, description = "Audit entries, newest first", body = [AuditLogEntry]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn audit_logs(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<LogQuery>,
) -> actix_web::Result<impl Responder> {
    let LogQuery {
        actor_id,
        action,
        target_id,
        limit,
    } = query.into_inner();
    let filter = AuditFilter {
        actor_id,
        action,
        target_id,
    };

    let entries = state.audit.query(&auth.principal(), &filter, limit).await?;
    Ok(HttpResponse::Ok().json(entries))
}
