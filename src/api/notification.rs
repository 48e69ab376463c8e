use crate::auth::auth::AuthUser;
use crate::model::notification::{MarkSeen, MarkSeenBatch, NotificationUpdate};
use crate::state::AppState;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct PendingUpdates {
    pub updates: Vec<NotificationUpdate>,
}

#[utoipa::path(
    get,
    path = "/api/notifications/pending",
    responses(
        (status = 200, description = "Decided requests of the caller not yet acknowledged", body = PendingUpdates),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notifications"
)]
pub async fn pending(auth: AuthUser, state: web::Data<AppState>) -> actix_web::Result<impl Responder> {
    let updates = state.notifications.pending(&auth.principal()).await?;
    Ok(HttpResponse::Ok().json(PendingUpdates { updates }))
}

#[utoipa::path(
    post,
    path = "/api/notifications/mark-seen",
    request_body(content = MarkSeen, content_type = "application/json"),
    responses(
        (status = 200, description = "Notification acknowledged", body = Object, example = json!({
            "message": "Notification marked as seen"
        })),
        (status = 403, description = "Request belongs to another employee"),
        (status = 404, description = "No such request in that category")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notifications"
)]
pub async fn mark_seen(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<MarkSeen>,
) -> actix_web::Result<impl Responder> {
    let MarkSeen { id, category, version } = payload.into_inner();
    state
        .notifications
        .mark_seen(&auth.principal(), id, version, category)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Notification marked as seen"
    })))
}

#[utoipa::path(
    post,
    path = "/api/notifications/mark-seen-batch",
    request_body(content = MarkSeenBatch, content_type = "application/json"),
    responses(
        (status = 200, description = "All listed notifications acknowledged", body = Object, example = json!({
            "message": "Notifications marked as seen",
            "updated": 2
        })),
        (status = 403, description = "At least one request belongs to another employee"),
        (status = 404, description = "At least one id does not exist in that category")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notifications"
)]
pub async fn mark_seen_batch(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<MarkSeenBatch>,
) -> actix_web::Result<impl Responder> {
    let MarkSeenBatch { ids, category } = payload.into_inner();
    let updated = state
        .notifications
        .mark_seen_many(&auth.principal(), &ids, category)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Notifications marked as seen",
        "updated": updated
    })))
}
