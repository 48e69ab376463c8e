use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::leave_request::{LeaveDraft, LeaveRequest, NewLeave};
use crate::service::requests::StatusChange;
use crate::state::AppState;
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;

/* =========================
Apply for leave
========================= */
#[utoipa::path(
    post,
    path = "/api/leave/apply",
    request_body(
        content = NewLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request created; Approved for Admins and auto-approved Managers", body = LeaveRequest),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn apply_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<NewLeave>,
) -> actix_web::Result<impl Responder> {
    let draft = LeaveDraft::try_from(payload.into_inner()).map_err(AppError::from)?;
    let leave = state.leave.submit(&auth.principal(), draft).await?;

    Ok(HttpResponse::Created().json(leave))
}

/* =========================
Approval queue (Manager/Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/all",
    responses(
        (status = 200, description = "All leave requests visible to the caller, newest first", body = Object,
         example = json!([{
            "id": 1,
            "employee_id": 3,
            "leave_type": "annual",
            "from_date": "2026-01-10",
            "to_date": "2026-01-12",
            "reason": "family event",
            "status": "Pending",
            "admin_reason": "",
            "updated_by": null,
            "notified": false,
            "version": 0,
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z",
            "applicant": {"name": "Jane Doe", "role": "Employee", "department": "Ops"}
         }])
        ),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn all_leaves(auth: AuthUser, state: web::Data<AppState>) -> actix_web::Result<impl Responder> {
    let leaves = state.leave.list_all(&auth.principal()).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

/// Leave history of one employee
#[utoipa::path(
    get,
    path = "/api/leave/user/{user_id}",
    params(
        ("user_id" = u64, Path, description = "Employee whose history is requested")
    ),
    responses(
        (status = 200, description = "Leave history, newest first", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn user_leaves(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leaves = state.leave.list_own(&auth.principal(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request 12 not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave = state.leave.get(&auth.principal(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Approve / reject (Manager/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/status",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to decide")
    ),
    request_body(content = StatusChange, content_type = "application/json"),
    responses(
        (status = 200, description = "Status applied", body = Object, example = json!({
            "message": "Leave Approved",
            "leave": {"id": 1, "status": "Approved"}
        })),
        (status = 403, description = "Forbidden, e.g. a Manager re-approving a rejected request"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Invalid transition or concurrent modification")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_leave_status(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<StatusChange>,
) -> actix_web::Result<impl Responder> {
    let leave = state
        .leave
        .update_status(&auth.principal(), path.into_inner(), payload.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Leave {}", leave.lifecycle.status),
        "leave": leave
    })))
}
