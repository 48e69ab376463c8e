use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::reimbursement::{ClaimDraft, NewClaim, ReimbursementClaim};
use crate::service::requests::StatusChange;
use crate::state::AppState;
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/api/reimbursement/apply",
    request_body(
        content = NewClaim,
        description = "Expense claim; `proof` is a relative reference to an already stored jpeg/png/pdf",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Claim created; Approved only for Admins", body = ReimbursementClaim),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reimbursement"
)]
pub async fn apply_claim(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<NewClaim>,
) -> actix_web::Result<impl Responder> {
    let draft = ClaimDraft::try_from(payload.into_inner()).map_err(AppError::from)?;
    let claim = state.claims.submit(&auth.principal(), draft).await?;

    Ok(HttpResponse::Created().json(claim))
}

#[utoipa::path(
    get,
    path = "/api/reimbursement/all",
    responses(
        (status = 200, description = "All claims visible to the caller, newest first", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reimbursement"
)]
pub async fn all_claims(auth: AuthUser, state: web::Data<AppState>) -> actix_web::Result<impl Responder> {
    let claims = state.claims.list_all(&auth.principal()).await?;
    Ok(HttpResponse::Ok().json(claims))
}

#[utoipa::path(
    get,
    path = "/api/reimbursement/user/{user_id}",
    params(
        ("user_id" = u64, Path, description = "Employee whose claims are requested")
    ),
    responses(
        (status = 200, description = "Claim history, newest first", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reimbursement"
)]
pub async fn user_claims(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let claims = state.claims.list_own(&auth.principal(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(claims))
}

#[utoipa::path(
    get,
    path = "/api/reimbursement/{claim_id}",
    params(
        ("claim_id" = u64, Path, description = "ID of the claim to fetch")
    ),
    responses(
        (status = 200, description = "Claim found", body = Object),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Claim not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reimbursement"
)]
pub async fn get_claim(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let claim = state.claims.get(&auth.principal(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(claim))
}

#[utoipa::path(
    put,
    path = "/api/reimbursement/{claim_id}/status",
    params(
        ("claim_id" = u64, Path, description = "ID of the claim to decide")
    ),
    request_body(content = StatusChange, content_type = "application/json"),
    responses(
        (status = 200, description = "Status applied", body = Object, example = json!({
            "message": "Claim Approved successfully",
            "claim": {"id": 12, "status": "Approved"}
        })),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Claim not found"),
        (status = 409, description = "Invalid transition or concurrent modification")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reimbursement"
)]
pub async fn update_claim_status(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<StatusChange>,
) -> actix_web::Result<impl Responder> {
    let claim = state
        .claims
        .update_status(&auth.principal(), path.into_inner(), payload.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Claim {} successfully", claim.lifecycle.status),
        "claim": claim
    })))
}
