//! Approval policy, free of storage so every rule is testable on its own.

use crate::error::AppError;
use crate::model::global_config::GlobalConfig;
use crate::model::principal::Principal;
use crate::model::request::RequestStatus;
use crate::model::role::Role;

/// Admins are always self-approved; Managers only while the global switch is on.
pub fn leave_initial_status(role: Role, config: &GlobalConfig) -> RequestStatus {
    match role {
        Role::Admin => RequestStatus::Approved,
        Role::Manager if config.auto_approve_managers => RequestStatus::Approved,
        Role::Manager | Role::Employee => RequestStatus::Pending,
    }
}

/// Claims have no Manager auto-approval path.
pub fn claim_initial_status(role: Role) -> RequestStatus {
    match role {
        Role::Admin => RequestStatus::Approved,
        Role::Manager | Role::Employee => RequestStatus::Pending,
    }
}

/// Whether `viewer` may see a request raised by someone holding `owner_role`
/// at submission time.
pub fn can_view(viewer: &Principal, owner_role: Role) -> bool {
    match viewer.role {
        Role::Admin => true,
        Role::Manager => owner_role != Role::Admin,
        Role::Employee => false,
    }
}

/// Facts a status change is judged against, all read in the same operation.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext {
    pub current: RequestStatus,
    pub requested: RequestStatus,
    pub owner_id: u64,
    pub owner_role: Role,
    pub strict_role_validation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Requested status equals the current one; nothing to write.
    Unchanged,
    Apply,
}

pub fn evaluate_transition(actor: &Principal, ctx: &TransitionContext) -> Result<Transition, AppError> {
    actor.require_approver()?;

    if ctx.requested == RequestStatus::Pending {
        return Err(AppError::InvalidTransition(
            "A decided request cannot be returned to Pending".to_string(),
        ));
    }

    if ctx.current == ctx.requested {
        return Ok(Transition::Unchanged);
    }

    match (ctx.current, ctx.requested) {
        (RequestStatus::Rejected, RequestStatus::Approved) if !actor.is_admin() => {
            return Err(AppError::forbidden(
                "Only an Admin may re-approve a rejected request",
            ));
        }
        (RequestStatus::Approved, RequestStatus::Rejected) => {
            return Err(AppError::InvalidTransition(
                "An approved request cannot be rejected".to_string(),
            ));
        }
        _ => {}
    }

    if ctx.strict_role_validation && !actor.is_admin() {
        if ctx.owner_id == actor.id {
            return Err(AppError::forbidden("Approvers may not decide their own requests"));
        }
        if ctx.owner_role == Role::Admin {
            return Err(AppError::forbidden(
                "Requests raised by an Admin require Admin clearance",
            ));
        }
    }

    Ok(Transition::Apply)
}
