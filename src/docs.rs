use crate::api::notification::PendingUpdates;
use crate::model::audit_log::{AuditAction, AuditLogEntry};
use crate::model::global_config::{ConfigPatch, GlobalConfig};
use crate::model::leave_request::{LeaveRequest, NewLeave};
use crate::model::notification::{MarkSeen, MarkSeenBatch, NotificationUpdate};
use crate::model::principal::Principal;
use crate::model::reimbursement::{NewClaim, ReimbursementClaim};
use crate::model::request::{Category, Lifecycle, RequestStatus};
use crate::model::role::Role;
use crate::model::user::Applicant;
use crate::service::requests::StatusChange;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Workflow API",
        version = "1.0.0",
        description = r#"
## HR request workflow

Employees submit **leave requests** and **reimbursement claims**; Managers and Admins decide them.

### Key rules
- Admin submissions are approved on creation. Manager leave is auto-approved only while
  `auto_approve_managers` is on. Claims never auto-approve for Managers.
- A rejected request can only be re-approved by an Admin.
- Managers never see requests raised by Admins in the approval queues.
- Every decision is written to the audit log and surfaces once in the owner's notifications.

### Security
All endpoints under `/api` require a **JWT Bearer** access token issued by the identity service.
"#,
    ),
    paths(
        crate::api::auth::me,

        crate::api::admin::get_config,
        crate::api::admin::update_config,
        crate::api::admin::audit_logs,

        crate::api::leave_request::apply_leave,
        crate::api::leave_request::all_leaves,
        crate::api::leave_request::user_leaves,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::update_leave_status,

        crate::api::reimbursement::apply_claim,
        crate::api::reimbursement::all_claims,
        crate::api::reimbursement::user_claims,
        crate::api::reimbursement::get_claim,
        crate::api::reimbursement::update_claim_status,

        crate::api::notification::pending,
        crate::api::notification::mark_seen,
        crate::api::notification::mark_seen_batch
    ),
    components(
        schemas(
            Principal,
            Role,
            GlobalConfig,
            ConfigPatch,
            AuditAction,
            AuditLogEntry,
            RequestStatus,
            Category,
            Lifecycle,
            LeaveRequest,
            NewLeave,
            ReimbursementClaim,
            NewClaim,
            StatusChange,
            Applicant,
            NotificationUpdate,
            MarkSeen,
            MarkSeenBatch,
            PendingUpdates
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Caller identity"),
        (name = "Admin", description = "Global policy switches and audit trail"),
        (name = "Leave", description = "Leave request workflow"),
        (name = "Reimbursement", description = "Expense claim workflow"),
        (name = "Notifications", description = "Decisions awaiting acknowledgement"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/leave/{leave_id}/status"));
        assert!(doc.paths.paths.contains_key("/api/notifications/mark-seen-batch"));

        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
