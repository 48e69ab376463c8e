use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::global_config::GlobalConfig;
use crate::model::role::Role;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn is_decided(self) -> bool {
        self != RequestStatus::Pending
    }
}

/// Discriminates the two request kinds wherever they share a surface.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, ToSchema)]
pub enum Category {
    Leave,
    Expense,
}

/// Status-tracking fields shared by every request kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Lifecycle {
    /// Role of the submitter at submission time; drives visibility and hierarchy checks.
    pub owner_role: Role,
    pub status: RequestStatus,
    /// Empty when the approver gave no reason.
    pub admin_reason: String,
    pub updated_by: Option<u64>,
    pub notified: bool,
    /// Bumped on every applied decision; guards compare-and-swap updates.
    pub version: u32,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,
}

impl Lifecycle {
    pub fn new(owner_role: Role, status: RequestStatus, now: DateTime<Utc>) -> Self {
        Self {
            owner_role,
            status,
            admin_reason: String::new(),
            updated_by: None,
            notified: false,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, decision: &Decision) {
        self.status = decision.status;
        self.admin_reason = decision.admin_reason.clone();
        self.updated_by = Some(decision.updated_by);
        self.updated_at = decision.decided_at;
        self.notified = false;
        self.version += 1;
    }
}

/// A status change that passed policy evaluation and is ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub status: RequestStatus,
    pub admin_reason: String,
    pub updated_by: u64,
    pub decided_at: DateTime<Utc>,
}

/// Behaviour shared by leave requests and reimbursement claims.
pub trait WorkflowRequest: Clone + Serialize + Send + Sync + 'static {
    /// Validated submission payload.
    type Draft: Send + 'static;

    const CATEGORY: Category;

    fn materialize(id: u64, employee_id: u64, draft: Self::Draft, lifecycle: Lifecycle) -> Self;

    fn id(&self) -> u64;

    fn employee_id(&self) -> u64;

    fn lifecycle(&self) -> &Lifecycle;

    fn lifecycle_mut(&mut self) -> &mut Lifecycle;

    /// Short human description used in audit details and notifications.
    fn label(&self) -> String;

    /// Status a fresh submission starts in.
    fn initial_status(role: Role, config: &GlobalConfig) -> RequestStatus;

    fn status(&self) -> RequestStatus {
        self.lifecycle().status
    }

    fn has_unseen_decision(&self) -> bool {
        let lifecycle = self.lifecycle();
        lifecycle.status.is_decided() && !lifecycle.notified
    }
}
