use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::{IntoParams, ToSchema};

use crate::model::request::{Category, RequestStatus};

/// Tagged name of a privileged mutation.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    LeaveSubmitted,
    LeaveApproved,
    LeaveRejected,
    ReimbursementSubmitted,
    ReimbursementApproved,
    ReimbursementRejected,
    ConfigUpdated,
}

impl AuditAction {
    pub fn submitted(category: Category) -> Self {
        match category {
            Category::Leave => AuditAction::LeaveSubmitted,
            Category::Expense => AuditAction::ReimbursementSubmitted,
        }
    }

    /// `None` for `Pending`, which is never a decision.
    pub fn decided(category: Category, status: RequestStatus) -> Option<Self> {
        match (category, status) {
            (_, RequestStatus::Pending) => None,
            (Category::Leave, RequestStatus::Approved) => Some(AuditAction::LeaveApproved),
            (Category::Leave, RequestStatus::Rejected) => Some(AuditAction::LeaveRejected),
            (Category::Expense, RequestStatus::Approved) => Some(AuditAction::ReimbursementApproved),
            (Category::Expense, RequestStatus::Rejected) => Some(AuditAction::ReimbursementRejected),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuditLogEntry {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1)]
    pub actor_id: u64,
    pub action: AuditAction,
    #[schema(example = "12")]
    pub target_id: String,
    #[schema(example = "Admin approved Taxi | 500 for Jane Doe")]
    pub details: String,
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: DateTime<Utc>,
}

/// Entry as handed to the store; id and timestamp are assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub actor_id: u64,
    pub action: AuditAction,
    pub target_id: String,
    pub details: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams, ToSchema)]
pub struct AuditFilter {
    /// Only entries written by this principal
    pub actor_id: Option<u64>,
    /// Only entries with this action tag
    #[param(value_type = Option<String>, example = "REIMBURSEMENT_APPROVED")]
    pub action: Option<AuditAction>,
    /// Only entries about this target
    pub target_id: Option<String>,
}

impl AuditFilter {
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.actor_id.is_none_or(|id| entry.actor_id == id)
            && self.action.is_none_or(|action| entry.action == action)
            && self
                .target_id
                .as_deref()
                .is_none_or(|target| entry.target_id == target)
    }
}
