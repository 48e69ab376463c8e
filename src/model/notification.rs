use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::request::{Category, RequestStatus, WorkflowRequest};

/// A decided request its owner has not acknowledged yet.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NotificationUpdate {
    #[schema(example = 12)]
    pub id: u64,
    pub category: Category,
    pub status: RequestStatus,
    #[schema(example = "Taxi | 500")]
    pub label: String,
    pub admin_reason: String,
    pub updated_by: Option<u64>,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,
    /// Echo this in `MarkSeen` so a later decision is not acknowledged unseen.
    #[schema(example = 1)]
    pub version: u32,
}

impl NotificationUpdate {
    pub fn from_request<R: WorkflowRequest>(request: &R) -> Self {
        let lifecycle = request.lifecycle();
        Self {
            id: request.id(),
            category: R::CATEGORY,
            status: lifecycle.status,
            label: request.label(),
            admin_reason: lifecycle.admin_reason.clone(),
            updated_by: lifecycle.updated_by,
            updated_at: lifecycle.updated_at,
            version: lifecycle.version,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MarkSeen {
    #[schema(example = 12)]
    pub id: u64,
    pub category: Category,
    /// Version from the notification that was shown; the current one when absent.
    #[serde(default)]
    #[schema(example = 1, nullable = true)]
    pub version: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MarkSeenBatch {
    #[schema(example = json!([12, 13]))]
    pub ids: Vec<u64>,
    pub category: Category,
}
