use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ValidationErrors;
use crate::model::global_config::GlobalConfig;
use crate::model::request::{Category, Lifecycle, RequestStatus, WorkflowRequest};
use crate::model::role::Role;
use crate::service::policy;

pub const LEAVE_TYPE_MAX_CHARS: usize = 64;
pub const LEAVE_REASON_MAX_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "annual")]
    pub leave_type: String,
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2026-01-12", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    #[schema(example = "family event")]
    pub reason: String,
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
}

/// Leave submission body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewLeave {
    #[schema(example = "annual")]
    pub leave_type: String,
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2026-01-12", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    #[schema(example = "family event")]
    pub reason: String,
}

/// A leave submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveDraft {
    pub leave_type: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub reason: String,
}

impl TryFrom<NewLeave> for LeaveDraft {
    type Error = ValidationErrors;

    fn try_from(value: NewLeave) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::default();

        let leave_type = value.leave_type.trim().to_string();
        if leave_type.is_empty() {
            errors.push("leave_type", "must not be empty");
        }
        errors.max_chars("leave_type", &leave_type, LEAVE_TYPE_MAX_CHARS);
        let reason = value.reason.trim().to_string();
        if reason.is_empty() {
            errors.push("reason", "must not be empty");
        }
        errors.max_chars("reason", &reason, LEAVE_REASON_MAX_CHARS);
        if value.from_date > value.to_date {
            errors.push("to_date", "must not be before from_date");
        }

        errors.finish(LeaveDraft {
            leave_type,
            from_date: value.from_date,
            to_date: value.to_date,
            reason,
        })
    }
}

impl WorkflowRequest for LeaveRequest {
    type Draft = LeaveDraft;

    const CATEGORY: Category = Category::Leave;

    fn materialize(id: u64, employee_id: u64, draft: LeaveDraft, lifecycle: Lifecycle) -> Self {
        Self {
            id,
            employee_id,
            leave_type: draft.leave_type,
            from_date: draft.from_date,
            to_date: draft.to_date,
            reason: draft.reason,
            lifecycle,
        }
    }

    fn id(&self) -> u64 {
        self.id
    }

    fn employee_id(&self) -> u64 {
        self.employee_id
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn label(&self) -> String {
        format!("{} leave {} to {}", self.leave_type, self.from_date, self.to_date)
    }

    fn initial_status(role: Role, config: &GlobalConfig) -> RequestStatus {
        policy::leave_initial_status(role, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(from: &str, to: &str) -> NewLeave {
        NewLeave {
            leave_type: "annual".into(),
            from_date: from.parse().unwrap(),
            to_date: to.parse().unwrap(),
            reason: " family event ".into(),
        }
    }

    #[test]
    fn accepts_single_day_leave() {
        let draft = LeaveDraft::try_from(payload("2025-01-10", "2025-01-10")).unwrap();
        assert_eq!(draft.reason, "family event");
    }

    #[test]
    fn rejects_blank_fields_and_inverted_range() {
        let mut body = payload("2025-01-12", "2025-01-10");
        body.leave_type = "  ".into();
        body.reason = String::new();

        let errors = LeaveDraft::try_from(body).unwrap_err();
        let fields: Vec<_> = errors.0.iter().map(|e| e.field).collect();
        assert_eq!(fields, ["leave_type", "reason", "to_date"]);
    }

    #[test]
    fn rejects_overlong_type_and_reason() {
        let mut body = payload("2025-01-10", "2025-01-11");
        body.leave_type = "x".repeat(LEAVE_TYPE_MAX_CHARS + 1);
        body.reason = "y".repeat(LEAVE_REASON_MAX_CHARS + 1);

        let errors = LeaveDraft::try_from(body).unwrap_err();
        let fields: Vec<_> = errors.0.iter().map(|e| e.field).collect();
        assert_eq!(fields, ["leave_type", "reason"]);

        let mut body = payload("2025-01-10", "2025-01-11");
        body.leave_type = "é".repeat(LEAVE_TYPE_MAX_CHARS);
        assert!(LeaveDraft::try_from(body).is_ok());
    }

    #[test]
    fn deserializes_missing_dates_as_error() {
        let body = serde_json::json!({ "leave_type": "sick", "reason": "flu" });
        assert!(serde_json::from_value::<NewLeave>(body).is_err());
    }
}
