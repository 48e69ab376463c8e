use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Process-wide policy switches. At most one live record exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "auto_approve_managers": false,
    "strict_role_validation": true,
    "mfa_enabled": false,
    "updated_by": 1,
    "last_updated": "2026-01-01T00:00:00Z"
}))]
pub struct GlobalConfig {
    /// A Manager's own leave is created Approved.
    pub auto_approve_managers: bool,
    /// Approvers below Admin may not decide their own requests or Admin-raised ones.
    pub strict_role_validation: bool,
    /// Carried for the identity side; not enforced here.
    pub mfa_enabled: bool,
    pub updated_by: Option<u64>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            auto_approve_managers: false,
            strict_role_validation: true,
            mfa_enabled: false,
            updated_by: None,
            last_updated: None,
        }
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct ConfigPatch {
    #[schema(example = true)]
    pub auto_approve_managers: Option<bool>,
    pub strict_role_validation: Option<bool>,
    pub mfa_enabled: Option<bool>,
}

impl ConfigPatch {
    /// `field=value` pairs of the fields actually present.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(v) = self.auto_approve_managers {
            parts.push(format!("auto_approve_managers={v}"));
        }
        if let Some(v) = self.strict_role_validation {
            parts.push(format!("strict_role_validation={v}"));
        }
        if let Some(v) = self.mfa_enabled {
            parts.push(format!("mfa_enabled={v}"));
        }
        if parts.is_empty() {
            "no fields changed".to_string()
        } else {
            parts.join(", ")
        }
    }
}

impl GlobalConfig {
    pub fn apply(mut self, patch: &ConfigPatch, updated_by: u64, now: DateTime<Utc>) -> Self {
        if let Some(v) = patch.auto_approve_managers {
            self.auto_approve_managers = v;
        }
        if let Some(v) = patch.strict_role_validation {
            self.strict_role_validation = v;
        }
        if let Some(v) = patch.mfa_enabled {
            self.mfa_enabled = v;
        }
        self.updated_by = Some(updated_by);
        self.last_updated = Some(now);
        self
    }
}
