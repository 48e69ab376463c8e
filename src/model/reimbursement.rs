use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ValidationErrors;
use crate::model::global_config::GlobalConfig;
use crate::model::request::{Category, Lifecycle, RequestStatus, WorkflowRequest};
use crate::model::role::Role;
use crate::service::policy;
use crate::utils::proof;

pub const TITLE_MAX_CHARS: usize = 255;
pub const PROOF_MAX_CHARS: usize = 512;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReimbursementClaim {
    #[schema(example = 12)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "Taxi")]
    pub title: String,
    #[schema(example = 500.0)]
    pub amount: f64,
    /// Relative reference to the stored proof document.
    #[schema(example = "uploads/1767225600000-receipt.pdf", nullable = true)]
    pub proof: Option<String>,
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewClaim {
    #[schema(example = "Taxi")]
    pub title: String,
    #[schema(example = 500.0)]
    pub amount: f64,
    #[schema(example = "uploads/1767225600000-receipt.pdf", nullable = true)]
    pub proof: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClaimDraft {
    pub title: String,
    pub amount: f64,
    pub proof: Option<String>,
}

impl TryFrom<NewClaim> for ClaimDraft {
    type Error = ValidationErrors;

    fn try_from(value: NewClaim) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::default();

        let title = value.title.trim().to_string();
        if title.is_empty() {
            errors.push("title", "must not be empty");
        }
        errors.max_chars("title", &title, TITLE_MAX_CHARS);
        if !value.amount.is_finite() || value.amount <= 0.0 {
            errors.push("amount", "must be a positive number");
        }

        let proof = match value.proof.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(reference) if reference.chars().count() > PROOF_MAX_CHARS => {
                errors.push("proof", format!("must be at most {PROOF_MAX_CHARS} characters"));
                None
            }
            Some(reference) => match proof::check_reference(reference) {
                Ok(()) => Some(reference.to_string()),
                Err(message) => {
                    errors.push("proof", message);
                    None
                }
            },
        };

        errors.finish(ClaimDraft {
            title,
            amount: value.amount,
            proof,
        })
    }
}

impl WorkflowRequest for ReimbursementClaim {
    type Draft = ClaimDraft;

    const CATEGORY: Category = Category::Expense;

    fn materialize(id: u64, employee_id: u64, draft: ClaimDraft, lifecycle: Lifecycle) -> Self {
        Self {
            id,
            employee_id,
            title: draft.title,
            amount: draft.amount,
            proof: draft.proof,
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
        format!("{} | {}", self.title, self.amount)
    }

    fn initial_status(role: Role, _config: &GlobalConfig) -> RequestStatus {
        policy::claim_initial_status(role)
    }
}
