use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::role::Role;

/// Authenticated actor of a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Principal {
    #[schema(example = 42)]
    pub id: u64,
    pub role: Role,
}

impl Principal {
    pub fn new(id: u64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin clearance required"))
        }
    }

    pub fn require_approver(&self) -> Result<(), AppError> {
        if self.role.is_approver() {
            Ok(())
        } else {
            Err(AppError::forbidden(
                "Forbidden: This action requires one of the following roles: Manager, Admin",
            ))
        }
    }
}
