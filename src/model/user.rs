use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

/// Directory record of an employee, maintained by the identity side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub role: Role,
    pub department: Option<String>,
}

/// Applicant details attached to listed requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Applicant {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "Employee")]
    pub role: String,
    pub department: Option<String>,
}

impl Applicant {
    /// Stand-in for a request whose employee record is gone.
    pub fn placeholder() -> Self {
        Self {
            name: "System User".to_string(),
            role: "Unknown".to_string(),
            department: None,
        }
    }
}

impl From<&User> for Applicant {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            role: user.role.to_string(),
            department: user.department.clone(),
        }
    }
}

/// A request together with who raised it.
#[derive(Debug, Clone, Serialize)]
pub struct Listed<R> {
    #[serde(flatten)]
    pub request: R,
    pub applicant: Applicant,
}
