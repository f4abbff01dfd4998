//! API request/response models for employees.
//!
//! Field names follow the directory's established JSON shape (`empId`, `userRoles`). Roles accept
//! any casing and an optional `ROLE_` prefix on input and are always rendered as `ADMIN`/`USER`.

use serde::{Deserialize, Serialize};

use crate::types::{Employee, EmployeeId, Role};

/// Roles given to a new employee whose request names none
pub const DEFAULT_ROLES: &[Role] = &[Role::User];

#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCreate {
    /// Client-chosen id. A UUID is generated when absent.
    #[serde(default)]
    pub emp_id: Option<EmployeeId>,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub user_roles: Vec<Role>,
}

/// Full replacement of an employee record. The id always comes from the path.
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdate {
    /// Ignored if present; the path id wins
    #[serde(default)]
    pub emp_id: Option<EmployeeId>,
    pub username: String,
    /// `None` keeps the stored password
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub user_roles: Vec<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeResponse {
    pub emp_id: EmployeeId,
    pub username: String,
    pub user_roles: Vec<Role>,
}

impl From<Employee> for EmployeeResponse {
    fn from(employee: Employee) -> Self {
        Self {
            emp_id: employee.id,
            username: employee.username,
            user_roles: employee.roles.into_iter().collect(),
        }
    }
}

impl std::fmt::Debug for EmployeeCreate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmployeeCreate")
            .field("emp_id", &self.emp_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("user_roles", &self.user_roles)
            .finish()
    }
}

impl std::fmt::Debug for EmployeeUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmployeeUpdate")
            .field("emp_id", &self.emp_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("user_roles", &self.user_roles)
            .finish()
    }
}
