//! Employee directory handlers.
//!
//! Every handler first passes the directory gate (authenticated, holding ADMIN or USER), then
//! looks up whatever facts about the target the policy needs and asks
//! [`permissions::enforce`] for a decision before touching storage.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    AppState,
    api::models::employees::{DEFAULT_ROLES, EmployeeCreate, EmployeeResponse, EmployeeUpdate},
    auth::{
        current_user::MaybePrincipal,
        password,
        permissions::{self, Action, Scope},
    },
    config::PasswordConfig,
    errors::{Error, Result},
    types::{Employee, EmployeeId, Operation, Role, RoleSet},
};

const RESOURCE: &str = "employees";

fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Username cannot be empty".to_string(),
        });
    }
    Ok(())
}

fn validate_password(password: &str, config: &PasswordConfig) -> Result<()> {
    let len = password.chars().count();
    if len < config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", config.min_length),
        });
    }
    if len > config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at most {} characters", config.max_length),
        });
    }
    Ok(())
}

fn role_set(roles: Vec<Role>) -> RoleSet {
    if roles.is_empty() {
        DEFAULT_ROLES.iter().copied().collect()
    } else {
        roles.into_iter().collect()
    }
}

/// Validate and hash a create request into a storable record
async fn prepare_new(state: &AppState, create: EmployeeCreate) -> Result<Employee> {
    let password_config = &state.config.auth.password;
    validate_username(&create.username)?;
    validate_password(&create.password, password_config)?;

    let id = match create.emp_id {
        Some(id) if id.trim().is_empty() => {
            return Err(Error::BadRequest {
                message: "empId cannot be empty".to_string(),
            });
        }
        Some(id) => id,
        None => Uuid::new_v4().to_string(),
    };

    let password_hash = password::hash_blocking(create.password, password_config.argon2_params()).await?;

    Ok(Employee {
        id,
        username: create.username,
        password_hash,
        roles: role_set(create.user_roles),
    })
}

fn employee_resource(id: &str) -> String {
    format!("employee {id}")
}

/// List employees. Admins see the whole directory; anyone else sees only their own record.
#[instrument(skip_all)]
pub async fn list_employees(
    State(state): State<AppState>,
    current_user: MaybePrincipal,
) -> Result<Json<Vec<EmployeeResponse>>> {
    let principal = permissions::require_directory_access(current_user.principal(), Operation::ListAll)?;

    let employees = match permissions::enforce(Some(principal), Action::ListAll, RESOURCE)? {
        Scope::All => state.store.list().await?,
        Scope::OwnedBy(username) => state.store.get_by_username(&username).await?.into_iter().collect(),
    };

    Ok(Json(employees.into_iter().map(EmployeeResponse::from).collect()))
}

/// Get one employee. Only the record's owner may read it.
#[instrument(skip_all)]
pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<EmployeeId>,
    current_user: MaybePrincipal,
) -> Result<Json<EmployeeResponse>> {
    let principal = permissions::require_directory_access(current_user.principal(), Operation::ReadOne)?;

    let employee = state.store.get_by_id(&id).await?;
    let owner = employee.as_ref().map(|e| e.username.as_str());
    permissions::enforce(Some(principal), Action::ReadOne { owner }, &employee_resource(&id))?;

    // The policy never permits reading a missing record
    employee.map(|e| Json(e.into())).ok_or_else(|| Error::Forbidden {
        action: Operation::ReadOne,
        resource: employee_resource(&id),
    })
}

#[instrument(skip_all)]
pub async fn create_employee(
    State(state): State<AppState>,
    current_user: MaybePrincipal,
    Json(create): Json<EmployeeCreate>,
) -> Result<(StatusCode, Json<EmployeeResponse>)> {
    let principal = permissions::require_directory_access(current_user.principal(), Operation::Create)?;
    permissions::enforce(Some(principal), Action::Create, RESOURCE)?;

    let employee = prepare_new(&state, create).await?;
    let employee = state.store.create(employee).await?;
    info!(employee_id = %employee.id, created_by = %principal.username, "Created employee");

    Ok((StatusCode::CREATED, Json(employee.into())))
}

/// Create a batch of employees. Either all of them are stored or none are.
#[instrument(skip_all)]
pub async fn create_employees_bulk(
    State(state): State<AppState>,
    current_user: MaybePrincipal,
    Json(creates): Json<Vec<EmployeeCreate>>,
) -> Result<(StatusCode, Json<Vec<EmployeeResponse>>)> {
    let principal = permissions::require_directory_access(current_user.principal(), Operation::CreateBulk)?;
    permissions::enforce(Some(principal), Action::CreateBulk, RESOURCE)?;

    // Validate and hash everything up front so a bad element aborts before any write
    let mut employees = Vec::with_capacity(creates.len());
    for create in creates {
        employees.push(prepare_new(&state, create).await?);
    }

    let employees = state.store.create_many(employees).await?;
    info!(count = employees.len(), created_by = %principal.username, "Created employees in bulk");

    Ok((StatusCode::CREATED, Json(employees.into_iter().map(EmployeeResponse::from).collect())))
}

/// Replace an employee record. The path id wins over any id in the body; a missing password keeps
/// the stored one.
#[instrument(skip_all)]
pub async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<EmployeeId>,
    current_user: MaybePrincipal,
    Json(update): Json<EmployeeUpdate>,
) -> Result<Json<EmployeeResponse>> {
    let principal = permissions::require_directory_access(current_user.principal(), Operation::Update)?;
    permissions::enforce(Some(principal), Action::Update, &employee_resource(&id))?;

    let existing = state.store.get_by_id(&id).await?.ok_or_else(|| Error::NotFound {
        resource: "Employee".to_string(),
        id: id.clone(),
    })?;

    validate_username(&update.username)?;
    let password_hash = match update.password {
        Some(new_password) => {
            let password_config = &state.config.auth.password;
            validate_password(&new_password, password_config)?;
            password::hash_blocking(new_password, password_config.argon2_params()).await?
        }
        None => existing.password_hash,
    };

    let employee = Employee {
        id: id.clone(),
        username: update.username,
        password_hash,
        roles: role_set(update.user_roles),
    };
    let employee = state.store.replace(&id, employee).await?;
    info!(employee_id = %employee.id, updated_by = %principal.username, "Updated employee");

    Ok(Json(employee.into()))
}

/// Delete an employee. Admin only, and an admin may never delete their own record.
#[instrument(skip_all)]
pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<EmployeeId>,
    current_user: MaybePrincipal,
) -> Result<StatusCode> {
    let principal = permissions::require_directory_access(current_user.principal(), Operation::Delete)?;

    let employee = state.store.get_by_id(&id).await?;
    let owner = employee.as_ref().map(|e| e.username.as_str());
    permissions::enforce(Some(principal), Action::Delete { owner }, &employee_resource(&id))?;

    if state.store.delete(&id).await? {
        info!(employee_id = %id, deleted_by = %principal.username, "Deleted employee");
    }
    Ok(StatusCode::NO_CONTENT)
}
