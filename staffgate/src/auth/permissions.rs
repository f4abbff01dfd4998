//! Authorization policy for the employee directory.
//!
//! [`evaluate`] is a pure function of the caller's [`Principal`] (if any) and the requested
//! [`Action`]. The action carries everything the policy needs about the target, such as the owning
//! username looked up by the handler, so the policy itself never touches storage or ambient state.
//!
//! | Action            | Rule                                                              |
//! |-------------------|-------------------------------------------------------------------|
//! | List all          | Admin sees everything; anyone else is narrowed to their own record |
//! | Read one          | Only the record's owner (admins included, no blanket read)         |
//! | Create / bulk     | Admin only                                                        |
//! | Update            | Admin only                                                        |
//! | Delete            | Admin only, and never the admin's own record                      |
//!
//! Anonymous callers are denied everything. Denials never say why.

use crate::{
    errors::{Error, Result},
    types::{Operation, Principal, Role},
};

/// Roles allowed past the directory gate at all
pub const DIRECTORY_ROLES: &[Role] = &[Role::Admin, Role::User];

/// A requested operation together with the facts about its target the policy depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    ListAll,
    /// `owner` is the username owning the target record, or `None` if the record does not exist
    ReadOne { owner: Option<&'a str> },
    Create,
    CreateBulk,
    Update,
    /// `owner` is the username owning the target record, or `None` if the record does not exist
    Delete { owner: Option<&'a str> },
}

impl Action<'_> {
    pub fn operation(&self) -> Operation {
        match self {
            Action::ListAll => Operation::ListAll,
            Action::ReadOne { .. } => Operation::ReadOne,
            Action::Create => Operation::Create,
            Action::CreateBulk => Operation::CreateBulk,
            Action::Update => Operation::Update,
            Action::Delete { .. } => Operation::Delete,
        }
    }
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Permit,
    /// Permitted, but only over the records owned by this username
    NarrowToOwner(String),
    Deny,
}

pub fn evaluate(principal: Option<&Principal>, action: Action<'_>) -> Decision {
    let Some(principal) = principal else {
        return Decision::Deny;
    };

    let is_owner = |owner: Option<&str>| owner.is_some_and(|o| o == principal.username);

    match action {
        Action::ListAll if principal.is_admin() => Decision::Permit,
        Action::ListAll => Decision::NarrowToOwner(principal.username.clone()),
        Action::ReadOne { owner } if is_owner(owner) => Decision::Permit,
        Action::ReadOne { .. } => Decision::Deny,
        Action::Create | Action::CreateBulk | Action::Update if principal.is_admin() => Decision::Permit,
        Action::Create | Action::CreateBulk | Action::Update => Decision::Deny,
        Action::Delete { owner } if principal.is_admin() && owner.is_some() && !is_owner(owner) => Decision::Permit,
        Action::Delete { .. } => Decision::Deny,
    }
}

/// What a permitted caller may see or touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    OwnedBy(String),
}

/// Evaluate and turn a denial into the matching error.
///
/// Anonymous callers get `Unauthenticated`; authenticated callers get a uniform `Forbidden`
/// whatever the underlying reason (missing record, wrong owner, missing role).
pub fn enforce(principal: Option<&Principal>, action: Action<'_>, resource: &str) -> Result<Scope> {
    match evaluate(principal, action) {
        Decision::Permit => Ok(Scope::All),
        Decision::NarrowToOwner(username) => Ok(Scope::OwnedBy(username)),
        Decision::Deny => Err(denial(principal, action.operation(), resource)),
    }
}

/// Gate applied to every directory route: the caller must be authenticated and hold ADMIN or USER.
pub fn require_directory_access<'p>(principal: Option<&'p Principal>, operation: Operation) -> Result<&'p Principal> {
    match principal {
        Some(p) if p.has_any_role(DIRECTORY_ROLES) => Ok(p),
        _ => Err(denial(principal, operation, "employees")),
    }
}

fn denial(principal: Option<&Principal>, action: Operation, resource: &str) -> Error {
    match principal {
        None => Error::Unauthenticated { message: None },
        Some(_) => Error::Forbidden {
            action,
            resource: resource.to_string(),
        },
    }
}
