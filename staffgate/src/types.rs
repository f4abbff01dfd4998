//! Common type definitions shared by the auth, storage and API layers.
//!
//! This module defines:
//! - [`Role`] and [`RoleSet`]: the typed role vocabulary used for every authorization check
//! - [`Principal`]: the identity resolved for a single request
//! - [`Employee`]: the stored record the directory API manages
//! - [`Operation`]: the actions the authorization policy distinguishes
//!
//! # Roles
//!
//! Roles are compared as enum values, never as decorated strings. Incoming role names are
//! normalised on parse: case is ignored and a legacy `ROLE_` prefix is dropped, so `"admin"`,
//! `"ADMIN"` and `"ROLE_ADMIN"` all parse to [`Role::Admin`]. On the wire roles are always
//! rendered uppercase.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// Employee ids are opaque strings: either supplied by the client (e.g. "EMP001") or a generated
// UUID.
pub type EmployeeId = String;

/// Ordered set of roles. Duplicates collapse and iteration order is stable.
pub type RoleSet = BTreeSet<Role>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        match name {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The authenticated identity attached to one request.
///
/// Built fresh by the authentication middleware (or by the login path) and passed explicitly to
/// the authorization policy. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub roles: RoleSet,
}

impl Principal {
    pub fn new(username: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            username: username.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.roles.contains(r))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

/// A stored employee record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: EmployeeId,
    pub username: String,
    pub password_hash: String,
    pub roles: RoleSet,
}

// Operations the authorization policy distinguishes between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListAll,
    ReadOne,
    Create,
    CreateBulk,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ListAll | Operation::ReadOne => write!(f, "read"),
            Operation::Create | Operation::CreateBulk => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_is_normalised() {
        for raw in ["admin", "ADMIN", "Admin", "ROLE_ADMIN", "role_admin", " admin "] {
            assert_eq!(raw.parse::<Role>().unwrap(), Role::Admin, "failed for {raw:?}");
        }
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("manager".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_uppercase() {
        let json = serde_json::to_string(&vec![Role::Admin, Role::User]).unwrap();
        assert_eq!(json, r#"["ADMIN","USER"]"#);

        let parsed: Vec<Role> = serde_json::from_str(r#"["admin","ROLE_USER"]"#).unwrap();
        assert_eq!(parsed, vec![Role::Admin, Role::User]);
    }

    #[test]
    fn test_principal_roles_collapse_duplicates() {
        let principal = Principal::new("alice", [Role::User, Role::User, Role::Admin]);
        assert_eq!(principal.roles.len(), 2);
        assert!(principal.is_admin());
        assert!(principal.has_any_role(&[Role::User]));

        let plain = Principal::new("bob", []);
        assert!(!plain.has_any_role(&[Role::Admin, Role::User]));
    }
}
