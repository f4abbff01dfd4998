//! Employee record storage.
//!
//! The directory is a key-value store addressed by employee id, with a unique secondary index on
//! username. The auth core only ever reads through it (login looks records up by username, the
//! policy looks up owners by id); the API handlers perform the writes.
//!
//! [`InMemoryEmployees`] is the bundled backend. Anything implementing [`EmployeeStore`] can be
//! plugged into [`crate::AppState`] instead.

pub mod errors;
pub mod memory;

pub use errors::{Result, StoreError};
pub use memory::InMemoryEmployees;

use crate::types::Employee;

/// Storage trait for employee records.
#[async_trait::async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Get an employee by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<Employee>>;

    /// Get an employee by their unique username
    async fn get_by_username(&self, username: &str) -> Result<Option<Employee>>;

    /// List every employee, ordered by ID
    async fn list(&self) -> Result<Vec<Employee>>;

    /// Insert a new employee. Fails with `UniqueViolation` if the ID or username is taken.
    async fn create(&self, employee: Employee) -> Result<Employee>;

    /// Insert a batch of employees. Either every record is stored or none is.
    async fn create_many(&self, employees: Vec<Employee>) -> Result<Vec<Employee>>;

    /// Replace the record stored under `id`. Fails with `NotFound` if there is none.
    async fn replace(&self, id: &str, employee: Employee) -> Result<Employee>;

    /// Delete an employee by ID, returning whether a record was removed
    async fn delete(&self, id: &str) -> Result<bool>;
}
