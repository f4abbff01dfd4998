//! In-process employee store.

use std::collections::{BTreeMap, HashMap, HashSet};

use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::{EmployeeStore, Result, StoreError};
use crate::types::{Employee, EmployeeId};

#[derive(Debug, Default)]
struct Inner {
    by_id: BTreeMap<EmployeeId, Employee>,
    // username -> id
    usernames: HashMap<String, EmployeeId>,
}

impl Inner {
    fn check_unique(&self, employee: &Employee) -> Result<()> {
        if self.by_id.contains_key(&employee.id) {
            return Err(StoreError::UniqueViolation {
                field: "id".to_string(),
                value: employee.id.clone(),
            });
        }
        if self.usernames.contains_key(&employee.username) {
            return Err(StoreError::UniqueViolation {
                field: "username".to_string(),
                value: employee.username.clone(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, employee: Employee) {
        self.usernames.insert(employee.username.clone(), employee.id.clone());
        self.by_id.insert(employee.id.clone(), employee);
    }
}

/// Employee store backed by in-memory maps behind a single lock.
///
/// All mutations take the write lock for their whole duration, so batch inserts are atomic with
/// respect to concurrent readers and writers.
#[derive(Debug, Default)]
pub struct InMemoryEmployees {
    inner: RwLock<Inner>,
}

impl InMemoryEmployees {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl EmployeeStore for InMemoryEmployees {
    async fn get_by_id(&self, id: &str) -> Result<Option<Employee>> {
        Ok(self.inner.read().await.by_id.get(id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Employee>> {
        let inner = self.inner.read().await;
        Ok(inner.usernames.get(username).and_then(|id| inner.by_id.get(id)).cloned())
    }

    async fn list(&self) -> Result<Vec<Employee>> {
        Ok(self.inner.read().await.by_id.values().cloned().collect())
    }

    #[instrument(skip_all, fields(employee_id = %employee.id))]
    async fn create(&self, employee: Employee) -> Result<Employee> {
        let mut inner = self.inner.write().await;
        inner.check_unique(&employee)?;
        inner.insert(employee.clone());
        debug!("Stored employee");
        Ok(employee)
    }

    #[instrument(skip_all, fields(count = employees.len()))]
    async fn create_many(&self, employees: Vec<Employee>) -> Result<Vec<Employee>> {
        let mut inner = self.inner.write().await;

        // Validate the whole batch (against storage and against itself) before touching anything
        let mut batch_ids = HashSet::new();
        let mut batch_usernames = HashSet::new();
        for employee in &employees {
            inner.check_unique(employee)?;
            if !batch_ids.insert(employee.id.as_str()) {
                return Err(StoreError::UniqueViolation {
                    field: "id".to_string(),
                    value: employee.id.clone(),
                });
            }
            if !batch_usernames.insert(employee.username.as_str()) {
                return Err(StoreError::UniqueViolation {
                    field: "username".to_string(),
                    value: employee.username.clone(),
                });
            }
        }

        for employee in &employees {
            inner.insert(employee.clone());
        }
        debug!("Stored employee batch");
        Ok(employees)
    }

    #[instrument(skip_all, fields(employee_id = %id))]
    async fn replace(&self, id: &str, mut employee: Employee) -> Result<Employee> {
        let mut inner = self.inner.write().await;
        let existing = inner.by_id.get(id).ok_or(StoreError::NotFound)?;

        employee.id = id.to_string();
        if existing.username != employee.username {
            if inner.usernames.contains_key(&employee.username) {
                return Err(StoreError::UniqueViolation {
                    field: "username".to_string(),
                    value: employee.username.clone(),
                });
            }
            let old_username = existing.username.clone();
            inner.usernames.remove(&old_username);
        }

        inner.insert(employee.clone());
        Ok(employee)
    }

    #[instrument(skip_all, fields(employee_id = %id))]
    async fn delete(&self, id: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.by_id.remove(id) {
            Some(removed) => {
                inner.usernames.remove(&removed.username);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn employee(id: &str, username: &str) -> Employee {
        Employee {
            id: id.to_string(),
            username: username.to_string(),
            password_hash: "hash".to_string(),
            roles: [Role::User].into_iter().collect(),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let store = InMemoryEmployees::new();
        store.create(employee("EMP001", "alice")).await.unwrap();

        let by_id = store.get_by_id("EMP001").await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        let by_name = store.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, "EMP001");

        assert!(store.get_by_id("EMP999").await.unwrap().is_none());
        assert!(store.get_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_constraints() {
        let store = InMemoryEmployees::new();
        store.create(employee("EMP001", "alice")).await.unwrap();

        let err = store.create(employee("EMP001", "bob")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { ref field, .. } if field == "id"));

        let err = store.create(employee("EMP002", "alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { ref field, .. } if field == "username"));
    }

    #[tokio::test]
    async fn test_create_many_is_all_or_nothing() {
        let store = InMemoryEmployees::new();
        store.create(employee("EMP001", "alice")).await.unwrap();

        // Second element collides with an existing username
        let result = store
            .create_many(vec![employee("EMP002", "bob"), employee("EMP003", "alice")])
            .await;
        assert!(result.is_err());
        assert!(store.get_by_id("EMP002").await.unwrap().is_none());

        // Duplicates within the batch itself are rejected as well
        let result = store
            .create_many(vec![employee("EMP002", "bob"), employee("EMP003", "bob")])
            .await;
        assert!(result.is_err());
        assert_eq!(store.list().await.unwrap().len(), 1);

        let created = store
            .create_many(vec![employee("EMP002", "bob"), employee("EMP003", "carol")])
            .await
            .unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(store.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_replace_reindexes_username() {
        let store = InMemoryEmployees::new();
        store.create(employee("EMP001", "alice")).await.unwrap();
        store.create(employee("EMP002", "bob")).await.unwrap();

        let updated = store.replace("EMP001", employee("ignored", "alicia")).await.unwrap();
        assert_eq!(updated.id, "EMP001");
        assert!(store.get_by_username("alice").await.unwrap().is_none());
        assert_eq!(store.get_by_username("alicia").await.unwrap().unwrap().id, "EMP001");

        let err = store.replace("EMP001", employee("EMP001", "bob")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));

        let err = store.replace("EMP404", employee("EMP404", "zed")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryEmployees::new();
        store.create(employee("EMP001", "alice")).await.unwrap();

        assert!(store.delete("EMP001").await.unwrap());
        assert!(!store.delete("EMP001").await.unwrap());
        assert!(store.get_by_username("alice").await.unwrap().is_none());

        // Username is free again
        store.create(employee("EMP002", "alice")).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let store = InMemoryEmployees::new();
        store.create(employee("EMP003", "carol")).await.unwrap();
        store.create(employee("EMP001", "alice")).await.unwrap();
        store.create(employee("EMP002", "bob")).await.unwrap();

        let ids: Vec<_> = store.list().await.unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["EMP001", "EMP002", "EMP003"]);
    }
}
