//! User repository over the shared in-memory store.

use async_trait::async_trait;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{EmailAddress, Role, User, UserId};

use super::store::{MemoryStore, StorePoisoned};

/// [`UserRepository`] adapter over a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryUserRepository {
    store: MemoryStore,
}

impl MemoryUserRepository {
    /// Create an adapter view over the store.
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

impl From<StorePoisoned> for UserPersistenceError {
    fn from(_: StorePoisoned) -> Self {
        UserPersistenceError::connection("store lock poisoned")
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut inner = self.store.guard()?;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(UserPersistenceError::duplicate_email(user.email.as_str()));
        }
        inner.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut inner = self.store.guard()?;
        if !inner.users.contains_key(&user.id) {
            return Err(UserPersistenceError::query(format!(
                "no user with id {}",
                user.id
            )));
        }
        inner.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let inner = self.store.guard()?;
        Ok(inner.users.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let inner = self.store.guard()?;
        Ok(inner.users.values().find(|u| &u.email == email).cloned())
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, UserPersistenceError> {
        let inner = self.store.guard()?;
        let mut users: Vec<User> = inner
            .users
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        let mut inner = self.store.guard()?;
        Ok(inner.users.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ParticipantProfile, ParticipantType, PasswordHash};
    use rstest::rstest;

    fn participant(email: &str) -> User {
        User::participant(
            EmailAddress::new(email).expect("email"),
            PasswordHash::derive("pw"),
            ParticipantProfile {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                participant_type: ParticipantType::NonIiit,
                college: None,
                contact_number: None,
            },
        )
        .expect("participant")
    }

    #[rstest]
    #[actix_rt::test]
    async fn insert_enforces_unique_email() {
        let repo = MemoryUserRepository::new(MemoryStore::new());
        repo.insert(&participant("ada@example.com"))
            .await
            .expect("first insert");
        let err = repo
            .insert(&participant("ada@example.com"))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, UserPersistenceError::DuplicateEmail { .. }));
    }

    #[rstest]
    #[actix_rt::test]
    async fn lookup_round_trips_by_id_and_email() {
        let repo = MemoryUserRepository::new(MemoryStore::new());
        let user = participant("ada@example.com");
        repo.insert(&user).await.expect("insert");

        let by_id = repo.find_by_id(&user.id).await.expect("query");
        assert_eq!(by_id.as_ref().map(|u| &u.id), Some(&user.id));

        let by_email = repo
            .find_by_email(&user.email)
            .await
            .expect("query")
            .expect("found");
        assert_eq!(by_email.id, user.id);
    }

    #[rstest]
    #[actix_rt::test]
    async fn update_requires_an_existing_record() {
        let repo = MemoryUserRepository::new(MemoryStore::new());
        let err = repo
            .update(&participant("ghost@example.com"))
            .await
            .expect_err("missing");
        assert!(matches!(err, UserPersistenceError::Query { .. }));
    }

    #[rstest]
    #[actix_rt::test]
    async fn delete_reports_whether_a_record_existed() {
        let repo = MemoryUserRepository::new(MemoryStore::new());
        let user = participant("ada@example.com");
        repo.insert(&user).await.expect("insert");
        assert!(repo.delete(&user.id).await.expect("delete"));
        assert!(!repo.delete(&user.id).await.expect("second delete"));
    }
}
