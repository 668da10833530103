use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::users::{
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User, UserChanges},
};

/// In-process store used by tests in place of Postgres.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn apply(changes: UserChanges, user: &mut User) {
    if let Some(v) = changes.name {
        user.name = v;
    }
    if let Some(v) = changes.email {
        user.email = v;
    }
    if let Some(v) = changes.image {
        user.image = v;
    }
    if let Some(v) = changes.address {
        user.address = v;
    }
    if let Some(v) = changes.phone_number {
        user.phone_number = v;
    }
    if let Some(v) = changes.user_skills {
        user.user_skills = v;
    }
    if let Some(v) = changes.price_per_hour {
        user.price_per_hour = v;
    }
    if let Some(v) = changes.password_hash {
        user.password_hash = v;
    }
    if let Some(v) = changes.auth_token {
        user.auth_token = Some(v);
    }
    user.updated_at = OffsetDateTime::now_utc();
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert(&self, new: NewUser) -> Result<User, StoreError> {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: new.id,
            name: new.name,
            email: new.email,
            image: new.image,
            address: new.address,
            phone_number: new.phone_number,
            user_skills: new.user_skills,
            price_per_hour: new.price_per_hour,
            password_hash: new.password_hash,
            auth_token: new.auth_token,
            created_at: now,
            updated_at: now,
        };
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        if users.contains_key(&user.id) {
            return Err(StoreError::Other(anyhow::anyhow!("duplicate id {}", user.id)));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        if let Some(email) = &changes.email {
            if users.values().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::DuplicateEmail);
            }
        }
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        apply(changes, user);
        Ok(Some(user.clone()))
    }

    async fn delete_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.write().await.remove(&id))
    }

    async fn find_all(&self) -> anyhow::Result<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
            ..NewUser::default()
        }
    }

    #[tokio::test]
    async fn lookups_return_none_when_absent() {
        let store = MemoryUserStore::new();
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert!(store.find_by_email("nobody@example.com").await.unwrap().is_none());
        assert!(store.delete_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert!(store
            .update_by_id(Uuid::new_v4(), UserChanges::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_touches_only_supplied_fields() {
        let store = MemoryUserStore::new();
        let created = store
            .insert(NewUser {
                address: Some("1 Main St".into()),
                user_skills: vec!["rust".into()],
                ..new_user("a@example.com")
            })
            .await
            .unwrap();

        let updated = store
            .update_by_id(
                created.id,
                UserChanges {
                    name: Some(Some("Ada".into())),
                    ..UserChanges::default()
                },
            )
            .await
            .unwrap()
            .expect("record exists");

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name.as_deref(), Some("Ada"));
        assert_eq!(updated.address.as_deref(), Some("1 Main St"));
        assert_eq!(updated.user_skills, vec!["rust".to_string()]);
        assert_eq!(updated.password_hash, created.password_hash);
    }

    #[tokio::test]
    async fn delete_returns_removed_record() {
        let store = MemoryUserStore::new();
        let created = store.insert(new_user("b@example.com")).await.unwrap();
        let deleted = store.delete_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(deleted.id, created.id);
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        store.insert(new_user("c@example.com")).await.unwrap();
        assert!(matches!(
            store.insert(new_user("c@example.com")).await,
            Err(StoreError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn update_cannot_take_another_users_email() {
        let store = MemoryUserStore::new();
        store.insert(new_user("d@example.com")).await.unwrap();
        let other = store.insert(new_user("e@example.com")).await.unwrap();
        let res = store
            .update_by_id(
                other.id,
                UserChanges {
                    email: Some("d@example.com".into()),
                    ..UserChanges::default()
                },
            )
            .await;
        assert!(matches!(res, Err(StoreError::DuplicateEmail)));

        // Re-saving its own email is not a conflict.
        let res = store
            .update_by_id(
                other.id,
                UserChanges {
                    email: Some("e@example.com".into()),
                    ..UserChanges::default()
                },
            )
            .await;
        assert!(res.unwrap().is_some());
    }

    #[tokio::test]
    async fn insert_keeps_caller_id_and_token() {
        let store = MemoryUserStore::new();
        let id = Uuid::new_v4();
        store
            .insert(NewUser {
                id,
                auth_token: Some("tok".into()),
                ..new_user("f@example.com")
            })
            .await
            .unwrap();
        let stored = store.find_by_id(id).await.unwrap().expect("stored");
        assert_eq!(stored.auth_token.as_deref(), Some("tok"));
        assert_eq!(stored.created_at, stored.updated_at);
    }

    #[tokio::test]
    async fn explicit_null_clears_optional_field() {
        let store = MemoryUserStore::new();
        let created = store
            .insert(NewUser {
                image: Some("me.png".into()),
                price_per_hour: Some(50.0),
                ..new_user("g@example.com")
            })
            .await
            .unwrap();
        let updated = store
            .update_by_id(
                created.id,
                UserChanges {
                    image: Some(None),
                    ..UserChanges::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(updated.image.is_none());
        assert_eq!(updated.price_per_hour, Some(50.0));
    }
}
