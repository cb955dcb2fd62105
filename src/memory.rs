use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{repo::UserRepo, PublicUser, User},
    error::StoreError,
    projects::{
        repo::ProjectRepo,
        repo_types::{Project, ProjectChanges, DEFAULT_STATUS},
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    projects: Vec<Project>,
    members: Vec<Membership>,
}

struct Membership {
    project_id: Uuid,
    user_id: Uuid,
    joined_at: OffsetDateTime,
}

/// Process-local store backing both repos. Every call holds the lock for its
/// whole duration, so each mutation is atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let mut t = self.inner.write().await;
        if t
            .users
            .iter()
            .any(|u| u.username == username || u.email == email)
        {
            return Err(StoreError::Conflict);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let t = self.inner.read().await;
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let t = self.inner.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_conflict(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError> {
        let t = self.inner.read().await;
        Ok(t
            .users
            .iter()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }
}

#[async_trait]
impl ProjectRepo for MemoryStore {
    async fn create(
        &self,
        creator_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Project, StoreError> {
        let mut t = self.inner.write().await;
        let now = OffsetDateTime::now_utc();
        let project = Project {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.map(str::to_string),
            status: DEFAULT_STATUS.to_string(),
            created_at: now,
            updated_at: now,
            creator_id,
        };
        t.projects.push(project.clone());
        Ok(project)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        let t = self.inner.read().await;
        Ok(t.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list_by_owner(
        &self,
        owner: Uuid,
        status: Option<&str>,
    ) -> Result<Vec<Project>, StoreError> {
        let t = self.inner.read().await;
        Ok(t
            .projects
            .iter()
            .filter(|p| p.creator_id == owner)
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, StoreError> {
        let mut t = self.inner.write().await;
        let Some(p) = t.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            p.name = name.clone();
        }
        if let Some(description) = &changes.description {
            p.description = Some(description.clone());
        }
        if let Some(status) = &changes.status {
            p.status = status.clone();
        }
        p.updated_at = OffsetDateTime::now_utc().max(p.updated_at);
        Ok(Some(p.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut t = self.inner.write().await;
        let before = t.projects.len();
        t.projects.retain(|p| p.id != id);
        let removed = t.projects.len() != before;
        if removed {
            t.members.retain(|m| m.project_id != id);
        }
        Ok(removed)
    }

    async fn members(&self, project_id: Uuid) -> Result<Vec<PublicUser>, StoreError> {
        let t = self.inner.read().await;
        let mut rows: Vec<&Membership> = t
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .collect();
        rows.sort_by_key(|m| m.joined_at);
        Ok(rows
            .into_iter()
            .filter_map(|m| t.users.iter().find(|u| u.id == m.user_id))
            .map(PublicUser::from)
            .collect())
    }

    async fn add_member(&self, project_id: Uuid, user_id: Uuid) -> Result<(), StoreError> {
        let mut t = self.inner.write().await;
        if t
            .members
            .iter()
            .any(|m| m.project_id == project_id && m.user_id == user_id)
        {
            return Err(StoreError::Conflict);
        }
        t.members.push(Membership {
            project_id,
            user_id,
            joined_at: OffsetDateTime::now_utc(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn user_uniqueness_is_enforced() {
        let store = MemoryStore::new();
        UserRepo::create(&store, "alice", "a@x.com", "h").await.unwrap();
        assert!(matches!(
            UserRepo::create(&store, "alice", "b@x.com", "h").await,
            Err(StoreError::Conflict)
        ));
        assert!(matches!(
            UserRepo::create(&store, "bob", "a@x.com", "h").await,
            Err(StoreError::Conflict)
        ));
        assert!(store.find_conflict("carol", "c@x.com").await.unwrap().is_none());
        assert!(store.find_conflict("carol", "a@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_drops_memberships() {
        let store = MemoryStore::new();
        let alice = UserRepo::create(&store, "alice", "a@x.com", "h").await.unwrap();
        let bob = UserRepo::create(&store, "bob", "b@x.com", "h").await.unwrap();
        let p = ProjectRepo::create(&store, alice.id, "P", None).await.unwrap();
        store.add_member(p.id, bob.id).await.unwrap();
        assert!(matches!(
            store.add_member(p.id, bob.id).await,
            Err(StoreError::Conflict)
        ));

        assert!(store.delete(p.id).await.unwrap());
        assert!(store.members(p.id).await.unwrap().is_empty());
        assert!(!store.delete(p.id).await.unwrap());
    }

    #[tokio::test]
    async fn update_of_missing_project_is_none() {
        let store = MemoryStore::new();
        let res = store
            .update(Uuid::new_v4(), &ProjectChanges::default())
            .await
            .unwrap();
        assert!(res.is_none());
    }
}
