use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{Project, ProjectChanges, DEFAULT_STATUS};
use crate::{auth::PublicUser, error::StoreError};

/// Persistence seam for projects and their membership relation.
#[async_trait]
pub trait ProjectRepo: Send + Sync {
    async fn create(
        &self,
        creator_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Project, StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<Project>, StoreError>;
    /// Projects created by `owner`, oldest first, optionally matching `status` exactly.
    async fn list_by_owner(
        &self,
        owner: Uuid,
        status: Option<&str>,
    ) -> Result<Vec<Project>, StoreError>;
    /// Applies `changes` and refreshes `updated_at`. `None` if the project is gone.
    async fn update(
        &self,
        id: Uuid,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, StoreError>;
    /// `false` if nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn members(&self, project_id: Uuid) -> Result<Vec<PublicUser>, StoreError>;
    async fn add_member(&self, project_id: Uuid, user_id: Uuid) -> Result<(), StoreError>;
}

const PROJECT_COLUMNS: &str =
    "id, name, description, status, created_at, updated_at, creator_id";

#[derive(Clone)]
pub struct PgProjectRepo {
    db: PgPool,
}

impl PgProjectRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Commits on success, rolls back explicitly on failure.
async fn finish<T>(
    tx: Transaction<'_, Postgres>,
    result: Result<T, sqlx::Error>,
) -> Result<T, StoreError> {
    match result {
        Ok(v) => {
            tx.commit().await?;
            Ok(v)
        }
        Err(e) => {
            tx.rollback().await?;
            Err(StoreError::from_sqlx(e))
        }
    }
}

#[async_trait]
impl ProjectRepo for PgProjectRepo {
    async fn create(
        &self,
        creator_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Project, StoreError> {
        let mut tx = self.db.begin().await?;
        let sql = format!(
            "INSERT INTO projects (name, description, status, creator_id) \
             VALUES ($1, $2, $3, $4) RETURNING {PROJECT_COLUMNS}"
        );
        let res = sqlx::query_as::<_, Project>(&sql)
            .bind(name)
            .bind(description)
            .bind(DEFAULT_STATUS)
            .bind(creator_id)
            .fetch_one(&mut *tx)
            .await;
        finish(tx, res).await
    }

    async fn find(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        let row = sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn list_by_owner(
        &self,
        owner: Uuid,
        status: Option<&str>,
    ) -> Result<Vec<Project>, StoreError> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects \
             WHERE creator_id = $1 AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, Project>(&sql)
            .bind(owner)
            .bind(status)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, StoreError> {
        let mut tx = self.db.begin().await?;
        let sql = format!(
            "UPDATE projects SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                status = COALESCE($4, status), \
                updated_at = now() \
             WHERE id = $1 RETURNING {PROJECT_COLUMNS}"
        );
        let res = sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(changes.name.as_deref())
            .bind(changes.description.as_deref())
            .bind(changes.status.as_deref())
            .fetch_optional(&mut *tx)
            .await;
        finish(tx, res).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.db.begin().await?;
        let res = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map(|r| r.rows_affected() > 0);
        finish(tx, res).await
    }

    async fn members(&self, project_id: Uuid) -> Result<Vec<PublicUser>, StoreError> {
        let rows = sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT u.id, u.username, u.email
              FROM project_members pm
              JOIN users u ON u.id = pm.user_id
             WHERE pm.project_id = $1
             ORDER BY pm.joined_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn add_member(&self, project_id: Uuid, user_id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;
        let res = sqlx::query("INSERT INTO project_members (project_id, user_id) VALUES ($1, $2)")
            .bind(project_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map(|_| ());
        finish(tx, res).await
    }
}
