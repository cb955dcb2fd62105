use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Project, ProjectChanges};
use crate::{
    auth::PublicUser,
    error::AppError,
    validation::{self, FieldErrors},
};

const NAME_MAX: usize = 128;
const STATUS_MAX: usize = 32;

#[derive(Debug, Default, Deserialize)]
pub struct CreateProjectRequest {
    pub name: Option<Value>,
    pub description: Option<Value>,
}

/// Validated create payload.
#[derive(Debug, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
}

impl CreateProjectRequest {
    pub fn validate(self) -> Result<NewProject, AppError> {
        let mut errors = FieldErrors::new();
        let name = validation::required(&mut errors, "name", self.name);
        validation::max_len(&mut errors, "name", name.as_deref(), NAME_MAX);
        let description = validation::optional(&mut errors, "description", self.description);
        errors.into_result("Invalid input")?;
        let name = name.ok_or_else(|| AppError::BadRequest("Invalid input".into()))?;
        Ok(NewProject { name, description })
    }
}

/// Partial update; fields not listed here are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<Value>,
    pub description: Option<Value>,
    pub status: Option<Value>,
}

impl UpdateProjectRequest {
    pub fn validate(self) -> Result<ProjectChanges, AppError> {
        let mut errors = FieldErrors::new();
        let name = validation::non_blank(&mut errors, "name", self.name);
        validation::max_len(&mut errors, "name", name.as_deref(), NAME_MAX);
        let description = validation::optional(&mut errors, "description", self.description);
        let status = validation::non_blank(&mut errors, "status", self.status);
        validation::max_len(&mut errors, "status", status.as_deref(), STATUS_MAX);
        errors.into_result("Invalid input")?;
        Ok(ProjectChanges {
            name,
            description,
            status,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

impl ListQuery {
    /// `?status=` with an empty value means no filter.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref().filter(|s| !s.is_empty())
    }
}

/// Outbound project shape, with creator and members expanded.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub creator_id: Uuid,
    pub creator: PublicUser,
    pub members: Vec<PublicUser>,
}

impl ProjectView {
    pub fn new(p: Project, creator: PublicUser, members: Vec<PublicUser>) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            status: p.status,
            created_at: p.created_at,
            updated_at: p.updated_at,
            creator_id: p.creator_id,
            creator,
            members,
        }
    }
}
