use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{NewProject, ProjectView},
    repo_types::{Project, ProjectChanges},
};
use crate::{
    auth::PublicUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub const NOT_FOUND: &str = "Project not found";

/// The single ownership predicate behind every project check.
pub fn is_owner(project: &Project, caller: Uuid) -> bool {
    project.creator_id == caller
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Edit,
    Delete,
}

impl Action {
    fn forbidden(self) -> AppError {
        let msg = match self {
            Action::Edit => "You are not authorized to edit this project",
            Action::Delete => "You are not authorized to delete this project",
        };
        AppError::Forbidden(msg.into())
    }
}

/// Owned project or 404; a foreign project looks exactly like a missing one.
pub async fn find_owned(state: &AppState, caller: Uuid, id: Uuid) -> AppResult<Project> {
    match state.projects.find(id).await? {
        Some(p) if is_owner(&p, caller) => Ok(p),
        Some(_) => {
            warn!(%caller, project_id = %id, "read of foreign project");
            Err(AppError::NotFound(NOT_FOUND.into()))
        }
        None => Err(AppError::NotFound(NOT_FOUND.into())),
    }
}

/// Existence first (404), then ownership (403).
pub async fn authorize(
    state: &AppState,
    caller: Uuid,
    id: Uuid,
    action: Action,
) -> AppResult<Project> {
    let project = state
        .projects
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))?;
    if !is_owner(&project, caller) {
        warn!(%caller, project_id = %id, ?action, "forbidden project access");
        return Err(action.forbidden());
    }
    Ok(project)
}

pub async fn view(state: &AppState, project: Project) -> AppResult<ProjectView> {
    let creator: PublicUser = state
        .users
        .find_by_id(project.creator_id)
        .await?
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "project {} references missing creator {}",
                project.id,
                project.creator_id
            ))
        })?
        .into();
    let members = state.projects.members(project.id).await?;
    Ok(ProjectView::new(project, creator, members))
}

/// `owner` is an already-resolved user, so a vanished caller never reaches the insert.
pub async fn create(
    state: &AppState,
    owner: &PublicUser,
    new: NewProject,
) -> AppResult<ProjectView> {
    let project = state
        .projects
        .create(owner.id, &new.name, new.description.as_deref())
        .await?;
    info!(project_id = %project.id, creator_id = %owner.id, "project created");
    // a fresh project has no members yet
    Ok(ProjectView::new(project, owner.clone(), Vec::new()))
}

pub async fn list(
    state: &AppState,
    caller: Uuid,
    status: Option<&str>,
) -> AppResult<Vec<ProjectView>> {
    let projects = state.projects.list_by_owner(caller, status).await?;
    let mut out = Vec::with_capacity(projects.len());
    for p in projects {
        out.push(view(state, p).await?);
    }
    Ok(out)
}

pub async fn get(state: &AppState, caller: Uuid, id: Uuid) -> AppResult<ProjectView> {
    let project = find_owned(state, caller, id).await?;
    view(state, project).await
}

/// Applies `changes` to a project already cleared by [`authorize`].
pub async fn update(
    state: &AppState,
    project: Project,
    changes: ProjectChanges,
) -> AppResult<ProjectView> {
    let project = state
        .projects
        .update(project.id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))?;
    info!(project_id = %project.id, "project updated");
    view(state, project).await
}

pub async fn delete(state: &AppState, caller: Uuid, id: Uuid) -> AppResult<()> {
    authorize(state, caller, id, Action::Delete).await?;
    if !state.projects.delete(id).await? {
        return Err(AppError::NotFound(NOT_FOUND.into()));
    }
    info!(project_id = %id, "project deleted");
    Ok(())
}
