use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateProjectRequest, ListQuery, ProjectView, UpdateProjectRequest},
    services,
};
use crate::{auth::CurrentUser, error::AppError, state::AppState, validation::json_body};

pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
}

/// Path ids that are not UUIDs cannot name a project.
fn project_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(services::NOT_FOUND.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProjectView>), AppError> {
    let new = json_body(payload)?.validate()?;
    let project = services::create(&state, &user, new).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

#[instrument(skip(state))]
pub async fn list_projects(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<ProjectView>>, AppError> {
    let projects = services::list(&state, user.id, q.status()).await?;
    Ok(Json(projects))
}

#[instrument(skip(state))]
pub async fn get_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ProjectView>, AppError> {
    let project = services::get(&state, user.id, project_id(&id)?).await?;
    Ok(Json(project))
}

#[instrument(skip(state, payload))]
pub async fn update_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProjectRequest>, JsonRejection>,
) -> Result<Json<ProjectView>, AppError> {
    let id = project_id(&id)?;
    // 404/403 take precedence over a bad body.
    let owned = services::authorize(&state, user.id, id, services::Action::Edit).await?;
    let changes = json_body(payload)?.validate()?;
    let project = services::update(&state, owned, changes).await?;
    Ok(Json(project))
}

#[instrument(skip(state))]
pub async fn delete_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    services::delete(&state, user.id, project_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_uuid_path_is_not_found() {
        assert!(matches!(project_id("999"), Err(AppError::NotFound(_))));
        let id = Uuid::new_v4();
        assert_eq!(project_id(&id.to_string()).unwrap(), id);
    }
}
