use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::NewUser,
    password::{hash_password, verify_password},
    repo_types::PublicUser,
};
use crate::{
    error::{AppError, AppResult, StoreError},
    state::AppState,
};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub async fn register(state: &AppState, new: NewUser) -> AppResult<PublicUser> {
    if let Some(existing) = state.users.find_conflict(&new.username, &new.email).await? {
        warn!(username = %new.username, existing_id = %existing.id, "user already exists");
        return Err(AppError::Conflict("User already exists".into()));
    }

    let hash = hash_password(&new.password)?;
    let user = match state.users.create(&new.username, &new.email, &hash).await {
        Ok(u) => u,
        Err(StoreError::Conflict) => {
            warn!(username = %new.username, "lost registration race");
            return Err(AppError::Conflict("User already exists".into()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user.into())
}

/// Verifies credentials and issues an access token. Unknown users and wrong
/// passwords fail identically.
pub async fn login(state: &AppState, username: &str, password: &str) -> AppResult<String> {
    let Some(user) = state.users.find_by_username(username).await? else {
        warn!(%username, "login unknown username");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(%username, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = state.jwt.sign_access(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

pub async fn who_am_i(state: &AppState, user_id: Uuid) -> AppResult<PublicUser> {
    match state.users.find_by_id(user_id).await? {
        Some(user) => Ok(user.into()),
        None => {
            warn!(%user_id, "token subject no longer exists");
            Err(AppError::NotFound("User not found".into()))
        }
    }
}
