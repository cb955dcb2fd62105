use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{Envelope, LoginRequest, MeResponse, RegisterRequest, TokenData},
    extractors::CurrentUser,
    repo_types::PublicUser,
    services,
};
use crate::{error::AppError, state::AppState, validation::json_body};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<PublicUser>>), AppError> {
    let new = json_body(payload)?.validate()?;
    let user = services::register(&state, new).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope {
            message: "User registered successfully",
            data: user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Envelope<TokenData>>, AppError> {
    let (username, password) = json_body(payload)?.validate()?;
    let access_token = services::login(&state, &username, &password).await?;
    Ok(Json(Envelope {
        message: "Login successful",
        data: TokenData { access_token },
    }))
}

#[instrument]
pub async fn get_me(
    CurrentUser(user): CurrentUser,
) -> Result<Json<MeResponse>, AppError> {
    Ok(Json(MeResponse {
        message: "Current user",
        user,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn me_response_never_carries_password() {
        let response = MeResponse {
            message: "Current user",
            user: PublicUser {
                id: uuid::Uuid::new_v4(),
                username: "alice".into(),
                email: "a@x.com".into(),
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["user"]["email"], "a@x.com");
        assert_eq!(json["user"]["username"], "alice");
        assert!(json["user"].get("password").is_none());
        assert!(json["user"].get("password_hash").is_none());
    }
}
