use axum::{
    extract::State,
    http::StatusCode,
    routing::{patch, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    error::ApiError,
    state::AppState,
    users::{
        dto::{AuthTokens, CredentialsRequest, ProfileUpdateRequest, PublicUser, VerifyRequest},
        jwt::AuthUser,
    },
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/authenticate", post(authenticate))
        .route("/users/verify", post(verify))
}

pub fn private_routes() -> Router<AppState> {
    Router::new().route("/users/me", patch(update_me))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let user = state
        .service
        .create_user(&payload.email, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
async fn authenticate(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<AuthTokens>), ApiError> {
    let tokens = state
        .service
        .authenticate(&payload.email, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

#[instrument(skip(state))]
async fn verify(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state.service.verify(&payload.code).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
async fn update_me(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state.service.update_profile(&email, payload).await?;
    Ok(Json(user.into()))
}
