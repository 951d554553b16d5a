use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, MeResponse, RegisterRequest, RegisterResponse},
        error::{AuthError, ErrorBody},
        extractors::AuthUser,
        repo_types::User,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// Bodies axum can't decode are reported the same way as missing fields.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AuthError::Validation(e.body_text()))
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Missing or malformed fields", body = ErrorBody),
        (status = 409, description = "Username already taken", body = ErrorBody),
    ),
    tag = "users"
)]
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AuthError> {
    let payload = json_body(payload)?;
    payload.validate()?;
    let RegisterRequest {
        username,
        password,
        role,
    } = payload;

    let hash = state.passwords.hash_blocking(password).await?;
    let user_id = User::register(&state.db, &username, &hash, &role).await?;

    info!(user_id, username = %username, role = %role, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, username }),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token issued", body = LoginResponse),
        (status = 400, description = "Missing or malformed fields", body = ErrorBody),
        (status = 401, description = "Wrong password", body = ErrorBody),
        (status = 404, description = "Unknown username", body = ErrorBody),
    ),
    tag = "users"
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthError> {
    let payload = json_body(payload)?;
    payload.validate()?;

    let user = User::find_by_username(&state.db, &payload.username)
        .await
        .map_err(|e| {
            if matches!(e, AuthError::NotFound) {
                warn!(username = %payload.username, "login unknown username");
            }
            e
        })?;

    let ok = state
        .passwords
        .verify_blocking(payload.password, user.password_hash)
        .await?;
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(AuthError::InvalidCredential);
    }

    let token = state.keys.issue(user.id, &user.username, &user.role)?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Json(LoginResponse { token }))
}

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Identity carried by the token", body = MeResponse),
        (status = 401, description = "No token presented", body = ErrorBody),
        (status = 403, description = "Invalid or expired token", body = ErrorBody),
    ),
    security(("bearerAuth" = [])),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn get_me(AuthUser(claims): AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: claims.user_id,
        username: claims.username,
        role: claims.role,
    })
}
