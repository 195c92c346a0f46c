use axum::{
    extract::{FromRef, Path, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument, warn};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    users::{
        dto::{
            ApiMessage, ForgotPasswordRequest, LoginRequest, LoginResponse, MeResponse,
            RegisterRequest, ResetPasswordRequest, SessionUser,
        },
        repo::{CreateOutcome, User},
        services::{
            generate_token, hash_password, is_valid_email, reset_expiry, session_cookie,
            verify_password, CurrentUser, JwtKeys,
        },
    },
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/verify/:token", get(verify_email))
        .route("/users/forgot-password", post(forgot_password))
        .route("/users/reset-password/:token", post(reset_password))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/users/logout", get(logout))
}

/// Treats empty strings as absent.
fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Option<Json<RegisterRequest>>,
) -> ApiResult<Json<ApiMessage>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let (Some(name), Some(email), Some(password), Some(phone)) = (
        present(payload.name.as_ref()),
        present(payload.email.as_ref()),
        present(payload.password.as_ref()),
        present(payload.phone.as_ref()),
    ) else {
        warn!("registration with missing fields");
        return Err(ApiError::Validation("all fields are required"));
    };

    if !is_valid_email(email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("invalid email"));
    }

    if User::find_by_email(&state.db, email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::UserExists);
    }

    let password_hash = hash_password(password)?;
    let verification_token = generate_token();

    let user = match User::create(
        &state.db,
        name,
        email,
        phone,
        &password_hash,
        &verification_token,
    )
    .await?
    {
        CreateOutcome::Created(user) => user,
        // Lost the insert race against a concurrent registration.
        CreateOutcome::EmailTaken => {
            warn!(email = %email, "email already registered");
            return Err(ApiError::UserExists);
        }
    };

    let link = format!(
        "{}/api/v1/users/verify/{}",
        state.config.base_url, verification_token
    );
    state
        .mailer
        .send(
            &user.email,
            "Verify your Email",
            &format!("Please click on the following link {link}"),
            &format!(r#"<p>Please click on the following link to verify your email: <a href="{link}">{link}</a></p>"#),
        )
        .await
        .map_err(ApiError::Mail)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(ApiMessage::ok("user registered successfully")))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Option<Json<LoginRequest>>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let (Some(email), Some(password)) = (
        present(payload.email.as_ref()),
        present(payload.password.as_ref()),
    ) else {
        warn!("login with missing fields");
        return Err(ApiError::Validation("email and password are required"));
    };

    let user = match User::find_by_email(&state.db, email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "login unknown email");
            return Err(ApiError::NotFound("no user found with this email"));
        }
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::PasswordMismatch);
    }

    let token = JwtKeys::from_ref(&state).sign_session(user.id)?;
    let jar = jar.add(session_cookie(token));

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((
        jar,
        Json(LoginResponse {
            message: "user logged in".into(),
            success: true,
            user: SessionUser { id: user.id },
        }),
    ))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<MeResponse>> {
    let user = match User::find_by_id(&state.db, user_id).await? {
        Some(u) => u,
        None => {
            warn!(user_id = %user_id, "session references missing user");
            return Err(ApiError::NotFound("cannot find user"));
        }
    };

    Ok(Json(MeResponse {
        user,
        message: "user found".into(),
        success: true,
    }))
}

#[instrument(skip(state, token))]
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<ApiMessage>> {
    match User::consume_verification_token(&state.db, &token).await? {
        Some(user_id) => {
            info!(user_id = %user_id, "user verified");
            Ok(Json(ApiMessage::ok("user verified successfully")))
        }
        None => {
            warn!("verification token not recognized");
            Err(ApiError::NotFound("no user found with this token"))
        }
    }
}

#[instrument(skip(jar))]
pub async fn logout(
    CurrentUser(user_id): CurrentUser,
    jar: CookieJar,
) -> (CookieJar, Json<ApiMessage>) {
    let jar = jar.add(session_cookie(String::new()));
    info!(user_id = %user_id, "user logged out");
    (jar, Json(ApiMessage::ok("logged out successfully")))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> ApiResult<Json<ApiMessage>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let Some(email) = present(payload.email.as_ref()) else {
        warn!("forgot-password with missing email");
        return Err(ApiError::Validation("email is required"));
    };

    let user = match User::find_by_email(&state.db, email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "forgot-password unknown email");
            return Err(ApiError::NotFound("no user exists with this email"));
        }
    };

    let token = generate_token();
    User::set_reset_token(&state.db, user.id, &token, reset_expiry()).await?;

    let link = format!(
        "{}/api/v1/users/reset-password/{}",
        state.config.base_url, token
    );
    state
        .mailer
        .send(
            &user.email,
            "Reset your password",
            &format!("Please click on the following link to reset your password {link}"),
            &format!(r#"<p>Please click on the following link to reset your password: <a href="{link}">{link}</a></p>"#),
        )
        .await
        .map_err(ApiError::Mail)?;

    info!(user_id = %user.id, "password reset link sent");
    Ok(Json(ApiMessage::ok("password reset link has been sent")))
}

#[instrument(skip(state, token, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> ApiResult<Json<ApiMessage>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let Some(password) = present(payload.password.as_ref()) else {
        warn!("reset-password with missing password");
        return Err(ApiError::Validation("password cannot be empty"));
    };

    // Hash up front so the window check and the write stay one statement.
    let password_hash = hash_password(password)?;

    match User::consume_reset_token(&state.db, &token, &password_hash).await? {
        Some(user_id) => {
            info!(user_id = %user_id, "password reset");
            Ok(Json(ApiMessage::ok("password reset done")))
        }
        None => {
            warn!("reset token not recognized or expired");
            Err(ApiError::NotFound("no such user found in database"))
        }
    }
}
