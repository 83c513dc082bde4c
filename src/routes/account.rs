//! Registration, login and profile routes.

use axum::extract::rejection::{FormRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{basic_success, form, path};
use crate::auth::{Principal, SessionToken};
use crate::error::CrescendoResult;
use crate::models::session::Session;
use crate::models::user::{NewUser, Profile, ProfileUpdate, User, MIN_PASSWORD_LENGTH};
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginInfo {
    pub username: String,
    pub password: String,
}

/// Describe the registration form.
pub async fn register_form() -> Json<Value> {
    Json(json!({
        "fields": ["username", "password", "email", "role", "profile"],
        "roles": ["musician", "organization"],
        "passwordPolicy": format!(
            "at least {MIN_PASSWORD_LENGTH} characters, with a number and an uppercase letter"
        ),
    }))
}

/// Register a new account.
///
/// ## Input Format:
///
/// Expects a [NewUser](crate::models::user::NewUser) as a url-encoded form.
///
/// ## Return Format:
///
/// ```json
/// {
///     "id": integer
/// }
/// ```
pub async fn register(
    State(state): State<AppState>,
    new_user: Result<Form<NewUser>, FormRejection>,
) -> CrescendoResult<(StatusCode, Json<Value>)> {
    let id = User::register(form(new_user)?, state.config.bcrypt_cost, &state.pool).await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn login_form() -> Json<Value> {
    Json(json!({ "fields": ["username", "password"] }))
}

/// Log in and open a session.
///
/// ## Return Format:
///
/// ```json
/// {
///     "token": string,
///     "userId": integer,
///     "role": "musician" | "organization"
/// }
/// ```
///
/// Send the token back in the `token` header on later requests.
pub async fn login(
    State(state): State<AppState>,
    info: Result<Form<LoginInfo>, FormRejection>,
) -> CrescendoResult<Json<Value>> {
    let info = form(info)?;
    let principal = Session::login(&info.username, &info.password, &state.pool).await?;

    Ok(Json(json!({
        "token": principal.token,
        "userId": principal.user_id,
        "role": principal.role,
    })))
}

/// Close the current session. Succeeds even without one.
pub async fn logout(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> CrescendoResult<Json<Value>> {
    if let Some(token) = token {
        Session::remove(&token, &state.pool).await?;
    }

    Ok(Json(basic_success()))
}

/// View any user's profile.
///
/// ## Required Permissions:
///
/// The user must be logged in.
pub async fn view_profile(
    State(state): State<AppState>,
    user_id: Result<Path<i64>, PathRejection>,
    _principal: Principal,
) -> CrescendoResult<Json<Profile>> {
    Ok(Json(User::with_id(path(user_id)?, &state.pool).await?.into()))
}

pub async fn own_profile(
    State(state): State<AppState>,
    principal: Principal,
) -> CrescendoResult<Json<Profile>> {
    Ok(Json(User::with_id(principal.user_id, &state.pool).await?.into()))
}

/// Edit the logged-in user's profile. The role cannot be changed.
///
/// ## Input Format:
///
/// Expects a [ProfileUpdate](crate::models::user::ProfileUpdate) as a url-encoded form.
///
/// ## Return Format:
///
/// Returns the updated [Profile](crate::models::user::Profile).
pub async fn update_profile(
    State(state): State<AppState>,
    principal: Principal,
    update: Result<Form<ProfileUpdate>, FormRejection>,
) -> CrescendoResult<Json<Profile>> {
    User::update_profile(principal.user_id, form(update)?, &state.pool).await?;

    Ok(Json(User::with_id(principal.user_id, &state.pool).await?.into()))
}
