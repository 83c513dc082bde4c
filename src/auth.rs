//! Authorization handling for the API.
//!
//! The [Principal] struct, used as an extractor parameter for endpoints, is
//! the primary method for handling authorization. It is resolved once per
//! request from the `token` header and passed explicitly to the models, so
//! nothing reads the session from ambient state.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::{CrescendoError, CrescendoResult};
use crate::models::session::Session;
use crate::models::user::Role;
use crate::AppState;

/// The header carrying the session token handed out at login.
pub const TOKEN_HEADER: &str = "token";

/// The logged-in user a request acts on behalf of.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
    /// The session this principal was resolved from
    pub token: String,
}

impl Principal {
    /// Fails with [Forbidden](CrescendoError::Forbidden) unless the principal holds the role.
    pub fn ensure_role(&self, role: Role) -> CrescendoResult<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(CrescendoError::Forbidden(format!(
                "Only {} accounts can do this",
                role.as_str()
            )))
        }
    }
}

/// The raw session token of a request, whether or not it is still valid.
pub struct SessionToken(pub Option<String>);

fn token_from_parts(parts: &Parts) -> CrescendoResult<Option<String>> {
    parts
        .headers
        .get(TOKEN_HEADER)
        .map(|value| {
            value
                .to_str()
                .map(ToOwned::to_owned)
                .map_err(|_| CrescendoError::Validation("The token header is not valid text".to_owned()))
        })
        .transpose()
}

#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = CrescendoError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts)?.ok_or(CrescendoError::LoginRequired)?;

        Session::principal_for_token(&token, &state.pool)
            .await?
            .ok_or(CrescendoError::LoginRequired)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionToken {
    type Rejection = CrescendoError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(SessionToken(token_from_parts(parts)?))
    }
}
