use sqlx::SqlitePool;
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::{CrescendoError, CrescendoResult};
use crate::models::user::{Role, User};

/// A server-side login, looked up by the opaque token handed out at login.
#[derive(sqlx::FromRow)]
pub struct Session {
    pub token: String,
    pub user: i64,
}

impl Session {
    pub async fn create(user: i64, pool: &SqlitePool) -> CrescendoResult<Self> {
        sqlx::query_as::<_, Self>("INSERT INTO sessions (token, user) VALUES (?, ?) RETURNING token, user")
            .bind(Uuid::new_v4().to_string())
            .bind(user)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    /// Resolves a token into the principal it authenticates, if the session still exists.
    pub async fn principal_for_token(token: &str, pool: &SqlitePool) -> CrescendoResult<Option<Principal>> {
        let row = sqlx::query_as::<_, (i64, Role)>(
            "SELECT users.id, users.role FROM sessions
             JOIN users ON users.id = sessions.user
             WHERE sessions.token = ?",
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|(user_id, role)| Principal {
            user_id,
            role,
            token: token.to_owned(),
        }))
    }

    pub async fn remove(token: &str, pool: &SqlitePool) -> CrescendoResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn login(username: &str, password: &str, pool: &SqlitePool) -> CrescendoResult<Principal> {
        let user = match User::check_login(username, password, pool).await {
            Ok(user) => user,
            Err(CrescendoError::InvalidCredentials) => {
                tracing::warn!(%username, "rejected login");
                return Err(CrescendoError::InvalidCredentials);
            }
            Err(other) => return Err(other),
        };
        let session = Self::create(user.id, pool).await?;
        tracing::info!(user = session.user, role = user.role.as_str(), "logged in");

        Ok(Principal {
            user_id: session.user,
            role: user.role,
            token: session.token,
        })
    }
}
