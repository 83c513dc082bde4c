use sqlx::{SqliteConnection, SqlitePool};

use crate::error::CrescendoResult;

/// A one-shot message waiting for a user's next dashboard view
#[derive(Debug, sqlx::FromRow)]
pub struct Notice {
    pub id: i64,
    pub user: i64,
    pub message: String,
}

impl Notice {
    /// Queues a notice for the user, whether or not they are logged in.
    ///
    /// Runs on the caller's connection so it can join a larger transaction.
    pub async fn send(user: i64, message: &str, conn: &mut SqliteConnection) -> CrescendoResult<i64> {
        let id = sqlx::query("INSERT INTO notices (user, message) VALUES (?, ?)")
            .bind(user)
            .bind(message)
            .execute(conn)
            .await?
            .last_insert_rowid();

        Ok(id)
    }

    /// Removes and returns the user's pending notices, oldest first.
    pub async fn take_for_user(user: i64, pool: &SqlitePool) -> CrescendoResult<Vec<String>> {
        let mut notices = sqlx::query_as::<_, Self>(
            "DELETE FROM notices WHERE user = ? RETURNING id, user, message",
        )
        .bind(user)
        .fetch_all(pool)
        .await?;
        notices.sort_by_key(|notice| notice.id);

        Ok(notices.into_iter().map(|notice| notice.message).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::Session;
    use crate::models::user::Role;
    use crate::tests::{login_as, test_pool};

    #[tokio::test]
    async fn notices_are_read_once_in_order() {
        let (_dir, pool) = test_pool().await;
        let bassist = login_as("bassist", Role::Musician, &pool).await;

        let mut conn = pool.acquire().await.unwrap();
        Notice::send(bassist.user_id, "first", &mut *conn).await.unwrap();
        Notice::send(bassist.user_id, "second", &mut *conn).await.unwrap();
        drop(conn);

        let notices = Notice::take_for_user(bassist.user_id, &pool).await.unwrap();
        assert_eq!(notices, vec!["first".to_owned(), "second".to_owned()]);
        assert!(Notice::take_for_user(bassist.user_id, &pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn notices_wait_for_the_next_login() {
        let (_dir, pool) = test_pool().await;
        let bassist = login_as("bassist", Role::Musician, &pool).await;
        let cellist = login_as("cellist", Role::Musician, &pool).await;
        Session::remove(&bassist.token, &pool).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        Notice::send(bassist.user_id, "while you were out", &mut *conn)
            .await
            .unwrap();
        drop(conn);

        assert!(Notice::take_for_user(cellist.user_id, &pool).await.unwrap().is_empty());
        assert_eq!(
            Notice::take_for_user(bassist.user_id, &pool).await.unwrap(),
            vec!["while you were out".to_owned()]
        );
    }
}
