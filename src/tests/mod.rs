//! Shared fixtures for the unit tests.

use std::path::Path;

use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::auth::Principal;
use crate::config::{Config, DEFAULT_MAX_CONNECTIONS, DEFAULT_MAX_UPLOAD_BYTES};
use crate::db::connect_to_db;
use crate::models::event::{Event, NewEvent};
use crate::models::session::Session;
use crate::models::user::{NewUser, Role, User};

pub const TEST_PASSWORD: &str = "Password1";

/// The cheapest cost bcrypt accepts, to keep the tests fast.
pub const TEST_HASH_COST: u32 = 4;

pub fn test_config(dir: &Path) -> Config {
    Config {
        database_url: format!("sqlite://{}", dir.join("test.db").display()),
        bind_address: ([127, 0, 0, 1], 0).into(),
        upload_dir: dir.join("uploads"),
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        bcrypt_cost: TEST_HASH_COST,
        max_connections: DEFAULT_MAX_CONNECTIONS,
    }
}

/// A migrated database in a fresh temporary directory.
///
/// The directory is deleted when the returned guard is dropped.
pub async fn test_pool() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let pool = connect_to_db(&test_config(dir.path())).await.unwrap();

    (dir, pool)
}

pub fn new_user(username: &str, role: Role) -> NewUser {
    NewUser {
        username: username.to_owned(),
        password: TEST_PASSWORD.to_owned(),
        email: format!("{username}@example.com"),
        role,
        profile: String::new(),
    }
}

pub async fn login_as(username: &str, role: Role, pool: &SqlitePool) -> Principal {
    User::register(new_user(username, role), TEST_HASH_COST, pool)
        .await
        .unwrap();

    Session::login(username, TEST_PASSWORD, pool).await.unwrap()
}

pub fn new_event() -> NewEvent {
    NewEvent {
        date: "2024-06-01".to_owned(),
        time: "19:30".to_owned(),
        venue: "The Blue Note".to_owned(),
        description: "Two sets of standards".to_owned(),
    }
}

pub async fn create_event(organization: &Principal, pool: &SqlitePool) -> i64 {
    Event::create(organization, new_event(), pool).await.unwrap()
}
