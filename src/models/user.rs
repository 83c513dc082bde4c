use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{CrescendoError, CrescendoResult};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Which side of the marketplace a user is on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    /// Browses pending events and applies to perform at them
    Musician,
    /// Posts events and reviews who was booked for them
    Organization,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Musician => "musician",
            Role::Organization => "organization",
        }
    }
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct User {
    /// The ID of the user
    pub id: i64,
    /// The user's login name, unique and made of word characters only
    pub username: String,
    /// The user's email, which must be unique
    pub email: String,
    pub role: Role,
    /// Free-form text the user shows on their profile
    pub profile: String,

    #[serde(skip)]
    pub password: String,
}

impl User {
    pub async fn with_id(id: i64, pool: &SqlitePool) -> CrescendoResult<Self> {
        Self::with_id_opt(id, pool)
            .await?
            .ok_or_else(|| CrescendoError::NotFound(format!("No user with id {id}")))
    }

    pub async fn with_id_opt(id: i64, pool: &SqlitePool) -> CrescendoResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, username, email, role, profile, password FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn with_username_opt(username: &str, pool: &SqlitePool) -> CrescendoResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, username, email, role, profile, password FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Returns the user if the password matches their stored hash.
    ///
    /// An unknown username and a wrong password are indistinguishable to the caller.
    pub async fn check_login(username: &str, password: &str, pool: &SqlitePool) -> CrescendoResult<User> {
        let user = Self::with_username_opt(username, pool)
            .await?
            .ok_or(CrescendoError::InvalidCredentials)?;

        let valid = bcrypt::verify(password, &user.password)
            .map_err(|err| CrescendoError::Server(format!("Failed to verify password: {err}")))?;
        if valid {
            Ok(user)
        } else {
            Err(CrescendoError::InvalidCredentials)
        }
    }

    pub async fn register(new_user: NewUser, hash_cost: u32, pool: &SqlitePool) -> CrescendoResult<i64> {
        validate_username(&new_user.username)?;
        validate_password(&new_user.password)?;
        let email = normalize_email(&new_user.email)?;

        let taken = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ? OR email = ?")
            .bind(&new_user.username)
            .bind(&email)
            .fetch_optional(pool)
            .await?;
        if taken.is_some() {
            return Err(CrescendoError::Conflict("Username or email already exists".to_owned()));
        }

        let pass_hash = bcrypt::hash(&new_user.password, hash_cost)
            .map_err(|err| CrescendoError::Server(format!("Failed to hash password: {err}")))?;

        let id = sqlx::query(
            "INSERT INTO users (username, password, email, role, profile) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new_user.username)
        .bind(pass_hash)
        .bind(&email)
        .bind(new_user.role)
        .bind(&new_user.profile)
        .execute(pool)
        .await
        .map_err(|err| CrescendoError::conflict_on_unique(err, "Username or email already exists"))?
        .last_insert_rowid();

        tracing::info!(user = id, username = %new_user.username, role = new_user.role.as_str(), "registered user");

        Ok(id)
    }

    /// Updates the editable parts of a profile. The role is fixed at registration.
    pub async fn update_profile(id: i64, update: ProfileUpdate, pool: &SqlitePool) -> CrescendoResult<()> {
        validate_username(&update.username)?;
        let email = normalize_email(&update.email)?;

        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM users WHERE (username = ? OR email = ?) AND id != ?",
        )
        .bind(&update.username)
        .bind(&email)
        .bind(id)
        .fetch_optional(pool)
        .await?;
        if taken.is_some() {
            return Err(CrescendoError::Conflict("Username or email already exists".to_owned()));
        }

        let result = sqlx::query("UPDATE users SET username = ?, email = ?, profile = ? WHERE id = ?")
            .bind(&update.username)
            .bind(&email)
            .bind(&update.profile)
            .bind(id)
            .execute(pool)
            .await
            .map_err(|err| CrescendoError::conflict_on_unique(err, "Username or email already exists"))?;
        if result.rows_affected() == 0 {
            return Err(CrescendoError::NotFound(format!("No user with id {id}")));
        }

        Ok(())
    }
}

/// The publicly visible part of a user
#[derive(Serialize)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub profile: String,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            profile: user.profile,
        }
    }
}

#[derive(Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(alias = "user_type")]
    pub role: Role,
    #[serde(default, alias = "profile_info")]
    pub profile: String,
}

#[derive(Deserialize)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    #[serde(default, alias = "profile_info")]
    pub profile: String,
}

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\w+$").expect("username pattern is valid"))
}

pub fn validate_username(username: &str) -> CrescendoResult<()> {
    if username_pattern().is_match(username) {
        Ok(())
    } else {
        Err(CrescendoError::Validation(
            "Username must not contain spaces and must be alphanumeric".to_owned(),
        ))
    }
}

pub fn validate_password(password: &str) -> CrescendoResult<()> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LENGTH;
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());

    if long_enough && has_digit && has_uppercase {
        Ok(())
    } else {
        Err(CrescendoError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long, \
             contain a number and an uppercase letter"
        )))
    }
}

/// Trims surrounding whitespace and checks the result, which is the form
/// that gets stored and compared for uniqueness.
pub fn normalize_email(email: &str) -> CrescendoResult<String> {
    let email = email.trim();
    validate_email(email)?;

    Ok(email.to_owned())
}

pub fn validate_email(email: &str) -> CrescendoResult<()> {
    if !email.is_empty() && email.contains('@') && !email.contains(char::is_whitespace) {
        Ok(())
    } else {
        Err(CrescendoError::Validation(format!("Invalid email {email:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{new_user, test_pool, TEST_HASH_COST, TEST_PASSWORD};

    #[test]
    fn password_policy() {
        assert!(validate_password("password").is_err());
        assert!(validate_password("Password").is_err());
        assert!(validate_password("password1").is_err());
        assert!(validate_password("Pass1").is_err());
        assert!(validate_password("Password1").is_ok());
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("alto@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("alto.example.com").is_err());
        assert!(validate_email("alto @example.com").is_err());
        assert!(validate_email(" alto@example.com").is_err());
        assert_eq!(normalize_email("  alto@example.com\t").unwrap(), "alto@example.com");
        assert!(matches!(normalize_email("   "), Err(CrescendoError::Validation(_))));
    }

    #[test]
    fn usernames_are_single_words() {
        assert!(validate_username("the_strings").is_ok());
        assert!(validate_username("the strings").is_err());
        assert!(validate_username("strings!").is_err());
        assert!(validate_username("").is_err());
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let (_dir, pool) = test_pool().await;
        User::register(new_user("quartet", Role::Musician), TEST_HASH_COST, &pool)
            .await
            .unwrap();

        let mut duplicate = new_user("quartet", Role::Organization);
        duplicate.email = "someone.else@example.com".to_owned();
        let result = User::register(duplicate, TEST_HASH_COST, &pool).await;

        assert!(matches!(result, Err(CrescendoError::Conflict(_))));
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let (_dir, pool) = test_pool().await;
        User::register(new_user("quartet", Role::Musician), TEST_HASH_COST, &pool)
            .await
            .unwrap();

        let mut duplicate = new_user("trio", Role::Musician);
        duplicate.email = "quartet@example.com".to_owned();
        let result = User::register(duplicate, TEST_HASH_COST, &pool).await;

        assert!(matches!(result, Err(CrescendoError::Conflict(_))));
        assert!(User::with_username_opt("trio", &pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn padded_duplicate_email_is_a_conflict() {
        let (_dir, pool) = test_pool().await;
        User::register(new_user("quartet", Role::Musician), TEST_HASH_COST, &pool)
            .await
            .unwrap();

        let mut padded = new_user("trio", Role::Musician);
        padded.email = " quartet@example.com ".to_owned();
        let result = User::register(padded, TEST_HASH_COST, &pool).await;

        assert!(matches!(result, Err(CrescendoError::Conflict(_))));
        assert!(User::with_username_opt("trio", &pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn emails_are_stored_trimmed() {
        let (_dir, pool) = test_pool().await;
        let mut padded = new_user("quartet", Role::Musician);
        padded.email = "  quartet@example.com ".to_owned();
        let id = User::register(padded, TEST_HASH_COST, &pool).await.unwrap();

        assert_eq!(User::with_id(id, &pool).await.unwrap().email, "quartet@example.com");

        let update = ProfileUpdate {
            username: "quartet".to_owned(),
            email: "\tquartet@example.org".to_owned(),
            profile: String::new(),
        };
        User::update_profile(id, update, &pool).await.unwrap();
        assert_eq!(User::with_id(id, &pool).await.unwrap().email, "quartet@example.org");
    }

    #[tokio::test]
    async fn weak_password_is_never_stored() {
        let (_dir, pool) = test_pool().await;
        let mut user = new_user("soloist", Role::Musician);
        user.password = "password".to_owned();

        let result = User::register(user, TEST_HASH_COST, &pool).await;

        assert!(matches!(result, Err(CrescendoError::Validation(_))));
        assert!(User::with_username_opt("soloist", &pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_checks_the_hash() {
        let (_dir, pool) = test_pool().await;
        let id = User::register(new_user("hall", Role::Organization), TEST_HASH_COST, &pool)
            .await
            .unwrap();

        let user = User::check_login("hall", TEST_PASSWORD, &pool).await.unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, Role::Organization);
        assert_ne!(user.password, TEST_PASSWORD);

        assert!(matches!(
            User::check_login("hall", "Wrong1234", &pool).await,
            Err(CrescendoError::InvalidCredentials)
        ));
        assert!(matches!(
            User::check_login("nobody", TEST_PASSWORD, &pool).await,
            Err(CrescendoError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn profile_updates_keep_uniqueness() {
        let (_dir, pool) = test_pool().await;
        let first = User::register(new_user("alto", Role::Musician), TEST_HASH_COST, &pool)
            .await
            .unwrap();
        User::register(new_user("tenor", Role::Musician), TEST_HASH_COST, &pool)
            .await
            .unwrap();

        let clash = ProfileUpdate {
            username: "tenor".to_owned(),
            email: "alto@example.com".to_owned(),
            profile: String::new(),
        };
        assert!(matches!(
            User::update_profile(first, clash, &pool).await,
            Err(CrescendoError::Conflict(_))
        ));

        let update = ProfileUpdate {
            username: "alto".to_owned(),
            email: "alto@example.com".to_owned(),
            profile: "Jazz and folk".to_owned(),
        };
        User::update_profile(first, update, &pool).await.unwrap();

        let user = User::with_id(first, &pool).await.unwrap();
        assert_eq!(user.profile, "Jazz and folk");
        assert_eq!(user.role, Role::Musician);
    }
}
