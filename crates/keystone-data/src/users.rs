//! User accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use tracing::{info, instrument};

use crate::database::Database;
use crate::error::{Result, map_query_err, map_write_err};
use crate::password;

/// Input for creating a user. The password is hashed before it is stored.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    /// Unique email address.
    pub email: &'a str,
    /// Unique username.
    pub username: &'a str,
    /// Plaintext password.
    pub password: &'a str,
    /// Whether the account's email is confirmed.
    pub confirmed: bool,
    /// Role assigned to the account.
    pub role_id: Option<i32>,
}

/// A stored user joined with its role name.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct User {
    /// Primary key.
    pub id: i32,
    /// Email address.
    pub email: String,
    /// Username.
    pub username: String,
    /// PHC-formatted password hash.
    #[serde(skip)]
    pub password_hash: String,
    /// Whether the account's email is confirmed.
    pub confirmed: bool,
    /// Assigned role id.
    pub role_id: Option<i32>,
    /// Assigned role name.
    pub role_name: Option<String>,
    /// Account creation time.
    pub member_since: DateTime<Utc>,
}

impl User {
    /// Check a candidate password against the stored hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored hash cannot be parsed.
    pub fn verify_password(&self, candidate: &str) -> Result<bool> {
        password::verify_password(&self.password_hash, candidate)
    }
}

const INSERT_USER: &str = r"
    WITH inserted AS (
        INSERT INTO users (email, username, password_hash, confirmed, role_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, email, username, password_hash, confirmed, role_id, member_since
    )
    SELECT i.id, i.email, i.username, i.password_hash, i.confirmed, i.role_id,
           r.name AS role_name, i.member_since
    FROM inserted i
    LEFT JOIN roles r ON r.id = i.role_id
";

const SELECT_USER_COLUMNS: &str = r"
    SELECT u.id, u.email, u.username, u.password_hash, u.confirmed, u.role_id,
           r.name AS role_name, u.member_since
    FROM users u
    LEFT JOIN roles r ON r.id = u.role_id
";

impl Database {
    /// Insert a user in its own transaction.
    ///
    /// No existence check precedes the insert; a duplicate email or username
    /// surfaces as [`crate::DataError::Conflict`].
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails, a uniqueness constraint is violated,
    /// or the transaction cannot be committed.
    #[instrument(name = "users.create", skip(self, new_user), fields(username = new_user.username))]
    pub async fn create_user(&self, new_user: NewUser<'_>) -> Result<User> {
        let password_hash = password::hash_password(new_user.password)?;

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(map_query_err("users.create.begin"))?;
        let user = sqlx::query_as::<_, User>(INSERT_USER)
            .bind(new_user.email)
            .bind(new_user.username)
            .bind(&password_hash)
            .bind(new_user.confirmed)
            .bind(new_user.role_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_write_err("users.insert"))?;
        tx.commit()
            .await
            .map_err(map_write_err("users.create.commit"))?;

        info!(user_id = user.id, "user created");
        Ok(user)
    }

    /// Look up a user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    #[instrument(name = "users.find_by_username", skip(self))]
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("{SELECT_USER_COLUMNS} WHERE u.username = $1"))
            .bind(username)
            .fetch_optional(self.pool())
            .await
            .map_err(map_query_err("users.find_by_username"))
    }

    /// Look up a user by email, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "{SELECT_USER_COLUMNS} WHERE LOWER(u.email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(map_query_err("users.find_by_email"))
    }

    /// All users ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    #[instrument(name = "users.list", skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>> {
        sqlx::query_as::<_, User>(&format!("{SELECT_USER_COLUMNS} ORDER BY u.id"))
            .fetch_all(self.pool())
            .await
            .map_err(map_query_err("users.list"))
    }
}
