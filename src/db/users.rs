//! Users repository for authentication
//!
//! Users carry no credentials of their own; login checks a shared password
//! from configuration (see [AuthService](crate::services::AuthService)).

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::sqlite_helpers::{new_id, now_iso8601};
use super::validation::{USERNAME_MIN_LEN, Validate, ValidationError, min_length};
use super::{DbError, conflict_on};

// ============================================================================
// User Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub favorite_genre: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub favorite_genre: String,
}

impl UserRecord {
    pub fn new(input: CreateUser) -> Self {
        Self {
            id: new_id(),
            username: input.username,
            favorite_genre: input.favorite_genre,
            created_at: now_iso8601(),
        }
    }
}

impl Validate for UserRecord {
    fn validate(&self) -> Result<(), ValidationError> {
        min_length("username", &self.username, USERNAME_MIN_LEN)?;
        min_length("favoriteGenre", &self.favorite_genre, 1)?;
        Ok(())
    }
}

type UserRow = (String, String, String, String);

fn from_row(r: UserRow) -> UserRecord {
    UserRecord {
        id: r.0,
        username: r.1,
        favorite_genre: r.2,
        created_at: r.3,
    }
}

// ============================================================================
// Repository
// ============================================================================

pub struct UsersRepository {
    pool: SqlitePool,
}

impl UsersRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Validate and create a new user
    pub async fn create(&self, user: CreateUser) -> Result<UserRecord, DbError> {
        let record = UserRecord::new(user);
        record.validate()?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, favorite_genre, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.username)
        .bind(&record.favorite_genre)
        .bind(&record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on(e, "username"))?;

        Ok(record)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Option<UserRecord>, DbError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, favorite_genre, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(from_row))
    }

    /// Get user by exact username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>, DbError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, favorite_genre, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(from_row))
    }

    /// Total number of users
    pub async fn count(&self) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_need_three_characters() {
        let user = UserRecord::new(CreateUser {
            username: "ml".to_string(),
            favorite_genre: "crime".to_string(),
        });
        assert_eq!(user.validate().unwrap_err().field, "username");
    }

    #[test]
    fn favorite_genre_is_required() {
        let user = UserRecord::new(CreateUser {
            username: "mluukkai".to_string(),
            favorite_genre: String::new(),
        });
        let err = user.validate().unwrap_err();
        assert_eq!(err.field, "favoriteGenre");
        assert_eq!(err.message, "is required");
    }
}
