//! Authors repository
//!
//! An author owns an ordered list of book ids, stored as a JSON array in the
//! `book_ids` column.

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

use super::sqlite_helpers::{json_to_vec, new_id, now_iso8601, vec_to_json};
use super::validation::{AUTHOR_NAME_MIN_LEN, Validate, ValidationError, min_length};
use super::{DbError, conflict_on};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorRecord {
    pub id: String,
    pub name: String,
    pub born: Option<i32>,
    pub book_ids: Vec<String>,
    pub created_at: String,
}

impl AuthorRecord {
    /// A new, not yet persisted author with no books
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            born: None,
            book_ids: Vec::new(),
            created_at: now_iso8601(),
        }
    }
}

impl Validate for AuthorRecord {
    fn validate(&self) -> Result<(), ValidationError> {
        min_length("name", &self.name, AUTHOR_NAME_MIN_LEN)
    }
}

type AuthorRow = (String, String, Option<i32>, String, String);

const SELECT_AUTHOR: &str = "SELECT id, name, born, book_ids, created_at FROM authors";

fn from_row(r: AuthorRow) -> AuthorRecord {
    AuthorRecord {
        id: r.0,
        name: r.1,
        born: r.2,
        book_ids: json_to_vec(&r.3),
        created_at: r.4,
    }
}

// ============================================================================
// Connection-level operations (usable inside a transaction)
// ============================================================================

/// Find an author by exact name
pub async fn find_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<AuthorRecord>, DbError> {
    let row = sqlx::query_as::<_, AuthorRow>(&format!("{} WHERE name = ?", SELECT_AUTHOR))
        .bind(name)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(from_row))
}

/// Insert a new author
pub async fn insert(conn: &mut SqliteConnection, author: &AuthorRecord) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO authors (id, name, born, book_ids, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&author.id)
    .bind(&author.name)
    .bind(author.born)
    .bind(vec_to_json(&author.book_ids))
    .bind(&author.created_at)
    .execute(conn)
    .await
    .map_err(|e| conflict_on(e, "name"))?;

    Ok(())
}

/// Write back the mutable fields of an existing author
pub async fn update(conn: &mut SqliteConnection, author: &AuthorRecord) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE authors SET name = ?, born = ?, book_ids = ? WHERE id = ?")
        .bind(&author.name)
        .bind(author.born)
        .bind(vec_to_json(&author.book_ids))
        .bind(&author.id)
        .execute(conn)
        .await
        .map_err(|e| conflict_on(e, "name"))?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound {
            entity: "author",
            key: author.id.clone(),
        });
    }
    Ok(())
}

// ============================================================================
// Repository
// ============================================================================

pub struct AuthorRepository {
    pool: SqlitePool,
}

impl AuthorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Total number of authors
    pub async fn count(&self) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// All authors in insertion order
    pub async fn list(&self) -> Result<Vec<AuthorRecord>, DbError> {
        let rows = sqlx::query_as::<_, AuthorRow>(&format!("{} ORDER BY rowid", SELECT_AUTHOR))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(from_row).collect())
    }

    /// Authors for a set of ids, in no particular order
    pub async fn list_by_ids(&self, ids: &[String]) -> Result<Vec<AuthorRecord>, DbError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, AuthorRow>(&format!(
            "{} WHERE id IN (SELECT value FROM json_each(?))",
            SELECT_AUTHOR
        ))
        .bind(vec_to_json(ids))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(from_row).collect())
    }

    /// Get author by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Option<AuthorRecord>, DbError> {
        let row = sqlx::query_as::<_, AuthorRow>(&format!("{} WHERE id = ?", SELECT_AUTHOR))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(from_row))
    }

    /// Get author by exact name
    pub async fn get_by_name(&self, name: &str) -> Result<Option<AuthorRecord>, DbError> {
        let mut conn = self.pool.acquire().await?;
        find_by_name(&mut conn, name).await
    }

    /// Validate and persist changes to an existing author
    pub async fn save(&self, author: &AuthorRecord) -> Result<(), DbError> {
        author.validate()?;
        let mut conn = self.pool.acquire().await?;
        update(&mut conn, author).await
    }
}
