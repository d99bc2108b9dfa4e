//! Books repository
//!
//! Genres are stored as a JSON array; genre filtering runs inside SQLite
//! through `json_each`.

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use super::sqlite_helpers::{json_to_vec, new_id, now_iso8601, vec_to_json};
use super::validation::{BOOK_TITLE_MIN_LEN, Validate, ValidationError, min_length};
use super::{DbError, conflict_on};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: String,
    pub title: String,
    pub published: i32,
    pub genres: Vec<String>,
    pub author_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateBook {
    pub title: String,
    pub published: i32,
    pub genres: Vec<String>,
}

impl BookRecord {
    /// A new, not yet persisted book written by `author_id`
    pub fn new(input: CreateBook, author_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: input.title,
            published: input.published,
            genres: input.genres,
            author_id: author_id.into(),
            created_at: now_iso8601(),
        }
    }
}

impl Validate for BookRecord {
    fn validate(&self) -> Result<(), ValidationError> {
        min_length("title", &self.title, BOOK_TITLE_MIN_LEN)?;
        if self.genres.iter().any(|g| g.trim().is_empty()) {
            return Err(ValidationError::new("genres", "must not contain empty genres"));
        }
        Ok(())
    }
}

/// Optional filters for [BookRepository::list]
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub author_id: Option<String>,
    pub genre: Option<String>,
}

type BookRow = (String, String, i32, String, String, String);

const SELECT_BOOK: &str = "SELECT id, title, published, genres, author_id, created_at FROM books";

fn from_row(r: BookRow) -> BookRecord {
    BookRecord {
        id: r.0,
        title: r.1,
        published: r.2,
        genres: json_to_vec(&r.3),
        author_id: r.4,
        created_at: r.5,
    }
}

// ============================================================================
// Connection-level operations (usable inside a transaction)
// ============================================================================

/// Insert a new book
pub async fn insert(conn: &mut SqliteConnection, book: &BookRecord) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO books (id, title, published, genres, author_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&book.id)
    .bind(&book.title)
    .bind(book.published)
    .bind(vec_to_json(&book.genres))
    .bind(&book.author_id)
    .bind(&book.created_at)
    .execute(conn)
    .await
    .map_err(|e| conflict_on(e, "title"))?;

    Ok(())
}

// ============================================================================
// Repository
// ============================================================================

pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Total number of books
    pub async fn count(&self) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Books matching every set filter, in insertion order
    pub async fn list(&self, filter: &BookFilter) -> Result<Vec<BookRecord>, DbError> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_BOOK);
        query.push(" WHERE 1 = 1");

        if let Some(author_id) = &filter.author_id {
            query.push(" AND author_id = ").push_bind(author_id.clone());
        }
        if let Some(genre) = &filter.genre {
            query
                .push(" AND EXISTS (SELECT 1 FROM json_each(books.genres) WHERE json_each.value = ")
                .push_bind(genre.clone())
                .push(")");
        }
        query.push(" ORDER BY rowid");

        let rows = query
            .build_query_as::<BookRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(from_row).collect())
    }

    /// Books for the given ids, returned in the order of `ids`
    pub async fn list_by_ids(&self, ids: &[String]) -> Result<Vec<BookRecord>, DbError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "{} WHERE id IN (SELECT value FROM json_each(?))",
            SELECT_BOOK
        ))
        .bind(vec_to_json(ids))
        .fetch_all(&self.pool)
        .await?;

        let mut books: Vec<BookRecord> = rows.into_iter().map(from_row).collect();
        books.sort_by_key(|b| ids.iter().position(|id| id == &b.id));
        Ok(books)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(title: &str, genres: &[&str]) -> CreateBook {
        CreateBook {
            title: title.to_string(),
            published: 2008,
            genres: genres.iter().map(|g| g.to_string()).collect(),
        }
    }

    #[test]
    fn new_book_points_at_its_author() {
        let book = BookRecord::new(create("Clean Code", &["refactoring"]), "author-1");
        assert_eq!(book.author_id, "author-1");
        assert!(book.validate().is_ok());
    }

    #[test]
    fn short_titles_are_rejected() {
        let err = BookRecord::new(create("Dune", &[]), "a").validate().unwrap_err();
        assert_eq!(err.field, "title");
    }

    #[test]
    fn blank_genres_are_rejected() {
        let err = BookRecord::new(create("The Idiot", &["classic", " "]), "a")
            .validate()
            .unwrap_err();
        assert_eq!(err.field, "genres");
    }
}
