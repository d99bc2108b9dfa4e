//! GraphQL object types for the catalog
//!
//! Field order follows the published contract:
//! `Author{name, id, born, bookCount, books}`,
//! `Book{title, published, author, id, genres}`,
//! `User{username, favoriteGenre, id}`, `Token{value}`.

use async_graphql::{Context, ErrorExtensions, ID, Object, Result, SimpleObject};
use serde_json::json;

use crate::db::{AuthorRecord, BookRecord, Database, UserRecord};

use super::errors::ApiError;

/// A book author; `bookCount` and `books` derive from the stored book ids
#[derive(Debug, Clone)]
pub struct Author {
    record: AuthorRecord,
}

impl From<AuthorRecord> for Author {
    fn from(record: AuthorRecord) -> Self {
        Self { record }
    }
}

#[Object]
impl Author {
    async fn name(&self) -> &str {
        &self.record.name
    }

    async fn id(&self) -> ID {
        ID(self.record.id.clone())
    }

    async fn born(&self) -> Option<i32> {
        self.record.born
    }

    /// Number of books credited to this author
    async fn book_count(&self) -> usize {
        self.record.book_ids.len()
    }

    /// Books by this author, oldest first
    async fn books(&self, ctx: &Context<'_>) -> Result<Vec<Book>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db
            .books()
            .list_by_ids(&self.record.book_ids)
            .await
            .map_err(|e| ApiError::from_db(e, json!({ "author": self.record.name })).extend())?;

        Ok(records
            .into_iter()
            .map(|book| Book::new(book, self.clone()))
            .collect())
    }
}

/// A book with its author resolved inline
#[derive(Debug, Clone, SimpleObject)]
pub struct Book {
    pub title: String,
    pub published: i32,
    pub author: Author,
    pub id: ID,
    pub genres: Vec<String>,
}

impl Book {
    pub fn new(record: BookRecord, author: Author) -> Self {
        Self {
            title: record.title,
            published: record.published,
            author,
            id: ID(record.id),
            genres: record.genres,
        }
    }

    pub fn from_records(book: BookRecord, author: AuthorRecord) -> Self {
        Self::new(book, Author::from(author))
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct User {
    pub username: String,
    pub favorite_genre: String,
    pub id: ID,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            username: record.username,
            favorite_genre: record.favorite_genre,
            id: ID(record.id),
        }
    }
}

/// Signed login token
#[derive(Debug, Clone, SimpleObject)]
pub struct Token {
    pub value: String,
}
