use std::collections::HashMap;

use super::prelude::*;

#[derive(Default)]
pub struct BookQueries;

#[Object]
impl BookQueries {
    /// Total number of books in the catalog
    async fn book_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let db = ctx.data_unchecked::<Database>();
        db.books()
            .count()
            .await
            .map_err(|e| ApiError::from_db(e, json!({})).extend())
    }

    /// All books, optionally narrowed to one author's name and/or a genre
    async fn all_books(
        &self,
        ctx: &Context<'_>,
        author: Option<String>,
        genre: Option<String>,
    ) -> Result<Vec<Book>> {
        let db = ctx.data_unchecked::<Database>();
        let args = json!({ "author": author, "genre": genre });
        let to_api = |e: DbError| ApiError::from_db(e, args.clone()).extend();

        let mut filter = BookFilter {
            genre,
            ..Default::default()
        };
        if let Some(name) = author.as_deref() {
            match db.authors().get_by_name(name).await.map_err(to_api)? {
                Some(found) => filter.author_id = Some(found.id),
                None => return Ok(Vec::new()),
            }
        }

        let records = db.books().list(&filter).await.map_err(to_api)?;

        let mut author_ids: Vec<String> = records.iter().map(|b| b.author_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();
        let authors: HashMap<String, AuthorRecord> = db
            .authors()
            .list_by_ids(&author_ids)
            .await
            .map_err(to_api)?
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();

        let mut books = Vec::with_capacity(records.len());
        for record in records {
            let Some(author) = authors.get(&record.author_id) else {
                tracing::error!(
                    book_id = %record.id,
                    author_id = %record.author_id,
                    "Book references a missing author"
                );
                return Err(ApiError::Internal("book without author".to_string()).extend());
            };
            books.push(Book::from_records(record, author.clone()));
        }

        Ok(books)
    }
}
