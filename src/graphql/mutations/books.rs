use super::prelude::*;

#[derive(Default)]
pub struct BookMutations;

#[Object]
impl BookMutations {
    /// Add a book, creating its author on first use.
    ///
    /// Requires authentication. Subscribers of `bookAdded` are notified once
    /// the book is stored.
    #[graphql(guard = "AuthGuard")]
    async fn add_book(
        &self,
        ctx: &Context<'_>,
        title: String,
        author: String,
        published: i32,
        genres: Vec<String>,
    ) -> Result<Book> {
        let user = ctx.current_user()?;
        let catalog = ctx.data_unchecked::<CatalogService>();
        let args = json!({
            "title": title,
            "author": author,
            "published": published,
            "genres": genres,
        });

        let (book, author) = catalog
            .add_book(AddBookInput {
                title,
                author,
                published,
                genres,
            })
            .await
            .map_err(|e| {
                tracing::warn!(user_id = %user.id, error = %e, "addBook rejected");
                ApiError::from_db(e, args).extend()
            })?;

        Ok(Book::from_records(book, author))
    }
}
