use super::prelude::*;

#[derive(Default)]
pub struct AuthorMutations;

#[Object]
impl AuthorMutations {
    /// Set the birth year of an existing author. Requires authentication.
    #[graphql(guard = "AuthGuard")]
    async fn edit_author(
        &self,
        ctx: &Context<'_>,
        name: String,
        set_born_to: i32,
    ) -> Result<Author> {
        let catalog = ctx.data_unchecked::<CatalogService>();
        let args = json!({ "name": name, "setBornTo": set_born_to });

        match catalog.edit_author(&name, set_born_to).await {
            Ok(Some(author)) => Ok(Author::from(author)),
            Ok(None) => {
                tracing::warn!(name = %name, "editAuthor on unknown author");
                Err(ApiError::invalid_input(format!("author '{}' not found", name), args).extend())
            }
            Err(e) => {
                tracing::warn!(name = %name, error = %e, "editAuthor rejected");
                Err(ApiError::from_db(e, args).extend())
            }
        }
    }
}
