use super::prelude::*;

#[derive(Default)]
pub struct UserMutations;

#[Object]
impl UserMutations {
    /// Create a user. No authentication required.
    async fn create_user(
        &self,
        ctx: &Context<'_>,
        username: String,
        favorite_genre: String,
    ) -> Result<User> {
        let catalog = ctx.data_unchecked::<CatalogService>();
        let args = json!({ "username": username, "favoriteGenre": favorite_genre });

        let user = catalog
            .create_user(CreateUser {
                username,
                favorite_genre,
            })
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "createUser rejected");
                ApiError::from_db(e, args).extend()
            })?;

        Ok(User::from(user))
    }
}
