use super::prelude::*;

#[derive(Default)]
pub struct AuthorQueries;

#[Object]
impl AuthorQueries {
    /// Total number of authors in the catalog
    async fn author_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let db = ctx.data_unchecked::<Database>();
        db.authors()
            .count()
            .await
            .map_err(|e| ApiError::from_db(e, json!({})).extend())
    }

    /// All authors in creation order
    async fn all_authors(&self, ctx: &Context<'_>) -> Result<Vec<Author>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db
            .authors()
            .list()
            .await
            .map_err(|e| ApiError::from_db(e, json!({})).extend())?;

        Ok(records.into_iter().map(Author::from).collect())
    }
}
