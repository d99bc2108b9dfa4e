pub mod authors;
pub mod books;
pub mod user;

pub use authors::AuthorQueries;
pub use books::BookQueries;
pub use user::UserQueries;

pub(crate) mod prelude {
    pub(crate) use async_graphql::{Context, ErrorExtensions, Object, Result};
    pub(crate) use serde_json::json;

    pub(crate) use crate::db::*;
    pub(crate) use crate::graphql::auth::AuthExt;
    pub(crate) use crate::graphql::errors::ApiError;
    pub(crate) use crate::graphql::types::*;
}
