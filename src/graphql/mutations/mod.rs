pub mod auth;
pub mod authors;
pub mod books;
pub mod user;

pub use auth::AuthMutations;
pub use authors::AuthorMutations;
pub use books::BookMutations;
pub use user::UserMutations;

pub(crate) mod prelude {
    pub(crate) use std::sync::Arc;

    pub(crate) use async_graphql::{Context, ErrorExtensions, Object, Result};
    pub(crate) use serde_json::json;

    pub(crate) use crate::db::*;
    pub(crate) use crate::graphql::auth::{AuthExt, AuthGuard};
    pub(crate) use crate::graphql::errors::ApiError;
    pub(crate) use crate::graphql::types::*;
    pub(crate) use crate::services::{AddBookInput, AuthService, CatalogService};
}
