//! GraphQL authentication and authorization
//!
//! The transport layer resolves the `Authorization` header once per request
//! and stores a [CurrentUser] in the request data. Resolvers read it through
//! [AuthExt].
//!
//! ## Guards
//!
//! Use `AuthGuard` to require authentication on any GraphQL operation:
//!
//! ```ignore
//! #[graphql(guard = "AuthGuard")]
//! async fn protected_mutation(&self, ctx: &Context<'_>) -> Result<Book> { ... }
//! ```

use async_graphql::{Context, ErrorExtensions, Result};

use crate::db::UserRecord;
pub use crate::services::CurrentUser;

use super::errors::ApiError;

/// Extension trait to get the authenticated user from GraphQL context
pub trait AuthExt {
    /// Get the authenticated user, or return an UNAUTHENTICATED error
    fn current_user(&self) -> Result<&UserRecord>;

    /// Get the authenticated user if present
    fn try_current_user(&self) -> Option<&UserRecord>;
}

impl<'a> AuthExt for Context<'a> {
    fn current_user(&self) -> Result<&UserRecord> {
        self.try_current_user()
            .ok_or_else(|| ApiError::Unauthenticated.extend())
    }

    fn try_current_user(&self) -> Option<&UserRecord> {
        self.data_opt::<CurrentUser>().and_then(CurrentUser::user)
    }
}

/// Guard that requires authentication for GraphQL operations.
///
/// Runs before the resolver body, so a rejected call performs no reads or
/// writes.
pub struct AuthGuard;

impl async_graphql::Guard for AuthGuard {
    fn check(&self, ctx: &Context<'_>) -> impl std::future::Future<Output = Result<()>> + Send {
        let result = ctx.current_user().map(|_| ());
        async move { result }
    }
}
