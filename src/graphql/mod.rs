//! GraphQL API with subscriptions for real-time updates
//!
//! This module provides the catalog API using async-graphql with support for
//! queries, mutations, and subscriptions over WebSocket.
//!
//! Resolvers are grouped per domain in `queries/` and `mutations/`; each file
//! defines a `#[derive(Default)]` struct with an `#[Object]` impl and the roots
//! combine them with `#[derive(MergedObject)]` in `schema.rs`.

pub mod auth;
pub mod errors;
pub mod mutations;
pub mod queries;
mod schema;
mod subscriptions;
pub mod types;

pub use auth::{AuthExt, AuthGuard, CurrentUser};
pub use errors::ApiError;
pub use schema::{BookshelfSchema, build_schema};
pub use types::{Author, Book, Token, User};
