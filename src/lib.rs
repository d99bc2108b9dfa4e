//! Bookshelf - GraphQL catalog of books and authors
//!
//! Books, authors and users are stored in SQLite. Everything is exposed via
//! GraphQL at /graphql, with a `bookAdded` subscription on /graphql/ws.

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod graphql;
pub mod services;

pub use app::{AppState, build_app};
