//! GraphQL schema definition with queries, mutations, and subscriptions
//!
//! Domain resolvers live in `queries/` and `mutations/` and are merged into
//! the roots here. Shared services are attached as schema data.

use std::sync::Arc;

use async_graphql::{MergedObject, MergedSubscription, Schema};

use crate::db::Database;
use crate::services::{AuthService, CatalogService, LibraryEvents};

use super::mutations::{AuthMutations, AuthorMutations, BookMutations, UserMutations};
use super::queries::{AuthorQueries, BookQueries, UserQueries};
use super::subscriptions::BookSubscriptions;

/// The GraphQL schema type
pub type BookshelfSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

#[derive(MergedObject, Default)]
pub struct QueryRoot(BookQueries, AuthorQueries, UserQueries);

#[derive(MergedObject, Default)]
pub struct MutationRoot(BookMutations, AuthorMutations, UserMutations, AuthMutations);

#[derive(MergedSubscription, Default)]
pub struct SubscriptionRoot(BookSubscriptions);

/// Build the GraphQL schema with all resolvers
pub fn build_schema(db: Database, auth: Arc<AuthService>, events: LibraryEvents) -> BookshelfSchema {
    let catalog = CatalogService::new(db.clone(), events.clone());

    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        SubscriptionRoot::default(),
    )
    .data(db)
    .data(auth)
    .data(events)
    .data(catalog)
    .extension(async_graphql::extensions::Tracing)
    .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdl_exposes_the_catalog_contract() {
        let schema = Schema::build(
            QueryRoot::default(),
            MutationRoot::default(),
            SubscriptionRoot::default(),
        )
        .finish();
        let sdl = schema.sdl();

        for expected in [
            "bookCount: Int!",
            "authorCount: Int!",
            "allBooks(author: String, genre: String): [Book!]!",
            "allAuthors: [Author!]!",
            "me: User!",
            "addBook(title: String!, author: String!, published: Int!, genres: [String!]!): Book!",
            "editAuthor(name: String!, setBornTo: Int!): Author!",
            "createUser(username: String!, favoriteGenre: String!): User!",
            "login(username: String!, password: String!): Token!",
            "bookAdded: Book!",
        ] {
            assert!(sdl.contains(expected), "missing `{}` in:\n{}", expected, sdl);
        }
    }
}
