//! GraphQL subscriptions for real-time updates
//!
//! Subscriptions allow clients to receive push updates over WebSocket. Each
//! stream holds its own receiver on the [LibraryEvents] bus; dropping the
//! stream unregisters it.

use async_graphql::{Context, ErrorExtensions, Result, Subscription};
use futures::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::services::{LibraryEvent, LibraryEvents};

use super::errors::ApiError;
use super::types::Book;

#[derive(Default)]
pub struct BookSubscriptions;

#[Subscription]
impl BookSubscriptions {
    /// Books added after the subscription started, in the order they were stored
    async fn book_added(&self, ctx: &Context<'_>) -> Result<impl Stream<Item = Book>> {
        let events = ctx.data_unchecked::<LibraryEvents>();
        let receiver = events.subscribe().map_err(|e| {
            tracing::warn!(error = %e, "bookAdded subscription refused");
            ApiError::Internal(e.to_string()).extend()
        })?;
        tracing::debug!(subscribers = events.subscriber_count(), "bookAdded subscription started");

        Ok(BroadcastStream::new(receiver).filter_map(|result| match result {
            Ok(LibraryEvent::BookAdded { book, author }) => Some(Book::from_records(book, author)),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "bookAdded subscriber fell behind, events skipped");
                None
            }
        }))
    }
}
