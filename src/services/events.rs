//! In-process event bus for catalog changes.
//!
//! One [LibraryEvents] is created per process and handed to the GraphQL
//! schema. Each subscription takes its own receiver and drops it when the
//! client goes away; there is no replay for late subscribers.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info;

use crate::db::{AuthorRecord, BookRecord};
use crate::services::manager::{Service, ServiceHealth};

/// Events published on the bus
#[derive(Debug, Clone)]
pub enum LibraryEvent {
    /// A book was committed, together with its (possibly new) author
    BookAdded {
        book: BookRecord,
        author: AuthorRecord,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event bus is closed")]
pub struct EventsClosed;

/// Broadcast bus shared by mutations (publishers) and subscriptions.
#[derive(Clone)]
pub struct LibraryEvents {
    sender: Arc<RwLock<Option<broadcast::Sender<LibraryEvent>>>>,
    capacity: usize,
}

impl LibraryEvents {
    /// `capacity` bounds how far a subscriber may fall behind before it
    /// starts skipping events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(RwLock::new(Some(sender))),
            capacity: capacity.max(1),
        }
    }

    /// Register a new listener. Only events published after this call are seen.
    pub fn subscribe(&self) -> Result<broadcast::Receiver<LibraryEvent>, EventsClosed> {
        self.sender
            .read()
            .as_ref()
            .map(|s| s.subscribe())
            .ok_or(EventsClosed)
    }

    /// Publish to every current listener, returning how many received it.
    /// Publishing with nobody listening is not an error.
    pub fn publish(&self, event: LibraryEvent) -> usize {
        match self.sender.read().as_ref() {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Number of live listeners
    pub fn subscriber_count(&self) -> usize {
        self.sender
            .read()
            .as_ref()
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    /// Reopen the bus after [close](Self::close). No-op when already open.
    pub fn open(&self) {
        let mut guard = self.sender.write();
        if guard.is_none() {
            let (sender, _) = broadcast::channel(self.capacity);
            *guard = Some(sender);
        }
    }

    /// Drop the sender; every open subscription stream ends.
    pub fn close(&self) {
        self.sender.write().take();
    }

    pub fn is_open(&self) -> bool {
        self.sender.read().is_some()
    }
}

/// Lifecycle wrapper registering the bus with the services manager.
pub struct EventsService {
    events: LibraryEvents,
}

impl EventsService {
    pub fn new(events: LibraryEvents) -> Self {
        Self { events }
    }
}

#[async_trait]
impl Service for EventsService {
    fn name(&self) -> &str {
        "events"
    }

    async fn start(&self) -> Result<()> {
        self.events.open();
        info!(service = "events", capacity = self.events.capacity, "Event bus started");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let subscribers = self.events.subscriber_count();
        self.events.close();
        info!(service = "events", subscribers, "Event bus stopped");
        Ok(())
    }

    async fn health(&self) -> Result<ServiceHealth> {
        if self.events.is_open() {
            Ok(ServiceHealth::healthy())
        } else {
            Ok(ServiceHealth::unhealthy("event bus is closed"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CreateBook;

    fn book_added(title: &str) -> LibraryEvent {
        let author = AuthorRecord::new("Joshua Kerievsky");
        let book = BookRecord::new(
            CreateBook {
                title: title.to_string(),
                published: 2004,
                genres: vec!["refactoring".to_string()],
            },
            &author.id,
        );
        LibraryEvent::BookAdded { book, author }
    }

    fn title(event: LibraryEvent) -> String {
        match event {
            LibraryEvent::BookAdded { book, .. } => book.title,
        }
    }

    #[tokio::test]
    async fn every_subscriber_sees_events_in_order() {
        let events = LibraryEvents::new(8);
        let mut first = events.subscribe().unwrap();
        let mut second = events.subscribe().unwrap();

        assert_eq!(events.publish(book_added("Refactoring to patterns")), 2);
        assert_eq!(events.publish(book_added("Practical Object-Oriented Design")), 2);

        for rx in [&mut first, &mut second] {
            assert_eq!(title(rx.recv().await.unwrap()), "Refactoring to patterns");
            assert_eq!(title(rx.recv().await.unwrap()), "Practical Object-Oriented Design");
        }
    }

    #[tokio::test]
    async fn late_subscribers_get_no_replay() {
        let events = LibraryEvents::new(8);
        assert_eq!(events.publish(book_added("Refactoring to patterns")), 0);

        let mut late = events.subscribe().unwrap();
        assert!(late.try_recv().is_err());
    }

    #[tokio::test]
    async fn dropping_a_receiver_unregisters_it() {
        let events = LibraryEvents::new(8);
        let rx = events.subscribe().unwrap();
        assert_eq!(events.subscriber_count(), 1);
        drop(rx);
        assert_eq!(events.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn closing_ends_open_streams() {
        let events = LibraryEvents::new(8);
        let mut rx = events.subscribe().unwrap();

        events.close();
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
        assert_eq!(events.subscribe().unwrap_err(), EventsClosed);
        assert_eq!(events.publish(book_added("Refactoring to patterns")), 0);

        events.open();
        assert!(events.subscribe().is_ok());
    }

    #[tokio::test]
    async fn service_health_follows_the_bus() {
        use crate::services::manager::HealthStatus;

        let events = LibraryEvents::new(8);
        let service = EventsService::new(events.clone());

        service.start().await.unwrap();
        assert_eq!(service.health().await.unwrap().status, HealthStatus::Healthy);

        service.stop().await.unwrap();
        assert!(!events.is_open());
        let health = service.health().await.unwrap();
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(health.message.as_deref(), Some("event bus is closed"));
    }
}
