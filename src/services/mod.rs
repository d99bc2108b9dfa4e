//! Application services

pub mod auth;
pub mod catalog;
pub mod database;
pub mod events;
pub mod logging;
pub mod manager;

pub use auth::{AuthConfig, AuthError, AuthService, CurrentUser, LoginResult, TokenClaims};
pub use catalog::{AddBookInput, CatalogService};
pub use database::DatabaseService;
pub use events::{EventsClosed, EventsService, LibraryEvent, LibraryEvents};
pub use logging::{LogFormat, init_tracing};
pub use manager::{HealthStatus, Service, ServiceHealth, ServicesManager};
