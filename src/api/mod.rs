//! API route definitions
//!
//! The primary API is GraphQL at /graphql, with subscriptions on /graphql/ws.
//! Liveness and readiness probes live at /healthz and /readyz.

pub mod graphql;
pub mod health;
