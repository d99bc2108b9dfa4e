//! SQLite helper utilities for type conversion
//!
//! SQLite has no array or UUID column types. List fields on catalog records
//! (book genres, an author's book ids) are stored as JSON text and ids as
//! UUID strings.

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

// ============================================================================
// Id Helpers
// ============================================================================

/// Generate a fresh record id
#[inline]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ============================================================================
// Array/Vec Helpers (stored as JSON strings in SQLite)
// ============================================================================

/// Serialize a slice to a JSON string for SQLite storage
#[inline]
pub fn vec_to_json<T: Serialize>(v: &[T]) -> String {
    serde_json::to_string(v).unwrap_or_else(|_| "[]".to_string())
}

/// Deserialize a JSON string from SQLite to a Vec
#[inline]
pub fn json_to_vec<T: DeserializeOwned>(s: &str) -> Vec<T> {
    serde_json::from_str(s).unwrap_or_default()
}

// ============================================================================
// Timestamp Helpers (stored as ISO8601 TEXT in SQLite)
// ============================================================================

/// Get current UTC timestamp as ISO8601 string for SQLite
#[inline]
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339()
}
