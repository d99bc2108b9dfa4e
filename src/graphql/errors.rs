//! Client-facing GraphQL errors.
//!
//! Every resolver failure is converted through [ApiError] so clients get a
//! stable `code` extension:
//!
//! | variant          | `code`                  | extra extensions |
//! |------------------|-------------------------|------------------|
//! | `Unauthenticated`| `UNAUTHENTICATED`       | none             |
//! | `InvalidInput`   | `BAD_USER_INPUT`        | `invalidArgs`    |
//! | `Internal`       | `INTERNAL_SERVER_ERROR` | none             |

use async_graphql::{ErrorExtensions, Value};
use thiserror::Error;

use crate::db::DbError;
use crate::services::AuthError;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("{message}")]
    InvalidInput {
        message: String,
        invalid_args: serde_json::Value,
    },

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>, invalid_args: serde_json::Value) -> Self {
        ApiError::InvalidInput {
            message: message.into(),
            invalid_args,
        }
    }

    /// Map a store failure. Input problems keep the offending arguments;
    /// anything else is logged and reported without detail.
    pub fn from_db(err: DbError, invalid_args: serde_json::Value) -> Self {
        if err.is_invalid_input() {
            let message = match &err {
                DbError::Validation(v) => format!("Validation failed: {}", v),
                other => other.to_string(),
            };
            return ApiError::invalid_input(message, invalid_args);
        }
        tracing::error!(error = %err, "Store operation failed");
        ApiError::Internal("internal storage error".to_string())
    }

    pub fn from_auth(err: AuthError, invalid_args: serde_json::Value) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ApiError::invalid_input(AuthError::InvalidCredentials.to_string(), invalid_args)
            }
            AuthError::Store(db) => ApiError::from_db(db, invalid_args),
            other => {
                tracing::error!(error = %other, "Token handling failed");
                ApiError::Internal("could not issue token".to_string())
            }
        }
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| match self {
            ApiError::Unauthenticated => e.set("code", "UNAUTHENTICATED"),
            ApiError::InvalidInput { invalid_args, .. } => {
                e.set("code", "BAD_USER_INPUT");
                e.set(
                    "invalidArgs",
                    Value::from_json(invalid_args.clone()).unwrap_or(Value::Null),
                );
            }
            ApiError::Internal(_) => e.set("code", "INTERNAL_SERVER_ERROR"),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::db::ValidationError;

    fn extensions(err: &ApiError) -> serde_json::Value {
        let gql = err.extend();
        serde_json::to_value(gql.extensions).unwrap()
    }

    #[test]
    fn unauthenticated_has_code_only() {
        let ext = extensions(&ApiError::Unauthenticated);
        assert_eq!(ext, json!({ "code": "UNAUTHENTICATED" }));
    }

    #[test]
    fn invalid_input_carries_arguments() {
        let err = ApiError::from_db(
            DbError::Validation(ValidationError::new("title", "is required")),
            json!({ "title": "" }),
        );

        assert_eq!(err.to_string(), "Validation failed: title: is required");
        assert_eq!(
            extensions(&err),
            json!({ "code": "BAD_USER_INPUT", "invalidArgs": { "title": "" } })
        );
    }

    #[test]
    fn conflicts_are_input_errors() {
        let err = ApiError::from_db(DbError::Conflict { field: "username" }, json!({}));
        assert!(matches!(err, ApiError::InvalidInput { .. }));
        assert_eq!(err.to_string(), "username must be unique");
    }

    #[test]
    fn store_failures_hide_details() {
        let err = ApiError::from_db(DbError::Sqlx(sqlx::Error::PoolClosed), json!({}));
        assert_eq!(extensions(&err), json!({ "code": "INTERNAL_SERVER_ERROR" }));
    }
}
