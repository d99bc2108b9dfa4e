//! HTTP routes for /graphql and /graphql/ws.
//!
//! Both transports resolve the caller's identity once, before the operation
//! runs, and attach it to the request data as a [CurrentUser].

use std::sync::Arc;

use async_graphql::Data;
use async_graphql::http::{ALL_WEBSOCKET_PROTOCOLS, GraphiQLSource};
use async_graphql_axum::{GraphQLProtocol, GraphQLRequest, GraphQLResponse, GraphQLWebSocket};
use axum::Router;
use axum::extract::{State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::http::header::{ACCEPT, AUTHORIZATION};
use axum::response::IntoResponse;
use axum::routing::get;

use crate::AppState;
use crate::services::{AuthService, CurrentUser};

/// Router with /graphql (POST, GraphiQL on GET) and /graphql/ws
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/graphql/ws", get(graphql_ws_handler))
}

fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok())
}

async fn graphiql(headers: HeaderMap) -> impl IntoResponse {
    let accepts_html = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false);

    if accepts_html {
        axum::response::Html(
            GraphiQLSource::build()
                .endpoint("/graphql")
                .subscription_endpoint("/graphql/ws")
                .finish(),
        )
        .into_response()
    } else {
        (
            axum::http::StatusCode::METHOD_NOT_ALLOWED,
            axum::Json(serde_json::json!({
                "error": "GET requests are not supported for GraphQL queries. Use POST with Content-Type: application/json"
            })),
        )
            .into_response()
    }
}

async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let current_user = state.auth.resolve_header(authorization_header(&headers)).await;
    let request = req.into_inner().data(current_user);
    state.schema.execute(request).await.into()
}

async fn graphql_ws_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    protocol: GraphQLProtocol,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let current_user = state.auth.resolve_header(authorization_header(&headers)).await;
    let auth = state.auth.clone();

    ws.protocols(ALL_WEBSOCKET_PROTOCOLS)
        .on_upgrade(move |socket| {
            GraphQLWebSocket::new(socket, state.schema.clone(), protocol)
                .with_data(connection_data(current_user))
                .on_connection_init(move |params| connection_init_data(auth, params))
                .serve()
        })
}

/// Connection-wide data for a subscription socket, holding the identity
/// resolved from the upgrade request.
pub fn connection_data(current_user: CurrentUser) -> Data {
    let mut data = Data::default();
    data.insert(current_user);
    data
}

/// Handle the `connection_init` payload of a subscription socket.
///
/// The returned data is merged over [connection_data], so it only carries a
/// user when the payload's `Authorization` entry authenticates. A missing,
/// malformed or rejected entry leaves the upgrade identity in place.
pub async fn connection_init_data(
    auth: Arc<AuthService>,
    params: serde_json::Value,
) -> async_graphql::Result<Data> {
    let mut data = Data::default();
    let header = params
        .get("Authorization")
        .or_else(|| params.get("authorization"))
        .and_then(|v| v.as_str());

    if let Some(header) = header {
        match auth.resolve_header(Some(header)).await {
            CurrentUser::Authenticated(user) => {
                data.insert(CurrentUser::Authenticated(user));
            }
            CurrentUser::Anonymous => {
                tracing::debug!("connection_init authorization ignored");
            }
        }
    }
    Ok(data)
}
