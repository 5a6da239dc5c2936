//! API Server Module
//!
//! This module implements a JSON-RPC server for the graph query API.
//! It provides an HTTP endpoint that accepts queries, resolves them through
//! the query engine (which drives the batching cache), and returns the
//! resolved graph data.
//!
//! Each request gets its own resolution scope; there is no process-wide
//! request lock. The only shared state is the graph store behind its own
//! read-write lock.

use crate::{
    config::Config,
    graph::GraphStore,
    query::QueryResolver,
    types::UserId,
};
use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Shared application state accessible across all request handlers
///
/// - `resolver`: resolves queries; builds a fresh loader scope per query
/// - `deadline`: per-request resolution deadline from configuration
#[derive(Clone)]
pub struct AppState {
    resolver: Arc<QueryResolver>,
    deadline: Duration,
}

/// The main API server struct
///
/// Encapsulates the server configuration and application state.
pub struct Server {
    config: Config,
    state: AppState,
}

impl Server {
    /// Creates a new API server instance
    ///
    /// # Arguments
    /// * `config` - Server configuration (host, port, request deadline)
    /// * `store` - The shared relationship graph
    pub fn new(config: Config, store: GraphStore) -> Self {
        let state = AppState {
            resolver: Arc::new(QueryResolver::new(store)),
            deadline: Duration::from_millis(config.request.timeout_ms),
        };

        Self { config, state }
    }

    /// Starts the API server and begins listening for incoming requests
    ///
    /// Binds an Axum router with a single POST endpoint at "/" to the
    /// configured host and port and serves requests until shutdown.
    pub async fn start(self) -> anyhow::Result<()> {
        let app = Router::new()
            .route("/", post(handle_rpc))
            .with_state(self.state);

        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);
        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// JSON-RPC 2.0 request structure
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Value,
    id: Value,
}

/// JSON-RPC 2.0 response structure
///
/// Either `result` or `error` is populated, never both.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Value,
}

/// JSON-RPC error object
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcResponse {
    fn success(result: Value, id: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    fn failure(code: i32, message: String, id: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError { code, message }),
            id,
        }
    }
}

/// Parameters of the "getUser" method
#[derive(Debug, Deserialize)]
struct GetUserParams {
    id: UserId,
}

/// Parameters of the "signUp" method
#[derive(Debug, Deserialize)]
struct SignUpParams {
    id: UserId,
    name: String,
}

/// Main RPC request handler
///
/// Called for every POST request to the "/" endpoint. Routes the request to
/// the appropriate method handler and bounds the whole resolution with the
/// configured deadline; on expiry the resolution future is dropped, which
/// cancels the query's loader scope along with it.
async fn handle_rpc(
    State(state): State<AppState>,
    Json(request): Json<JsonRpcRequest>,
) -> Json<JsonRpcResponse> {
    info!("Received RPC request: {}", request.method);

    let id = request.id.clone();
    let resolution = dispatch(&state, request);

    match timeout(state.deadline, resolution).await {
        Ok(response) => Json(response),
        Err(_) => {
            warn!("Request deadline of {:?} exceeded", state.deadline);
            Json(JsonRpcResponse::failure(
                -32001,
                "request deadline exceeded".to_string(),
                id,
            ))
        }
    }
}

/// Route a request to its method handler
async fn dispatch(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    match request.method.as_str() {
        "listUsers" => handle_list_users(state, request.id).await,
        "getUser" => handle_get_user(state, request.params, request.id).await,
        "signUp" => handle_sign_up(state, request.params, request.id).await,
        _ => JsonRpcResponse::failure(-32601, "Method not found".to_string(), request.id),
    }
}

/// Handles the "listUsers" RPC method
///
/// Resolves every user together with their friend list. All friend lookups
/// of the query are served by one batched fetch.
async fn handle_list_users(state: &AppState, id: Value) -> JsonRpcResponse {
    match state.resolver.list_users().await {
        Ok(users) => match serde_json::to_value(users) {
            Ok(value) => JsonRpcResponse::success(value, id),
            Err(e) => JsonRpcResponse::failure(-32000, e.to_string(), id),
        },
        Err(e) => {
            warn!("listUsers resolution failed: {}", e);
            JsonRpcResponse::failure(-32000, e.to_string(), id)
        }
    }
}

/// Handles the "getUser" RPC method
///
/// Returns the user with their friend list, or a null result for an unknown
/// id (absence is not an error).
async fn handle_get_user(state: &AppState, params: Value, id: Value) -> JsonRpcResponse {
    let params: GetUserParams = match serde_json::from_value(params) {
        Ok(params) => params,
        Err(e) => {
            return JsonRpcResponse::failure(-32602, format!("Invalid params: {}", e), id);
        }
    };

    match state.resolver.get_user(params.id).await {
        Ok(user) => match serde_json::to_value(user) {
            Ok(value) => JsonRpcResponse::success(value, id),
            Err(e) => JsonRpcResponse::failure(-32000, e.to_string(), id),
        },
        Err(e) => {
            warn!("getUser resolution failed for {}: {}", params.id, e);
            JsonRpcResponse::failure(-32000, e.to_string(), id)
        }
    }
}

/// Handles the "signUp" RPC method
///
/// Inserts a user (overwriting any existing entry with the same id, as the
/// demo graph allows) and returns it.
async fn handle_sign_up(state: &AppState, params: Value, id: Value) -> JsonRpcResponse {
    let params: SignUpParams = match serde_json::from_value(params) {
        Ok(params) => params,
        Err(e) => {
            return JsonRpcResponse::failure(-32602, format!("Invalid params: {}", e), id);
        }
    };

    let user = state.resolver.sign_up(params.id, params.name).await;
    match serde_json::to_value(user) {
        Ok(value) => JsonRpcResponse::success(value, id),
        Err(e) => JsonRpcResponse::failure(-32000, e.to_string(), id),
    }
}
