//! The `addContract` endpoint: records a deployed contract on behalf of a user.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::any,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use uuid::Uuid;
use vellum_common::address::is_valid_address;

/// A contract stored through `addContract`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    /// Lowercase.
    pub user_address: String,
    /// Lowercase.
    pub contract_address: String,
    pub name: String,
    pub description: String,
    pub network: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
#[error("failed to store contract: {0}")]
pub struct StoreError(pub String);

/// Storage behind the endpoint.
#[async_trait]
pub trait ContractStore: Send + Sync + 'static {
    /// Stores `record` and returns its identifier.
    async fn add(&self, record: ContractRecord) -> Result<String, StoreError>;
}

/// Keeps records in memory, keyed by a random identifier.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<BTreeMap<String, ContractRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<ContractRecord> {
        self.records.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl ContractStore for MemoryStore {
    async fn add(&self, record: ContractRecord) -> Result<String, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        self.records.write().insert(id.clone(), record);
        Ok(id)
    }
}

/// Body accepted by `addContract`. Every field is optional on the wire so missing fields
/// are reported as a validation error rather than a decode failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddContractBody {
    user_address: Option<String>,
    contract_address: Option<String>,
    name: Option<String>,
    description: Option<String>,
    network: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddContractResponse {
    pub message: String,
    pub id: String,
}

/// Builds the router serving `addContract` at `/` and `/addContract`.
///
/// Browsers may only call it from `allowed_origins`.
pub fn router<S: ContractStore>(store: S, allowed_origins: &[String]) -> Router {
    let store: Arc<dyn ContractStore> = Arc::new(store);
    Router::new()
        .route("/", any(add_contract))
        .route("/addContract", any(add_contract))
        .with_state(store)
        .layer(cors(allowed_origins))
}

/// Serves [`router`] on `listener` until the task is dropped.
pub async fn serve<S: ContractStore>(
    listener: TcpListener,
    store: S,
    allowed_origins: &[String],
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, origins = ?allowed_origins, "serving addContract");
    }
    axum::serve(listener, router(store, allowed_origins)).await
}

fn cors(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([Method::POST]).allow_headers([header::CONTENT_TYPE]);
    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(AllowOrigin::any());
    }
    let origins = allowed_origins.iter().filter_map(|origin| match HeaderValue::from_str(origin) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(%origin, "ignoring invalid CORS origin");
            None
        }
    });
    layer.allow_origin(AllowOrigin::list(origins))
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

async fn add_contract(
    State(store): State<Arc<dyn ContractStore>>,
    method: Method,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response();
    }

    let body: AddContractBody = serde_json::from_slice(&body).unwrap_or_default();
    let (Some(user_address), Some(contract_address), Some(name), Some(network)) = (
        present(body.user_address),
        present(body.contract_address),
        present(body.name),
        present(body.network),
    ) else {
        warn!("addContract: missing required fields");
        return (StatusCode::BAD_REQUEST, "Missing required fields.").into_response();
    };

    if !is_valid_address(&user_address) || !is_valid_address(&contract_address) {
        warn!(%user_address, %contract_address, "addContract: invalid address format");
        return (StatusCode::BAD_REQUEST, "Invalid address format.").into_response();
    }

    let record = ContractRecord {
        user_address: user_address.to_lowercase(),
        contract_address: contract_address.to_lowercase(),
        name,
        description: body.description.unwrap_or_default(),
        network,
        created_at: Utc::now(),
    };
    match store.add(record).await {
        Ok(id) => {
            info!(%id, "contract added");
            let response =
                AddContractResponse { message: "Contract added successfully".to_string(), id };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(err) => {
            error!(%err, "error adding contract");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
