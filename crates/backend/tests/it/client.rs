//! Persistence client against an in-process backend.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use vellum_backend::{
    BackendClient, BackendError, DeployedContractRef, SaveRequest, SignedPayload,
};
use vellum_common::{CanonicalAddress, ErrorKind};
use vellum_test_utils::fixtures;

use crate::utils::{dead_url, spawn};

const OWNER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

#[derive(Clone, Default)]
struct Backend {
    saved: Arc<Mutex<Vec<Value>>>,
    deleted: Arc<Mutex<Vec<(String, Value)>>>,
    fail_save: bool,
}

async fn save(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    if backend.fail_save {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "firestore down"})))
            .into_response();
    }
    backend.saved.lock().push(body);
    (StatusCode::CREATED, Json(json!({"message": "saved", "firestoreId": "doc-1"}))).into_response()
}

async fn list(Path(owner): Path<String>) -> Response {
    match owner.as_str() {
        OWNER => Json(json!([{
            "contractAddress": CONTRACT,
            "abi": [],
            "network": "sepolia",
            "name": "My counter",
            "description": "",
            "contractNameSol": "Counter",
            "firestoreId": "doc-1"
        }]))
        .into_response(),
        "0x0000000000000000000000000000000000000001" => {
            (StatusCode::BAD_REQUEST, Json(json!({"message": "No contracts found for user"})))
                .into_response()
        }
        "0x0000000000000000000000000000000000000002" => {
            (StatusCode::INTERNAL_SERVER_ERROR, "database offline").into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn remove(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    backend.deleted.lock().push((id, body));
    Json(json!({"message": "deleted"})).into_response()
}

async fn backend(backend: Backend) -> BackendClient {
    let router = Router::new()
        .route("/save-contract-reference", post(save))
        .route("/user-contracts/{id}", get(list).delete(remove))
        .with_state(backend);
    BackendClient::new(&spawn(router).await).unwrap()
}

fn owner() -> CanonicalAddress {
    OWNER.parse().unwrap()
}

fn auth() -> SignedPayload {
    SignedPayload { signed_message: "msg".into(), signature: "0x00".into(), user_address: owner() }
}

fn reference() -> DeployedContractRef {
    DeployedContractRef {
        contract_address: CONTRACT.parse().unwrap(),
        abi: fixtures::counter_abi(),
        network: "Sepolia".into(),
        name: "My counter".into(),
        description: String::new(),
        contract_name_sol: Some("Counter".into()),
        firestore_id: None,
        created_at: None,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn saves_reference() {
    let state = Backend::default();
    let client = backend(state.clone()).await;

    let resp =
        client.save_reference(&SaveRequest { contract_data: reference(), auth: auth() }).await.unwrap();
    assert_eq!(resp.firestore_id, "doc-1");

    let saved = state.saved.lock();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0]["contractData"]["network"], "sepolia");
    assert_eq!(
        saved[0]["contractData"]["contractAddress"],
        "0x5fbdb2315678afecb367f032d93f642f64180aa3"
    );
    assert_eq!(saved[0]["userAddress"], OWNER);
    assert_eq!(saved[0]["signedMessage"], "msg");
}

#[tokio::test(flavor = "multi_thread")]
async fn refuses_reference_without_abi() {
    let state = Backend::default();
    let client = backend(state.clone()).await;

    let mut contract_data = reference();
    contract_data.abi = Default::default();
    let err = client.save_reference(&SaveRequest { contract_data, auth: auth() }).await.unwrap_err();
    assert!(matches!(err, BackendError::MissingAbi));
    assert!(state.saved.lock().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn surfaces_backend_error() {
    let client = backend(Backend { fail_save: true, ..Default::default() }).await;

    let err = client
        .save_reference(&SaveRequest { contract_data: reference(), auth: auth() })
        .await
        .unwrap_err();
    match &err {
        BackendError::Rejected { status, message } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(message, "firestore down");
        }
        err => panic!("unexpected error: {err:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::BackendUnreachable);
}

#[tokio::test(flavor = "multi_thread")]
async fn lists_references() {
    let client = backend(Backend::default()).await;

    let references = client.list_references(owner()).await.unwrap();
    assert_eq!(references.len(), 1);
    assert_eq!(references[0].firestore_id.as_deref(), Some("doc-1"));
    assert_eq!(references[0].contract_address.to_string(), CONTRACT.to_lowercase());
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_references_are_empty() {
    let client = backend(Backend::default()).await;

    let not_found = "0x00000000000000000000000000000000000000ff".parse().unwrap();
    assert!(client.list_references(not_found).await.unwrap().is_empty());

    let none = "0x0000000000000000000000000000000000000001".parse().unwrap();
    assert!(client.list_references(none).await.unwrap().is_empty());

    let broken = "0x0000000000000000000000000000000000000002".parse().unwrap();
    let err = client.list_references(broken).await.unwrap_err();
    assert!(matches!(&err, BackendError::Rejected { message, .. } if message == "database offline"));
}

#[tokio::test(flavor = "multi_thread")]
async fn deletes_reference() {
    let state = Backend::default();
    let client = backend(state.clone()).await;

    let resp = client.delete_reference("doc-1", &auth()).await.unwrap();
    assert_eq!(resp.message, "deleted");

    let deleted = state.deleted.lock();
    assert_eq!(deleted[0].0, "doc-1");
    assert_eq!(deleted[0].1["userAddress"], OWNER);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_backend() {
    let client = BackendClient::new(&dead_url().await).unwrap();
    let err = client.list_references(owner()).await.unwrap_err();
    assert!(matches!(err, BackendError::Unreachable(_)), "{err:?}");
    assert!(err.kind().is_retryable_by_user());
}
