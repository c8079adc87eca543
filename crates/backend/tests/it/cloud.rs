//! The `addContract` endpoint.

use async_trait::async_trait;
use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use vellum_backend::cloud::{ContractRecord, ContractStore, MemoryStore, StoreError, router};

struct BrokenStore;

#[async_trait]
impl ContractStore for BrokenStore {
    async fn add(&self, _record: ContractRecord) -> Result<String, StoreError> {
        Err(StoreError("quota exceeded".into()))
    }
}

const ORIGIN: &str = "http://localhost:4200";

fn origins() -> Vec<String> {
    vec![ORIGIN.to_string()]
}

fn body() -> Value {
    json!({
        "userAddress": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
        "contractAddress": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
        "name": "My counter",
        "network": "sepolia"
    })
}

async fn send<S: ContractStore>(store: S, method: &str, body: &Value) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri("/addContract")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router(store, &origins()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn adds_contract() {
    let store = MemoryStore::new();
    let (status, text) = send(store.clone(), "POST", &body()).await;
    assert_eq!(status, StatusCode::CREATED);

    let resp: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(resp["message"], "Contract added successfully");
    let record = store.get(resp["id"].as_str().unwrap()).unwrap();
    assert_eq!(record.user_address, "0x70997970c51812dc3a010c7d01b50e0d17dc79c8");
    assert_eq!(record.contract_address, "0x5fbdb2315678afecb367f032d93f642f64180aa3");
    assert_eq!(record.description, "");
    assert_eq!(record.network, "sepolia");
}

#[tokio::test]
async fn rejects_other_methods() {
    let store = MemoryStore::new();
    let (status, text) = send(store.clone(), "GET", &Value::Null).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(text, "Method Not Allowed");
    assert!(store.is_empty());
}

#[tokio::test]
async fn validates_fields() {
    for field in ["userAddress", "contractAddress", "name", "network"] {
        let mut body = body();
        body.as_object_mut().unwrap().remove(field);
        let (status, text) = send(MemoryStore::new(), "POST", &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{field}");
        assert_eq!(text, "Missing required fields.");
    }

    let mut body = body();
    body["name"] = json!("");
    assert_eq!(send(MemoryStore::new(), "POST", &body).await.1, "Missing required fields.");

    let (status, text) = send(MemoryStore::new(), "POST", &json!("not an object")).await;
    assert_eq!((status, text.as_str()), (StatusCode::BAD_REQUEST, "Missing required fields."));

    let mut body = self::body();
    body["contractAddress"] = json!("0x5FbDB2315678afecb367f032d93F642f64180aa");
    let (status, text) = send(MemoryStore::new(), "POST", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "Invalid address format.");
}

#[tokio::test]
async fn storage_failure() {
    let (status, text) = send(BrokenStore, "POST", &body()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text, "Internal Server Error");
}

#[tokio::test]
async fn answers_preflight_for_allowed_origins() {
    let preflight = |origin: &str| {
        Request::builder()
            .method("OPTIONS")
            .uri("/addContract")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap()
    };

    let store = MemoryStore::new();
    let response = router(store.clone(), &origins()).oneshot(preflight(ORIGIN)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
    assert!(headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap().contains("POST"));

    let response =
        router(store.clone(), &origins()).oneshot(preflight("https://evil.example")).await.unwrap();
    assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(store.is_empty());
}

#[tokio::test]
async fn cross_origin_post_carries_allow_origin() {
    let request = Request::builder()
        .method("POST")
        .uri("/addContract")
        .header(header::ORIGIN, ORIGIN)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body().to_string()))
        .unwrap();
    let response = router(MemoryStore::new(), &origins()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
}
