//! Compiler clients.

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::post};
use serde_json::{Value, json};
use vellum_backend::{CompileError, CompileRequest, Compiler, HttpCompiler, SolcCompiler};
use vellum_common::ErrorKind;
use vellum_test_utils::fixtures;

use crate::utils::{dead_url, spawn};

async fn compile(Json(body): Json<Value>) -> impl IntoResponse {
    match body["fileName"].as_str() {
        Some("Counter.sol") => (
            StatusCode::OK,
            Json(json!({
                "abi": serde_json::from_str::<Value>(fixtures::COUNTER_ABI).unwrap(),
                "bytecode": fixtures::COUNTER_BYTECODE.to_string(),
                "contractName": "Counter",
                "warnings": ["Warning: SPDX license identifier not provided"]
            })),
        ),
        Some("Broken.sol") => (
            StatusCode::BAD_REQUEST,
            Json(json!({"errors": ["ParserError: Expected ';' but got '}'"]})),
        ),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"message": "compiler crashed"}))),
    }
}

async fn service() -> HttpCompiler {
    let base = spawn(Router::new().route("/api/compile", post(compile))).await;
    HttpCompiler::new(&format!("{base}/api")).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn compiles_remotely() {
    let compiler = service().await;

    let artifact = compiler
        .compile(&CompileRequest::new("Counter.sol", fixtures::COUNTER_SOURCE))
        .await
        .unwrap();
    assert_eq!(artifact.contract_name, "Counter");
    assert_eq!(artifact.bytecode, fixtures::COUNTER_BYTECODE);
    assert_eq!(artifact.abi, fixtures::counter_abi());
    assert_eq!(artifact.warnings.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn reports_diagnostics() {
    let compiler = service().await;

    let err = compiler.compile(&CompileRequest::new("Broken.sol", "contract {")).await.unwrap_err();
    assert!(
        matches!(&err, CompileError::Diagnostics(d) if d[0].starts_with("ParserError")),
        "{err:?}"
    );
    assert_eq!(err.kind(), ErrorKind::Compilation);

    let err = compiler.compile(&CompileRequest::new("Other.sol", "")).await.unwrap_err();
    assert!(matches!(&err, CompileError::Unreachable(msg) if msg.contains("compiler crashed")));
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_compiler() {
    let compiler = HttpCompiler::new(&dead_url().await).unwrap();
    let err = compiler.compile(&CompileRequest::new("Counter.sol", "")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendUnreachable);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_solc_binary() {
    let compiler = SolcCompiler::new("/nonexistent/solc");
    let err = compiler.compile(&CompileRequest::new("Counter.sol", "")).await.unwrap_err();
    assert!(matches!(err, CompileError::Solc(_)), "{err:?}");
}
