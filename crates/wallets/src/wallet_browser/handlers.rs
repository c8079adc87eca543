use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderValue, header},
    response::{Html, IntoResponse},
};

use crate::wallet_browser::{
    app::contents,
    state::BrowserWalletState,
    types::{
        BrowserApiResponse, BrowserTransaction, Connection, SignRequest, SignResponse,
        TransactionResponse,
    },
};

pub(crate) async fn serve_index(State(state): State<Arc<BrowserWalletState>>) -> impl IntoResponse {
    let page = contents::INDEX_HTML.replace(contents::TOKEN_PLACEHOLDER, state.session_token());
    (
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"))],
        Html(page),
    )
}

pub(crate) async fn get_next_transaction_request(
    State(state): State<Arc<BrowserWalletState>>,
) -> Json<BrowserApiResponse<BrowserTransaction>> {
    Json(match state.read_next_transaction_request() {
        Some(tx) => BrowserApiResponse::Ok(tx),
        None => BrowserApiResponse::error("No pending transaction"),
    })
}

pub(crate) async fn post_transaction_response(
    State(state): State<Arc<BrowserWalletState>>,
    Json(response): Json<TransactionResponse>,
) -> Json<BrowserApiResponse<()>> {
    if !state.has_transaction_request(&response.id) {
        return Json(BrowserApiResponse::error("Unknown transaction id"));
    }
    state.add_transaction_response(response);
    Json(BrowserApiResponse::Ok(()))
}

pub(crate) async fn get_next_signing_request(
    State(state): State<Arc<BrowserWalletState>>,
) -> Json<BrowserApiResponse<SignRequest>> {
    Json(match state.read_next_signing_request() {
        Some(request) => BrowserApiResponse::Ok(request),
        None => BrowserApiResponse::error("No pending signing request"),
    })
}

pub(crate) async fn post_signing_response(
    State(state): State<Arc<BrowserWalletState>>,
    Json(response): Json<SignResponse>,
) -> Json<BrowserApiResponse<()>> {
    if !state.has_signing_request(&response.id) {
        return Json(BrowserApiResponse::error("Unknown signing request id"));
    }
    state.add_signing_response(response);
    Json(BrowserApiResponse::Ok(()))
}

pub(crate) async fn get_connection_info(
    State(state): State<Arc<BrowserWalletState>>,
) -> Json<BrowserApiResponse<Option<Connection>>> {
    Json(BrowserApiResponse::Ok(state.get_connection()))
}

pub(crate) async fn post_connection_update(
    State(state): State<Arc<BrowserWalletState>>,
    Json(connection): Json<Option<Connection>>,
) -> Json<BrowserApiResponse<()>> {
    state.set_connection(connection);
    Json(BrowserApiResponse::Ok(()))
}
