use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};

use crate::wallet_browser::{handlers, state::BrowserWalletState};

pub const SESSION_TOKEN_HEADER: &str = "X-Session-Token";

pub(crate) fn build_router(state: Arc<BrowserWalletState>) -> Router {
    let api = Router::new()
        .route("/transaction/request", get(handlers::get_next_transaction_request))
        .route("/transaction/response", post(handlers::post_transaction_response))
        .route("/signing/request", get(handlers::get_next_signing_request))
        .route("/signing/response", post(handlers::post_signing_response))
        .route(
            "/connection",
            get(handlers::get_connection_info).post(handlers::post_connection_update),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session_token))
        .with_state(state.clone());

    Router::new().route("/", get(handlers::serve_index)).nest("/api", api).with_state(state)
}

async fn require_session_token(
    State(state): State<Arc<BrowserWalletState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let ok = req
        .headers()
        .get(SESSION_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == state.session_token());

    if !ok {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(req).await)
}
