//! HTTP client of the persistence backend.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;
use vellum_common::CanonicalAddress;

use crate::{
    error::BackendError,
    types::{DeleteResponse, DeployedContractRef, SaveRequest, SaveResponse, SignedPayload},
};

/// Client of the contract-reference store.
#[derive(Clone, Debug)]
pub struct BackendClient {
    http: reqwest::Client,
    base: Url,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, BackendError> {
        let mut base: Url =
            base_url.parse().map_err(|err| BackendError::InvalidUrl(format!("{base_url}: {err}")))?;
        // keep any path prefix when joining
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, BackendError> {
        self.base.join(path).map_err(|err| BackendError::InvalidUrl(err.to_string()))
    }

    /// Stores a signed contract reference and returns the assigned identifier.
    pub async fn save_reference(&self, request: &SaveRequest) -> Result<SaveResponse, BackendError> {
        if request.contract_data.abi.is_empty() {
            return Err(BackendError::MissingAbi);
        }
        let mut request = request.clone();
        request.contract_data.network = request.contract_data.network.to_lowercase();

        let url = self.url("save-contract-reference")?;
        debug!(%url, address = %request.contract_data.contract_address, "saving contract reference");
        let resp = self.http.post(url).json(&request).send().await?;
        decode(resp).await
    }

    /// Lists the references stored for `owner`.
    ///
    /// A 404, or an error that says no contracts were found, is an empty list.
    pub async fn list_references(
        &self,
        owner: CanonicalAddress,
    ) -> Result<Vec<DeployedContractRef>, BackendError> {
        let url = self.url(&format!("user-contracts/{owner}"))?;
        debug!(%url, "listing contract references");
        let resp = self.http.get(url).send().await?;
        match decode(resp).await {
            Ok(references) => Ok(references),
            Err(BackendError::Rejected { status, message })
                if status == StatusCode::NOT_FOUND ||
                    message.to_lowercase().contains("no contracts found") =>
            {
                trace!(%owner, "no contract references stored");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Deletes the reference with backend identifier `id`.
    pub async fn delete_reference(
        &self,
        id: &str,
        auth: &SignedPayload,
    ) -> Result<DeleteResponse, BackendError> {
        let url = self.url(&format!("user-contracts/{id}"))?;
        debug!(%url, "deleting contract reference");
        let resp = self.http.delete(url).json(auth).send().await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, BackendError> {
    let status = resp.status();
    if status.is_success() {
        return resp.json().await.map_err(|err| BackendError::Decode(err.to_string()));
    }
    let body = resp.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    warn!(%status, %message, "backend rejected request");
    Err(BackendError::Rejected { status, message })
}

/// Extracts the most useful error text from a failed response: `error`, then `message`,
/// then the raw body.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        return ["error", "message"]
            .iter()
            .find_map(|key| map.get(*key).and_then(|v| v.as_str()).filter(|s| !s.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| "unspecified error".to_string());
    }
    let body = body.trim();
    if body.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        body.to_string()
    }
}
