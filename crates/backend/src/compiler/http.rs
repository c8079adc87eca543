use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{CompileRequest, CompiledArtifact, Compiler};
use crate::{client::error_message, error::CompileError};

/// Body returned by the compiler service when compilation fails.
#[derive(Debug, Default, Deserialize)]
struct CompileFailure {
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client of a compiler microservice exposing `POST /compile`.
#[derive(Clone, Debug)]
pub struct HttpCompiler {
    http: reqwest::Client,
    url: Url,
}

impl HttpCompiler {
    pub fn new(base_url: &str) -> Result<Self, CompileError> {
        let mut base: Url = base_url
            .parse()
            .map_err(|err| CompileError::Unreachable(format!("invalid compiler url `{base_url}`: {err}")))?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let url = base.join("compile").map_err(|err| CompileError::Unreachable(err.to_string()))?;
        Ok(Self { http: reqwest::Client::new(), url })
    }
}

#[async_trait]
impl Compiler for HttpCompiler {
    async fn compile(&self, request: &CompileRequest) -> Result<CompiledArtifact, CompileError> {
        debug!(url = %self.url, file = %request.file_name, "compiling remotely");
        let resp = self
            .http
            .post(self.url.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| CompileError::Unreachable(err.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|err| CompileError::Unreachable(err.to_string()))?;
        if status.is_success() {
            return serde_json::from_str(&body).map_err(|err| CompileError::Decode(err.to_string()));
        }
        if status.is_client_error() {
            if let Ok(failure) = serde_json::from_str::<CompileFailure>(&body) {
                if !failure.errors.is_empty() {
                    return Err(CompileError::Diagnostics(failure.errors));
                }
                if let Some(error) = failure.error {
                    return Err(CompileError::Diagnostics(vec![error]));
                }
            }
        }
        Err(CompileError::Unreachable(format!("{status}: {}", error_message(status, &body))))
    }
}
