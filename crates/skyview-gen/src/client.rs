//! Blocking client for the studio backend's generation endpoint.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::error::{GenerateError, Result};
use crate::request::{GenerationRequest, GenerationResponse};

const CLIENT_AGENT: &str = concat!("skyview/", env!("CARGO_PKG_VERSION"));

pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Reads a non-2xx response into `GenerateError::Service`, preferring a
/// `detail` field when the body is JSON.
pub(crate) fn service_error(response: Response) -> GenerateError {
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().to_string(),
    };
    GenerateError::Service { status, message }
}

pub struct GenerationClient {
    client: Client,
    base_url: String,
}

impl GenerationClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        Self::new(config.api_url.clone(), config.timeout())
    }

    pub fn endpoint(&self) -> String {
        format!("{}/generate", self.base_url.trim_end_matches('/'))
    }

    pub fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let endpoint = self.endpoint();
        info!(
            endpoint = %endpoint,
            generator = %request.generator,
            semi_span = request.parameters.semi_span,
            "requesting wing model"
        );
        let response = self
            .client
            .post(&endpoint)
            .header(USER_AGENT, CLIENT_AGENT)
            .header(ACCEPT, "application/json")
            .json(request)
            .send()?;

        if !response.status().is_success() {
            let err = service_error(response);
            warn!(error = %err, "generation request failed");
            return Err(err);
        }

        let body = response.text()?;
        let generated: GenerationResponse = serde_json::from_str(&body)?;
        let Some(url) = generated.asset_url() else {
            return Err(GenerateError::MissingAssetUrl);
        };
        info!(url = %url, source = ?generated.source, "wing model ready");
        Ok(generated)
    }

    /// Best-effort `HEAD` on a generated asset. Failures are logged, never
    /// raised.
    pub fn verify_asset(&self, url: &str) -> bool {
        match self.client.head(url).header(USER_AGENT, CLIENT_AGENT).send() {
            Ok(response) if response.status().is_success() => {
                debug!(url, "asset reachable");
                true
            }
            Ok(response) => {
                warn!(url, status = response.status().as_u16(), "asset check failed");
                false
            }
            Err(err) => {
                warn!(url, error = %err, "asset check failed");
                false
            }
        }
    }
}
