//! Remote module store client.
//!
//! Three request contracts, nothing more: list the installable backend
//! module paths, fetch the backend bundle for one of them, and upload a
//! backend bundle for an installed module. Calls are synchronous and never
//! retried; a failure surfaces immediately and terminates the pipeline.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    /// The store answered with a failure; the message is the remote one
    /// when it supplied any, otherwise a generic fallback.
    #[error("{0}")]
    Api(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Request/response contract with the remote module store.
pub trait ModuleStore {
    /// Ordered list of installable backend module paths.
    fn list_module_paths(&self) -> Result<Vec<String>, RemoteError>;

    /// Raw compressed archive bytes for one backend module path.
    fn fetch_backend_bundle(&self, module_path: &str) -> Result<Vec<u8>, RemoteError>;

    /// Upload a backend bundle for a module, keyed by the manifest name.
    fn upload_backend_bundle(&self, module_name: &str, bundle: Vec<u8>) -> Result<(), RemoteError>;
}

/// Response envelope the store wraps JSON payloads in.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    state: String,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP implementation, authenticated with a bearer session token.
pub struct HttpModuleStore {
    host: String,
    session_token: String,
    client: reqwest::blocking::Client,
}

impl HttpModuleStore {
    pub fn new(host: String, session_token: String) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            host: host.trim_end_matches('/').to_string(),
            session_token,
            client,
        }
    }

    /// Pull the remote failure message out of a JSON error body, if any.
    fn failure_message(response: reqwest::blocking::Response, fallback: &str) -> RemoteError {
        let message = response
            .json::<serde_json::Value>()
            .ok()
            .and_then(|body| body.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_else(|| fallback.to_string());
        RemoteError::Api(message)
    }
}

impl ModuleStore for HttpModuleStore {
    fn list_module_paths(&self) -> Result<Vec<String>, RemoteError> {
        let response = self
            .client
            .get(format!("{}/modules/paths", self.host))
            .bearer_auth(&self.session_token)
            .send()?;

        if !response.status().is_success() {
            return Err(Self::failure_message(
                response,
                "Failed to fetch backend module paths",
            ));
        }

        let envelope: ApiEnvelope<Vec<String>> = response.json()?;
        if envelope.state != "success" {
            return Err(RemoteError::Api(envelope.message.unwrap_or_else(|| {
                "Failed to fetch backend module paths".to_string()
            })));
        }
        Ok(envelope.data.unwrap_or_default())
    }

    fn fetch_backend_bundle(&self, module_path: &str) -> Result<Vec<u8>, RemoteError> {
        let response = self
            .client
            .post(format!("{}/modules/package/{}", self.host, module_path))
            .bearer_auth(&self.session_token)
            .send()?;

        if !response.status().is_success() {
            return Err(Self::failure_message(
                response,
                "Failed to fetch backend files",
            ));
        }

        Ok(response.bytes()?.to_vec())
    }

    fn upload_backend_bundle(&self, module_name: &str, bundle: Vec<u8>) -> Result<(), RemoteError> {
        let part = reqwest::blocking::multipart::Part::bytes(bundle).file_name("backend.tar.gz");
        let form = reqwest::blocking::multipart::Form::new()
            .part("file", part)
            .text("name", module_name.to_string());

        let response = self
            .client
            .post(format!("{}/modules/install", self.host))
            .bearer_auth(&self.session_token)
            .multipart(form)
            .send()?;

        if !response.status().is_success() {
            return Err(Self::failure_message(
                response,
                "Failed to upload backend bundle",
            ));
        }
        Ok(())
    }
}
