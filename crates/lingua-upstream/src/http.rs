//! Shared HTTP plumbing for upstream clients

use lingua_common::UpstreamConfig;
use lingua_core::{DomainError, RepoResult};
use reqwest::{Client, Response};

/// Build a `reqwest` client honoring the upstream timeout
pub fn build_client(config: &UpstreamConfig) -> RepoResult<Client> {
    Client::builder()
        .timeout(config.timeout())
        .build()
        .map_err(|e| DomainError::InternalError(format!("failed to build HTTP client: {e}")))
}

/// Map a transport failure to a domain error
pub(crate) fn transport_error(err: reqwest::Error) -> DomainError {
    DomainError::UpstreamUnavailable(err.to_string())
}

/// Map a body decoding failure to a domain error
pub(crate) fn decode_error(err: reqwest::Error) -> DomainError {
    DomainError::UpstreamDecode(err.to_string())
}

/// Turn a non-success response into `UpstreamStatus`
pub(crate) async fn ensure_success(response: Response) -> RepoResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(DomainError::UpstreamStatus {
        status: status.as_u16(),
        body,
    })
}
