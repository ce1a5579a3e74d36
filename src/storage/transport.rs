use async_trait::async_trait;

use crate::error::TransportError;
use crate::storage::request::{Request, Response};

/// Delivers assembled requests to the service.
///
/// Signing, connection reuse and retries are the transport's business;
/// the [`Client`](crate::storage::Client) only hands over a [`Request`] and
/// reads back the [`Response`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
}

/// A [`Transport`] sending requests as-is through `reqwest`.
#[cfg(feature = "reqwest-transport")]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

#[cfg(feature = "reqwest-transport")]
impl ReqwestTransport {
    pub fn new() -> Result<ReqwestTransport, TransportError> {
        let client = reqwest::Client::builder().build()?;
        Ok(ReqwestTransport::from_client(client))
    }

    /// Reuse an already configured `reqwest` client.
    pub fn from_client(client: reqwest::Client) -> ReqwestTransport {
        ReqwestTransport { client }
    }
}

#[cfg(feature = "reqwest-transport")]
#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let url = request.url();
        let response = self
            .client
            .request(request.method, url.as_str())
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
