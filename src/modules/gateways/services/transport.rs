use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Identity, Response};

use crate::core::{AppError, Result};

/// Narrow HTTP collaborator the orchestrator talks through.
///
/// One call per request, no retries; deadlines belong to the caller
/// (build the `reqwest::Client` with a timeout and use [`HttpTransport::with_client`]).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, url: &str, content_type: &str, body: Vec<u8>) -> Result<Vec<u8>>;

    async fn get(&self, url: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Fully encoded request ready for the transport
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl OutboundRequest {
    pub async fn send(self, transport: &dyn Transport) -> Result<Vec<u8>> {
        match self.method {
            HttpMethod::Post => transport.post(&self.url, self.content_type, self.body).await,
            HttpMethod::Get => transport.get(&self.url).await,
        }
    }
}

/// reqwest-backed transport
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Transport presenting a merchant client certificate (mutual TLS)
    pub fn with_identity(cert_pem: &str, key_pem: &str) -> Result<Self> {
        let mut bundle = Vec::with_capacity(cert_pem.len() + key_pem.len() + 1);
        bundle.extend_from_slice(key_pem.as_bytes());
        bundle.push(b'\n');
        bundle.extend_from_slice(cert_pem.as_bytes());

        let identity = Identity::from_pem(&bundle)
            .map_err(|e| AppError::key_material(format!("invalid merchant certificate: {}", e), ""))?;
        let client = Client::builder()
            .identity(identity)
            .build()
            .map_err(|e| AppError::configuration(format!("cannot build TLS client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, content_type: &str, body: Vec<u8>) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;
        read_body(response).await
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        read_body(response).await
    }
}

async fn read_body(response: Response) -> Result<Vec<u8>> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(AppError::transport(format!(
            "HTTP {} ({})",
            status.as_u16(),
            String::from_utf8_lossy(&body)
        )));
    }

    Ok(body.to_vec())
}
