use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

use super::ClientError;
use crate::models::{Document, PutDocumentRequest, Version};

/// Access to the document store as seen from a client session
#[async_trait]
pub trait DocumentApi: Send + Sync {
    async fn get_document(&self) -> Result<Document, ClientError>;
    async fn put_document(&self, content: &Value, create_version: bool) -> Result<(), ClientError>;
    async fn list_versions(&self) -> Result<Vec<Version>, ClientError>;
}

/// `DocumentApi` over the service's HTTP surface
#[derive(Debug, Clone)]
pub struct HttpDocumentApi {
    client: Client,
    document_url: String,
}

impl HttpDocumentApi {
    /// Talk to the default document of the service at `base_url`
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_path(base_url, "/api/document")
    }

    /// Talk to an explicit document id
    pub fn for_document(base_url: &str, doc_id: &str) -> Result<Self, ClientError> {
        Self::with_path(base_url, &format!("/api/documents/{}", doc_id))
    }

    fn with_path(base_url: &str, path: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            document_url: format!("{}{}", base_url.trim_end_matches('/'), path),
        })
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status { status: status.as_u16(), body })
    }
}

#[async_trait]
impl DocumentApi for HttpDocumentApi {
    async fn get_document(&self) -> Result<Document, ClientError> {
        let response = self.client.get(&self.document_url).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn put_document(&self, content: &Value, create_version: bool) -> Result<(), ClientError> {
        let body = PutDocumentRequest {
            content: content.clone(),
            create_version,
        };
        let response = self.client.put(&self.document_url).json(&body).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_versions(&self) -> Result<Vec<Version>, ClientError> {
        let url = format!("{}/versions", self.document_url);
        let response = self.client.get(&url).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }
}
