//! REST transport for the remote document store and blob store.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::FileId,
    error::ApiError,
    protocol::{CreateDocumentRequest, DocumentList, StoredFile, UpdateDocumentRequest},
};
use tracing::debug;
use url::Url;

use crate::{
    config::BlogConfig,
    error::{ConfigError, ServiceError, ServiceResult},
    query::Query,
    types::FileUpload,
};

const PROJECT_HEADER: &str = "x-appwrite-project";
const KEY_HEADER: &str = "x-appwrite-key";
const JWT_HEADER: &str = "x-appwrite-jwt";

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(&self, collection: &str, id: &str, fields: Value)
        -> ServiceResult<Value>;
    async fn update_document(&self, collection: &str, id: &str, fields: Value)
        -> ServiceResult<Value>;
    async fn delete_document(&self, collection: &str, id: &str) -> ServiceResult<()>;
    async fn get_document(&self, collection: &str, id: &str) -> ServiceResult<Value>;
    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> ServiceResult<DocumentList<Value>>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload_file(
        &self,
        bucket: &str,
        file_id: &FileId,
        upload: FileUpload,
    ) -> ServiceResult<StoredFile>;
    async fn delete_file(&self, bucket: &str, file_id: &FileId) -> ServiceResult<()>;
    fn file_view_url(&self, bucket: &str, file_id: &FileId) -> ServiceResult<Url>;
}

pub struct AppwriteTransport {
    http: Client,
    endpoint: Url,
    project_id: String,
    database_id: String,
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value)
        .map_err(|e| ConfigError::Invalid(format!("{name} is not a valid header value: {e}")))
}

impl AppwriteTransport {
    pub fn new(config: &BlogConfig) -> ServiceResult<Self> {
        config.validate()?;
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| ServiceError::InvalidUrl(format!("{}: {e}", config.endpoint)))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(PROJECT_HEADER),
            header_value("project_id", &config.project_id)?,
        );
        if let Some(api_key) = &config.api_key {
            let mut value = header_value("api_key", api_key)?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static(KEY_HEADER), value);
        }
        if let Some(jwt) = &config.jwt {
            let mut value = header_value("jwt", jwt)?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static(JWT_HEADER), value);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint,
            project_id: config.project_id.clone(),
            database_id: config.database_id.clone(),
        })
    }

    fn url_for(&self, segments: &[&str]) -> ServiceResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| ServiceError::InvalidUrl(format!("{} cannot be a base", self.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn documents_url(&self, collection: &str, id: Option<&str>) -> ServiceResult<Url> {
        let mut segments = vec![
            "databases",
            self.database_id.as_str(),
            "collections",
            collection,
            "documents",
        ];
        segments.extend(id);
        self.url_for(&segments)
    }

    fn files_url(&self, bucket: &str, id: Option<&str>) -> ServiceResult<Url> {
        let mut segments = vec!["storage", "buckets", bucket, "files"];
        segments.extend(id);
        self.url_for(&segments)
    }
}

async fn ensure_success(response: Response) -> ServiceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => {
            debug!(%status, %err, "transport: failed to read error body");
            String::new()
        }
    };
    let api_error = serde_json::from_str::<ApiError>(&body)
        .unwrap_or_else(|_| ApiError::new(status.as_u16(), body.trim()));
    Err(ServiceError::from_remote(status.as_u16(), api_error))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> ServiceResult<T> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl DocumentStore for AppwriteTransport {
    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        fields: Value,
    ) -> ServiceResult<Value> {
        let url = self.documents_url(collection, None)?;
        debug!(%url, document_id = id, "transport: create document");
        let response = self
            .http
            .post(url)
            .json(&CreateDocumentRequest {
                document_id: id.to_string(),
                data: fields,
                permissions: None,
            })
            .send()
            .await?;
        read_json(response).await
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Value,
    ) -> ServiceResult<Value> {
        let url = self.documents_url(collection, Some(id))?;
        debug!(%url, "transport: update document");
        let response = self
            .http
            .patch(url)
            .json(&UpdateDocumentRequest { data: fields })
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> ServiceResult<()> {
        let url = self.documents_url(collection, Some(id))?;
        debug!(%url, "transport: delete document");
        let response = self.http.delete(url).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn get_document(&self, collection: &str, id: &str) -> ServiceResult<Value> {
        let url = self.documents_url(collection, Some(id))?;
        debug!(%url, "transport: get document");
        let response = self.http.get(url).send().await?;
        read_json(response).await
    }

    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> ServiceResult<DocumentList<Value>> {
        let url = self.documents_url(collection, None)?;
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|query| ("queries[]", query.to_param()))
            .collect();
        debug!(%url, queries = params.len(), "transport: list documents");
        let response = self.http.get(url).query(&params).send().await?;
        read_json(response).await
    }
}

#[async_trait]
impl BlobStore for AppwriteTransport {
    async fn upload_file(
        &self,
        bucket: &str,
        file_id: &FileId,
        upload: FileUpload,
    ) -> ServiceResult<StoredFile> {
        let url = self.files_url(bucket, None)?;
        debug!(%url, file_id = %file_id, size_bytes = upload.bytes.len(), "transport: upload file");

        let mut part = Part::bytes(upload.bytes).file_name(upload.filename);
        if let Some(mime_type) = &upload.mime_type {
            part = part
                .mime_str(mime_type)
                .map_err(|e| ServiceError::InvalidUpload(format!("mime type '{mime_type}': {e}")))?;
        }
        let form = Form::new()
            .text("fileId", file_id.to_string())
            .part("file", part);

        let response = self.http.post(url).multipart(form).send().await?;
        read_json(response).await
    }

    async fn delete_file(&self, bucket: &str, file_id: &FileId) -> ServiceResult<()> {
        let url = self.files_url(bucket, Some(file_id.as_str()))?;
        debug!(%url, "transport: delete file");
        let response = self.http.delete(url).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    fn file_view_url(&self, bucket: &str, file_id: &FileId) -> ServiceResult<Url> {
        let mut url = self.files_url(bucket, Some(file_id.as_str()))?;
        url.path_segments_mut()
            .map_err(|()| ServiceError::InvalidUrl(format!("{} cannot be a base", self.endpoint)))?
            .push("view");
        url.query_pairs_mut().append_pair("project", &self.project_id);
        Ok(url)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
