use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{FileId, Slug},
    protocol::{
        DocumentList, NewPost, Post, PostAttributes, PostDocument, PostPage, PostUpdate,
        StoredFile,
    },
};
use tracing::{debug, info, warn};
use url::Url;

pub mod config;
pub mod error;
pub mod query;
pub mod transport;
pub mod types;

pub use config::{load_config, BlogConfig};
pub use error::{ConfigError, RemoteFailure, ServiceError, ServiceResult};
pub use query::Query;
pub use transport::{AppwriteTransport, BlobStore, DocumentStore};
pub use types::{FileUpload, WorkflowOutcome};

/// Post-level operations over the remote stores. Field names are mapped at
/// this boundary; callers only ever see application-side types.
pub struct BlogService {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    collection_id: String,
    bucket_id: String,
}

fn decode<T: DeserializeOwned>(raw: Value) -> ServiceResult<T> {
    Ok(serde_json::from_value(raw)?)
}

fn decode_post(raw: Value) -> ServiceResult<Post> {
    decode::<PostDocument>(raw).map(Post::from)
}

fn encode(attributes: PostAttributes) -> ServiceResult<Value> {
    Ok(serde_json::to_value(attributes)?)
}

fn logged<T>(operation: &'static str, target: &str, result: ServiceResult<T>) -> ServiceResult<T> {
    match &result {
        Ok(_) => debug!(operation, target, "blog service: ok"),
        Err(error) => warn!(operation, target, %error, "blog service: call failed"),
    }
    result
}

impl BlogService {
    pub fn new(config: &BlogConfig) -> ServiceResult<Self> {
        let transport = Arc::new(AppwriteTransport::new(config)?);
        Ok(Self::new_with_stores(
            transport.clone(),
            transport,
            config.collection_id.clone(),
            config.bucket_id.clone(),
        ))
    }

    pub fn new_with_stores(
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        collection_id: impl Into<String>,
        bucket_id: impl Into<String>,
    ) -> Self {
        Self {
            documents,
            blobs,
            collection_id: collection_id.into(),
            bucket_id: bucket_id.into(),
        }
    }

    pub async fn create_post(&self, post: &NewPost) -> ServiceResult<Post> {
        let result = match encode(PostAttributes::from(post)) {
            Ok(fields) => self
                .documents
                .create_document(&self.collection_id, post.slug.as_str(), fields)
                .await
                .and_then(decode_post),
            Err(error) => Err(error),
        };
        if result.is_ok() {
            info!(slug = %post.slug, "blog service: post created");
        }
        logged("create_post", post.slug.as_str(), result)
    }

    pub async fn update_post(&self, slug: &Slug, update: &PostUpdate) -> ServiceResult<Post> {
        let result = match encode(PostAttributes::from(update)) {
            Ok(fields) => self
                .documents
                .update_document(&self.collection_id, slug.as_str(), fields)
                .await
                .and_then(decode_post),
            Err(error) => Err(error),
        };
        logged("update_post", slug.as_str(), result)
    }

    pub async fn delete_post(&self, slug: &Slug) -> ServiceResult<()> {
        let result = self
            .documents
            .delete_document(&self.collection_id, slug.as_str())
            .await;
        logged("delete_post", slug.as_str(), result)
    }

    pub async fn get_post(&self, slug: &Slug) -> ServiceResult<Post> {
        let result = self
            .documents
            .get_document(&self.collection_id, slug.as_str())
            .await
            .and_then(decode_post);
        logged("get_post", slug.as_str(), result)
    }

    /// Lists posts matching `queries`; an empty slice lists every post.
    pub async fn list_posts(&self, queries: &[Query]) -> ServiceResult<PostPage> {
        let result = self
            .documents
            .list_documents(&self.collection_id, queries)
            .await
            .and_then(|list| {
                let documents = list
                    .documents
                    .into_iter()
                    .map(decode::<PostDocument>)
                    .collect::<ServiceResult<Vec<_>>>()?;
                Ok(PostPage::from(DocumentList {
                    total: list.total,
                    documents,
                }))
            });
        logged("list_posts", &self.collection_id, result)
    }

    pub async fn list_active_posts(&self) -> ServiceResult<PostPage> {
        self.list_posts(&query::active_posts()).await
    }

    pub async fn upload_file(&self, upload: FileUpload) -> ServiceResult<StoredFile> {
        if upload.bytes.is_empty() {
            return Err(ServiceError::InvalidUpload(format!(
                "'{}' is empty",
                upload.filename
            )));
        }
        let file_id = FileId::unique();
        let result = self
            .blobs
            .upload_file(&self.bucket_id, &file_id, upload)
            .await;
        logged("upload_file", file_id.as_str(), result)
    }

    pub async fn delete_file(&self, file_id: &FileId) -> ServiceResult<()> {
        let result = self.blobs.delete_file(&self.bucket_id, file_id).await;
        logged("delete_file", file_id.as_str(), result)
    }

    pub fn file_view_url(&self, file_id: &FileId) -> ServiceResult<Url> {
        self.blobs.file_view_url(&self.bucket_id, file_id)
    }

    // Best effort: the write that would have referenced the file already failed.
    async fn discard_upload(&self, file_id: Option<&FileId>) {
        let Some(file_id) = file_id else {
            return;
        };
        if let Err(error) = self.delete_file(file_id).await {
            warn!(file_id = %file_id, %error, "blog service: orphaned upload left in bucket");
        }
    }

    /// Uploads the featured image (if any), then creates the post pointing at it.
    /// The upload is deleted again when the create fails.
    pub async fn publish_post(
        &self,
        mut post: NewPost,
        image: Option<FileUpload>,
    ) -> ServiceResult<Post> {
        let uploaded = match image {
            Some(image) => {
                let file = self.upload_file(image).await?;
                post.featured_image = Some(file.id.clone());
                Some(file.id)
            }
            None => None,
        };
        match self.create_post(&post).await {
            Ok(created) => Ok(created),
            Err(error) => {
                self.discard_upload(uploaded.as_ref()).await;
                Err(error)
            }
        }
    }

    /// Uploads a replacement image (if any), updates the post, then removes
    /// the image the post previously referenced. A failed update deletes the
    /// new upload and leaves the old image in place.
    pub async fn revise_post(
        &self,
        current: &Post,
        mut update: PostUpdate,
        image: Option<FileUpload>,
    ) -> ServiceResult<WorkflowOutcome<Post>> {
        let uploaded = match image {
            Some(image) => {
                let file = self.upload_file(image).await?;
                update.featured_image = Some(file.id.clone());
                Some(file.id)
            }
            None => None,
        };
        let replaced = uploaded.is_some();

        let revised = match self.update_post(&current.slug, &update).await {
            Ok(revised) => revised,
            Err(error) => {
                self.discard_upload(uploaded.as_ref()).await;
                return Err(error);
            }
        };

        let stale = current
            .featured_image
            .as_ref()
            .filter(|old| replaced && revised.featured_image.as_ref() != Some(*old));
        let cleanup_error = match stale {
            Some(old) => self.delete_file(old).await.err(),
            None => None,
        };

        Ok(WorkflowOutcome {
            value: revised,
            cleanup_error,
        })
    }

    /// Deletes the post, then its featured image.
    pub async fn remove_post(&self, slug: &Slug) -> ServiceResult<WorkflowOutcome<Post>> {
        let post = self.get_post(slug).await?;
        self.delete_post(slug).await?;

        let cleanup_error = match &post.featured_image {
            Some(file_id) => self.delete_file(file_id).await.err(),
            None => None,
        };
        info!(slug = %slug, "blog service: post removed");

        Ok(WorkflowOutcome {
            value: post,
            cleanup_error,
        })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
