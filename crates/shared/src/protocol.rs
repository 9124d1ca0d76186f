//! Wire shapes of the remote document and file stores, and the mapping
//! between the remote all-lowercase field names and the application's
//! mixed-case ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{FileId, PostStatus, Slug, UserId};

/// Post as stored remotely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDocument {
    #[serde(rename = "$id")]
    pub id: Slug,
    #[serde(rename = "$createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "$updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featuredimage: Option<FileId>,
    pub status: PostStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userid: Option<UserId>,
}

/// Attribute payload written to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAttributes {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featuredimage: Option<FileId>,
    pub status: PostStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userid: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest<T> {
    pub document_id: String,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDocumentRequest<T> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentList<T> {
    #[serde(default)]
    pub total: u64,
    pub documents: Vec<T>,
}

/// File record returned by the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    #[serde(rename = "$id")]
    pub id: FileId,
    #[serde(rename = "bucketId")]
    pub bucket_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(rename = "sizeOriginal", default)]
    pub size_bytes: u64,
}

/// Post as the application sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub slug: Slug,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<FileId>,
    pub status: PostStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub slug: Slug,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<FileId>,
    pub status: PostStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdate {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<FileId>,
    pub status: PostStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPage {
    pub total: u64,
    pub posts: Vec<Post>,
}

// Empty strings come back for attributes that were cleared remotely.
fn non_empty<T: AsRef<str>>(value: Option<T>) -> Option<T> {
    value.filter(|v| !v.as_ref().is_empty())
}

impl From<PostDocument> for Post {
    fn from(doc: PostDocument) -> Self {
        Self {
            slug: doc.id,
            title: doc.title,
            content: doc.content,
            featured_image: non_empty(doc.featuredimage),
            status: doc.status,
            user_id: non_empty(doc.userid),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

impl From<&NewPost> for PostAttributes {
    fn from(post: &NewPost) -> Self {
        Self {
            title: post.title.clone(),
            content: post.content.clone(),
            featuredimage: post.featured_image.clone(),
            status: post.status,
            userid: post.user_id.clone(),
        }
    }
}

impl From<&PostUpdate> for PostAttributes {
    fn from(update: &PostUpdate) -> Self {
        Self {
            title: update.title.clone(),
            content: update.content.clone(),
            featuredimage: update.featured_image.clone(),
            status: update.status,
            userid: None,
        }
    }
}

impl From<DocumentList<PostDocument>> for PostPage {
    fn from(list: DocumentList<PostDocument>) -> Self {
        Self {
            total: list.total,
            posts: list.documents.into_iter().map(Post::from).collect(),
        }
    }
}

impl From<&Post> for PostUpdate {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            content: post.content.clone(),
            featured_image: post.featured_image.clone(),
            status: post.status,
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
