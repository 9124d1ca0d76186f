//! Backend commands queued from UI to backend worker.

use shared::{
    domain::{PostStatus, Slug},
    protocol::Post,
};
use std::path::PathBuf;

pub enum BackendCommand {
    ListPosts {
        include_inactive: bool,
    },
    OpenPost {
        slug: Slug,
    },
    /// Creates a post when `current` is `None`, otherwise revises it.
    SavePost {
        current: Option<Post>,
        draft: PostDraft,
    },
    DeletePost {
        slug: Slug,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::ListPosts { .. } => "list_posts",
            BackendCommand::OpenPost { .. } => "open_post",
            BackendCommand::SavePost { current: None, .. } => "create_post",
            BackendCommand::SavePost { current: Some(_), .. } => "update_post",
            BackendCommand::DeletePost { .. } => "delete_post",
        }
    }
}

/// Editor contents as submitted by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostDraft {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub status: PostStatus,
    pub image_path: Option<PathBuf>,
}

impl PostDraft {
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.to_string(),
            content: post.content.clone(),
            status: post.status,
            image_path: None,
        }
    }

    /// Uses the typed slug, or derives one from the title when left blank.
    pub fn resolve_slug(&self) -> Result<Slug, shared::domain::IdError> {
        let typed = self.slug.trim();
        if typed.is_empty() {
            Slug::from_title(&self.title)
        } else {
            Slug::parse(typed)
        }
    }
}
