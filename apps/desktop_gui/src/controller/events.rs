//! UI/backend events and error modeling for desktop GUI controller.

use client_core::ServiceError;
use shared::{
    domain::Slug,
    protocol::{Post, PostPage},
};

pub enum UiEvent {
    Info(String),
    PostsLoaded {
        include_inactive: bool,
        page: PostPage,
    },
    PostLoaded {
        post: Post,
        image_url: Option<String>,
    },
    PostSaved {
        post: Post,
        image_url: Option<String>,
        cleanup_warning: Option<String>,
    },
    PostDeleted {
        slug: Slug,
        cleanup_warning: Option<String>,
    },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    NotFound,
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    ListPosts,
    OpenPost,
    SavePost,
    DeletePost,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_service(context: UiErrorContext, err: &ServiceError) -> Self {
        let category = match err {
            ServiceError::Unauthorized(_) | ServiceError::Forbidden(_) => UiErrorCategory::Auth,
            ServiceError::NotFound(_) => UiErrorCategory::NotFound,
            ServiceError::Validation(_)
            | ServiceError::Conflict(_)
            | ServiceError::InvalidId(_)
            | ServiceError::InvalidUpload(_) => UiErrorCategory::Validation,
            ServiceError::Transport(_) | ServiceError::RateLimited(_) => {
                UiErrorCategory::Transport
            }
            ServiceError::Server(_)
            | ServiceError::Decode(_)
            | ServiceError::InvalidUrl(_)
            | ServiceError::Config(_) => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn from_message(
        context: UiErrorContext,
        category: UiErrorCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            context,
            message: message.into(),
        }
    }

    pub fn requires_credentials(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// One-line status text for the bottom bar.
    pub fn status_line(&self) -> String {
        let action = match self.context {
            UiErrorContext::BackendStartup => "Backend startup failed",
            UiErrorContext::ListPosts => "Could not load posts",
            UiErrorContext::OpenPost => "Could not open post",
            UiErrorContext::SavePost => "Could not save post",
            UiErrorContext::DeletePost => "Could not delete post",
        };
        match self.category {
            UiErrorCategory::Auth => {
                format!("{action}: check the project id and API key/JWT ({})", self.message)
            }
            _ => format!("{action}: {}", self.message),
        }
    }
}
