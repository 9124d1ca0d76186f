//! State transitions for the Counter and Posts views.
//!
//! Every backend event is folded into [`PostsState`] here so the view code only
//! renders. A failed remote call never clears data the view already shows.

use shared::{
    counter::{BoundedCounter, CounterAction},
    domain::{PostStatus, Slug},
    protocol::Post,
};

use crate::backend_bridge::commands::PostDraft;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn reduce_counter(counter: BoundedCounter, action: CounterAction) -> BoundedCounter {
    counter.apply(action)
}

#[derive(Debug, Clone, Default)]
pub struct EditorState {
    /// The stored post being edited; `None` while composing a new one.
    pub current: Option<Post>,
    pub draft: PostDraft,
    pub image_url: Option<String>,
    pub saving: bool,
}

impl EditorState {
    pub fn compose() -> Self {
        Self::default()
    }

    pub fn edit(post: Post, image_url: Option<String>) -> Self {
        Self {
            draft: PostDraft::from_post(&post),
            current: Some(post),
            image_url,
            saving: false,
        }
    }

    pub fn is_new(&self) -> bool {
        self.current.is_none()
    }
}

#[derive(Debug, Default)]
pub struct PostsState {
    pub include_inactive: bool,
    pub posts: Vec<Post>,
    pub total: u64,
    pub loading: bool,
    pub editor: Option<EditorState>,
    pub last_error: Option<UiError>,
}

impl PostsState {
    pub fn begin_list(&mut self, include_inactive: bool) {
        self.include_inactive = include_inactive;
        self.loading = true;
    }

    pub fn begin_save(&mut self) {
        if let Some(editor) = &mut self.editor {
            editor.saving = true;
        }
    }

    fn is_listed(&self, post: &Post) -> bool {
        self.include_inactive || post.status == PostStatus::Active
    }

    fn remove_listed(&mut self, slug: &Slug) -> bool {
        let before = self.posts.len();
        self.posts.retain(|post| &post.slug != slug);
        let removed = self.posts.len() != before;
        if removed {
            self.total = self.total.saturating_sub(1);
        }
        removed
    }

    fn upsert_listed(&mut self, post: &Post) {
        if !self.is_listed(post) {
            self.remove_listed(&post.slug);
            return;
        }
        match self.posts.iter_mut().find(|p| p.slug == post.slug) {
            Some(existing) => *existing = post.clone(),
            None => {
                self.posts.insert(0, post.clone());
                self.total += 1;
            }
        }
    }

    /// Folds one backend event into the state and returns a status line, if any.
    pub fn apply(&mut self, event: UiEvent) -> Option<String> {
        match event {
            UiEvent::Info(message) => Some(message),
            UiEvent::PostsLoaded {
                include_inactive,
                page,
            } => {
                // A stale reply for the other filter is ignored.
                if include_inactive != self.include_inactive {
                    return None;
                }
                self.loading = false;
                self.last_error = None;
                self.total = page.total;
                self.posts = page.posts;
                Some(format!("Loaded {} of {} posts", self.posts.len(), self.total))
            }
            UiEvent::PostLoaded { post, image_url } => {
                let status = format!("Opened '{}'", post.title);
                self.editor = Some(EditorState::edit(post, image_url));
                Some(status)
            }
            UiEvent::PostSaved {
                post,
                image_url,
                cleanup_warning,
            } => {
                self.upsert_listed(&post);
                let mut status = format!("Saved '{}'", post.slug);
                if let Some(warning) = cleanup_warning {
                    status.push_str(&format!(" (old image not removed: {warning})"));
                }
                self.editor = Some(EditorState::edit(post, image_url));
                self.last_error = None;
                Some(status)
            }
            UiEvent::PostDeleted {
                slug,
                cleanup_warning,
            } => {
                self.remove_listed(&slug);
                let editing_deleted = self
                    .editor
                    .as_ref()
                    .and_then(|editor| editor.current.as_ref())
                    .is_some_and(|post| post.slug == slug);
                if editing_deleted {
                    self.editor = None;
                }
                let mut status = format!("Deleted '{slug}'");
                if let Some(warning) = cleanup_warning {
                    status.push_str(&format!(" (image not removed: {warning})"));
                }
                Some(status)
            }
            UiEvent::Error(err) => {
                let context = err.context();
                if matches!(
                    context,
                    UiErrorContext::ListPosts | UiErrorContext::BackendStartup
                ) {
                    self.loading = false;
                }
                if matches!(
                    context,
                    UiErrorContext::SavePost | UiErrorContext::BackendStartup
                ) {
                    if let Some(editor) = &mut self.editor {
                        editor.saving = false;
                    }
                }
                let status = err.status_line();
                self.last_error = Some(err);
                Some(status)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
