//! Runtime bridge between UI command queue and backend event intake.

use std::thread;

use client_core::{query, BlogConfig, BlogService, FileUpload, ServiceResult};
use crossbeam_channel::{Receiver, Sender};
use shared::{
    domain::FileId,
    protocol::{NewPost, Post, PostUpdate},
};

use crate::backend_bridge::commands::{BackendCommand, PostDraft};
use crate::controller::events::{UiError, UiErrorCategory, UiErrorContext, UiEvent};

/// Spawns the worker thread. Commands are handled one at a time, in order.
pub fn launch(config: BlogConfig, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    UiErrorCategory::Unknown,
                    format!("failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let service = match BlogService::new(&config) {
                Ok(service) => service,
                Err(err) => {
                    tracing::error!(%err, "backend worker startup failure");
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_service(
                        UiErrorContext::BackendStartup,
                        &err,
                    )));
                    return;
                }
            };
            let _ = ui_tx.try_send(UiEvent::Info(format!(
                "Connected to {} (project {})",
                config.endpoint, config.project_id
            )));

            while let Ok(cmd) = cmd_rx.recv() {
                let event = handle_command(&service, cmd).await;
                if ui_tx.send(event).is_err() {
                    tracing::debug!("ui event receiver dropped; stopping backend worker");
                    break;
                }
            }
        });
    });
}

fn view_url(service: &BlogService, file_id: Option<&FileId>) -> Option<String> {
    let file_id = file_id?;
    match service.file_view_url(file_id) {
        Ok(url) => Some(url.to_string()),
        Err(err) => {
            tracing::warn!(%err, file_id = %file_id, "could not build image view url");
            None
        }
    }
}

async fn handle_command(service: &BlogService, cmd: BackendCommand) -> UiEvent {
    let (context, result) = match cmd {
        BackendCommand::ListPosts { include_inactive } => {
            let queries = if include_inactive {
                Vec::new()
            } else {
                query::active_posts()
            };
            let result = service
                .list_posts(&queries)
                .await
                .map(|page| UiEvent::PostsLoaded {
                    include_inactive,
                    page,
                });
            (UiErrorContext::ListPosts, result)
        }
        BackendCommand::OpenPost { slug } => {
            let result = service.get_post(&slug).await.map(|post| {
                let image_url = view_url(service, post.featured_image.as_ref());
                UiEvent::PostLoaded { post, image_url }
            });
            (UiErrorContext::OpenPost, result)
        }
        BackendCommand::SavePost { current, draft } => {
            let result = save_post(service, current, draft).await;
            (UiErrorContext::SavePost, result)
        }
        BackendCommand::DeletePost { slug } => {
            let result = service
                .remove_post(&slug)
                .await
                .map(|outcome| UiEvent::PostDeleted {
                    slug: outcome.value.slug,
                    cleanup_warning: outcome.cleanup_error.map(|err| err.to_string()),
                });
            (UiErrorContext::DeletePost, result)
        }
    };
    result.unwrap_or_else(|err| UiEvent::Error(UiError::from_service(context, &err)))
}

async fn save_post(
    service: &BlogService,
    current: Option<Post>,
    draft: PostDraft,
) -> ServiceResult<UiEvent> {
    let image = match &draft.image_path {
        Some(path) => Some(FileUpload::from_path(path).await?),
        None => None,
    };

    let (post, cleanup_error) = match current {
        None => {
            let post = NewPost {
                slug: draft.resolve_slug()?,
                title: draft.title,
                content: draft.content,
                featured_image: None,
                status: draft.status,
                user_id: None,
            };
            (service.publish_post(post, image).await?, None)
        }
        Some(current) => {
            let mut update = PostUpdate::from(&current);
            update.title = draft.title;
            update.content = draft.content;
            update.status = draft.status;
            let outcome = service.revise_post(&current, update, image).await?;
            (outcome.value, outcome.cleanup_error)
        }
    };

    Ok(UiEvent::PostSaved {
        image_url: view_url(service, post.featured_image.as_ref()),
        post,
        cleanup_warning: cleanup_error.map(|err| err.to_string()),
    })
}
