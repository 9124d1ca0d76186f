//! App shell: top bar view switch, Counter view, Posts view, status bar.

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::{
    counter::{BoundedCounter, CounterAction},
    domain::{PostStatus, Slug},
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiError, UiErrorCategory, UiEvent},
    orchestration::dispatch_backend_command,
    reducer::{reduce_counter, EditorState, PostsState},
};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum AppView {
    #[default]
    Counter,
    Posts,
}

/// Deferred so the view can render against `&self.posts` and still queue commands.
enum PostsAction {
    Refresh { include_inactive: bool },
    Open(Slug),
    Compose,
    Save,
    PickImage,
    ClearImage,
    RequestDelete(Slug),
    ConfirmDelete,
    CancelDelete,
    CloseEditor,
}

pub struct StartupConfig {
    pub endpoint: String,
    pub project_id: String,
}

pub struct DesktopGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    startup: StartupConfig,
    view: AppView,
    counter: BoundedCounter,
    posts: PostsState,
    pending_delete: Option<Slug>,
    posts_requested: bool,
    status: String,
}

impl DesktopGuiApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: StartupConfig,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            startup,
            view: AppView::default(),
            counter: BoundedCounter::new(),
            posts: PostsState::default(),
            pending_delete: None,
            posts_requested: false,
            status: "Starting backend worker...".to_string(),
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            if let Some(status) = self.posts.apply(event) {
                self.status = status;
            }
        }
    }

    fn on_counter(&mut self, action: CounterAction) {
        self.counter = reduce_counter(self.counter, action);
    }

    fn show_counter_view(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(24.0);
            ui.heading("Counter");
            ui.add_space(8.0);
            ui.label(egui::RichText::new(format!("counter value: {}", self.counter)).size(22.0));
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                if ui.button(CounterAction::Increment.label()).clicked() {
                    self.on_counter(CounterAction::Increment);
                }
                if ui.button(CounterAction::Decrement.label()).clicked() {
                    self.on_counter(CounterAction::Decrement);
                }
            });
        });
    }

    fn show_post_list(&self, ui: &mut egui::Ui, actions: &mut Vec<PostsAction>) {
        ui.horizontal(|ui| {
            let mut include_inactive = self.posts.include_inactive;
            if ui.checkbox(&mut include_inactive, "Show inactive").changed() {
                actions.push(PostsAction::Refresh { include_inactive });
            }
            if ui
                .add_enabled(!self.posts.loading, egui::Button::new("Refresh"))
                .clicked()
            {
                actions.push(PostsAction::Refresh {
                    include_inactive: self.posts.include_inactive,
                });
            }
            if self.posts.loading {
                ui.spinner();
            }
        });
        if ui.button("New post").clicked() {
            actions.push(PostsAction::Compose);
        }
        if let Some(err) = &self.posts.last_error {
            show_error_banner(ui, err);
        }
        ui.separator();
        ui.label(format!("{} posts", self.posts.total));

        let open_slug = self
            .posts
            .editor
            .as_ref()
            .and_then(|editor| editor.current.as_ref())
            .map(|post| &post.slug);
        egui::ScrollArea::vertical().show(ui, |ui| {
            for post in &self.posts.posts {
                let label = match post.status {
                    PostStatus::Active => post.title.clone(),
                    PostStatus::Inactive => format!("{} (inactive)", post.title),
                };
                let selected = open_slug == Some(&post.slug);
                if ui.selectable_label(selected, label).clicked() {
                    actions.push(PostsAction::Open(post.slug.clone()));
                }
            }
        });
    }

    fn show_editor(editor: &mut EditorState, ui: &mut egui::Ui, actions: &mut Vec<PostsAction>) {
        ui.heading(if editor.is_new() { "New post" } else { "Edit post" });
        egui::Grid::new("post_editor_fields")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                ui.label("Title");
                ui.text_edit_singleline(&mut editor.draft.title);
                ui.end_row();

                ui.label("Slug");
                if editor.is_new() {
                    ui.add(
                        egui::TextEdit::singleline(&mut editor.draft.slug)
                            .hint_text("derived from title"),
                    );
                } else {
                    ui.monospace(&editor.draft.slug);
                }
                ui.end_row();

                ui.label("Status");
                egui::ComboBox::from_id_salt("post_status")
                    .selected_text(editor.draft.status.as_str())
                    .show_ui(ui, |ui| {
                        for status in PostStatus::ALL {
                            ui.selectable_value(&mut editor.draft.status, status, status.as_str());
                        }
                    });
                ui.end_row();

                ui.label("Featured image");
                ui.horizontal(|ui| {
                    match (&editor.draft.image_path, &editor.image_url) {
                        (Some(path), _) => {
                            ui.label(path.display().to_string());
                        }
                        (None, Some(url)) => {
                            ui.hyperlink_to("current image", url);
                        }
                        (None, None) => {
                            ui.weak("none");
                        }
                    }
                    if ui.button("Choose...").clicked() {
                        actions.push(PostsAction::PickImage);
                    }
                    if editor.draft.image_path.is_some() && ui.button("Clear").clicked() {
                        actions.push(PostsAction::ClearImage);
                    }
                });
                ui.end_row();
            });

        ui.label("Content");
        ui.add(
            egui::TextEdit::multiline(&mut editor.draft.content)
                .desired_rows(14)
                .desired_width(f32::INFINITY),
        );

        ui.horizontal(|ui| {
            let can_save = !editor.saving && !editor.draft.title.trim().is_empty();
            if ui.add_enabled(can_save, egui::Button::new("Save")).clicked() {
                actions.push(PostsAction::Save);
            }
            if editor.saving {
                ui.spinner();
            }
            if let Some(post) = &editor.current {
                if ui.button("Delete").clicked() {
                    actions.push(PostsAction::RequestDelete(post.slug.clone()));
                }
            }
            if ui.button("Close").clicked() {
                actions.push(PostsAction::CloseEditor);
            }
        });
    }

    fn show_delete_confirmation(&self, ctx: &egui::Context, actions: &mut Vec<PostsAction>) {
        let Some(slug) = &self.pending_delete else {
            return;
        };
        egui::Window::new("Delete post")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!("Delete '{slug}' and its featured image?"));
                ui.horizontal(|ui| {
                    if ui.button("Delete").clicked() {
                        actions.push(PostsAction::ConfirmDelete);
                    }
                    if ui.button("Cancel").clicked() {
                        actions.push(PostsAction::CancelDelete);
                    }
                });
            });
    }

    fn show_posts_view(&mut self, ctx: &egui::Context) {
        if !self.posts_requested {
            self.posts_requested = true;
            self.run_posts_action(PostsAction::Refresh {
                include_inactive: false,
            });
        }

        let mut actions = Vec::new();
        egui::SidePanel::left("post_list")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| self.show_post_list(ui, &mut actions));
        egui::CentralPanel::default().show(ctx, |ui| match &mut self.posts.editor {
            Some(editor) => Self::show_editor(editor, ui, &mut actions),
            None => {
                ui.centered_and_justified(|ui| {
                    ui.weak("Select a post or create a new one");
                });
            }
        });
        self.show_delete_confirmation(ctx, &mut actions);

        for action in actions {
            self.run_posts_action(action);
        }
    }

    fn run_posts_action(&mut self, action: PostsAction) {
        match action {
            PostsAction::Refresh { include_inactive } => {
                let queued = dispatch_backend_command(
                    &self.cmd_tx,
                    BackendCommand::ListPosts { include_inactive },
                    &mut self.status,
                );
                if queued {
                    self.posts.begin_list(include_inactive);
                }
            }
            PostsAction::Open(slug) => {
                dispatch_backend_command(
                    &self.cmd_tx,
                    BackendCommand::OpenPost { slug },
                    &mut self.status,
                );
            }
            PostsAction::Compose => self.posts.editor = Some(EditorState::compose()),
            PostsAction::Save => {
                let Some(editor) = &self.posts.editor else {
                    return;
                };
                let cmd = BackendCommand::SavePost {
                    current: editor.current.clone(),
                    draft: editor.draft.clone(),
                };
                if dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status) {
                    self.posts.begin_save();
                }
            }
            PostsAction::PickImage => {
                let picked = rfd::FileDialog::new()
                    .add_filter("Images", IMAGE_EXTENSIONS)
                    .pick_file();
                if let (Some(path), Some(editor)) = (picked, &mut self.posts.editor) {
                    editor.draft.image_path = Some(path);
                }
            }
            PostsAction::ClearImage => {
                if let Some(editor) = &mut self.posts.editor {
                    editor.draft.image_path = None;
                }
            }
            PostsAction::RequestDelete(slug) => self.pending_delete = Some(slug),
            PostsAction::ConfirmDelete => {
                if let Some(slug) = self.pending_delete.take() {
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::DeletePost { slug },
                        &mut self.status,
                    );
                }
            }
            PostsAction::CancelDelete => self.pending_delete = None,
            PostsAction::CloseEditor => self.posts.editor = None,
        }
    }
}

fn show_error_banner(ui: &mut egui::Ui, err: &UiError) {
    let hint = if err.requires_credentials() {
        "Check the project id and API key/JWT in blog.toml."
    } else {
        match err.category() {
            UiErrorCategory::NotFound => "It may have been deleted; refresh the list.",
            UiErrorCategory::Transport => "The backend could not be reached; retry shortly.",
            UiErrorCategory::Validation => "The backend rejected the input.",
            UiErrorCategory::Auth | UiErrorCategory::Unknown => "",
        }
    };
    let color = ui.visuals().error_fg_color;
    ui.colored_label(color, err.message());
    if !hint.is_empty() {
        ui.weak(hint);
    }
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::TopBottomPanel::top("view_switch").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.view, AppView::Counter, "Counter");
                ui.selectable_value(&mut self.view, AppView::Posts, "Posts");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(format!(
                        "{} / {}",
                        self.startup.endpoint, self.startup.project_id
                    ));
                });
            });
        });
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(&self.status);
        });

        match self.view {
            AppView::Counter => {
                egui::CentralPanel::default().show(ctx, |ui| self.show_counter_view(ui));
            }
            AppView::Posts => self.show_posts_view(ctx),
        }

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}
