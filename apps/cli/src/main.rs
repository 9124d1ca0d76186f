use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{load_config, BlogConfig, BlogService, FileUpload, Query, WorkflowOutcome};
use serde::Serialize;
use shared::{
    counter::{BoundedCounter, CounterAction},
    domain::{FileId, PostStatus, Slug, UserId},
    protocol::{NewPost, PostUpdate},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "megablog", about = "Blog content client and bounded counter")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// Path to blog.toml; defaults to ./blog.toml, then the user config dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    endpoint: Option<String>,
    #[arg(long, global = true)]
    project_id: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replays add/remove actions against a fresh counter.
    Counter {
        #[arg(required = true, allow_hyphen_values = true)]
        actions: Vec<CounterAction>,
    },
    #[command(subcommand)]
    Posts(PostsCommand),
    #[command(subcommand)]
    Files(FilesCommand),
}

#[derive(Subcommand, Debug)]
enum PostsCommand {
    List {
        /// Include inactive posts.
        #[arg(long, conflicts_with = "status")]
        all: bool,
        #[arg(long)]
        status: Option<PostStatus>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
        #[arg(long)]
        newest_first: bool,
    },
    Get {
        slug: Slug,
    },
    Create {
        #[arg(long)]
        title: String,
        /// Derived from the title when omitted.
        #[arg(long)]
        slug: Option<Slug>,
        #[command(flatten)]
        content: ContentArgs,
        #[arg(long, default_value = "active")]
        status: PostStatus,
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long)]
        user_id: Option<UserId>,
    },
    Update {
        slug: Slug,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        content: OptionalContentArgs,
        #[arg(long)]
        status: Option<PostStatus>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    Delete {
        slug: Slug,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ContentArgs {
    #[arg(long)]
    content: Option<String>,
    #[arg(long)]
    content_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[group(required = false, multiple = false)]
struct OptionalContentArgs {
    #[arg(long)]
    content: Option<String>,
    #[arg(long)]
    content_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum FilesCommand {
    Upload { path: PathBuf },
    Delete { file_id: FileId },
    Url { file_id: FileId },
}

async fn read_content(inline: Option<String>, file: Option<PathBuf>) -> Result<Option<String>> {
    match (inline, file) {
        (Some(text), _) => Ok(Some(text)),
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .map(Some)
            .with_context(|| format!("failed to read content from '{}'", path.display())),
        (None, None) => Ok(None),
    }
}

async fn read_image(path: Option<PathBuf>) -> Result<Option<FileUpload>> {
    match path {
        Some(path) => Ok(Some(FileUpload::from_path(&path).await?)),
        None => Ok(None),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report_cleanup<T>(outcome: &WorkflowOutcome<T>) {
    if let Some(error) = &outcome.cleanup_error {
        eprintln!("warning: post saved but featured image cleanup failed: {error}");
    }
}

fn list_queries(
    all: bool,
    status: Option<PostStatus>,
    limit: Option<u32>,
    offset: Option<u32>,
    newest_first: bool,
) -> Vec<Query> {
    let mut queries = Vec::new();
    match (all, status) {
        (true, _) => {}
        (false, Some(status)) => queries.push(Query::equal("status", status.as_str())),
        (false, None) => queries.extend(client_core::query::active_posts()),
    }
    if newest_first {
        queries.push(Query::order_desc("$createdAt"));
    }
    if let Some(limit) = limit {
        queries.push(Query::limit(limit));
    }
    if let Some(offset) = offset {
        queries.push(Query::offset(offset));
    }
    queries
}

/// Prints one line per action with the value before and after it.
fn run_counter(actions: &[CounterAction]) -> BoundedCounter {
    let mut counter = BoundedCounter::new();
    for action in actions {
        let before = counter;
        counter = counter.apply(*action);
        println!("{}: {before} -> {counter}", action.label());
    }
    println!("counter value: {counter}");
    counter
}

async fn run_posts(service: &BlogService, command: PostsCommand) -> Result<()> {
    match command {
        PostsCommand::List {
            all,
            status,
            limit,
            offset,
            newest_first,
        } => {
            let queries = list_queries(all, status, limit, offset, newest_first);
            print_json(&service.list_posts(&queries).await?)
        }
        PostsCommand::Get { slug } => print_json(&service.get_post(&slug).await?),
        PostsCommand::Create {
            title,
            slug,
            content,
            status,
            image,
            user_id,
        } => {
            let slug = match slug {
                Some(slug) => slug,
                None => Slug::from_title(&title)
                    .with_context(|| format!("cannot derive a slug from title '{title}'"))?,
            };
            let content = read_content(content.content, content.content_file)
                .await?
                .unwrap_or_default();
            let post = NewPost {
                title,
                slug,
                content,
                featured_image: None,
                status,
                user_id,
            };
            let image = read_image(image).await?;
            print_json(&service.publish_post(post, image).await?)
        }
        PostsCommand::Update {
            slug,
            title,
            content,
            status,
            image,
        } => {
            let current = service.get_post(&slug).await?;
            let mut update = PostUpdate::from(&current);
            if let Some(title) = title {
                update.title = title;
            }
            if let Some(content) = read_content(content.content, content.content_file).await? {
                update.content = content;
            }
            if let Some(status) = status {
                update.status = status;
            }
            let image = read_image(image).await?;
            let outcome = service.revise_post(&current, update, image).await?;
            report_cleanup(&outcome);
            print_json(&outcome.value)
        }
        PostsCommand::Delete { slug } => {
            let outcome = service.remove_post(&slug).await?;
            report_cleanup(&outcome);
            println!("deleted post '{}'", outcome.value.slug);
            Ok(())
        }
    }
}

async fn run_files(service: &BlogService, command: FilesCommand) -> Result<()> {
    match command {
        FilesCommand::Upload { path } => {
            let upload = FileUpload::from_path(&path).await?;
            print_json(&service.upload_file(upload).await?)
        }
        FilesCommand::Delete { file_id } => {
            service.delete_file(&file_id).await?;
            println!("deleted file '{file_id}'");
            Ok(())
        }
        FilesCommand::Url { file_id } => {
            println!("{}", service.file_view_url(&file_id)?);
            Ok(())
        }
    }
}

fn resolve_config(args: &ConnectionArgs) -> Result<BlogConfig> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(project_id) = &args.project_id {
        config.project_id = project_id.clone();
    }
    if let Err(err) = config.validate() {
        bail!("{err}; set it in blog.toml or the APPWRITE_* environment variables");
    }
    tracing::debug!(
        endpoint = %config.endpoint,
        project_id = %config.project_id,
        collection_id = %config.collection_id,
        "cli: configuration resolved"
    );
    Ok(config)
}

/// Only remote commands need configuration.
fn connect(args: &ConnectionArgs) -> Result<BlogService> {
    let config = resolve_config(args)?;
    Ok(BlogService::new(&config)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Counter { actions } => {
            run_counter(&actions);
            Ok(())
        }
        Command::Posts(command) => run_posts(&connect(&cli.connection)?, command).await,
        Command::Files(command) => run_files(&connect(&cli.connection)?, command).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_replay_clamps_at_ceiling() {
        let actions = vec![CounterAction::Increment; 25];
        assert_eq!(run_counter(&actions).value(), 20);
    }

    #[test]
    fn counter_command_accepts_symbol_aliases() {
        let cli = Cli::try_parse_from(["megablog", "counter", "add", "+", "-", "remove"])
            .expect("parse");
        match cli.command {
            Command::Counter { actions } => {
                assert_eq!(
                    actions,
                    vec![
                        CounterAction::Increment,
                        CounterAction::Increment,
                        CounterAction::Decrement,
                        CounterAction::Decrement,
                    ]
                );
                assert_eq!(BoundedCounter::new().apply_all(actions).value(), 0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn default_listing_filters_active_posts() {
        assert_eq!(
            list_queries(false, None, None, None, false),
            vec![Query::equal("status", "active")]
        );
        assert!(list_queries(true, None, None, None, false).is_empty());
        assert_eq!(
            list_queries(false, Some(PostStatus::Inactive), Some(5), None, true),
            vec![
                Query::equal("status", "inactive"),
                Query::order_desc("$createdAt"),
                Query::limit(5),
            ]
        );
    }

    #[test]
    fn create_requires_content_source() {
        assert!(Cli::try_parse_from(["megablog", "posts", "create", "--title", "Hi"]).is_err());
        assert!(Cli::try_parse_from([
            "megablog", "posts", "create", "--title", "Hi", "--content", "body"
        ])
        .is_ok());
    }

    #[test]
    fn counter_runs_without_any_configuration() {
        let cli = Cli::try_parse_from([
            "megablog",
            "--config",
            "/nonexistent/blog.toml",
            "counter",
            "add",
        ])
        .expect("parse");
        assert!(connect(&cli.connection).is_err());
        match cli.command {
            Command::Counter { actions } => assert_eq!(run_counter(&actions).value(), 1),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_connection_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "megablog",
            "posts",
            "get",
            "hello",
            "--endpoint",
            "http://localhost:9/v1",
            "--project-id",
            "p1",
        ])
        .expect("parse");
        assert_eq!(cli.connection.endpoint.as_deref(), Some("http://localhost:9/v1"));
        assert_eq!(cli.connection.project_id.as_deref(), Some("p1"));
    }

    #[test]
    fn invalid_slug_is_rejected_at_parse_time() {
        assert!(Cli::try_parse_from(["megablog", "posts", "get", "bad slug"]).is_err());
    }
}
