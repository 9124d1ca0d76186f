use super::*;

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, RawQuery, State},
    http::{HeaderMap as AxumHeaders, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shared::domain::{PostStatus, Slug, UserId};
use shared::protocol::NewPost;
use tokio::{net::TcpListener, sync::Mutex};

use crate::BlogService;

#[derive(Debug, Clone, Default)]
struct Recorded {
    project: Option<String>,
    api_key: Option<String>,
    body: Option<Value>,
    raw_query: Option<String>,
    upload: Option<(String, String, Vec<u8>)>,
    deleted: Vec<String>,
}

#[derive(Clone, Default)]
struct MockState {
    recorded: Arc<Mutex<Recorded>>,
}

fn stored_document(id: &str) -> Value {
    json!({
        "$id": id,
        "$createdAt": "2024-05-01T08:00:00.000+00:00",
        "$updatedAt": "2024-05-01T08:00:00.000+00:00",
        "$collectionId": "posts",
        "$databaseId": "blog",
        "title": "Stored",
        "content": "text",
        "featuredimage": "img-9",
        "status": "active",
        "userid": "owner-3"
    })
}

fn header(headers: &AxumHeaders, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn rejected(headers: &AxumHeaders) -> Option<(StatusCode, Json<Value>)> {
    (header(headers, "x-appwrite-project").as_deref() == Some("locked")).then(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "message": "User (role: guests) missing scope (documents.read)",
                "code": 401,
                "type": "general_unauthorized_scope"
            })),
        )
    })
}

async fn list_documents(
    State(state): State<MockState>,
    headers: AxumHeaders,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if let Some(rejection) = rejected(&headers) {
        return Err(rejection);
    }
    let mut recorded = state.recorded.lock().await;
    recorded.project = header(&headers, "x-appwrite-project");
    recorded.api_key = header(&headers, "x-appwrite-key");
    recorded.raw_query = raw_query;
    Ok(Json(json!({
        "total": 2,
        "documents": [stored_document("one"), stored_document("two")]
    })))
}

async fn create_document(
    State(state): State<MockState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut document = body["data"].clone();
    document["$id"] = body["documentId"].clone();
    state.recorded.lock().await.body = Some(body);
    (StatusCode::CREATED, Json(document))
}

async fn get_document(Path((_db, _collection, id)): Path<(String, String, String)>) -> Response {
    match id.as_str() {
        "missing" => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "message": "Document with the requested ID could not be found.",
                "code": 404,
                "type": "document_not_found"
            })),
        )
            .into_response(),
        "crash" => (StatusCode::BAD_GATEWAY, "upstream gone\n").into_response(),
        _ => Json(stored_document(&id)).into_response(),
    }
}

async fn update_document(
    State(state): State<MockState>,
    Path((_db, _collection, id)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut document = stored_document(&id);
    if let (Some(target), Some(patch)) = (document.as_object_mut(), body["data"].as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
    state.recorded.lock().await.body = Some(body);
    Json(document)
}

async fn delete_document(
    State(state): State<MockState>,
    Path((_db, _collection, id)): Path<(String, String, String)>,
) -> StatusCode {
    state.recorded.lock().await.deleted.push(id);
    StatusCode::NO_CONTENT
}

async fn upload_file(
    State(state): State<MockState>,
    Path(bucket): Path<String>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let mut file_id = String::new();
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("fileId") => file_id = field.text().await.expect("file id"),
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.expect("file bytes").to_vec();
                upload = Some((filename, content_type, bytes));
            }
            _ => {}
        }
    }
    let (filename, content_type, bytes) = upload.clone().expect("file part");
    state.recorded.lock().await.upload = upload;
    (
        StatusCode::CREATED,
        Json(json!({
            "$id": file_id,
            "bucketId": bucket,
            "name": filename,
            "mimeType": content_type,
            "sizeOriginal": bytes.len(),
        })),
    )
}

async fn delete_file(
    State(state): State<MockState>,
    Path((_bucket, id)): Path<(String, String)>,
) -> StatusCode {
    state.recorded.lock().await.deleted.push(id);
    StatusCode::NO_CONTENT
}

async fn spawn_mock_backend() -> (String, MockState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = MockState::default();
    let app = Router::new()
        .route(
            "/v1/databases/:db/collections/:collection/documents",
            get(list_documents).post(create_document),
        )
        .route(
            "/v1/databases/:db/collections/:collection/documents/:id",
            get(get_document)
                .patch(update_document)
                .delete(delete_document),
        )
        .route("/v1/storage/buckets/:bucket/files", post(upload_file))
        .route(
            "/v1/storage/buckets/:bucket/files/:id",
            axum::routing::delete(delete_file),
        )
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/v1"), state)
}

fn config_for(endpoint: &str) -> BlogConfig {
    BlogConfig {
        endpoint: endpoint.to_string(),
        project_id: "proj-1".into(),
        database_id: "blog".into(),
        collection_id: "posts".into(),
        bucket_id: "images".into(),
        api_key: Some("server-key".into()),
        ..BlogConfig::default()
    }
}

#[tokio::test]
async fn list_sends_project_headers_and_json_queries() {
    let (endpoint, state) = spawn_mock_backend().await;
    let service = BlogService::new(&config_for(&endpoint)).expect("service");

    let page = service.list_active_posts().await.expect("list");
    assert_eq!(page.total, 2);
    assert_eq!(page.posts[1].slug.as_str(), "two");
    assert_eq!(
        page.posts[0].featured_image.as_ref().map(|f| f.as_str()),
        Some("img-9")
    );
    assert_eq!(page.posts[0].user_id.as_ref().map(UserId::as_str), Some("owner-3"));

    let recorded = state.recorded.lock().await.clone();
    assert_eq!(recorded.project.as_deref(), Some("proj-1"));
    assert_eq!(recorded.api_key.as_deref(), Some("server-key"));
    let raw_query = recorded.raw_query.expect("query string");
    let queries: Vec<(String, String)> = url::form_urlencoded::parse(raw_query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].0, "queries[]");
    let decoded: Value = serde_json::from_str(&queries[0].1).expect("query json");
    assert_eq!(
        decoded,
        json!({ "method": "equal", "attribute": "status", "values": ["active"] })
    );
}

#[tokio::test]
async fn listing_everything_sends_no_queries() {
    let (endpoint, state) = spawn_mock_backend().await;
    let service = BlogService::new(&config_for(&endpoint)).expect("service");

    service.list_posts(&[]).await.expect("list");
    let recorded = state.recorded.lock().await.clone();
    assert!(recorded.raw_query.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn create_sends_document_id_and_lowercase_fields() {
    let (endpoint, state) = spawn_mock_backend().await;
    let service = BlogService::new(&config_for(&endpoint)).expect("service");

    let post = NewPost {
        title: "Hello".into(),
        slug: Slug::parse("hello").expect("slug"),
        content: "body".into(),
        featured_image: Some(FileId::parse("cover").expect("file id")),
        status: PostStatus::Active,
        user_id: Some(UserId::new("u-1")),
    };
    let created = service.create_post(&post).await.expect("create");
    assert_eq!(created.slug.as_str(), "hello");
    assert_eq!(created.featured_image.as_ref().map(|f| f.as_str()), Some("cover"));

    let body = state.recorded.lock().await.body.clone().expect("body");
    assert_eq!(body["documentId"], "hello");
    assert_eq!(body["data"]["featuredimage"], "cover");
    assert_eq!(body["data"]["userid"], "u-1");
    assert!(body["data"].get("featuredImage").is_none());
}

#[tokio::test]
async fn update_patches_without_owner_field() {
    let (endpoint, state) = spawn_mock_backend().await;
    let service = BlogService::new(&config_for(&endpoint)).expect("service");

    let update = shared::protocol::PostUpdate {
        title: "Edited".into(),
        content: "new body".into(),
        featured_image: None,
        status: PostStatus::Inactive,
    };
    let updated = service
        .update_post(&Slug::parse("post-1").expect("slug"), &update)
        .await
        .expect("update");
    assert_eq!(updated.title, "Edited");
    assert_eq!(updated.status, PostStatus::Inactive);

    let body = state.recorded.lock().await.body.clone().expect("body");
    assert!(body["data"].get("userid").is_none());
}

#[tokio::test]
async fn missing_document_maps_to_not_found_with_remote_detail() {
    let (endpoint, _state) = spawn_mock_backend().await;
    let service = BlogService::new(&config_for(&endpoint)).expect("service");

    let err = service
        .get_post(&Slug::parse("missing").expect("slug"))
        .await
        .expect_err("not found");
    assert!(err.is_not_found());
    let remote = err.remote().expect("remote detail");
    assert_eq!(remote.status, 404);
    assert_eq!(remote.kind.as_deref(), Some("document_not_found"));
}

#[tokio::test]
async fn plain_text_error_body_keeps_status_and_text() {
    let (endpoint, _state) = spawn_mock_backend().await;
    let service = BlogService::new(&config_for(&endpoint)).expect("service");

    let err = service
        .get_post(&Slug::parse("crash").expect("slug"))
        .await
        .expect_err("bad gateway");
    assert!(matches!(err, ServiceError::Server(_)));
    let remote = err.remote().expect("remote detail");
    assert_eq!(remote.status, 502);
    assert_eq!(remote.message, "upstream gone");
    assert!(remote.kind.is_none());
}

#[tokio::test]
async fn wrong_project_maps_to_unauthorized() {
    let (endpoint, _state) = spawn_mock_backend().await;
    let mut config = config_for(&endpoint);
    config.project_id = "locked".into();
    let service = BlogService::new(&config).expect("service");

    let err = service.list_posts(&[]).await.expect_err("unauthorized");
    assert!(matches!(err, ServiceError::Unauthorized(_)));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let service =
        BlogService::new(&config_for(&format!("http://{addr}/v1"))).expect("service");
    let err = service
        .get_post(&Slug::parse("any").expect("slug"))
        .await
        .expect_err("connection refused");
    assert!(err.is_transport());
    assert!(err.code().is_none());
}

#[tokio::test]
async fn delete_post_and_file_succeed_on_no_content() {
    let (endpoint, state) = spawn_mock_backend().await;
    let service = BlogService::new(&config_for(&endpoint)).expect("service");

    service
        .delete_post(&Slug::parse("old-post").expect("slug"))
        .await
        .expect("delete post");
    service
        .delete_file(&FileId::parse("old-file").expect("file id"))
        .await
        .expect("delete file");

    let deleted = state.recorded.lock().await.deleted.clone();
    assert_eq!(deleted, vec!["old-post", "old-file"]);
}

#[tokio::test]
async fn upload_sends_multipart_with_generated_id() {
    let (endpoint, state) = spawn_mock_backend().await;
    let service = BlogService::new(&config_for(&endpoint)).expect("service");

    let stored = service
        .upload_file(FileUpload::new("cover.png", vec![0x89, b'P', b'N', b'G']))
        .await
        .expect("upload");
    assert_eq!(stored.id.as_str().len(), 32);
    assert_eq!(stored.bucket_id, "images");
    assert_eq!(stored.size_bytes, 4);

    let (filename, content_type, bytes) =
        state.recorded.lock().await.upload.clone().expect("upload");
    assert_eq!(filename, "cover.png");
    assert_eq!(content_type, "image/png");
    assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);
}

#[test]
fn view_url_targets_bucket_file_and_project() {
    let transport = AppwriteTransport::new(&config_for("https://cloud.example.com/v1/"))
        .expect("transport");
    let url = transport
        .file_view_url("images", &FileId::parse("abc123").expect("file id"))
        .expect("url");
    assert_eq!(
        url.as_str(),
        "https://cloud.example.com/v1/storage/buckets/images/files/abc123/view?project=proj-1"
    );
}

#[test]
fn document_urls_escape_ids() {
    let transport =
        AppwriteTransport::new(&config_for("http://localhost/v1")).expect("transport");
    let url = transport
        .documents_url("posts", Some("a b"))
        .expect("url");
    assert_eq!(
        url.as_str(),
        "http://localhost/v1/databases/blog/collections/posts/documents/a%20b"
    );
}

#[test]
fn invalid_config_is_rejected_before_any_request() {
    let mut config = config_for("http://localhost/v1");
    config.database_id.clear();
    assert!(matches!(
        AppwriteTransport::new(&config),
        Err(ServiceError::Config(_))
    ));
}
