//! Integration tests for the typed Halo and GitHub clients.

use std::time::Duration;

use haloctl_core::{
    ApiError, AuthInterceptor, HaloClient, InterceptorConfig, JournalType, MemoryStore, PostQuery,
    ReleasesClient, ReqwestTransport, TokenHeader, TokenPair,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

async fn client(server: &MockServer) -> HaloClient<ReqwestTransport, MemoryStore> {
    let transport = ReqwestTransport::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let store = MemoryStore::new();
    TokenPair::new("admin-token", "refresh").store(&store).await.unwrap();
    let config = InterceptorConfig {
        token_header: TokenHeader::halo_admin(),
        ..InterceptorConfig::default()
    };
    HaloClient::new(AuthInterceptor::new(transport, store, config))
}

fn page(content: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "status": 200,
        "message": "OK",
        "data": {"content": content, "total": 1, "page": 0, "pages": 1}
    }))
}

#[tokio::test]
async fn test_list_posts_sends_filters_and_admin_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("keyword", "rust"))
        .and(query_param("categoryId", "3"))
        .and(header("Admin-Authorization", "admin-token"))
        .respond_with(page(serde_json::json!([{
            "id": 7,
            "title": "Learning Rust",
            "slug": "learning-rust",
            "fullPath": "https://blog.example.com/archives/learning-rust",
            "createTime": 1640995200000u64
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server).await;
    let posts = client
        .list_posts(&PostQuery {
            keyword: Some("rust".to_string()),
            category_id: Some(3),
            ..PostQuery::default()
        })
        .await
        .unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "Learning Rust");
}

#[tokio::test]
async fn test_get_post_detail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/posts/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": 200,
            "data": {
                "id": 7,
                "title": "Learning Rust",
                "slug": "learning-rust",
                "fullPath": "https://blog.example.com/archives/learning-rust",
                "createTime": 1640995200000u64,
                "originalContent": "# Ownership"
            }
        })))
        .mount(&mock_server)
        .await;

    let detail = client(&mock_server).await.get_post(7).await.unwrap();
    assert_eq!(detail.post.id, 7);
    assert_eq!(detail.original_content.as_deref(), Some("# Ownership"));
}

#[tokio::test]
async fn test_post_list_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "status": 500,
            "message": "Internal Server Error"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .await
        .list_posts(&PostQuery::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Server { status: 500, .. }));
    assert_eq!(err.to_string(), "Internal Server Error");
}

#[tokio::test]
async fn test_create_journal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/journals"))
        .and(body_json(serde_json::json!({
            "sourceContent": "Have a good time~",
            "type": "INTIMATE"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": 200,
            "data": {
                "id": 99,
                "sourceContent": "Have a good time~",
                "type": "INTIMATE",
                "createTime": 1640995200000u64
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let journal = client(&mock_server)
        .await
        .create_journal("Have a good time~", JournalType::Intimate)
        .await
        .unwrap();

    assert_eq!(journal.id, Some(99));
    assert_eq!(journal.kind, JournalType::Intimate);
}

#[tokio::test]
async fn test_create_journal_rejects_blank_content_locally() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/journals"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .await
        .create_journal("   ", JournalType::Public)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Request { ref message } if message == "Please enter content"));
}

#[tokio::test]
async fn test_list_journals_and_attachments() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/journals"))
        .and(query_param("keyword", "good"))
        .respond_with(page(serde_json::json!([{
            "id": 1,
            "sourceContent": "a good day",
            "type": "PUBLIC",
            "createTime": 1640995200000u64
        }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/attachments"))
        .respond_with(page(serde_json::json!([{
            "id": 5,
            "name": "cat.png",
            "path": "https://blog.example.com/upload/cat.png",
            "thumbPath": "https://blog.example.com/upload/cat-thumbnail.png",
            "mediaType": "image/png",
            "size": 2048,
            "createTime": 1640995200000u64
        }])))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server).await;

    let journals = client.list_journals(Some("good")).await.unwrap();
    assert_eq!(journals[0].source_content, "a good day");

    let attachments = client.list_attachments(None).await.unwrap();
    assert_eq!(
        attachments[0].markdown_link(),
        "![cat.png](https://blog.example.com/upload/cat.png)"
    );
}

#[tokio::test]
async fn test_environment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/environments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": 200,
            "data": {"version": "1.5.0", "database": "H2", "mode": "production", "startTime": 1640995200000u64}
        })))
        .mount(&mock_server)
        .await;

    let env = client(&mock_server).await.environment().await.unwrap();
    assert_eq!(env.version, "1.5.0");
}

#[tokio::test]
async fn test_list_releases() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/halo-dev/halo/releases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": 1,
            "name": "v1.5.0",
            "tag_name": "v1.5.0",
            "html_url": "https://github.com/halo-dev/halo/releases/tag/v1.5.0",
            "body": "## Features",
            "draft": false,
            "prerelease": false,
            "created_at": "2022-01-01T00:00:00Z",
            "published_at": "2022-01-01T00:00:00Z",
            "author": {"login": "ruibaby", "avatar_url": "https://avatars.example.com/u/1"},
            "assets": [
                {"id": 10, "name": "halo-1.5.0.jar", "content_type": "application/java-archive",
                 "size": 1, "download_count": 40, "browser_download_url": "https://example.com/a.jar"},
                {"id": 11, "name": "halo-1.5.0.zip", "content_type": "application/zip",
                 "size": 1, "download_count": 2, "browser_download_url": "https://example.com/a.zip"}
            ]
        }])))
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new(&mock_server.uri(), Duration::from_secs(5)).unwrap();
    let releases = ReleasesClient::new(transport).list("halo-dev/halo").await.unwrap();

    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].download_count(), 42);
    assert!(releases[0].is_version("1.5.0"));
}
