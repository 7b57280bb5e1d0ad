use std::path::PathBuf;

use figsync_core::{CollectionId, CollectionMetadata, FileId};
use figsync_remote::{FigshareClient, RemoteError, Repository, RetryPolicy};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HELLO_MD5: &str = "5d41402abc4b2a76b9719d911017c592";

fn client(server: &MockServer) -> FigshareClient {
    FigshareClient::new(server.uri(), Some("test-token".to_string())).with_retry(RetryPolicy::none())
}

fn hello_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("preds.csv");
    std::fs::write(&path, "hello").unwrap();
    path
}

/// Run a blocking client call off the async test runtime.
async fn blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    tokio::task::spawn_blocking(f).await.expect("blocking task")
}

async fn mount_upload_flow(server: &MockServer) {
    let uri = server.uri();
    Mock::given(method("POST"))
        .and(path("/account/articles/7/files"))
        .and(body_json(json!({"name": "a/b.csv", "md5": HELLO_MD5, "size": 5})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "location": format!("{uri}/account/articles/7/files/99")
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/account/articles/7/files/99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 99,
            "upload_url": format!("{uri}/upload/abc")
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/upload/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "parts": [
                {"partNo": 1, "startOffset": 0, "endOffset": 2},
                {"partNo": 2, "startOffset": 3, "endOffset": 4}
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/upload/abc/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/upload/abc/2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/account/articles/7/files/99"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn list_files_sends_token_and_keys_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account/articles/7/files"))
        .and(query_param("page", "1"))
        .and(header("authorization", "token test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "a/b.csv", "computed_md5": HELLO_MD5, "size": 5, "status": "available"},
            {"id": 2, "name": "c.json", "computed_md5": "", "size": 10}
        ])))
        .mount(&server)
        .await;

    let client = client(&server);
    let inventory = blocking(move || client.list_files(CollectionId(7)))
        .await
        .unwrap();

    assert_eq!(inventory.len(), 2);
    assert_eq!(inventory.get("a/b.csv").map(|f| f.id), Some(FileId(1)));
}

#[tokio::test(flavor = "multi_thread")]
async fn collection_exists_maps_404_to_false() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account/articles/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/account/articles/6"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "not found"})))
        .mount(&server)
        .await;

    let client = client(&server);
    let (five, six) = blocking(move || {
        (
            client.collection_exists(CollectionId(5)),
            client.collection_exists(CollectionId(6)),
        )
    })
    .await;
    assert!(five.unwrap());
    assert!(!six.unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn auth_failure_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account/articles/5"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = blocking(move || client.collection_exists(CollectionId(5)))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Api { status: 403, .. }), "got: {err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn create_collection_reads_entity_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/account/articles"))
        .and(body_json(json!({
            "title": "Predictions for Discovery",
            "description": "d",
            "defined_type": "dataset",
            "tags": ["task-discovery"],
            "categories": [25162]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "entity_id": 321,
            "location": "https://api.figshare.com/v2/account/articles/321"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let metadata = CollectionMetadata {
        title: "Predictions for Discovery".into(),
        description: "d".into(),
        defined_type: "dataset".into(),
        tags: vec!["task-discovery".into()],
        categories: vec![25162],
    };
    let id = blocking(move || client.create_collection(&metadata))
        .await
        .unwrap();
    assert_eq!(id, CollectionId(321));
}

#[tokio::test(flavor = "multi_thread")]
async fn file_matches_compares_remote_md5() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account/articles/7/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "a/b.csv", "computed_md5": HELLO_MD5}
        ])))
        .mount(&server)
        .await;

    let client = client(&server);
    let (same, different, absent) = blocking(move || {
        (
            client.file_matches(CollectionId(7), "a/b.csv", HELLO_MD5),
            client.file_matches(CollectionId(7), "a/b.csv", "0000"),
            client.file_matches(CollectionId(7), "x.csv", HELLO_MD5),
        )
    })
    .await;
    assert_eq!(same.unwrap(), Some(FileId(1)));
    assert_eq!(different.unwrap(), None);
    assert_eq!(absent.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn upload_if_needed_creates_new_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account/articles/7/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    mount_upload_flow(&server).await;

    let dir = TempDir::new().unwrap();
    let local = hello_file(&dir);
    let client = client(&server);
    let receipt = blocking(move || client.upload_if_needed(CollectionId(7), &local, "a/b.csv", false))
        .await
        .unwrap();

    assert_eq!(receipt.file_id, FileId(99));
    assert!(receipt.uploaded);
}

#[tokio::test(flavor = "multi_thread")]
async fn upload_if_needed_keeps_identical_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account/articles/7/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "a/b.csv", "computed_md5": HELLO_MD5}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let local = hello_file(&dir);
    let client = client(&server);
    let receipt = blocking(move || client.upload_if_needed(CollectionId(7), &local, "a/b.csv", false))
        .await
        .unwrap();

    assert_eq!(receipt.file_id, FileId(1));
    assert!(!receipt.uploaded);
}

#[tokio::test(flavor = "multi_thread")]
async fn forced_upload_replaces_same_named_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account/articles/7/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "a/b.csv", "computed_md5": HELLO_MD5}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/account/articles/7/files/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    mount_upload_flow(&server).await;

    let dir = TempDir::new().unwrap();
    let local = hello_file(&dir);
    let client = client(&server);
    let receipt = blocking(move || client.upload_if_needed(CollectionId(7), &local, "a/b.csv", true))
        .await
        .unwrap();

    assert_eq!(receipt.file_id, FileId(99));
    assert!(receipt.uploaded);
}
