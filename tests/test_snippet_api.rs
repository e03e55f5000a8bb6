//! End-to-end tests: run the router on a loopback port over the in-memory store and drive
//! it with a real HTTP client.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value as JsonValue};
use snippets_api::{transport, MemoryStore, RecordStore, SnippetService};
use std::sync::Arc;

struct TestServer {
    base_url: String,
    client: Client,
    server_handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let accounts = SnippetService::new(store.clone());
        accounts.register_owner("alice", "alice-pw").await.unwrap();
        accounts.register_owner("bob", "bob-pw").await.unwrap();

        let app_state = transport::http::AppState::new(store, None);
        let router = transport::http::create_router(app_state);

        // Bind to an ephemeral port to avoid conflicts with a running server.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            client: Client::new(),
            server_handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn create_as(&self, user: &str, password: &str, body: JsonValue) -> JsonValue {
        let resp = self
            .client
            .post(self.url("/snippets"))
            .basic_auth(user, Some(password))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: JsonValue = resp.json().await.unwrap();
        body["data"].clone()
    }

    async fn get_json(&self, path: &str) -> (StatusCode, JsonValue) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    async fn highlight_html(&self, id: i64) -> String {
        let resp = self
            .client
            .get(self.url(&format!("/snippets/{}/highlight", id)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        resp.text().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_stamps_owner_and_links() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .post(server.url("/snippets"))
        .basic_auth("alice", Some("alice-pw"))
        .json(&json!({
            "title": "hello",
            "code": "print('hi')",
            "language_id": "python",
            "owner": "bob",
            "id": 999
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body: JsonValue = resp.json().await.unwrap();
    assert_eq!(body["success"], true);

    let data = &body["data"];
    let id = data["id"].as_i64().unwrap();
    assert_ne!(id, 999);
    assert_eq!(data["owner"], "alice");
    assert_eq!(data["title"], "hello");
    assert_eq!(data["linenos"], false);
    assert_eq!(data["style_id"], "friendly");
    assert_eq!(data["url"], server.url(&format!("/snippets/{}", id)));
    assert_eq!(data["highlight"], server.url(&format!("/snippets/{}/highlight", id)));
    assert_eq!(location.as_deref(), data["url"].as_str());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reads_are_open_and_writes_need_credentials() {
    let server = TestServer::start().await;
    let created = server
        .create_as("alice", "alice-pw", json!({ "code": "x = 1" }))
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, list) = server.get_json("/snippets").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let (status, detail) = server.get_json(&format!("/snippets/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["data"]["code"], "x = 1");

    let resp = server
        .client
        .post(server.url("/snippets"))
        .json(&json!({ "code": "y" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().get("www-authenticate").is_some());

    for resp in [
        server
            .client
            .patch(server.url(&format!("/snippets/{}", id)))
            .json(&json!({ "code": "z" }))
            .send()
            .await
            .unwrap(),
        server
            .client
            .delete(server.url(&format!("/snippets/{}", id)))
            .send()
            .await
            .unwrap(),
    ] {
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    let (_, detail) = server.get_json(&format!("/snippets/{}", id)).await;
    assert_eq!(detail["data"]["code"], "x = 1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn only_the_owner_may_modify() {
    let server = TestServer::start().await;
    let created = server
        .create_as("alice", "alice-pw", json!({ "code": "x = 1", "title": "mine" }))
        .await;
    let id = created["id"].as_i64().unwrap();
    let path = server.url(&format!("/snippets/{}", id));

    let put = server
        .client
        .put(&path)
        .basic_auth("bob", Some("bob-pw"))
        .json(&json!({ "code": "stolen" }))
        .send()
        .await
        .unwrap();
    assert_eq!(put.status(), StatusCode::FORBIDDEN);

    // Forbidden wins over an invalid payload.
    let patch = server
        .client
        .patch(&path)
        .basic_auth("bob", Some("bob-pw"))
        .json(&json!({ "language_id": "klingon" }))
        .send()
        .await
        .unwrap();
    assert_eq!(patch.status(), StatusCode::FORBIDDEN);

    let delete = server
        .client
        .delete(&path)
        .basic_auth("bob", Some("bob-pw"))
        .send()
        .await
        .unwrap();
    assert_eq!(delete.status(), StatusCode::FORBIDDEN);

    let (_, detail) = server.get_json(&format!("/snippets/{}", id)).await;
    assert_eq!(detail["data"]["code"], "x = 1");
    assert_eq!(detail["data"]["title"], "mine");

    let own = server
        .client
        .put(&path)
        .basic_auth("alice", Some("alice-pw"))
        .json(&json!({ "code": "x = 2", "owner": "bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(own.status(), StatusCode::OK);
    let body: JsonValue = own.json().await.unwrap();
    assert_eq!(body["data"]["code"], "x = 2");
    assert_eq!(body["data"]["owner"], "alice");
    assert_eq!(body["data"]["title"], "mine");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn highlight_follows_code_but_not_title() {
    let server = TestServer::start().await;
    let created = server
        .create_as("alice", "alice-pw", json!({ "code": "alpha = 1" }))
        .await;
    let id = created["id"].as_i64().unwrap();
    let path = server.url(&format!("/snippets/{}", id));

    let resp = server
        .client
        .get(server.url(&format!("/snippets/{}/highlight", id)))
        .send()
        .await
        .unwrap();
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"));
    let original = resp.text().await.unwrap();
    assert!(original.starts_with("<!DOCTYPE html>"));
    assert!(original.contains("alpha"));

    let retitle = server
        .client
        .patch(&path)
        .basic_auth("alice", Some("alice-pw"))
        .json(&json!({ "title": "renamed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(retitle.status(), StatusCode::OK);
    assert_eq!(server.highlight_html(id).await, original);

    let recode = server
        .client
        .patch(&path)
        .basic_auth("alice", Some("alice-pw"))
        .json(&json!({ "code": "omega = 2", "linenos": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(recode.status(), StatusCode::OK);
    let rerendered = server.highlight_html(id).await;
    assert_ne!(rerendered, original);
    assert!(rerendered.contains("omega"));
    assert!(!rerendered.contains("alpha"));
    assert!(rerendered.contains("highlighttable"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_records_are_not_found_for_everyone() {
    let server = TestServer::start().await;

    let (status, _) = server.get_json("/snippets/4242").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server.get_json("/snippets/4242/highlight").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server.get_json("/snippets/not-a-number").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let anonymous_delete = server
        .client
        .delete(server.url("/snippets/4242"))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous_delete.status(), StatusCode::NOT_FOUND);

    let owner_put = server
        .client
        .put(server.url("/snippets/4242"))
        .basic_auth("alice", Some("alice-pw"))
        .json(&json!({ "code": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(owner_put.status(), StatusCode::NOT_FOUND);

    let (status, _) = server.get_json("/users/4242").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_payloads_are_rejected_with_field_errors() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .post(server.url("/snippets"))
        .basic_auth("alice", Some("alice-pw"))
        .json(&json!({
            "title": "t".repeat(101),
            "language_id": "klingon",
            "style_id": "neon"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = resp.json().await.unwrap();
    let errors = &body["data"]["errors"];
    assert_eq!(errors["code"][0], "This field is required.");
    assert!(errors["title"][0].as_str().unwrap().contains("100"));
    assert_eq!(errors["language_id"][0], "\"klingon\" is not a valid choice.");
    assert_eq!(errors["style_id"][0], "\"neon\" is not a valid choice.");

    let (_, list) = server.get_json("/snippets").await;
    assert!(list["data"].as_array().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn undecodable_body_is_unprocessable_after_the_gate() {
    let server = TestServer::start().await;
    let created = server.create_as("alice", "alice-pw", json!({ "code": "x" })).await;
    let id = created["id"].as_i64().unwrap();
    let path = server.url(&format!("/snippets/{}", id));

    let owner = server
        .client
        .patch(&path)
        .basic_auth("alice", Some("alice-pw"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(owner.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let stranger = server
        .client
        .patch(&path)
        .basic_auth("bob", Some("bob-pw"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(stranger.status(), StatusCode::FORBIDDEN);

    let anonymous = server
        .client
        .post(server.url("/snippets"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn bad_credentials_are_unauthorized() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(server.url("/snippets"))
        .basic_auth("alice", Some("wrong"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: JsonValue = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid username/password.");

    let resp = server
        .client
        .get(server.url("/snippets"))
        .header("authorization", "Basic ???")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn delete_removes_the_snippet() {
    let server = TestServer::start().await;
    let keep = server.create_as("alice", "alice-pw", json!({ "code": "keep" })).await;
    let doomed = server.create_as("alice", "alice-pw", json!({ "code": "drop" })).await;
    let drop_id = doomed["id"].as_i64().unwrap();

    let resp = server
        .client
        .delete(server.url(&format!("/snippets/{}", drop_id)))
        .basic_auth("alice", Some("alice-pw"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(resp.bytes().await.unwrap().is_empty());

    let (status, _) = server.get_json(&format!("/snippets/{}", drop_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, list) = server.get_json("/snippets").await;
    let ids: Vec<i64> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![keep["id"].as_i64().unwrap()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn users_and_root_are_hyperlinked() {
    let server = TestServer::start().await;
    let first = server.create_as("alice", "alice-pw", json!({ "code": "1" })).await;
    let second = server.create_as("alice", "alice-pw", json!({ "code": "2" })).await;

    let (status, root) = server.get_json("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(root["data"]["users"], server.url("/users"));
    assert_eq!(root["data"]["snippets"], server.url("/snippets"));

    let (status, users) = server.get_json("/users").await;
    assert_eq!(status, StatusCode::OK);
    let users = users["data"].as_array().unwrap().clone();
    assert_eq!(users.len(), 2);

    let alice = users.iter().find(|u| u["username"] == "alice").unwrap();
    assert_eq!(alice["snippets"], json!([first["url"], second["url"]]));
    let bob = users.iter().find(|u| u["username"] == "bob").unwrap();
    assert!(bob["snippets"].as_array().unwrap().is_empty());

    let alice_id = alice["id"].as_i64().unwrap();
    let (status, detail) = server.get_json(&format!("/users/{}", alice_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["data"]["url"], server.url(&format!("/users/{}", alice_id)));

    let (status, health) = server.get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["data"]["status"], "ok");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn bad_credentials_are_rejected_on_every_read_route() {
    let server = TestServer::start().await;
    let created = server.create_as("alice", "alice-pw", json!({ "code": "x" })).await;
    let id = created["id"].as_i64().unwrap();

    for path in [
        "/".to_string(),
        "/users".to_string(),
        "/users/1".to_string(),
        "/snippets".to_string(),
        format!("/snippets/{}", id),
        format!("/snippets/{}/highlight", id),
    ] {
        let resp = server
            .client
            .get(server.url(&path))
            .basic_auth("alice", Some("WRONG"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "GET {}", path);

        let resp = server
            .client
            .get(server.url(&path))
            .basic_auth("alice", Some("alice-pw"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "GET {}", path);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn put_replaces_and_patch_amends() {
    let server = TestServer::start().await;
    let created = server
        .create_as("alice", "alice-pw", json!({ "code": "x", "title": "kept" }))
        .await;
    let path = server.url(&format!("/snippets/{}", created["id"].as_i64().unwrap()));

    let put = server
        .client
        .put(&path)
        .basic_auth("alice", Some("alice-pw"))
        .json(&json!({ "title": "no code" }))
        .send()
        .await
        .unwrap();
    assert_eq!(put.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = put.json().await.unwrap();
    assert_eq!(body["data"]["errors"]["code"][0], "This field is required.");

    let patch = server
        .client
        .patch(&path)
        .basic_auth("alice", Some("alice-pw"))
        .json(&json!({ "title": "patched" }))
        .send()
        .await
        .unwrap();
    assert_eq!(patch.status(), StatusCode::OK);
    let body: JsonValue = patch.json().await.unwrap();
    assert_eq!(body["data"]["title"], "patched");
    assert_eq!(body["data"]["code"], "x");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn null_characters_are_a_bad_request() {
    let server = TestServer::start().await;
    let resp = server
        .client
        .post(server.url("/snippets"))
        .basic_auth("alice", Some("alice-pw"))
        .json(&json!({ "code": "a\u{0}b" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = resp.json().await.unwrap();
    assert_eq!(body["data"]["errors"]["code"][0], "Null characters are not allowed.");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn serve_stops_cleanly_on_shutdown_signal() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let router = transport::http::create_router(transport::http::AppState::new(store, None));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server_handle = tokio::spawn(transport::http::serve(listener, router, async move {
        let _ = stop_rx.await;
    }));

    let resp = Client::new()
        .get(format!("{}/health", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    drop(resp);

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(std::time::Duration::from_secs(10), server_handle)
        .await
        .expect("server did not stop after the shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}
