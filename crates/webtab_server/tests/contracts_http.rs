use serde_json::{Value, json};
use std::path::Path;
use webtab_backend::StorageConfig;
use webtab_server::{ServerConfig, StartedServer, start_server_with_config};

struct TestServer {
    server: StartedServer,
    _root: tempfile::TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.server.addr)
    }
}

fn temp_dir(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(&format!("webtab-contracts-{prefix}-"))
        .tempdir()
        .expect("create temp dir")
}

async fn start_test_server(sync_dir: Option<&Path>) -> TestServer {
    let root = temp_dir("root");
    let web_dist = root.path().join("web");
    std::fs::create_dir_all(&web_dist).expect("create web dist");
    std::fs::write(web_dist.join("index.html"), "<html>webtab</html>").expect("write index");

    let config = ServerConfig {
        storage: StorageConfig {
            root: root.path().join("data"),
            sync_dir: sync_dir.map(Path::to_path_buf),
        },
        web_dist,
    };
    let server = start_server_with_config("127.0.0.1:0".parse().unwrap(), config)
        .await
        .expect("start server");

    TestServer {
        server,
        _root: root,
    }
}

async fn get_json(client: &reqwest::Client, url: String) -> Value {
    let res = client.get(url).send().await.expect("send get");
    assert!(res.status().is_success(), "unexpected status {}", res.status());
    res.json().await.expect("parse json")
}

async fn post_action(
    client: &reqwest::Client,
    server: &TestServer,
    action: Value,
) -> reqwest::Response {
    client
        .post(server.url("/api/actions"))
        .json(&action)
        .send()
        .await
        .expect("send action")
}

fn custom_categories() -> Value {
    json!([
        {
            "id": "home",
            "title": "Home",
            "shortcuts": [
                { "id": "1", "title": "Docs", "url": "https://docs.rs", "color": "#3b82f6" },
                {
                    "id": "2",
                    "title": "Crates",
                    "url": "https://crates.io",
                    "iconUrl": "https://crates.io/favicon.ico"
                }
            ]
        },
        { "id": "work", "title": "Work", "shortcuts": [] }
    ])
}

#[tokio::test]
async fn health_and_static_fallback() {
    let server = start_test_server(None).await;
    let client = reqwest::Client::new();

    let health = client
        .get(server.url("/api/health"))
        .send()
        .await
        .expect("send health");
    assert_eq!(health.status(), reqwest::StatusCode::OK);
    assert_eq!(health.text().await.unwrap(), "ok");

    let page = client
        .get(server.url("/some/client/route"))
        .send()
        .await
        .expect("send page");
    assert_eq!(page.text().await.unwrap(), "<html>webtab</html>");
}

#[tokio::test]
async fn fresh_install_serves_defaults() {
    let server = start_test_server(None).await;
    let client = reqwest::Client::new();

    let categories = get_json(&client, server.url("/api/categories")).await;
    let categories = categories.as_array().expect("categories array");
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0]["id"], "home");
    assert_eq!(categories[0]["shortcuts"].as_array().unwrap().len(), 4);
    assert_eq!(categories[1]["id"], "social");
    assert_eq!(categories[1]["shortcuts"].as_array().unwrap().len(), 2);

    let settings = get_json(&client, server.url("/api/settings")).await;
    assert_eq!(settings["userName"], "User");
    assert_eq!(settings["useAiGreetings"], true);
}

#[tokio::test]
async fn saved_categories_and_settings_are_served_back() {
    let sync = temp_dir("sync");
    let server = start_test_server(Some(sync.path())).await;
    let client = reqwest::Client::new();

    let res = client
        .put(server.url("/api/categories"))
        .json(&custom_categories())
        .send()
        .await
        .expect("put categories");
    assert_eq!(res.status(), reqwest::StatusCode::NO_CONTENT);

    let settings = json!({
        "userName": "Ada",
        "backgroundImageUrl": "https://example.com/bg.jpg",
        "useAiGreetings": false
    });
    let res = client
        .put(server.url("/api/settings"))
        .json(&settings)
        .send()
        .await
        .expect("put settings");
    assert_eq!(res.status(), reqwest::StatusCode::NO_CONTENT);

    assert_eq!(
        get_json(&client, server.url("/api/categories/cached")).await,
        custom_categories()
    );
    assert_eq!(
        get_json(&client, server.url("/api/categories")).await,
        custom_categories()
    );
    assert_eq!(get_json(&client, server.url("/api/settings")).await, settings);
    assert!(sync.path().join("categories.json").is_file());
    assert!(sync.path().join("settings.json").is_file());
}

#[tokio::test]
async fn malformed_writes_are_rejected() {
    let server = start_test_server(None).await;
    let client = reqwest::Client::new();

    let res = client
        .put(server.url("/api/categories"))
        .json(&json!([]))
        .send()
        .await
        .expect("put categories");
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    assert!(res.text().await.unwrap().contains("categories is empty"));

    let res = client
        .put(server.url("/api/settings"))
        .json(&json!({ "userName": "Ada" }))
        .send()
        .await
        .expect("put settings");
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn remote_value_wins_across_devices() {
    let sync = temp_dir("shared-sync");
    let first = start_test_server(Some(sync.path())).await;
    let second = start_test_server(Some(sync.path())).await;
    let client = reqwest::Client::new();

    // Populate the second device's cache before the first device writes.
    get_json(&client, second.url("/api/categories")).await;

    client
        .put(first.url("/api/categories"))
        .json(&custom_categories())
        .send()
        .await
        .expect("put categories");

    let stale = get_json(&client, second.url("/api/categories/cached")).await;
    assert_eq!(stale[1]["id"], "social");

    assert_eq!(
        get_json(&client, second.url("/api/categories")).await,
        custom_categories()
    );

    let res = client
        .post(second.url("/api/cache/invalidate"))
        .send()
        .await
        .expect("invalidate");
    assert_eq!(res.status(), reqwest::StatusCode::NO_CONTENT);
    assert_eq!(
        get_json(&client, second.url("/api/categories/cached")).await,
        custom_categories()
    );
}

#[tokio::test]
async fn collection_actions_edit_and_persist() {
    let server = start_test_server(None).await;
    let client = reqwest::Client::new();
    get_json(&client, server.url("/api/categories")).await;

    let add = json!({ "type": "add_category", "title": "Reading" });
    let res = post_action(&client, &server, add).await;
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let categories: Value = res.json().await.unwrap();
    let reading_id = categories[2]["id"].as_str().expect("new category id").to_owned();
    assert_eq!(categories[2]["title"], "Reading");

    let res = post_action(
        &client,
        &server,
        json!({
            "type": "add_shortcut",
            "category_id": "home",
            "title": "Rust",
            "url": "rust-lang.org"
        }),
    )
    .await;
    let categories: Value = res.json().await.unwrap();
    let added = &categories[0]["shortcuts"][4];
    assert_eq!(added["url"], "https://rust-lang.org");
    assert!(added["color"].is_string());
    let added_id = added["id"].as_str().unwrap().to_owned();

    let res = post_action(
        &client,
        &server,
        json!({
            "type": "reorder_shortcut",
            "category_id": "home",
            "from_index": 4,
            "to_index": 0
        }),
    )
    .await;
    let categories: Value = res.json().await.unwrap();
    assert_eq!(categories[0]["shortcuts"][0]["id"], added_id);

    let res = post_action(
        &client,
        &server,
        json!({
            "type": "move_shortcut",
            "shortcut_id": added_id,
            "from_category_id": "home",
            "to_category_id": reading_id
        }),
    )
    .await;
    let categories: Value = res.json().await.unwrap();
    assert_eq!(categories[0]["shortcuts"].as_array().unwrap().len(), 4);
    assert_eq!(categories[2]["shortcuts"][0]["id"], added_id);

    let remove_home = json!({ "type": "remove_category", "category_id": "home" });
    let res = post_action(&client, &server, remove_home).await;
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let res = post_action(
        &client,
        &server,
        json!({
            "type": "reorder_shortcut",
            "category_id": "home",
            "from_index": 9,
            "to_index": 0
        }),
    )
    .await;
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let stored = get_json(&client, server.url("/api/categories")).await;
    assert_eq!(stored, categories);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_actions_are_all_applied() {
    let server = start_test_server(None).await;
    let client = reqwest::Client::new();
    get_json(&client, server.url("/api/categories")).await;

    let requests = (0..40).map(|i| {
        let client = client.clone();
        let url = server.url("/api/actions");
        tokio::spawn(async move {
            client
                .post(url)
                .json(&json!({ "type": "add_category", "title": format!("Group {i}") }))
                .send()
                .await
                .expect("send action")
                .status()
        })
    });
    let requests: Vec<_> = requests.collect();
    for request in requests {
        assert_eq!(request.await.unwrap(), reqwest::StatusCode::OK);
    }

    let categories = get_json(&client, server.url("/api/categories")).await;
    let categories = categories.as_array().unwrap();
    assert_eq!(categories.len(), 42);
    for i in 0..40 {
        let title = format!("Group {i}");
        assert!(categories.iter().any(|c| c["title"] == title.as_str()), "missing {title}");
    }
}

#[tokio::test]
async fn first_action_builds_on_the_synced_collection() {
    let sync = temp_dir("first-action-sync");
    let first = start_test_server(Some(sync.path())).await;
    let second = start_test_server(Some(sync.path())).await;
    let client = reqwest::Client::new();

    client
        .put(first.url("/api/categories"))
        .json(&custom_categories())
        .send()
        .await
        .expect("put categories");

    let add = json!({ "type": "add_category", "title": "Later" });
    let res = post_action(&client, &second, add).await;
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let categories: Value = res.json().await.unwrap();
    let categories = categories.as_array().unwrap();
    assert_eq!(categories.len(), 3);
    assert_eq!(categories[1]["id"], "work");
    assert_eq!(categories[2]["title"], "Later");
}

#[tokio::test]
async fn loose_shortcuts_survive_import() {
    let server = start_test_server(None).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/backup"))
        .body(
            r#"{
                "categories": [{"id": "home", "title": "Home", "shortcuts": [{"id": "1"}]}],
                "settings": {}
            }"#,
        )
        .send()
        .await
        .expect("import backup");
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    let categories = get_json(&client, server.url("/api/categories")).await;
    assert_eq!(categories[0]["shortcuts"][0]["id"], "1");
}

#[tokio::test]
async fn backup_export_import_round_trip() {
    let source = start_test_server(None).await;
    let client = reqwest::Client::new();
    client
        .put(source.url("/api/categories"))
        .json(&custom_categories())
        .send()
        .await
        .expect("put categories");

    let res = client
        .get(source.url("/api/backup"))
        .send()
        .await
        .expect("export backup");
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let disposition = res
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .expect("content disposition")
        .to_str()
        .unwrap()
        .to_owned();
    assert!(disposition.starts_with("attachment; filename=\"webtab-backup-"), "{disposition}");
    assert!(disposition.ends_with(".json\""), "{disposition}");
    let document = res.text().await.unwrap();
    let parsed: Value = serde_json::from_str(&document).unwrap();
    assert_eq!(parsed["version"], "1.0");
    assert!(parsed["exportDate"].is_string());

    let target = start_test_server(None).await;
    let res = client
        .post(target.url("/api/backup"))
        .body(document)
        .send()
        .await
        .expect("import backup");
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let imported: Value = res.json().await.unwrap();
    assert_eq!(imported["categories"], custom_categories());

    assert_eq!(
        get_json(&client, target.url("/api/categories")).await,
        custom_categories()
    );
}

#[tokio::test]
async fn invalid_backup_is_rejected_without_changes() {
    let server = start_test_server(None).await;
    let client = reqwest::Client::new();
    client
        .put(server.url("/api/categories"))
        .json(&custom_categories())
        .send()
        .await
        .expect("put categories");

    let res = client
        .post(server.url("/api/backup"))
        .body(r#"{"categories":"x","settings":{}}"#)
        .send()
        .await
        .expect("import backup");
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    assert!(res.text().await.unwrap().contains("categories is not an array"));

    assert_eq!(
        get_json(&client, server.url("/api/categories")).await,
        custom_categories()
    );
}
