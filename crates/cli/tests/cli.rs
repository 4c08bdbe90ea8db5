use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_article(dir: &TempDir, relative: &str, front_matter: &str) {
    let content = format!("---\n{}---\n\nHello from crosspost.\n", front_matter);
    let path = dir.path().join(relative);
    fs::create_dir_all(path.parent().expect("parent dir")).expect("create dirs");
    fs::write(&path, content).expect("write article");
}

fn crosspost(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("crosspost");
    cmd.current_dir(dir.path())
        .env_remove("DEVTO_API_KEY")
        .env_remove("QIITA_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("crosspost.toml");

    crosspost(&dir)
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).expect("read config");
    let parsed: toml::Value = toml::from_str(&content).expect("valid toml");
    assert_eq!(parsed["devto"]["api_key_env"].as_str(), Some("DEVTO_API_KEY"));
    assert!(content.contains("content/ja/"));
}

#[test]
fn config_init_refuses_to_overwrite_without_force() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("crosspost.toml");
    fs::write(&config_path, "# mine\n").expect("write config");

    crosspost(&dir)
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    assert_eq!(
        fs::read_to_string(&config_path).expect("read config"),
        "# mine\n"
    );

    crosspost(&dir)
        .args(["config", "init", "--force", "--path"])
        .arg(&config_path)
        .assert()
        .success();
}

#[test]
fn publish_without_files_is_a_no_op() {
    let dir = TempDir::new().expect("temp dir");

    crosspost(&dir)
        .env("DEVTO_API_KEY", "test-key")
        .args(["publish", "--platform", "devto"])
        .assert()
        .success();

    assert!(!dir.path().join(".posts-map.devto.json").exists());
}

#[test]
fn publish_fails_without_credential() {
    let dir = TempDir::new().expect("temp dir");
    write_article(&dir, "content/ja/post.md", "title: Post\ntags: rust\n");

    crosspost(&dir)
        .args(["publish", "--platform", "qiita", "content/ja/post.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("QIITA_TOKEN"));
}

#[tokio::test]
async fn publish_draft_creates_article_and_post_map() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/articles"))
        .and(header("api-key", "test-key"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": 321,
            "url": "https://dev.to/me/hello-321",
            "published": false
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("temp dir");
    write_article(&dir, "content/en/hello.md", "title: Hello\ntags: [rust]\n");

    crosspost(&dir)
        .env("DEVTO_API_KEY", "test-key")
        .env("CROSSPOST__DEVTO__BASE_URL", mock_server.uri())
        .args(["publish", "--platform", "devto", "content/en/hello.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("content/en/hello.md"));

    let raw = fs::read_to_string(dir.path().join(".posts-map.devto.json")).expect("read map");
    let map: Value = serde_json::from_str(&raw).expect("valid json");
    let entry = &map["content/en/hello.md"];
    assert_eq!(entry["id"], 321);
    assert_eq!(entry["url"], "https://dev.to/me/hello-321");
    assert_eq!(entry["published"], false);
}

#[tokio::test]
async fn publish_without_draft_is_rejected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("temp dir");
    write_article(&dir, "content/en/hello.md", "title: Hello\n");

    crosspost(&dir)
        .env("DEVTO_API_KEY", "test-key")
        .env("CROSSPOST__DEVTO__BASE_URL", mock_server.uri())
        .args([
            "publish",
            "--platform",
            "devto",
            "--mode",
            "publish",
            "content/en/hello.md",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Run a draft first"));

    let raw = fs::read_to_string(dir.path().join(".posts-map.devto.json")).expect("read map");
    let map: Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(map, serde_json::json!({}));
}

#[test]
fn doctor_reports_json() {
    let dir = TempDir::new().expect("temp dir");
    fs::create_dir_all(dir.path().join("content/en")).expect("create dirs");
    fs::create_dir_all(dir.path().join("content/ja")).expect("create dirs");
    write_article(&dir, "content/en/a.md", "title: A\n");

    let output = crosspost(&dir)
        .env("DEVTO_API_KEY", "test-key")
        .args(["doctor", "--json"])
        .output()
        .expect("run doctor");

    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["config"]["status"], "ok");
    assert_eq!(value["devto"]["status"], "ok");
    assert_eq!(value["qiita"]["status"], "warn");
    assert_eq!(value["content"]["details"][0]["markdown_files"], 1);
}

fn write_devto_map(dir: &TempDir) {
    let map = serde_json::json!({
        "content/en/hello.md": {
            "id": 55,
            "url": "https://dev.to/me/hello-55",
            "published": false
        }
    });
    fs::write(
        dir.path().join(".posts-map.devto.json"),
        format!("{}\n", serde_json::to_string_pretty(&map).expect("serialize map")),
    )
    .expect("write map");
}

async fn serve_devto_article(body_markdown: &str) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/articles/55"))
        .and(header("api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 55,
            "title": "Hello",
            "body_markdown": body_markdown,
            "url": "https://dev.to/me/hello-55",
            "published": false
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    mock_server
}

#[tokio::test]
async fn verify_reports_mismatch_and_exits_non_zero() {
    let mock_server = serve_devto_article("An older body.\n").await;

    let dir = TempDir::new().expect("temp dir");
    write_article(&dir, "content/en/hello.md", "title: Hello\n");
    write_devto_map(&dir);

    crosspost(&dir)
        .env("DEVTO_API_KEY", "test-key")
        .env("CROSSPOST__DEVTO__BASE_URL", mock_server.uri())
        .args(["verify", "--platform", "devto"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "content/en/hello.md: Local markdown content does not match remote",
        ));
}

#[tokio::test]
async fn verify_in_sync_succeeds() {
    let mock_server = serve_devto_article("Hello from crosspost.\n").await;

    let dir = TempDir::new().expect("temp dir");
    write_article(&dir, "content/en/hello.md", "title: Hello\n");
    write_devto_map(&dir);

    crosspost(&dir)
        .env("DEVTO_API_KEY", "test-key")
        .env("CROSSPOST__DEVTO__BASE_URL", mock_server.uri())
        .args(["verify", "--platform", "devto"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "All remote articles are in sync with local markdown and post maps.",
        ));
}
