//! End-to-end tests of the describo binary

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn describo(config: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("describo").unwrap();
    cmd.arg("--config")
        .arg(config)
        .env_remove("GEMINI_API_KEY")
        .env_remove("DESCRIBO_PROVIDER")
        .env_remove("DESCRIBO_MODEL")
        .env_remove("DESCRIBO_API_BASE")
        .env_remove("DESCRIBO_MAX_IMAGE_BYTES")
        .env_remove("DESCRIBO_TIMEOUT_SECONDS");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("describo").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_check_accepts_png() {
    let dir = TempDir::new().unwrap();
    let image = common::write_image(&dir, "pixel.png", 2, 2);

    describo(&dir.path().join("missing.yaml"))
        .arg("check")
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("pixel.png"))
        .stdout(predicate::str::contains("image/png"))
        .stdout(predicate::str::contains("2x2"));
}

#[test]
fn test_check_rejects_non_image() {
    let dir = TempDir::new().unwrap();
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "hello").unwrap();

    describo(&dir.path().join("missing.yaml"))
        .arg("check")
        .arg(&notes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid file type: text/plain"));
}

#[test]
fn test_check_honors_configured_ceiling() {
    let (dir, config) = common::temp_config_file(
        r#"
provider:
  type: gemini
intake:
  max_image_bytes: 16
"#,
    );
    let image = common::write_image(&dir, "big.png", 32, 32);

    describo(&config)
        .arg("check")
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("too large"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let (_dir, config) = common::temp_config_file(
        r#"
provider:
  type: copilot
"#,
    );

    describo(&config)
        .arg("check")
        .arg("whatever.png")
        .assert()
        .failure()
        .stderr(predicate::str::contains("provider"));
}

#[test]
fn test_ask_without_api_key_fails() {
    let dir = TempDir::new().unwrap();
    let image = common::write_image(&dir, "pixel.png", 2, 2);

    describo(&dir.path().join("missing.yaml"))
        .args(["ask", "--prompt", "what is this?", "--image"])
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing credentials"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ask_streams_answer_to_stdout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:streamGenerateContent"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                common::sse_body(&["Hola", " mundo"]).into_bytes(),
                "text/event-stream",
            ),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let image = common::write_image(&dir, "pixel.png", 2, 2);

    describo(&dir.path().join("missing.yaml"))
        .env("GEMINI_API_KEY", "test-key")
        .env("DESCRIBO_API_BASE", server.uri())
        .args(["ask", "--prompt", "what is this?", "--image"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("Hola mundo"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ask_surfaces_api_error_without_double_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:streamGenerateContent"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let image = common::write_image(&dir, "pixel.png", 2, 2);

    describo(&dir.path().join("missing.yaml"))
        .env("GEMINI_API_KEY", "bad-key")
        .env("DESCRIBO_API_BASE", server.uri())
        .args(["ask", "--prompt", "what is this?", "--image"])
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key not valid"))
        .stderr(predicate::str::contains("Request error: Request error").not());
}
