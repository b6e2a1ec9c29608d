//! End-to-end runs of the `lca-dash` binary against the mock backend

mod helpers;

use std::path::Path;
use std::process::Output;

use assert_cmd::Command;
use helpers::{completed_status, logged_in, test_config, MockBackend};
use lca_common::config::{ENV_API_URL, ENV_CONFIG_FILE, ENV_DATA_FOLDER, ENV_POLL_INTERVAL_MS};
use lca_common::Store;
use lca_dash::models::Role;
use lca_dash::DashState;
use serde_json::json;
use tempfile::TempDir;

/// Run the binary off the runtime so the in-process mock keeps serving
async fn run_cli(backend: &MockBackend, data_folder: &Path, args: &[&str]) -> Output {
    let config_file = data_folder.join("config.toml");
    std::fs::write(&config_file, "").unwrap();

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_lca-dash"));
    cmd.env_remove(ENV_API_URL)
        .env_remove(ENV_DATA_FOLDER)
        .env_remove(ENV_CONFIG_FILE)
        .env_remove(ENV_POLL_INTERVAL_MS)
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&config_file)
        .arg("--api-url")
        .arg(&backend.base_url)
        .arg("--data-folder")
        .arg(data_folder)
        .args(args);

    tokio::task::spawn_blocking(move || cmd.output().expect("run lca-dash"))
        .await
        .unwrap()
}

fn persist_session(backend: &MockBackend, data_folder: &Path) {
    let state = DashState::open(test_config(&backend.base_url, data_folder)).unwrap();
    state
        .session
        .set(Some(logged_in("user-token", Role::User)))
        .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_template_requires_login() {
    let backend = MockBackend::start().await;
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("template.csv");

    let output = run_cli(&backend, dir.path(), &["template", dest.to_str().unwrap()]).await;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Not logged in"));
    assert!(backend.requests().is_empty());
    assert!(!dest.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_confirm_with_alternative_sends_new_mapping() {
    let backend = MockBackend::start().await;
    backend
        .respond("GET /products/upload-status/job-1", 200, completed_status())
        .respond(
            "POST /products/materials/suggest-alternatives",
            200,
            json!({
                "alternatives": [
                    { "uuid": "p-7", "name": "polyethylene, granulate", "similarity": 0.81 }
                ]
            }),
        )
        .respond(
            "POST /products/materials/confirm-mapping",
            200,
            json!({ "message": "Mappings saved" }),
        );

    let dir = TempDir::new().unwrap();
    persist_session(&backend, dir.path());

    let output = run_cli(
        &backend,
        dir.path(),
        &["confirm", "job-1", "--min-level", "high", "--alt", "3:p-7"],
    )
    .await;

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Confirmed 2 mappings"));

    let search = &backend.requests_to("POST /products/materials/suggest-alternatives")[0];
    assert_eq!(search.json(), json!({ "materialName": "Mystery polymer" }));

    let confirm = &backend.requests_to("POST /products/materials/confirm-mapping")[0];
    assert_eq!(confirm.authorization.as_deref(), Some("Bearer user-token"));
    let body = confirm.json();
    assert_eq!(body["mappings"]["3"]["activityUuid"], "p-7");
    assert_eq!(body["mappings"]["3"]["newMapping"], true);
    // m1's top suggestion is high confidence, m2's is not
    assert_eq!(body["mappings"]["m1"]["activityUuid"], "a-1");
    assert!(body["mappings"].get("m2").is_none());
}
