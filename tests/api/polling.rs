use crate::helpers::TestApp;
use serde_json::{Value, json};

async fn check(app: &TestApp, id: i64) -> Value {
    let response = app.post(&format!("/api/projects/{id}/check"), &json!({})).await;
    assert_eq!(response.status(), 200);
    response.json().await.unwrap()
}

async fn logs(app: &TestApp, id: i64) -> Vec<Value> {
    app.get(&format!("/api/projects/{id}/logs"))
        .await
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn a_new_head_is_logged_once() {
    let app = TestApp::spawn().await;
    let id = app.create_project(&["main"]).await;
    app.set_head("main", "abc123").await;

    let report = check(&app, id).await;
    assert_eq!(report["changes"], 1);

    let entries = logs(&app, id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["status"], "CHANGE_DETECTED");
    assert_eq!(entries[0]["commit_sha"], "abc123");
    assert_eq!(entries[0]["branch_name"], "main");

    let report = check(&app, id).await;
    assert_eq!(report["changes"], 0);
    assert_eq!(logs(&app, id).await.len(), 1);

    app.set_head("main", "def456").await;
    let report = check(&app, id).await;
    assert_eq!(report["changes"], 1);
    let entries = logs(&app, id).await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["commit_sha"], "def456");
}

#[tokio::test]
async fn change_runs_script_with_its_secrets() {
    let app = TestApp::spawn().await;
    let id = app.create_project(&["main"]).await;
    let marker = app.scratch.path().join("deployed");

    let action: Value = app
        .post(
            &format!("/api/projects/{id}/actions"),
            &json!({
                "actionType": "script",
                "scriptContent": format!("echo \"$DEPLOY_KEY\" > '{}'", marker.display())
            }),
        )
        .await
        .json()
        .await
        .unwrap();
    let action_id = action["id"].as_i64().unwrap();
    app.post(
        &format!("/api/actions/{action_id}/secrets"),
        &json!({ "name": "DEPLOY_KEY", "value": "k3y" }),
    )
    .await;
    app.set_head("main", "abc123").await;

    let report = check(&app, id).await;
    assert_eq!(report["failed_actions"], 0);
    assert_eq!(std::fs::read_to_string(&marker).unwrap(), "k3y\n");
}

#[tokio::test]
async fn missing_branch_is_reported_as_a_failure() {
    let app = TestApp::spawn().await;
    let id = app.create_project(&["main"]).await;

    let report = check(&app, id).await;
    assert_eq!(report["branches_checked"], 1);
    assert_eq!(report["failures"], 1);
    assert!(logs(&app, id).await.is_empty());
}

#[tokio::test]
async fn log_limit_is_respected() {
    let app = TestApp::spawn().await;
    let id = app.create_project(&["main"]).await;
    for sha in ["a1", "b2", "c3"] {
        app.set_head("main", sha).await;
        check(&app, id).await;
    }

    let entries: Vec<Value> = app
        .get(&format!("/api/projects/{id}/logs?limit=2"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["commit_sha"], "c3");
}
