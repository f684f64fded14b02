use crate::helpers::TestApp;
use repo_radar::domain::ProjectId;
use serde_json::{Value, json};

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;
    let response = app.get("/health").await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn created_project_is_listed_with_its_branches() {
    let app = TestApp::spawn().await;
    let id = app.create_project(&["main", "dev"]).await;

    let response = app.get("/api/projects").await;
    assert_eq!(response.status(), 200);
    let projects: Vec<Value> = response.json().await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["id"], id);
    assert_eq!(projects[0]["check_interval"], 5);
    assert_eq!(projects[0]["branches"][0]["name"], "main");
    assert_eq!(projects[0]["branches"][0]["last_commit"], Value::Null);
    assert!(app.scheduler.is_scheduled(ProjectId(id)));
}

#[tokio::test]
async fn malformed_repository_url_is_rejected() {
    let app = TestApp::spawn().await;
    let response = app
        .post(
            "/api/projects",
            &json!({ "name": "radar", "repoUrl": "not-a-url", "branches": ["main"] }),
        )
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid repository URL")
    );
    assert_eq!(app.scheduler.scheduled_count(), 0);
}

#[tokio::test]
async fn zero_interval_is_rejected_with_a_correctable_message() {
    let app = TestApp::spawn().await;
    let response = app
        .post(
            "/api/projects",
            &json!({
                "name": "radar",
                "repoUrl": "https://github.com/owner/repo",
                "branches": ["main"],
                "checkInterval": 0
            }),
        )
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "check interval must be at least 1 minute");
}

#[tokio::test]
async fn huge_interval_is_rejected_on_create_and_update() {
    let app = TestApp::spawn().await;
    let huge = json!({
        "name": "radar",
        "repoUrl": "https://github.com/owner/repo",
        "branches": ["main"],
        "checkInterval": 200_000_000_000_000_000_i64
    });

    let response = app.post("/api/projects", &huge).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "check interval must be at most 525600 minutes (one year)"
    );
    assert_eq!(app.scheduler.scheduled_count(), 0);

    let id = app.create_project(&["main"]).await;
    let response = app.put(&format!("/api/projects/{id}"), &huge).await;
    assert_eq!(response.status(), 400);
    assert!(app.scheduler.is_scheduled(ProjectId(id)));
}

#[tokio::test]
async fn unknown_project_is_not_found() {
    let app = TestApp::spawn().await;
    let response = app.get("/api/projects/404").await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "project not found");
}

#[tokio::test]
async fn update_replaces_branches_and_interval() {
    let app = TestApp::spawn().await;
    let id = app.create_project(&["main"]).await;

    let response = app
        .put(
            &format!("/api/projects/{id}"),
            &json!({
                "name": "radar",
                "repoUrl": "https://github.com/owner/repo",
                "branches": ["release"],
                "checkInterval": 15
            }),
        )
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["check_interval"], 15);
    assert_eq!(body["branches"].as_array().unwrap().len(), 1);
    assert_eq!(body["branches"][0]["name"], "release");
    assert_eq!(app.scheduler.scheduled_count(), 1);
}

#[tokio::test]
async fn deleting_a_project_stops_its_timer() {
    let app = TestApp::spawn().await;
    let id = app.create_project(&["main"]).await;

    let response = app.delete(&format!("/api/projects/{id}")).await;
    assert_eq!(response.status(), 204);
    assert!(!app.scheduler.is_scheduled(ProjectId(id)));

    let response = app.get(&format!("/api/projects/{id}")).await;
    assert_eq!(response.status(), 404);
    let response = app.delete(&format!("/api/projects/{id}")).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn actions_can_be_created_switched_and_deleted() {
    let app = TestApp::spawn().await;
    let id = app.create_project(&["main"]).await;

    let response = app
        .post(
            &format!("/api/projects/{id}/actions"),
            &json!({ "name": "notify", "actionType": "webhook", "webhookUrl": "https://example.com/hook" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let action: Value = response.json().await.unwrap();
    assert_eq!(action["action_type"], "webhook");
    let action_id = action["id"].as_i64().unwrap();

    let response = app
        .put(
            &format!("/api/projects/{id}/actions/{action_id}"),
            &json!({ "actionType": "script", "scriptContent": "echo hi" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let action: Value = response.json().await.unwrap();
    assert_eq!(action["action_type"], "script");
    assert_eq!(action["script_content"], "echo hi");
    assert!(action.get("webhook_url").is_none());

    let actions: Vec<Value> = app
        .get(&format!("/api/projects/{id}/actions"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(actions.len(), 1);

    let response = app
        .delete(&format!("/api/projects/{id}/actions/{action_id}"))
        .await;
    assert_eq!(response.status(), 204);
    let response = app
        .delete(&format!("/api/projects/{id}/actions/{action_id}"))
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn action_with_both_targets_is_rejected() {
    let app = TestApp::spawn().await;
    let id = app.create_project(&["main"]).await;

    let response = app
        .post(
            &format!("/api/projects/{id}/actions"),
            &json!({
                "actionType": "webhook",
                "webhookUrl": "https://example.com/hook",
                "scriptContent": "echo hi"
            }),
        )
        .await;
    assert_eq!(response.status(), 400);
}
