use crate::helpers::TestApp;
use serde_json::{Value, json};

async fn script_action(app: &TestApp) -> i64 {
    let id = app.create_project(&["main"]).await;
    let response = app
        .post(
            &format!("/api/projects/{id}/actions"),
            &json!({ "actionType": "script", "scriptContent": "echo $FOO" }),
        )
        .await;
    let action: Value = response.json().await.unwrap();
    action["id"].as_i64().unwrap()
}

#[tokio::test]
async fn secrets_are_listed_without_values() {
    let app = TestApp::spawn().await;
    let action_id = script_action(&app).await;

    let response = app
        .post(
            &format!("/api/actions/{action_id}/secrets"),
            &json!({ "name": "FOO", "value": "bar" }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let response = app.get(&format!("/api/actions/{action_id}/secrets")).await;
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    let secrets: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(secrets.len(), 1);
    assert_eq!(secrets[0]["name"], "FOO");
    assert!(!body.contains("bar"));
}

#[tokio::test]
async fn duplicate_secret_name_is_a_conflict() {
    let app = TestApp::spawn().await;
    let action_id = script_action(&app).await;
    let path = format!("/api/actions/{action_id}/secrets");

    app.post(&path, &json!({ "name": "FOO", "value": "bar" }))
        .await;
    let response = app
        .post(&path, &json!({ "name": "FOO", "value": "baz" }))
        .await;

    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "secret with this name already exists");
}

#[tokio::test]
async fn secret_names_must_be_shell_identifiers() {
    let app = TestApp::spawn().await;
    let action_id = script_action(&app).await;

    let response = app
        .post(
            &format!("/api/actions/{action_id}/secrets"),
            &json!({ "name": "FOO; rm -rf /", "value": "bar" }),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn secrets_can_be_updated_and_deleted() {
    let app = TestApp::spawn().await;
    let action_id = script_action(&app).await;

    let secret: Value = app
        .post(
            &format!("/api/actions/{action_id}/secrets"),
            &json!({ "name": "FOO", "value": "bar" }),
        )
        .await
        .json()
        .await
        .unwrap();
    let secret_id = secret["id"].as_i64().unwrap();
    let path = format!("/api/actions/{action_id}/secrets/{secret_id}");

    let response = app.put(&path, &json!({ "value": "qux" })).await;
    assert_eq!(response.status(), 204);

    let response = app.delete(&path).await;
    assert_eq!(response.status(), 204);
    let response = app.delete(&path).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn secrets_of_unknown_action_are_not_found() {
    let app = TestApp::spawn().await;
    let response = app.get("/api/actions/999/secrets").await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "action not found");
}
