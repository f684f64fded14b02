use repo_radar::Settings;
use repo_radar::configuration::{
    ApplicationSettings, CorsSettings, DatabaseSettings, DispatchSettings, GitHubSettings,
};
use repo_radar::db::create_in_memory_pool;
use repo_radar::schedule::Scheduler;
use repo_radar::startup::Application;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::time::{Duration, sleep};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TestApp {
    addr: SocketAddr,
    client: reqwest::Client,
    pub github: MockServer,
    pub scheduler: Arc<Scheduler>,
    pub scratch: TempDir,
}

impl TestApp {
    /// Serves the full application on a random port, backed by an in-memory
    /// database and a mock GitHub.
    pub async fn spawn() -> Self {
        let github = MockServer::start().await;
        let scratch = tempfile::tempdir().unwrap();
        let settings = test_settings(&github.uri(), &scratch);

        let pool = create_in_memory_pool().await.unwrap();
        let app = Application::build(settings, pool).await.unwrap();
        let scheduler = app.scheduler().clone();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = app.router;
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let test_app = Self {
            addr,
            client: reqwest::Client::new(),
            github,
            scheduler,
            scratch,
        };
        test_app.wait_for_server().await;
        test_app
    }

    async fn wait_for_server(&self) {
        for _ in 0..50 {
            if self.client.get(self.url("/health")).send().await.is_ok() {
                return;
            }
            sleep(Duration::from_millis(100)).await;
        }
        panic!("Server failed to start within 5 seconds");
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .unwrap()
    }

    pub async fn put(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .unwrap()
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client.delete(self.url(path)).send().await.unwrap()
    }

    /// Creates a project tracking `branches` of owner/repo and returns its id.
    pub async fn create_project(&self, branches: &[&str]) -> i64 {
        let response = self
            .post(
                "/api/projects",
                &json!({
                    "name": "radar",
                    "repoUrl": "https://github.com/owner/repo",
                    "branches": branches,
                    "checkInterval": 5
                }),
            )
            .await;
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    /// Makes the mock GitHub report `sha` as the head of `branch`.
    pub async fn set_head(&self, branch: &str, sha: &str) {
        self.github.reset().await;
        Mock::given(method("GET"))
            .and(path(format!("/repos/owner/repo/branches/{branch}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": branch,
                "commit": {
                    "sha": sha,
                    "commit": {
                        "message": "Move the radar",
                        "author": { "name": "Octo Cat", "date": "2025-03-01T12:00:00Z" }
                    }
                }
            })))
            .mount(&self.github)
            .await;
    }
}

fn test_settings(github_uri: &str, scratch: &TempDir) -> Settings {
    Settings {
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        github: GitHubSettings {
            api_base_url: github_uri.to_string(),
            token: None,
            user_agent: "repo-radar-tests".to_string(),
            timeout_seconds: 5,
        },
        dispatch: DispatchSettings {
            webhook_timeout_seconds: 5,
            script_timeout_seconds: Some(10),
            shell: "/bin/sh".to_string(),
            workdir: Some(scratch.path().to_path_buf()),
        },
        cors: CorsSettings {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
    }
}
