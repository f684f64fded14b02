use crate::api;
use crate::configuration::{CorsSettings, Settings};
use crate::db::init_db;
use crate::dispatch::Dispatcher;
use crate::error::{PersistenceError, StartupError};
use crate::github::{ChangeDetector, GitHubClient};
use crate::schedule::{ProjectPoller, Scheduler};
use crate::service::ProjectService;
use crate::store::Store;
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post, put},
};
use reqwest::{
    Method,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub struct Application {
    pub host: String,
    pub port: u16,
    pub router: Router,
    store: Store,
    scheduler: Arc<Scheduler>,
}

impl Application {
    /// Migrates the database and wires store, detector, dispatcher and scheduler together.
    /// No timers run until [`Application::bootstrap`] is called.
    pub async fn build(configuration: Settings, pool: SqlitePool) -> Result<Self, StartupError> {
        init_db(&pool).await.map_err(PersistenceError::from)?;
        let store = Store::new(pool);

        let github = GitHubClient::new(&configuration.github)?;
        let dispatcher = Dispatcher::new(store.clone(), &configuration.dispatch)?;
        let poller = ProjectPoller::new(
            store.clone(),
            ChangeDetector::new(Arc::new(github)),
            dispatcher,
        );
        let scheduler = Arc::new(Scheduler::new(Arc::new(poller)));
        let service = ProjectService::new(store.clone(), scheduler.clone());
        let router = Self::app(service, &configuration.cors)?;

        Ok(Self {
            host: configuration.application.host,
            port: configuration.application.port,
            router,
            store,
            scheduler,
        })
    }

    pub fn app(service: ProjectService, cors: &CorsSettings) -> Result<Router, StartupError> {
        let cors = cors_layer(cors)?;

        let router = Router::new()
            .route("/health", get(api::health_check))
            .route(
                "/api/projects",
                get(api::list_projects).post(api::create_project),
            )
            .route(
                "/api/projects/{id}",
                get(api::get_project)
                    .put(api::update_project)
                    .delete(api::delete_project),
            )
            .route("/api/projects/{id}/check", post(api::check_project))
            .route("/api/projects/{id}/logs", get(api::list_logs))
            .route(
                "/api/projects/{id}/actions",
                get(api::list_actions).post(api::create_action),
            )
            .route(
                "/api/projects/{id}/actions/{action_id}",
                put(api::update_action).delete(api::delete_action),
            )
            .route(
                "/api/actions/{id}/secrets",
                get(api::list_secrets).post(api::create_secret),
            )
            .route(
                "/api/actions/{id}/secrets/{secret_id}",
                put(api::update_secret).delete(api::delete_secret),
            )
            .with_state(service)
            .layer(cors);

        Ok(router)
    }

    /// Installs a timer for every stored project.
    pub async fn bootstrap(&self) -> Result<usize, PersistenceError> {
        self.scheduler.bootstrap(&self.store).await
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }
}

/// Credentials are allowed, so every origin must be spelled out.
fn cors_layer(cors: &CorsSettings) -> Result<CorsLayer, StartupError> {
    let allowed_origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .map(|origin| {
            if origin.trim() == "*" {
                return Err(StartupError::CorsOrigin {
                    origin: origin.clone(),
                    reason: "wildcard origin cannot be combined with credentials".to_string(),
                });
            }
            HeaderValue::from_str(origin).map_err(|e| StartupError::CorsOrigin {
                origin: origin.clone(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, ACCEPT])
        .allow_credentials(true))
}
