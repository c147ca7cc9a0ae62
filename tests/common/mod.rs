use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use storefront_api::{
    checkout::mirror::InMemoryMirrorStore,
    config::AppConfig,
    db,
    events::{self, EventSender},
    handlers::AppServices,
    services::checkout::UpiCollectDetails,
    AppState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Helper harness spinning up the full application state backed by a
/// file-based SQLite database in a temp directory.
pub struct TestApp {
    router: Router,
    pub state: Arc<AppState>,
    _db_dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_dir = TempDir::new().expect("temp dir for test database");
        let db_path = db_dir.path().join("storefront_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            Arc::new(InMemoryMirrorStore::new()),
            None,
            UpiCollectDetails {
                payee_vpa: "storefront@upi".into(),
                payee_name: "Storefront".into(),
            },
        );

        let state = Arc::new(AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        });

        let router = Router::new()
            .nest("/health", storefront_api::handlers::health::health_routes())
            .nest("/api/v1", storefront_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _db_dir: db_dir,
            _event_task: event_task,
        }
    }

    /// Issues one request against the in-process router.
    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(path);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request body"),
            None => builder.body(Body::empty()).expect("request"),
        };

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
