//! Showcase Backend - library for app logic and testing

pub mod config;
pub mod db;
pub mod error;
pub mod intake;
pub mod logging;
pub mod notify;
pub mod routes;
pub mod state;
pub mod validation;

#[cfg(test)]
mod test_support;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use thiserror::Error;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use config::{Config, ConfigError};
use db::models::{AdminForm, Application, BlogPost, Order, PortfolioItem, Social, Work};
use db::{MemoryStore, PgStore, Store};
use notify::WebhookNotifier;
use routes::{admins, auth, blog, health, leads, resource, socials};
use state::AppState;

const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("DATABASE_URL is not set")]
    DatabaseUrlMissing,
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// CORS for the configured frontend origins.
pub fn configure_cors(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/detailed", get(health::health_detailed))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/verify", post(auth::verify_token))
        .route("/api/auth/logout", post(auth::logout))
        .merge(resource::public_routes::<Work>("/api/works"))
        .merge(resource::public_routes::<PortfolioItem>("/api/portfolio"))
        .route("/api/blog", get(blog::list_posts))
        .route("/api/blog/{id}", get(resource::get_one::<BlogPost>))
        .route("/api/socials", get(socials::list_socials))
        .route(
            "/api/applications",
            post(leads::create_lead::<Application>).get(resource::admin_list::<Application>),
        )
        .route(
            "/api/orders",
            post(leads::create_lead::<Order>).get(resource::admin_list::<Order>),
        )
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .merge(resource::admin_routes::<Work>("/api/admin/works"))
        .merge(resource::admin_routes::<PortfolioItem>("/api/admin/portfolio"))
        .merge(resource::admin_routes::<BlogPost>("/api/admin/blog"))
        .merge(resource::admin_routes::<Social>("/api/admin/socials"))
        .route(
            "/api/admin/applications",
            get(resource::admin_list::<Application>),
        )
        .route(
            "/api/admin/applications/{id}",
            get(resource::admin_get::<Application>)
                .patch(resource::update::<Application>)
                .delete(resource::delete::<Application>),
        )
        .route("/api/admin/orders", get(resource::admin_list::<Order>))
        .route(
            "/api/admin/orders/{id}",
            get(resource::admin_get::<Order>)
                .put(resource::update::<Order>)
                .delete(resource::delete::<Order>),
        )
        .route(
            "/api/admin/admins",
            get(admins::list_admins).post(admins::create_admin),
        )
        .route("/api/admin/admins/{id}", axum::routing::delete(admins::delete_admin))
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(state.config());

    Router::new()
        .merge(public_routes())
        .merge(admin_routes())
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(cors)
        .with_state(state)
}

/// PostgreSQL when DATABASE_URL is set, otherwise the in-memory store.
///
/// An unreachable database does not stop startup: the pool connects lazily
/// and /health reports the outage until it comes back.
pub async fn build_store(config: &Config) -> Result<Arc<dyn Store>, StartupError> {
    let Some(db_config) = &config.database else {
        tracing::warn!("DATABASE_URL not set. Using in-memory store; data is lost on restart.");
        return Ok(Arc::new(MemoryStore::new()));
    };

    match db::init_pool(db_config).await {
        Ok(pool) => {
            if let Err(e) = db::run_migrations(&pool).await {
                tracing::error!("Failed to run database migrations: {}", e);
            }
            Ok(Arc::new(PgStore::new(pool)))
        }
        Err(e) => {
            tracing::error!(
                "Failed to connect to database: {}. Starting with a lazy pool.",
                e
            );
            Ok(Arc::new(PgStore::new(db::lazy_pool(db_config)?)))
        }
    }
}

/// Connect and migrate for the CLI tools, which always need a real database.
pub async fn connect_database(config: &Config) -> Result<PgStore, StartupError> {
    let db_config = config
        .database
        .as_ref()
        .ok_or(StartupError::DatabaseUrlMissing)?;
    let pool = db::init_pool(db_config).await?;
    db::run_migrations(&pool).await?;
    Ok(PgStore::new(pool))
}

/// Create the configured admin when no admin exists yet.
pub async fn bootstrap_admin(state: &AppState) {
    let Some(admin) = state.config().bootstrap_admin.clone() else {
        return;
    };

    match state.store().admins().count().await {
        Ok(0) => {}
        Ok(_) => return,
        Err(e) => {
            tracing::warn!(error = %e, "Could not check for existing admins");
            return;
        }
    }

    let form = AdminForm {
        email: admin.email,
        password: admin.password,
        name: admin.name,
    };
    match admins::create_account(state.store(), form, state.config().bcrypt_cost).await {
        Ok(created) => tracing::info!(email = %created.email, "Bootstrap admin created"),
        Err(e) => tracing::warn!(error = %e, "Failed to create bootstrap admin"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    let config = Config::from_env()?;

    // Held until the server stops so buffered log lines are flushed.
    let _log_guards = logging::init(&config);

    let store = build_store(&config).await?;
    let notifier = WebhookNotifier::new(config.webhook.clone());
    if !notifier.is_configured() {
        tracing::warn!("BOT_WEBHOOK_URL / BOT_WEBHOOK_SECRET not set. Lead notifications are disabled.");
    }

    let addr = config.addr;
    let state = AppState::new(config, store, Arc::new(notifier));
    bootstrap_admin(&state).await;

    let app = create_app(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin_token, send, test_config, test_state, TEST_PASSWORD};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (state, _) = test_state();
        let (status, _) = send(&create_app(state), Method::GET, "/api/nothing", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let (state, _) = test_state();
        let res = create_app(state)
            .oneshot(
                Request::get("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let (state, _) = test_state();
        let res = create_app(state)
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/works")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            res.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:3000"
        );
    }

    #[tokio::test]
    async fn test_build_store_without_database_uses_memory() {
        let store = build_store(&test_config()).await.unwrap();
        assert_eq!(store.backend(), "memory");
    }

    #[tokio::test]
    async fn test_bootstrap_admin_runs_once() {
        let mut config = test_config();
        config.bootstrap_admin = Some(config::BootstrapAdmin {
            email: "owner@example.com".to_string(),
            password: TEST_PASSWORD.to_string(),
            name: "Owner".to_string(),
        });
        let state = AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(WebhookNotifier::new(Default::default())),
        );

        bootstrap_admin(&state).await;
        bootstrap_admin(&state).await;
        assert_eq!(state.store().admins().count().await.unwrap(), 1);

        let app = create_app(state);
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "owner@example.com", "password": TEST_PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_public_site_and_admin_flow() {
        let (state, notifier) = test_state();
        let token = admin_token(&state).await;
        let app = create_app(state);

        let (status, social) = send(
            &app,
            Method::POST,
            "/api/admin/socials",
            Some(&token),
            Some(json!({ "name": "Telegram", "url": "https://t.me/studio", "icon": "telegram" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(social["order"], 0);

        let (status, work) = send(
            &app,
            Method::POST,
            "/api/admin/works",
            Some(&token),
            Some(json!({
                "title": "Online store",
                "description": "Full catalogue with cart and checkout",
                "price": "from 150 000",
                "images": ["https://cdn.example.com/shop.jpg"],
                "clientName": "Electro LLC",
                "clientReview": "Delivered on time and works great",
                "category": "E-commerce",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, earlier) = send(
            &app,
            Method::POST,
            "/api/orders",
            None,
            Some(json!({
                "name": "Olga",
                "email": "olga@example.com",
                "phone": "+79990001122",
                "message": "Please call me about a redesign",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let (status, order) = send(
            &app,
            Method::POST,
            "/api/orders",
            None,
            Some(json!({
                "name": "Ivan",
                "email": "ivan@example.com",
                "phone": "+79991234567",
                "message": "I want one like this",
                "workId": work["id"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order["workId"], work["id"]);
        assert_eq!(notifier.events().len(), 2);

        let (status, orders) = send(&app, Method::GET, "/api/admin/orders", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<_> = orders.as_array().unwrap().iter().map(|o| &o["id"]).collect();
        assert_eq!(ids, vec![&order["id"], &earlier["id"]]);

        let (status, works) = send(&app, Method::GET, "/api/works", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(works[0]["title"], "Online store");
    }
}
