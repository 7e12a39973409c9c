//! Persistence Gateway
//! Typed single-record operations over the site's tables, backed either by
//! PostgreSQL or by an in-process store when no database is configured.

pub mod memory;
pub mod models;
pub mod postgres;

use std::{cmp::Ordering, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::validation::Validate;
use models::{Admin, AdminCredentials, NewAdmin};

pub use memory::MemoryStore;
pub use postgres::PgStore;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// Unique constraint violation.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(err.to_string())
            }
            _ => Self::Database(err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// Gateway traits
// ============================================================================

/// An entity managed through the generic CRUD surface.
///
/// Ordering and record construction live here so every backend applies the
/// same semantics.
pub trait Resource: Clone + Serialize + Send + Sync + Unpin + 'static {
    /// Validated body for create.
    type Input: Validate + Send + Sync + 'static;
    /// Validated body for update.
    type Patch: Validate + Send + Sync + 'static;

    /// Human label used in messages and logs, e.g. "Work".
    const LABEL: &'static str;

    fn id(&self) -> Uuid;

    fn build(id: Uuid, now: DateTime<Utc>, input: Self::Input) -> Self;

    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>);

    /// Order of `Repository::list`.
    fn list_order(a: &Self, b: &Self) -> Ordering;

    fn repository(store: &dyn Store) -> &dyn Repository<Self>;
}

#[async_trait]
pub trait Repository<R: Resource>: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<R>>;

    async fn get(&self, id: Uuid) -> StoreResult<R>;

    async fn create(&self, input: R::Input) -> StoreResult<R>;

    async fn update(&self, id: Uuid, patch: R::Patch) -> StoreResult<R>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Newest first, without password hashes.
    async fn list(&self) -> StoreResult<Vec<Admin>>;

    /// Fails with `StoreError::Conflict` when the email is taken.
    async fn create(&self, admin: NewAdmin) -> StoreResult<Admin>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<AdminCredentials>>;

    async fn count(&self) -> StoreResult<i64>;
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for health output.
    fn backend(&self) -> &'static str;

    /// Run a trivial query and report how long it took.
    async fn ping(&self) -> StoreResult<Duration>;

    fn works(&self) -> &dyn Repository<models::Work>;
    fn portfolio(&self) -> &dyn Repository<models::PortfolioItem>;
    fn blog(&self) -> &dyn Repository<models::BlogPost>;
    fn socials(&self) -> &dyn Repository<models::Social>;
    fn applications(&self) -> &dyn Repository<models::Application>;
    fn orders(&self) -> &dyn Repository<models::Order>;
    fn admins(&self) -> &dyn AdminRepository;
}

// ============================================================================
// PostgreSQL pool
// ============================================================================

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl DbConfig {
    /// Pool settings for `url`, tuned through DB_POOL_MAX, DB_POOL_MIN,
    /// DB_CONNECT_TIMEOUT and DB_IDLE_TIMEOUT as returned by `var`.
    pub fn from_lookup<F>(url: String, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |name: &str, default: u64| -> u64 {
            var(name)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            url,
            max_connections: u32::try_from(var_or("DB_POOL_MAX", 10)).unwrap_or(10),
            min_connections: u32::try_from(var_or("DB_POOL_MIN", 2)).unwrap_or(2),
            connect_timeout_secs: var_or("DB_CONNECT_TIMEOUT", 10),
            idle_timeout_secs: var_or("DB_IDLE_TIMEOUT", 300),
        }
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(1800))
            .test_before_acquire(true)
    }

    /// URL with user and password replaced, safe to log.
    fn redacted_url(&self) -> String {
        let Ok(mut url) = url::Url::parse(&self.url) else {
            return "<unparseable database url>".to_string();
        };
        if !url.username().is_empty() {
            let _ = url.set_username("***");
        }
        if url.password().is_some() {
            let _ = url.set_password(Some("***"));
        }
        url.to_string()
    }
}

pub async fn init_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Initializing database connection pool...");
    tracing::debug!("Database URL: {}", config.redacted_url());

    let pool = config.pool_options().connect(&config.url).await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");
    Ok(pool)
}

/// Pool that connects on first use, so the server can start while the
/// database is still down and report it through /health.
pub fn lazy_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    config.pool_options().min_connections(0).connect_lazy(&config.url)
}

const MIGRATIONS: &[&str] = &[
    r#"
    DO $$ BEGIN
        CREATE TYPE application_status AS ENUM ('new', 'processing', 'completed');
    EXCEPTION
        WHEN duplicate_object THEN NULL;
    END $$
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS admins (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        email TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        name TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS works (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        price TEXT NOT NULL,
        images TEXT[] NOT NULL DEFAULT '{}',
        videos TEXT[] NOT NULL DEFAULT '{}',
        site_url TEXT,
        client_name TEXT NOT NULL,
        client_review TEXT NOT NULL,
        category TEXT NOT NULL,
        featured BOOLEAN NOT NULL DEFAULT false,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_works_created_at ON works(created_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS portfolio_items (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        images TEXT[] NOT NULL DEFAULT '{}',
        videos TEXT[] NOT NULL DEFAULT '{}',
        site_url TEXT,
        client_name TEXT NOT NULL,
        client_review TEXT NOT NULL,
        category TEXT NOT NULL,
        featured BOOLEAN NOT NULL DEFAULT false,
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_portfolio_items_order ON portfolio_items(sort_order, created_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS blog_posts (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        excerpt TEXT NOT NULL,
        image TEXT,
        published BOOLEAN NOT NULL DEFAULT false,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_blog_posts_created_at ON blog_posts(created_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS socials (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        url TEXT NOT NULL,
        icon TEXT NOT NULL,
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS applications (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        full_name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT NOT NULL,
        telegram TEXT,
        project_type TEXT NOT NULL,
        project_problem TEXT NOT NULL,
        target_audience TEXT NOT NULL,
        budget TEXT NOT NULL,
        deadline TEXT NOT NULL,
        description TEXT NOT NULL,
        additional_info TEXT,
        status application_status NOT NULL DEFAULT 'new',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_applications_created_at ON applications(created_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT NOT NULL,
        telegram TEXT,
        message TEXT NOT NULL,
        work_id UUID,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_orders_created_at ON orders(created_at DESC)",
];

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    for statement in MIGRATIONS {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
