//! PostgreSQL backend.

use std::marker::PhantomData;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

use super::models::{
    Admin, AdminCredentials, Application, BlogPost, NewAdmin, Order, PortfolioItem, Social, Work,
};
use super::{AdminRepository, Repository, Resource, Store, StoreError, StoreResult};

type PgQueryAs<'q, R> = QueryAs<'q, Postgres, R, PgArguments>;

/// Table mapping for a resource. `COLUMNS` starts with `id` and lists the
/// columns in the order `bind` binds them.
pub trait PgResource: Resource + for<'r> FromRow<'r, PgRow> {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    const ORDER_BY: &'static str;

    fn bind<'q>(self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self>;
}

impl PgResource for Work {
    const TABLE: &'static str = "works";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "description",
        "price",
        "images",
        "videos",
        "site_url",
        "client_name",
        "client_review",
        "category",
        "featured",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "created_at DESC";

    fn bind<'q>(self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self> {
        query
            .bind(self.id)
            .bind(self.title)
            .bind(self.description)
            .bind(self.price)
            .bind(self.images)
            .bind(self.videos)
            .bind(self.site_url)
            .bind(self.client_name)
            .bind(self.client_review)
            .bind(self.category)
            .bind(self.featured)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl PgResource for PortfolioItem {
    const TABLE: &'static str = "portfolio_items";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "description",
        "images",
        "videos",
        "site_url",
        "client_name",
        "client_review",
        "category",
        "featured",
        "sort_order",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "sort_order ASC, created_at DESC";

    fn bind<'q>(self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self> {
        query
            .bind(self.id)
            .bind(self.title)
            .bind(self.description)
            .bind(self.images)
            .bind(self.videos)
            .bind(self.site_url)
            .bind(self.client_name)
            .bind(self.client_review)
            .bind(self.category)
            .bind(self.featured)
            .bind(self.order)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl PgResource for BlogPost {
    const TABLE: &'static str = "blog_posts";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "content",
        "excerpt",
        "image",
        "published",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "created_at DESC";

    fn bind<'q>(self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self> {
        query
            .bind(self.id)
            .bind(self.title)
            .bind(self.content)
            .bind(self.excerpt)
            .bind(self.image)
            .bind(self.published)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl PgResource for Social {
    const TABLE: &'static str = "socials";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "url",
        "icon",
        "sort_order",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "sort_order ASC, created_at ASC";

    fn bind<'q>(self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self> {
        query
            .bind(self.id)
            .bind(self.name)
            .bind(self.url)
            .bind(self.icon)
            .bind(self.order)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl PgResource for Application {
    const TABLE: &'static str = "applications";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "full_name",
        "email",
        "phone",
        "telegram",
        "project_type",
        "project_problem",
        "target_audience",
        "budget",
        "deadline",
        "description",
        "additional_info",
        "status",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "created_at DESC";

    fn bind<'q>(self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self> {
        query
            .bind(self.id)
            .bind(self.full_name)
            .bind(self.email)
            .bind(self.phone)
            .bind(self.telegram)
            .bind(self.project_type)
            .bind(self.project_problem)
            .bind(self.target_audience)
            .bind(self.budget)
            .bind(self.deadline)
            .bind(self.description)
            .bind(self.additional_info)
            .bind(self.status)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl PgResource for Order {
    const TABLE: &'static str = "orders";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "email",
        "phone",
        "telegram",
        "message",
        "work_id",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "created_at DESC";

    fn bind<'q>(self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self> {
        query
            .bind(self.id)
            .bind(self.name)
            .bind(self.email)
            .bind(self.phone)
            .bind(self.telegram)
            .bind(self.message)
            .bind(self.work_id)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

// ============================================================================
// Generic repository
// ============================================================================

/// Statements for one table, rendered once from its `PgResource` mapping.
#[derive(Debug, Clone, PartialEq)]
struct Statements {
    list: String,
    get: String,
    lock: String,
    insert: String,
    update: String,
    delete: String,
}

impl Statements {
    fn for_resource<R: PgResource>() -> Self {
        let table = R::TABLE;
        let columns = R::COLUMNS.join(", ");
        let placeholders = (1..=R::COLUMNS.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let assignments = R::COLUMNS
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, column)| format!("{column} = ${}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            list: format!("SELECT {columns} FROM {table} ORDER BY {}", R::ORDER_BY),
            get: format!("SELECT {columns} FROM {table} WHERE id = $1"),
            lock: format!("SELECT {columns} FROM {table} WHERE id = $1 FOR UPDATE"),
            insert: format!(
                "INSERT INTO {table} ({columns}) VALUES ({placeholders}) RETURNING {columns}"
            ),
            update: format!("UPDATE {table} SET {assignments} WHERE id = $1 RETURNING {columns}"),
            delete: format!("DELETE FROM {table} WHERE id = $1"),
        }
    }
}

pub struct PgRepository<R> {
    pool: PgPool,
    sql: Statements,
    _resource: PhantomData<fn() -> R>,
}

impl<R: PgResource> PgRepository<R> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            sql: Statements::for_resource::<R>(),
            _resource: PhantomData,
        }
    }
}

#[async_trait]
impl<R: PgResource> Repository<R> for PgRepository<R> {
    async fn list(&self) -> StoreResult<Vec<R>> {
        let rows = sqlx::query_as::<_, R>(&self.sql.list)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> StoreResult<R> {
        sqlx::query_as::<_, R>(&self.sql.get)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, input: R::Input) -> StoreResult<R> {
        let record = R::build(Uuid::new_v4(), Utc::now(), input);
        let created = record
            .bind(sqlx::query_as::<_, R>(&self.sql.insert))
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(resource = R::LABEL, id = %created.id(), "Record created");
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: R::Patch) -> StoreResult<R> {
        let mut tx = self.pool.begin().await?;

        let mut record = sqlx::query_as::<_, R>(&self.sql.lock)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound)?;
        record.apply(patch, Utc::now());

        let updated = record
            .bind(sqlx::query_as::<_, R>(&self.sql.update))
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(resource = R::LABEL, id = %id, "Record updated");
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(&self.sql.delete)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        tracing::debug!(resource = R::LABEL, id = %id, "Record deleted");
        Ok(())
    }
}

// ============================================================================
// Admins
// ============================================================================

pub struct PgAdminRepository {
    pool: PgPool,
}

#[async_trait]
impl AdminRepository for PgAdminRepository {
    async fn list(&self) -> StoreResult<Vec<Admin>> {
        let admins = sqlx::query_as::<_, Admin>(
            r#"
            SELECT id, email, name, created_at, updated_at
            FROM admins
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(admins)
    }

    async fn create(&self, admin: NewAdmin) -> StoreResult<Admin> {
        let created = sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (id, email, password_hash, name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(&admin.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<AdminCredentials>> {
        let admin = sqlx::query_as::<_, AdminCredentials>(
            r#"
            SELECT id, email, name, password_hash, created_at, updated_at
            FROM admins
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    async fn count(&self) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// ============================================================================
// Store
// ============================================================================

pub struct PgStore {
    pool: PgPool,
    works: PgRepository<Work>,
    portfolio: PgRepository<PortfolioItem>,
    blog: PgRepository<BlogPost>,
    socials: PgRepository<Social>,
    applications: PgRepository<Application>,
    orders: PgRepository<Order>,
    admins: PgAdminRepository,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            works: PgRepository::new(pool.clone()),
            portfolio: PgRepository::new(pool.clone()),
            blog: PgRepository::new(pool.clone()),
            socials: PgRepository::new(pool.clone()),
            applications: PgRepository::new(pool.clone()),
            orders: PgRepository::new(pool.clone()),
            admins: PgAdminRepository { pool: pool.clone() },
            pool,
        }
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<Duration> {
        let start = Instant::now();
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(start.elapsed())
    }

    fn works(&self) -> &dyn Repository<Work> {
        &self.works
    }

    fn portfolio(&self) -> &dyn Repository<PortfolioItem> {
        &self.portfolio
    }

    fn blog(&self) -> &dyn Repository<BlogPost> {
        &self.blog
    }

    fn socials(&self) -> &dyn Repository<Social> {
        &self.socials
    }

    fn applications(&self) -> &dyn Repository<Application> {
        &self.applications
    }

    fn orders(&self) -> &dyn Repository<Order> {
        &self.orders
    }

    fn admins(&self) -> &dyn AdminRepository {
        &self.admins
    }
}
