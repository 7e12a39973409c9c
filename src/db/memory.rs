//! In-process backend used when no DATABASE_URL is configured, and by tests.
//! Contents are lost on restart.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    Admin, AdminCredentials, Application, BlogPost, NewAdmin, Order, PortfolioItem, Social, Work,
};
use super::{AdminRepository, Repository, Resource, Store, StoreError, StoreResult};

pub struct MemoryTable<R> {
    rows: RwLock<Vec<R>>,
}

impl<R> Default for MemoryTable<R> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl<R: Resource> Repository<R> for MemoryTable<R> {
    async fn list(&self) -> StoreResult<Vec<R>> {
        let mut rows = self.rows.read().await.clone();
        rows.sort_by(R::list_order);
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> StoreResult<R> {
        self.rows
            .read()
            .await
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, input: R::Input) -> StoreResult<R> {
        let record = R::build(Uuid::new_v4(), Utc::now(), input);
        self.rows.write().await.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: Uuid, patch: R::Patch) -> StoreResult<R> {
        let mut rows = self.rows.write().await;
        let record = rows
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or(StoreError::NotFound)?;
        record.apply(patch, Utc::now());
        Ok(record.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut rows = self.rows.write().await;
        let index = rows
            .iter()
            .position(|r| r.id() == id)
            .ok_or(StoreError::NotFound)?;
        rows.remove(index);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryAdmins {
    rows: RwLock<Vec<AdminCredentials>>,
}

#[async_trait]
impl AdminRepository for MemoryAdmins {
    async fn list(&self) -> StoreResult<Vec<Admin>> {
        let mut admins: Vec<Admin> = self
            .rows
            .read()
            .await
            .iter()
            .map(AdminCredentials::to_admin)
            .collect();
        admins.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(admins)
    }

    async fn create(&self, admin: NewAdmin) -> StoreResult<Admin> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|a| a.email == admin.email) {
            return Err(StoreError::Conflict(format!(
                "admin with email {} already exists",
                admin.email
            )));
        }

        let now = Utc::now();
        let credentials = AdminCredentials {
            id: Uuid::new_v4(),
            email: admin.email,
            name: admin.name,
            password_hash: admin.password_hash,
            created_at: now,
            updated_at: now,
        };
        let created = credentials.to_admin();
        rows.push(credentials);
        Ok(created)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|a| a.id != id);
        if rows.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<AdminCredentials>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn count(&self) -> StoreResult<i64> {
        Ok(self.rows.read().await.len() as i64)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    works: MemoryTable<Work>,
    portfolio: MemoryTable<PortfolioItem>,
    blog: MemoryTable<BlogPost>,
    socials: MemoryTable<Social>,
    applications: MemoryTable<Application>,
    orders: MemoryTable<Order>,
    admins: MemoryAdmins,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<Duration> {
        let start = Instant::now();
        let _ = self.admins.rows.read().await;
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
