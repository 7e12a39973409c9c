//! Database Models - records as stored, and the validated inputs that create them.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Repository, Resource, Store};

// ============================================================================
// Work
// ============================================================================

/// Public catalogue item.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: String,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub site_url: Option<String>,
    pub client_name: String,
    pub client_review: String,
    pub category: String,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkInput {
    pub title: String,
    pub description: String,
    pub price: String,
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    pub site_url: Option<String>,
    pub client_name: String,
    pub client_review: String,
    pub category: String,
    #[serde(default)]
    pub featured: bool,
}

impl Resource for Work {
    type Input = WorkInput;
    type Patch = WorkInput;

    const LABEL: &'static str = "Work";

    fn id(&self) -> Uuid {
        self.id
    }

    fn build(id: Uuid, now: DateTime<Utc>, input: WorkInput) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            price: input.price,
            images: input.images,
            videos: input.videos,
            site_url: input.site_url,
            client_name: input.client_name,
            client_review: input.client_review,
            category: input.category,
            featured: input.featured,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: WorkInput, now: DateTime<Utc>) {
        *self = Self {
            created_at: self.created_at,
            ..Self::build(self.id, now, patch)
        };
    }

    fn list_order(a: &Self, b: &Self) -> Ordering {
        b.created_at.cmp(&a.created_at)
    }

    fn repository(store: &dyn Store) -> &dyn Repository<Self> {
        store.works()
    }
}

// ============================================================================
// Portfolio
// ============================================================================

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub site_url: Option<String>,
    pub client_name: String,
    pub client_review: String,
    pub category: String,
    pub featured: bool,
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItemInput {
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    pub site_url: Option<String>,
    pub client_name: String,
    pub client_review: String,
    pub category: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub order: i32,
}

impl Resource for PortfolioItem {
    type Input = PortfolioItemInput;
    type Patch = PortfolioItemInput;

    const LABEL: &'static str = "Portfolio item";

    fn id(&self) -> Uuid {
        self.id
    }

    fn build(id: Uuid, now: DateTime<Utc>, input: PortfolioItemInput) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            images: input.images,
            videos: input.videos,
            site_url: input.site_url,
            client_name: input.client_name,
            client_review: input.client_review,
            category: input.category,
            featured: input.featured,
            order: input.order,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: PortfolioItemInput, now: DateTime<Utc>) {
        *self = Self {
            created_at: self.created_at,
            ..Self::build(self.id, now, patch)
        };
    }

    fn list_order(a: &Self, b: &Self) -> Ordering {
        a.order
            .cmp(&b.order)
            .then_with(|| b.created_at.cmp(&a.created_at))
    }

    fn repository(store: &dyn Store) -> &dyn Repository<Self> {
        store.portfolio()
    }
}

// ============================================================================
// Blog
// ============================================================================

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub image: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostInput {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub image: Option<String>,
    #[serde(default)]
    pub published: bool,
}

impl Resource for BlogPost {
    type Input = BlogPostInput;
    type Patch = BlogPostInput;

    const LABEL: &'static str = "Blog post";

    fn id(&self) -> Uuid {
        self.id
    }

    fn build(id: Uuid, now: DateTime<Utc>, input: BlogPostInput) -> Self {
        Self {
            id,
            title: input.title,
            content: input.content,
            excerpt: input.excerpt,
            image: input.image,
            published: input.published,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: BlogPostInput, now: DateTime<Utc>) {
        *self = Self {
            created_at: self.created_at,
            ..Self::build(self.id, now, patch)
        };
    }

    fn list_order(a: &Self, b: &Self) -> Ordering {
        b.created_at.cmp(&a.created_at)
    }

    fn repository(store: &dyn Store) -> &dyn Repository<Self> {
        store.blog()
    }
}

// ============================================================================
// Socials
// ============================================================================

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Social {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub icon: String,
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialInput {
    pub name: String,
    pub url: String,
    pub icon: String,
    #[serde(default)]
    pub order: i32,
}

impl Resource for Social {
    type Input = SocialInput;
    type Patch = SocialInput;

    const LABEL: &'static str = "Social";

    fn id(&self) -> Uuid {
        self.id
    }

    fn build(id: Uuid, now: DateTime<Utc>, input: SocialInput) -> Self {
        Self {
            id,
            name: input.name,
            url: input.url,
            icon: input.icon,
            order: input.order,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: SocialInput, now: DateTime<Utc>) {
        *self = Self {
            created_at: self.created_at,
            ..Self::build(self.id, now, patch)
        };
    }

    fn list_order(a: &Self, b: &Self) -> Ordering {
        a.order
            .cmp(&b.order)
            .then_with(|| a.created_at.cmp(&b.created_at))
    }

    fn repository(store: &dyn Store) -> &dyn Repository<Self> {
        store.socials()
    }
}

/// Icon a social link is rendered with. Unknown keys fall back to the
/// first letter of the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SocialIcon {
    Telegram,
    Vk,
    Youtube,
    Letter { letter: String },
}

impl SocialIcon {
    pub fn resolve(key: &str) -> Self {
        let trimmed = key.trim();
        match trimmed.to_lowercase().as_str() {
            "telegram" => Self::Telegram,
            "vk" => Self::Vk,
            "youtube" => Self::Youtube,
            _ => {
                let source = if trimmed.is_empty() { key } else { trimmed };
                Self::Letter {
                    letter: source
                        .chars()
                        .next()
                        .map(|c| c.to_uppercase().collect())
                        .unwrap_or_default(),
                }
            }
        }
    }
}

// ============================================================================
// Leads
// ============================================================================

pub const APPLICATION_STATUSES: &[&str] = &["new", "processing", "completed"];

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    New,
    Processing,
    Completed,
}

/// Detailed lead collected by the application wizard.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub telegram: Option<String>,
    pub project_type: String,
    pub project_problem: String,
    pub target_audience: String,
    pub budget: String,
    pub deadline: String,
    pub description: String,
    pub additional_info: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInput {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub telegram: Option<String>,
    pub project_type: String,
    pub project_problem: String,
    pub target_audience: String,
    pub budget: String,
    pub deadline: String,
    pub description: String,
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPatch {
    pub status: ApplicationStatus,
}

impl Resource for Application {
    type Input = ApplicationInput;
    type Patch = StatusPatch;

    const LABEL: &'static str = "Application";

    fn id(&self) -> Uuid {
        self.id
    }

    fn build(id: Uuid, now: DateTime<Utc>, input: ApplicationInput) -> Self {
        Self {
            id,
            full_name: input.full_name,
            email: input.email,
            phone: input.phone,
            telegram: input.telegram,
            project_type: input.project_type,
            project_problem: input.project_problem,
            target_audience: input.target_audience,
            budget: input.budget,
            deadline: input.deadline,
            description: input.description,
            additional_info: input.additional_info,
            status: ApplicationStatus::New,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: StatusPatch, now: DateTime<Utc>) {
        self.status = patch.status;
        self.updated_at = now;
    }

    fn list_order(a: &Self, b: &Self) -> Ordering {
        b.created_at.cmp(&a.created_at)
    }

    fn repository(store: &dyn Store) -> &dyn Repository<Self> {
        store.applications()
    }
}

/// Lightweight lead from the simple order form.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub telegram: Option<String>,
    pub message: String,
    pub work_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub telegram: Option<String>,
    pub message: String,
    pub work_id: Option<Uuid>,
}

impl Resource for Order {
    type Input = OrderInput;
    type Patch = OrderInput;

    const LABEL: &'static str = "Order";

    fn id(&self) -> Uuid {
        self.id
    }

    fn build(id: Uuid, now: DateTime<Utc>, input: OrderInput) -> Self {
        Self {
            id,
            name: input.name,
            email: input.email,
            phone: input.phone,
            telegram: input.telegram,
            message: input.message,
            work_id: input.work_id,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: OrderInput, now: DateTime<Utc>) {
        *self = Self {
            created_at: self.created_at,
            ..Self::build(self.id, now, patch)
        };
    }

    fn list_order(a: &Self, b: &Self) -> Ordering {
        b.created_at.cmp(&a.created_at)
    }

    fn repository(store: &dyn Store) -> &dyn Repository<Self> {
        store.orders()
    }
}

// ============================================================================
// Admins
// ============================================================================

/// Dashboard account as exposed over the API.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin row including the bcrypt hash. Never serialized.
#[derive(Clone, FromRow)]
pub struct AdminCredentials {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminCredentials {
    pub fn to_admin(&self) -> Admin {
        Admin {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Deserialize)]
pub struct AdminForm {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl fmt::Debug for AdminForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminForm")
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Admin ready for insertion, password already hashed.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}
