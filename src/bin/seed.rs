use serde_json::{json, Value};
use showcase_backend::{
    config::Config,
    db::{
        models::{AdminForm, BlogPost, PortfolioItem, Social, Work},
        Resource, Store, StoreError,
    },
    error::ApiError,
    logging,
    routes::admins,
    validation::{Validate, ValidationErrors},
};
use thiserror::Error;

const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Error)]
enum SeedError {
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("invalid {label} seed record: {errors:?}")]
    Invalid {
        label: &'static str,
        errors: ValidationErrors,
    },
}

/// Insert `records` unless the table already has rows. Returns how many were
/// inserted.
async fn seed_if_empty<R: Resource>(
    store: &dyn Store,
    records: Vec<Value>,
) -> Result<usize, SeedError> {
    let repository = R::repository(store);
    if !repository.list().await?.is_empty() {
        println!("  {}: already present, skipped", R::LABEL);
        return Ok(0);
    }

    let count = records.len();
    for raw in records {
        let input = R::Input::from_json(&raw).map_err(|errors| SeedError::Invalid {
            label: R::LABEL,
            errors,
        })?;
        repository.create(input).await?;
    }
    println!("  {}: {} created", R::LABEL, count);
    Ok(count)
}

async fn seed_admin(store: &dyn Store, config: &Config) -> Result<(), SeedError> {
    let (email, password, name) = match &config.bootstrap_admin {
        Some(admin) => (admin.email.clone(), admin.password.clone(), admin.name.clone()),
        None => (
            DEFAULT_ADMIN_EMAIL.to_string(),
            DEFAULT_ADMIN_PASSWORD.to_string(),
            "Administrator".to_string(),
        ),
    };

    if store.admins().find_by_email(&email).await?.is_some() {
        println!("  Admin: {} already present, skipped", email);
        return Ok(());
    }

    let form = AdminForm::from_json(&json!({
        "email": email,
        "password": password,
        "name": name,
    }))
    .map_err(|errors| SeedError::Invalid {
        label: "Admin",
        errors,
    })?;
    let admin = admins::create_account(store, form, config.bcrypt_cost).await?;
    println!("  Admin: {} created", admin.email);
    if config.bootstrap_admin.is_none() {
        println!("    password: {} (change it before going live)", DEFAULT_ADMIN_PASSWORD);
    }
    Ok(())
}

fn socials() -> Vec<Value> {
    vec![
        json!({ "name": "Telegram", "url": "https://t.me/studio", "icon": "telegram", "order": 1 }),
        json!({ "name": "VK", "url": "https://vk.com/studio", "icon": "vk", "order": 2 }),
        json!({ "name": "YouTube", "url": "https://youtube.com/@studio", "icon": "youtube", "order": 3 }),
    ]
}

fn works() -> Vec<Value> {
    vec![json!({
        "title": "Online store for an electronics retailer",
        "description": "Catalogue with filters, cart, online payment and an order dashboard.",
        "price": "from 150 000",
        "images": ["https://images.unsplash.com/photo-1556742049-0cfed4f6a45d"],
        "siteUrl": "https://example.com",
        "clientName": "Electro LLC",
        "clientReview": "The store went live on schedule and sales doubled in two months.",
        "category": "E-commerce",
        "featured": true,
    })]
}

fn portfolio() -> Vec<Value> {
    vec![json!({
        "title": "Landing page for a bakery",
        "description": "One-page site with a menu, delivery zones and an order form.",
        "images": ["https://images.unsplash.com/photo-1509440159596-0249088772ff"],
        "clientName": "Sweet Corner",
        "clientReview": "Orders from the site now cover a third of our revenue.",
        "category": "Landing page",
        "featured": true,
        "order": 1,
    })]
}

fn blog() -> Vec<Value> {
    vec![json!({
        "title": "How to prepare a brief for your website",
        "excerpt": "Five questions to answer before the first call.",
        "content": "A good brief saves weeks. Describe the problem the site solves, who it is for, \
                    which pages you need, your budget range and the date you want to launch.",
        "published": true,
    })]
}

async fn seed(store: &dyn Store, config: &Config) -> Result<(), SeedError> {
    seed_admin(store, config).await?;
    seed_if_empty::<Social>(store, socials()).await?;
    seed_if_empty::<Work>(store, works()).await?;
    seed_if_empty::<PortfolioItem>(store, portfolio()).await?;
    seed_if_empty::<BlogPost>(store, blog()).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    logging::init_cli();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let store = match showcase_backend::connect_database(&config).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("\nSeeding database");
    if let Err(e) = seed(&store, &config).await {
        eprintln!("Seeding failed: {}", e);
        std::process::exit(1);
    }
    println!("Done\n");
}
