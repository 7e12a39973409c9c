use serde_json::json;
use showcase_backend::{
    config::Config, db::models::AdminForm, error::ApiError, logging, routes::admins,
    validation::Validate,
};
use std::env;

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin create-admin <EMAIL> <PASSWORD> [NAME]");
    std::process::exit(1);
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    logging::init_cli();

    let mut args = env::args().skip(1);
    let email = args.next().unwrap_or_else(|| usage());
    let password = args.next().unwrap_or_else(|| usage());
    let name = args.next().unwrap_or_else(|| "Admin".to_string());

    let form = match AdminForm::from_json(&json!({
        "email": email,
        "password": password,
        "name": name,
    })) {
        Ok(form) => form,
        Err(errors) => {
            for field in errors.fields() {
                eprintln!("  {}: {}", field, errors.get(field).unwrap_or_default());
            }
            fail(errors);
        }
    };

    let config = Config::from_env().unwrap_or_else(|e| fail(e));
    let store = showcase_backend::connect_database(&config)
        .await
        .unwrap_or_else(|e| fail(e));

    match admins::create_account(&store, form, config.bcrypt_cost).await {
        Ok(admin) => {
            println!("\nAdmin created");
            println!("Id    : {}", admin.id);
            println!("Email : {}", admin.email);
            println!("Name  : {}\n", admin.name);
        }
        Err(ApiError::Conflict(_)) => fail(format!("an admin with email {} already exists", email)),
        Err(e) => fail(e),
    }
}
