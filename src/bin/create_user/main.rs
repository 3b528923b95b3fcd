//! Creates a login for the polls site.
//!
//! Usage: create_user <username> <password> [--staff]

use anyhow::{bail, Context};
use env_logger::Env;
use polls::app_config;
use polls::db::{connect, create_schema};
use polls::user::{create_user, find_by_username};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut staff = false;
    let mut positional = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--staff" => staff = true,
            _ => positional.push(arg),
        }
    }

    let (username, password) = match positional.as_slice() {
        [username, password] => (username.trim(), password.as_str()),
        _ => bail!("usage: create_user <username> <password> [--staff]"),
    };
    if username.is_empty() || username.chars().count() > 150 {
        bail!("username must be between 1 and 150 characters");
    }

    let config = app_config::get_config();
    let url = std::env::var("DATABASE_URL").unwrap_or(config.database.url);
    let db = connect(&url, 1)
        .await
        .with_context(|| format!("connecting to {}", url))?;
    create_schema(&db).await.context("creating schema")?;

    if find_by_username(&db, username).await?.is_some() {
        bail!("user {} already exists", username);
    }

    let user = create_user(&db, username, password, staff)
        .await
        .context("inserting user")?;
    log::info!(
        "Created user {} (id {}){}",
        user.username,
        user.id,
        if user.is_staff { " with staff access" } else { "" }
    );

    Ok(())
}
