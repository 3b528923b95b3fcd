//! Test database setup and management
#![allow(dead_code)]

use sea_orm::{DatabaseConnection, DbErr};

/// A fresh in-memory SQLite database with the full schema.
///
/// Limited to one connection: every pooled connection to `sqlite::memory:`
/// would otherwise open its own empty database.
pub async fn setup_test_database() -> Result<DatabaseConnection, DbErr> {
    let db = polls::db::connect("sqlite::memory:", 1).await?;
    polls::db::create_schema(&db).await?;
    Ok(db)
}

/// Number of rows in the votes table.
pub async fn count_votes(db: &DatabaseConnection) -> Result<u64, DbErr> {
    use polls::orm::votes;
    use sea_orm::{EntityTrait, PaginatorTrait};

    votes::Entity::find().count(db).await
}

/// A file-backed SQLite database under `dir` with the full schema.
///
/// Unlike the in-memory database, every pooled connection sees the same data,
/// so requests can really run side by side.
pub async fn setup_file_database(
    dir: &tempfile::TempDir,
    max_connections: u32,
) -> Result<DatabaseConnection, DbErr> {
    let path = dir.path().join("polls.sqlite3");
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let db = polls::db::connect(&url, max_connections).await?;
    polls::db::create_schema(&db).await?;
    Ok(db)
}
