//! Database connection and schema bootstrap.

use crate::orm::{choices, questions, users, votes};
use once_cell::sync::OnceCell;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use std::time::Duration;

static DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();

/// Name of the unique index backing the one-vote-per-user-per-question rule.
pub const VOTE_UNIQUE_INDEX: &str = "idx_votes_user_question";

/// Opens a connection pool.
pub async fn connect(url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(url.to_owned());
    opt.max_connections(max_connections)
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    Database::connect(opt).await
}

/// Connects, creates missing tables and stores the pool globally.
/// Panics if the database is unreachable; called once at startup.
pub async fn init_db(url: String, max_connections: u32) {
    let db = connect(&url, max_connections)
        .await
        .expect("Failed to connect to database.");

    create_schema(&db)
        .await
        .expect("Failed to create database schema.");

    if DB_POOL.set(db).is_err() {
        log::warn!("init_db called more than once; keeping the first pool");
    }
}

/// Returns the global pool. Panics when `init_db` has not run.
pub fn get_db_pool() -> &'static DatabaseConnection {
    DB_POOL
        .get()
        .expect("Database pool accessed before init_db().")
}

/// Creates every table from the entity definitions, then the unique vote index.
/// Safe to run against an existing schema.
pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    // Parents before children so foreign keys resolve.
    let tables = [
        schema.create_table_from_entity(users::Entity),
        schema.create_table_from_entity(questions::Entity),
        schema.create_table_from_entity(choices::Entity),
        schema.create_table_from_entity(votes::Entity),
    ];

    for mut table in tables {
        table.if_not_exists();
        db.execute(backend.build(&table)).await?;
    }

    let mut index = Index::create();
    index
        .name(VOTE_UNIQUE_INDEX)
        .table(votes::Entity)
        .col(votes::Column::UserId)
        .col(votes::Column::QuestionId)
        .unique()
        .if_not_exists();
    db.execute(backend.build(&index)).await?;

    log::debug!("Database schema ready ({:?})", backend);
    Ok(())
}
