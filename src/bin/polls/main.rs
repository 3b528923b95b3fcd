use actix_files::Files;
use actix_session::{config::PersistentSession, storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{time::Duration as CookieDuration, Key, SameSite};
use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::middleware::{DefaultHeaders, ErrorHandlers, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use env_logger::Env;
use polls::app_config;
use polls::db::{get_db_pool, init_db};
use polls::middleware::ClientCtx;
use rand::{distributions::Alphanumeric, Rng};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_lib_mods();
    app_config::init();

    let config = app_config::get_config();
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| config.database.url.clone());
    init_db(database_url, config.database.max_connections).await;

    let secret_key = match std::env::var("SECRET_KEY") {
        Ok(key) if key.len() >= 64 => Key::from(key.as_bytes()),
        other => {
            let random_string: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(128)
                .map(char::from)
                .collect();
            log::warn!("SECRET_KEY was invalid. Reason: {:?}\r\nThis means the key used for signing session cookies will invalidate every time the application is restarted. A secret key must be at least 64 bytes to be accepted.\r\n\r\nNeed a key? How about:\r\n{}", other.map(|k| format!("only {} bytes", k.len())), random_string);
            Key::from(random_string.as_bytes())
        }
    };

    let audit = polls::audit::default_sink();
    let security = app_config::security();
    let workers = config.server.workers;

    let server = HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(Data::new(get_db_pool().clone()))
            .app_data(Data::new(audit.clone()))
            // Security headers - applied to all responses
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::BAD_REQUEST, polls::web::error::render_400)
                    .handler(StatusCode::FORBIDDEN, polls::web::error::render_403)
                    .handler(StatusCode::NOT_FOUND, polls::web::error::render_404)
                    .handler(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        polls::web::error::render_500,
                    ),
            )
            .wrap(ClientCtx::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_name("polls_session".to_owned())
                    .cookie_same_site(SameSite::Lax)
                    .cookie_secure(security.cookie_secure)
                    .session_lifecycle(PersistentSession::default().session_ttl(
                        CookieDuration::minutes(security.session_timeout_minutes),
                    ))
                    .build(),
            )
            .wrap(Logger::new("%a \"%r\" %s %Dms"))
            .configure(polls::web::configure)
            .service(Files::new("/static", "./static"))
    });

    let server = if workers > 0 {
        server.workers(workers)
    } else {
        server
    };

    server.bind(config.bind_address())?.run().await
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    // A missing .env file is normal outside development.
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env file loaded: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
