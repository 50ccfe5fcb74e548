use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

use hr_office::config::Config;
use hr_office::db::{init_db, run_migrations};
use hr_office::repository::MySqlStore;
use hr_office::{routes, scheduler};

use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;

#[get("/")]
async fn index() -> impl Responder {
    "HR office API"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!(addr = %config.server_addr, "Server starting...");

    let pool = init_db(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool).await.context("Failed to run migrations")?;

    let store = MySqlStore::new(pool);
    scheduler::spawn(store.clone(), config.scheduler.clone());

    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .app_data(Data::new(store.clone()))
            .app_data(Data::new(config.clone()))
            .configure(routes::extractors)
            .service(index)
            .configure(|cfg| routes::configure::<MySqlStore>(cfg, &config))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
