use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bizledger::config::{AppConfig, Config};
use bizledger::core::numbering::MySqlNumberSequence;
use bizledger::middleware::RequestId;
use bizledger::modules::health;
use bizledger::modules::invoices::MySqlInvoiceRepository;
use bizledger::modules::notifications::LogNotifier;
use bizledger::modules::quotes::MySqlQuoteRepository;
use bizledger::BillingServices;

fn init_tracing(app: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("bizledger={},actix_web=info", app.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);

    if app.log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.app);
    config.validate().context("Configuration validation failed")?;

    tracing::info!(
        env = %config.app.env,
        bind = %config.server.bind_address(),
        utc_offset_minutes = config.billing.utc_offset_minutes,
        "Starting BizLedger billing service"
    );

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    tracing::info!(
        max_connections = config.database.max_connections,
        "Database pool initialized"
    );

    let services = BillingServices::new(
        Arc::new(MySqlQuoteRepository::new(db_pool.clone())),
        Arc::new(MySqlInvoiceRepository::new(db_pool.clone())),
        Arc::new(MySqlNumberSequence::new(db_pool.clone())),
        Arc::new(LogNotifier),
        &config.billing,
    );

    let cors_origin = config.server.cors_allowed_origin.clone();
    let bind_address = config.server.bind_address();

    let server = HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                .allow_any_header()
                .expose_headers(vec!["x-request-id"])
                .max_age(3600),
            None => Cors::default(),
        };

        let services = services.clone();

        App::new()
            .wrap(cors)
            .wrap(RequestId)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(db_pool.clone()))
            .configure(health::configure)
            .configure(move |cfg| bizledger::configure(cfg, &services))
    })
    .workers(config.server.workers)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await.context("Server terminated with an error")
}
