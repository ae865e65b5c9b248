use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write;
use std::sync::Arc;

use scommerce_backend::{
    config::{BotMode, Config},
    database::{create_pool, run_migrations},
    external::{ChatGateway, TelegramClient},
    handlers::{self, BotDispatcher, WebhookSecret},
    middlewares::{AuthMiddleware, create_cors},
    repositories::{AccountStore, SeaOrmAccountStore, SeaOrmVerificationStore, VerificationStore},
    services::*,
    swagger::swagger_config,
    tasks::spawn_telegram_poller,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    let verifications: Arc<dyn VerificationStore> =
        Arc::new(SeaOrmVerificationStore::new(pool.clone()));
    let accounts: Arc<dyn AccountStore> = Arc::new(SeaOrmAccountStore::new(pool.clone()));

    let auth_service = AuthService::new(
        verifications.clone(),
        accounts,
        jwt_service.clone(),
        DeepLinkBuilder::from_config(&config.telegram),
        &config.verification,
    );
    let catalog_service = CatalogService::new(pool.clone());
    let cart_service = CartService::new(pool.clone());
    let order_service = OrderService::new(pool.clone());

    let telegram = TelegramClient::new(config.telegram.clone());
    let gateway: Arc<dyn ChatGateway> = Arc::new(telegram.clone());
    let dispatcher = BotDispatcher::new(
        BotService::new(verifications),
        gateway,
        config.telegram.require_own_contact,
    );

    let bot_mode = if config.telegram.bot_token.is_empty() {
        log::warn!("TELEGRAM_BOT_TOKEN is empty, the chat bot is disabled");
        BotMode::Disabled
    } else {
        config.telegram.mode
    };
    if bot_mode == BotMode::Polling {
        spawn_telegram_poller(
            telegram,
            dispatcher.clone(),
            config.telegram.poll_timeout_secs,
        );
    }
    let webhook_secret = WebhookSecret(config.telegram.webhook_secret.clone());

    log::info!(
        "Starting HTTP server at {}:{} (bot mode: {:?})",
        config.server.host,
        config.server.port,
        bot_mode
    );

    HttpServer::new(move || {
        let app = App::new()
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(catalog_service.clone()))
            .app_data(web::Data::new(cart_service.clone()))
            .app_data(web::Data::new(order_service.clone()))
            .app_data(web::Data::new(dispatcher.clone()))
            .app_data(web::Data::new(webhook_secret.clone()))
            .configure(swagger_config);

        let app = if bot_mode == BotMode::Webhook {
            app.configure(handlers::webhook_config)
        } else {
            app
        };

        app.service(
            web::scope("/api")
                .configure(handlers::auth_config)
                .configure(handlers::catalog_config)
                .configure(handlers::cart_config)
                .configure(handlers::order_config),
        )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
