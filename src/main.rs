use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paybridge::config::Config;
use paybridge::gateways::{AlipayProfile, WxpayProfile};
use paybridge::middleware::RequestId;
use paybridge::modules::health;
use paybridge::notifications::{self, LoggingNotificationHandler, NotificationController};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("paybridge={},actix_web=info", config.app.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    config.validate().context("Configuration validation failed")?;

    tracing::info!("Starting PayBridge notification receiver");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    let mut controller = NotificationController::new(Arc::new(LoggingNotificationHandler));
    if let Some(wxpay) = &config.wxpay {
        let profile = WxpayProfile::new(wxpay).context("Invalid wxpay configuration")?;
        controller = controller.with_wxpay(Arc::new(profile));
        tracing::info!("wxpay notifications enabled");
    }
    if let Some(alipay) = &config.alipay {
        let profile = AlipayProfile::new(alipay).context("Invalid alipay configuration")?;
        controller = controller.with_alipay(Arc::new(profile));
        tracing::info!("alipay notifications enabled");
    }
    let controller = web::Data::new(controller);

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestId)
            .wrap(TracingLogger::default())
            .app_data(controller.clone())
            .configure(health::configure)
            .configure(notifications::configure)
    })
    .workers(config.server.workers)
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await?;
    Ok(())
}
