// src/main.rs

use std::error::Error;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use newsroom_cms::config::AppConfig;
use newsroom_cms::logging::event_log::EventLogger;
use newsroom_cms::{bootstrap_admin, build_router, db, logging, AppState};

/// 等待 Ctrl+C 或 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => error!(error = %e, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutting down gracefully...");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = AppConfig::load();

    // guard 必须活到进程结束，否则文件日志会丢
    let _guard = logging::init_tracing(&config.log_dir)?;
    info!(port = config.port, database = %config.database_url, "newsroom server starting");

    let pool = db::create_pool(&config.database_url).await?;
    db::migrate(&pool).await?;

    if let Some(admin) = &config.admin {
        bootstrap_admin(&pool, admin).await?;
    }

    // 广告展示 / 点击 / 审计事件日志
    let event_log = EventLogger::new(&config.log_dir, "events", 1000, 100, 1000, config.log_retention_hours);

    let addr = format!("0.0.0.0:{}", config.port);
    let state = AppState::new(pool.clone(), config, event_log.clone());
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("newsroom server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    event_log.shutdown().await;
    pool.close().await;
    info!("newsroom server shut down.");
    Ok(())
}
