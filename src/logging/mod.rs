pub mod event_log;
pub mod events;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// 初始化全局 tracing：JSON 写入按小时滚动的文件，同时输出到终端。
/// 返回的 guard 必须在 main 中持有到进程结束，否则尾部日志会丢失。
pub fn init_tracing(log_dir: &str) -> Result<WorkerGuard, tracing::subscriber::SetGlobalDefaultError> {
    let log_file = rolling::hourly(log_dir, "newsroom.json");
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().json().with_writer(non_blocking))
        .with(fmt::layer().compact());
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}
