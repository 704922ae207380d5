// src/logging/event_log.rs

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration as StdDuration, SystemTime};

use serde::Serialize;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::{watch, Mutex};
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Duration};
use tracing::{debug, warn};
use tracing_appender::rolling;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::MakeWriter;

use super::events::{AdEvent, AuditEvent};

/// 单条事件日志
pub struct LogEntry {
    pub channel: String,
    pub content: String,
}

/// 事件日志管理器（EventLogger）
/// 把广告展示、点击以及后台审计事件按通道分流到不同的滚动文件中，
/// 请求路径只负责投递，落盘由后台任务批量完成。
pub struct EventLogger {
    sender: Sender<LogEntry>,
    shutdown_tx: watch::Sender<bool>,
    writer: Mutex<Option<JoinHandle<()>>>,
    sweeper: JoinHandle<()>,
}

impl EventLogger {
    /// 创建一个新的 EventLogger
    ///
    /// - `log_dir`: 日志文件存放目录
    /// - `file_prefix`: 文件前缀，例如 "events"（最终文件名形如 events_click.json.YYYY-MM-DD-HH）
    /// - `buffer_size`: mpsc 通道缓冲区大小
    /// - `batch_size`: 每个通道批量写入的条数
    /// - `flush_interval`: 定时刷新的时间间隔（毫秒）
    /// - `retention_hours`: 超过该时长的日志文件会被清理
    pub fn new(
        log_dir: &str,
        file_prefix: &str,
        buffer_size: usize,
        batch_size: usize,
        flush_interval: u64,
        retention_hours: u64,
    ) -> Arc<Self> {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let writer = tokio::spawn(Self::background_log_writer(
            log_dir.to_string(),
            file_prefix.to_string(),
            receiver,
            shutdown_rx,
            batch_size.max(1),
            flush_interval.max(1),
        ));

        // 定期清理过期日志文件
        let sweeper = {
            let log_dir = log_dir.to_string();
            tokio::spawn(async move {
                let cleanup_interval = Duration::from_secs(3600);
                loop {
                    Self::cleanup_old_logs(&log_dir, retention_hours).await;
                    time::sleep(cleanup_interval).await;
                }
            })
        };

        Arc::new(Self {
            sender,
            shutdown_tx,
            writer: Mutex::new(Some(writer)),
            sweeper,
        })
    }

    /// 记录一条事件，channel 决定写入哪个文件
    pub async fn record<T: Serialize>(&self, channel: &str, event: &T) {
        let content = match serde_json::to_string(event) {
            Ok(content) => content,
            Err(e) => {
                warn!(channel, error = %e, "failed to serialize event");
                return;
            }
        };

        let entry = LogEntry {
            channel: channel.to_string(),
            content,
        };

        if let Err(e) = self.sender.send(entry).await {
            warn!(channel, error = %e, "failed to enqueue event");
        }
    }

    pub async fn ad_event(&self, event: &AdEvent) {
        self.record(event.channel(), event).await;
    }

    pub async fn audit(&self, event: &AuditEvent) {
        self.record("audit", event).await;
    }

    /// 后台写入任务
    async fn background_log_writer(
        log_dir: String,
        file_prefix: String,
        mut receiver: Receiver<LogEntry>,
        mut shutdown_rx: watch::Receiver<bool>,
        batch_size: usize,
        flush_interval: u64,
    ) {
        let mut appenders: HashMap<String, Arc<RollingFileAppender>> = HashMap::new();
        // 每个通道独立的缓冲区
        let mut buffers: HashMap<String, Vec<String>> = HashMap::new();
        let mut interval = time::interval(Duration::from_millis(flush_interval));

        loop {
            tokio::select! {
                received = receiver.recv() => {
                    let Some(entry) = received else { break };
                    let buffer = buffers.entry(entry.channel.clone()).or_default();
                    buffer.push(entry.content);
                    if buffer.len() >= batch_size {
                        let lines = std::mem::take(buffer);
                        let appender = Self::appender_for(&mut appenders, &log_dir, &file_prefix, &entry.channel);
                        Self::write_logs_to_disk(appender, lines).await;
                    }
                },
                _ = interval.tick() => {
                    Self::flush_all(&mut appenders, &mut buffers, &log_dir, &file_prefix).await;
                },
                _ = shutdown_rx.changed() => {
                    while let Ok(entry) = receiver.try_recv() {
                        buffers.entry(entry.channel).or_default().push(entry.content);
                    }
                    break;
                }
            }
        }

        Self::flush_all(&mut appenders, &mut buffers, &log_dir, &file_prefix).await;
    }

    fn appender_for(
        appenders: &mut HashMap<String, Arc<RollingFileAppender>>,
        log_dir: &str,
        file_prefix: &str,
        channel: &str,
    ) -> Arc<RollingFileAppender> {
        appenders
            .entry(channel.to_string())
            .or_insert_with(|| {
                let file_name = format!("{}_{}.json", file_prefix, channel);
                Arc::new(rolling::hourly(log_dir, file_name))
            })
            .clone()
    }

    async fn flush_all(
        appenders: &mut HashMap<String, Arc<RollingFileAppender>>,
        buffers: &mut HashMap<String, Vec<String>>,
        log_dir: &str,
        file_prefix: &str,
    ) {
        for (channel, buffer) in buffers.iter_mut() {
            if buffer.is_empty() {
                continue;
            }
            let lines = std::mem::take(buffer);
            let appender = Self::appender_for(appenders, log_dir, file_prefix, channel);
            Self::write_logs_to_disk(appender, lines).await;
        }
    }

    async fn write_logs_to_disk(file: Arc<RollingFileAppender>, lines: Vec<String>) {
        let content = lines.join("\n") + "\n";
        let result = task::spawn_blocking(move || {
            let mut writer = file.make_writer();
            writer.write_all(content.as_bytes())
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "failed to write event logs"),
            Err(e) => warn!(error = %e, "event log writer task panicked"),
        }
    }

    async fn cleanup_old_logs(log_dir: &str, retention_hours: u64) {
        let retention_duration = StdDuration::from_secs(retention_hours * 3600);
        let now = SystemTime::now();
        let mut dir = match tokio::fs::read_dir(log_dir).await {
            Ok(dir) => dir,
            Err(e) => {
                debug!(log_dir, error = %e, "log directory not readable yet");
                return;
            }
        };

        while let Ok(Some(entry)) = dir.next_entry().await {
            let path = entry.path();
            let Ok(metadata) = entry.metadata().await else { continue };
            let Ok(modified) = metadata.modified() else { continue };
            if metadata.is_file() && now.duration_since(modified).unwrap_or_default() > retention_duration {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => debug!(path = ?path, "deleted old log file"),
                    Err(e) => warn!(path = ?path, error = %e, "failed to delete old log file"),
                }
            }
        }
    }

    /// 停止日志系统，排空队列并刷盘
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        self.sweeper.abort();
        if let Some(writer) = self.writer.lock().await.take() {
            if let Err(e) = writer.await {
                warn!(error = %e, "event log writer did not finish cleanly");
            }
        }
    }
}
