// src/config/mod.rs

use clap::Parser;
use tracing::warn;

const DEV_TOKEN_SECRET: &str = "newsroom-dev-secret-change-me";

/// 命令行参数，每一项都可以通过环境变量（含 .env 文件）覆盖
#[derive(Parser, Debug, Clone)]
#[command(author = "whiteCcinn", version = "1.0", about = "A news publishing CMS server")]
pub struct CliArgs {
    #[arg(short, long, env = "NEWSROOM_PORT", default_value_t = 8080)]
    pub port: u16,
    #[arg(long, env = "NEWSROOM_LOG_DIR", default_value = "logs")]
    pub log_dir: String,
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://newsroom.db")]
    pub database_url: String,
    #[arg(long, env = "NEWSROOM_UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: String,
    #[arg(long, env = "NEWSROOM_TOKEN_SECRET")]
    pub token_secret: Option<String>,
    #[arg(long, env = "NEWSROOM_TOKEN_TTL_HOURS", default_value_t = 24)]
    pub token_ttl_hours: i64,
    #[arg(long, env = "NEWSROOM_ADMIN_USERNAME")]
    pub admin_username: Option<String>,
    #[arg(long, env = "NEWSROOM_ADMIN_PASSWORD")]
    pub admin_password: Option<String>,
    #[arg(long, env = "NEWSROOM_LOG_RETENTION_HOURS", default_value_t = 72)]
    pub log_retention_hours: u64,
}

/// 管理员初始账号
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
}

/// **服务运行配置**
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub log_dir: String,
    pub database_url: String,
    pub upload_dir: String,
    pub token_secret: String,
    pub token_ttl_hours: i64,
    pub admin: Option<AdminBootstrap>,
    pub log_retention_hours: u64,
}

impl AppConfig {
    /// 先加载 .env，再解析命令行
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_args(CliArgs::parse())
    }

    pub fn from_args(args: CliArgs) -> Self {
        let token_secret = match args.token_secret {
            Some(secret) if !secret.trim().is_empty() => secret,
            _ => {
                warn!("NEWSROOM_TOKEN_SECRET not set, using development secret");
                DEV_TOKEN_SECRET.to_string()
            }
        };

        let admin = match (args.admin_username, args.admin_password) {
            (Some(username), Some(password)) => Some(AdminBootstrap { username, password }),
            (Some(_), None) | (None, Some(_)) => {
                warn!("admin bootstrap needs both username and password, skipping");
                None
            }
            (None, None) => None,
        };

        Self {
            port: args.port,
            log_dir: args.log_dir,
            database_url: args.database_url,
            upload_dir: args.upload_dir,
            token_secret,
            token_ttl_hours: args.token_ttl_hours.max(1),
            admin,
            log_retention_hours: args.log_retention_hours,
        }
    }

    /// 测试与嵌入场景使用的内存库配置
    pub fn in_memory(log_dir: &str) -> Self {
        Self {
            port: 0,
            log_dir: log_dir.to_string(),
            database_url: "sqlite::memory:".to_string(),
            upload_dir: "uploads".to_string(),
            token_secret: "test-secret".to_string(),
            token_ttl_hours: 24,
            admin: None,
            log_retention_hours: 72,
        }
    }
}
