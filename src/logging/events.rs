use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// **广告统计事件**（展示或点击）
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AdEvent {
    pub event_id: String,       // 事件唯一 ID，便于下游去重
    pub timestamp: String,      // 记录时间
    pub event: String,          // "impression" 或 "click"
    pub ad_id: i64,             // 广告 ID
    pub recorded: bool,         // 计数是否写入成功
    pub failure_reason: Option<String>,
}

impl AdEvent {
    pub fn impression(ad_id: i64) -> Self {
        Self::new("impression", ad_id)
    }

    pub fn click(ad_id: i64) -> Self {
        Self::new("click", ad_id)
    }

    fn new(event: &str, ad_id: i64) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339(),
            event: event.to_string(),
            ad_id,
            recorded: true,
            failure_reason: None,
        }
    }

    /// **标记计数失败**
    pub fn failed(mut self, reason: &str) -> Self {
        self.recorded = false;
        self.failure_reason = Some(reason.to_string());
        self
    }

    pub fn channel(&self) -> &str {
        &self.event
    }
}

/// **后台管理操作审计记录**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuditEvent {
    pub event_id: String,
    pub timestamp: String,
    pub actor_id: i64,          // 操作人
    pub action: String,         // 例如 "advertisement.update"
    pub target_id: Option<i64>, // 被操作对象
    pub detail: Option<String>,
}

impl AuditEvent {
    pub fn new(actor_id: i64, action: &str, target_id: Option<i64>) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339(),
            actor_id,
            action: action.to_string(),
            target_id,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
