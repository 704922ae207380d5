use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, AppResult};

/// 站点设置的默认值，首次启动时写入
pub const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    ("site_title", "Newsroom"),
    ("site_tagline", "Independent news, every day"),
    ("contact_email", "desk@newsroom.local"),
    ("articles_per_page", "10"),
    ("facebook_url", ""),
    ("twitter_url", ""),
];

const MAX_KEY_LEN: usize = 64;

#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

/// 批量更新：key 只允许小写字母、数字和下划线
#[derive(Deserialize, Debug, Clone)]
#[serde(transparent)]
pub struct SettingsUpdate(pub BTreeMap<String, String>);

impl SettingsUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if self.0.is_empty() {
            return Err(AppError::validation("no settings supplied"));
        }
        for key in self.0.keys() {
            let well_formed = !key.is_empty()
                && key.len() <= MAX_KEY_LEN
                && key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
            if !well_formed {
                return Err(AppError::validation(format!("invalid setting key: {}", key)));
            }
        }
        Ok(())
    }
}
