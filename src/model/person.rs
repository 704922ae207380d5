use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppResult;
use crate::model::{optional_text, required_text, slugify};

pub const DEFAULT_PERSON_CATEGORY: &str = "other";

/// **人物**：既是文章的显式标签，也是提及检测的候选集合
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub category: String,         // 职业 / 类别，例如 politician、celebrity
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub mention_count: i64,       // 被多少篇文章标记过（派生字段）
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PersonInput {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl PersonInput {
    pub fn validated(self) -> AppResult<Self> {
        let name = required_text(&self.name, "name")?;
        required_text(&slugify(&name), "name")?;
        let category = optional_text(self.category)
            .map(|c| c.to_lowercase())
            .unwrap_or_else(|| DEFAULT_PERSON_CATEGORY.to_string());
        Ok(Self {
            name,
            category: Some(category),
            description: optional_text(self.description),
            image_url: optional_text(self.image_url),
        })
    }

    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_PERSON_CATEGORY)
    }
}

/// 人物目录查询参数
#[derive(Deserialize, Debug, Clone, Default)]
pub struct PeopleQuery {
    pub q: Option<String>,
    pub category: Option<String>,
}
