use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppResult;
use crate::model::{required_text, slugify};

/// 静态页面（关于我们、联系方式等）
#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PageInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_published: bool,
}

impl PageInput {
    pub fn validated(self) -> AppResult<Self> {
        let title = required_text(&self.title, "title")?;
        let slug = slugify(self.slug.as_deref().unwrap_or(&title));
        let slug = required_text(&slug, "slug")?;
        Ok(Self {
            title,
            slug: Some(slug),
            ..self
        })
    }

    pub fn slug(&self) -> String {
        self.slug.clone().unwrap_or_else(|| slugify(&self.title))
    }
}
