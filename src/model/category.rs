use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppResult;
use crate::model::{optional_text, required_text, slugify};

/// 新闻分类
#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CategoryInput {
    pub fn validated(self) -> AppResult<Self> {
        let name = required_text(&self.name, "name")?;
        let slug = slugify(self.slug.as_deref().unwrap_or(&name));
        let slug = required_text(&slug, "slug")?;
        Ok(Self {
            name,
            slug: Some(slug),
            description: optional_text(self.description),
        })
    }

    pub fn slug(&self) -> String {
        self.slug.clone().unwrap_or_else(|| slugify(&self.name))
    }
}
