use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::model::person::Person;
use crate::model::{optional_text, required_text, slugify};
use crate::string_enum;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 50;

string_enum!(
    /// 文章发布状态
    NewsStatus {
        Draft => "draft",
        Published => "published",
    }
);

/// **新闻文章**
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct News {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub category_id: i64,
    pub category_name: String,
    pub author_id: i64,
    pub author_name: String,
    pub status: NewsStatus,
    pub views: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub people: Vec<Person>,
}

impl News {
    pub fn is_published(&self) -> bool {
        self.status == NewsStatus::Published
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewsInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category_id: i64,
    #[serde(default)]
    pub people_ids: Vec<i64>,
}

impl NewsInput {
    pub fn validated(self) -> AppResult<Self> {
        let title = required_text(&self.title, "title")?;
        let content = required_text(&self.content, "content")?;
        let slug = slugify(self.slug.as_deref().unwrap_or(&title));
        let slug = required_text(&slug, "slug")?;
        if self.category_id <= 0 {
            return Err(AppError::validation("categoryId is required"));
        }
        // 去重并保持稳定顺序
        let people_ids: Vec<i64> = self
            .people_ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(Self {
            title,
            slug: Some(slug),
            summary: optional_text(self.summary),
            content,
            image_url: optional_text(self.image_url),
            category_id: self.category_id,
            people_ids,
        })
    }

    pub fn slug(&self) -> String {
        self.slug.clone().unwrap_or_else(|| slugify(&self.title))
    }
}

/// 公开列表的分页 / 分类参数
#[derive(Deserialize, Debug, Clone, Default)]
pub struct NewsListQuery {
    pub category: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl NewsListQuery {
    /// 返回 (limit, offset)
    pub fn window(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let page = self.page.unwrap_or(1).max(1);
        (limit as i64, ((page - 1) * limit) as i64)
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SuggestPeopleInput {
    pub content: String,
    #[serde(default)]
    pub tagged_ids: Vec<i64>,
}
