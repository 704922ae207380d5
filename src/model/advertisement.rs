// src/model/advertisement.rs

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::model::{optional_text, required_text};
use crate::string_enum;

/// 页面通配符，出现在 pages 中表示所有页面
pub const PAGE_ALL: &str = "all";
/// 未指定页面时的默认页面
pub const PAGE_HOME: &str = "home";

pub const DEFAULT_ROTATION_INTERVAL: i64 = 10;
pub const MIN_ROTATION_INTERVAL: i64 = 3;
pub const MAX_ROTATION_INTERVAL: i64 = 60;

string_enum!(
    /// 广告素材类型
    AdType {
        Image => "image",
        Text => "text",
        Video => "video",
        Html => "html",
    }
);

string_enum!(
    /// 页面上的十二个广告位
    AdPosition {
        HeaderTop => "header-top",
        HeaderBottom => "header-bottom",
        SidebarLeft => "sidebar-left",
        SidebarRight => "sidebar-right",
        ContentTop => "content-top",
        ContentMiddle => "content-middle",
        ContentBottom => "content-bottom",
        BetweenArticles => "between-articles",
        FooterTop => "footer-top",
        FooterBottom => "footer-bottom",
        OverlayCenter => "overlay-center",
        FloatingCorner => "floating-corner",
    }
);

impl AdPosition {
    /// 浮层广告位脱离正常布局，固定定位渲染
    pub fn is_overlay(&self) -> bool {
        matches!(self, AdPosition::OverlayCenter | AdPosition::FloatingCorner)
    }
}

string_enum!(
    /// 投放设备
    DeviceTarget {
        All => "all",
        Desktop => "desktop",
        Mobile => "mobile",
    }
);

impl Default for DeviceTarget {
    fn default() -> Self {
        DeviceTarget::All
    }
}

string_enum!(
    /// 合格广告集合的展示方式
    DisplayMode {
        Rotation => "rotation",
        Random => "random",
        Priority => "priority",
        All => "all",
    }
);

impl Default for DisplayMode {
    fn default() -> Self {
        DisplayMode::Rotation
    }
}

/// **广告**
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub ad_type: AdType,
    pub content: Option<String>,       // 文本或 HTML 素材
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub link_url: Option<String>,      // 点击跳转地址
    pub position: AdPosition,
    pub size: String,                  // 例如 "728x90"、"custom"
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub pages: Vec<String>,            // 投放页面，"all" 为通配
    pub exclude_pages: Vec<String>,
    pub device_target: DeviceTarget,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub priority: i64,                 // 越大越优先
    pub sort_order: i64,               // 同一广告位内的手动排序，升序
    pub is_active: bool,
    pub impressions: i64,
    pub clicks: i64,
    pub display_mode: DisplayMode,
    pub rotation_interval: i64,        // 轮播间隔（秒）
    pub article_position: Option<i64>, // between-articles：每 N 篇文章后插入
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_size() -> String {
    "custom".to_string()
}

fn default_pages() -> Vec<String> {
    vec![PAGE_ALL.to_string()]
}

fn default_true() -> bool {
    true
}

fn default_rotation_interval() -> i64 {
    DEFAULT_ROTATION_INTERVAL
}

/// **创建 / 更新广告的请求体**
///
/// 字段类型严格：pages 必须是字符串数组，枚举字段必须是合法取值，
/// 不认识的字段直接拒绝。
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdvertisementInput {
    pub title: String,
    #[serde(rename = "type")]
    pub ad_type: AdType,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub link_url: Option<String>,
    pub position: AdPosition,
    #[serde(default = "default_size")]
    pub size: String,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default = "default_pages")]
    pub pages: Vec<String>,
    #[serde(default)]
    pub exclude_pages: Vec<String>,
    #[serde(default)]
    pub device_target: DeviceTarget,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub display_mode: DisplayMode,
    #[serde(default = "default_rotation_interval")]
    pub rotation_interval: i64,
    #[serde(default)]
    pub article_position: Option<i64>,
}

fn normalize_pages(pages: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    pages
        .into_iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

impl AdvertisementInput {
    /// 校验并规整请求体，返回可以直接落库的版本
    pub fn validated(self) -> AppResult<Self> {
        let title = required_text(&self.title, "title")?;
        let size = required_text(&self.size, "size")?;
        let content = optional_text(self.content);
        let image_url = optional_text(self.image_url);
        let video_url = optional_text(self.video_url);
        let link_url = optional_text(self.link_url);

        match self.ad_type {
            AdType::Image if image_url.is_none() => {
                return Err(AppError::validation("imageUrl is required for image advertisements"));
            }
            AdType::Video if video_url.is_none() => {
                return Err(AppError::validation("videoUrl is required for video advertisements"));
            }
            AdType::Text | AdType::Html if content.is_none() => {
                return Err(AppError::validation("content is required for text and html advertisements"));
            }
            _ => {}
        }

        for (name, value) in [("width", self.width), ("height", self.height)] {
            if matches!(value, Some(v) if v <= 0) {
                return Err(AppError::validation(format!("{} must be positive", name)));
            }
        }

        let pages = normalize_pages(self.pages);
        if pages.is_empty() {
            return Err(AppError::validation("pages must contain at least one page or \"all\""));
        }
        let exclude_pages = normalize_pages(self.exclude_pages);

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(AppError::validation("startDate must not be after endDate"));
            }
        }

        if !(MIN_ROTATION_INTERVAL..=MAX_ROTATION_INTERVAL).contains(&self.rotation_interval) {
            return Err(AppError::validation(format!(
                "rotationInterval must be between {} and {} seconds",
                MIN_ROTATION_INTERVAL, MAX_ROTATION_INTERVAL
            )));
        }

        if matches!(self.article_position, Some(n) if n < 1) {
            return Err(AppError::validation("articlePosition must be at least 1"));
        }

        Ok(Self {
            title,
            size,
            content,
            image_url,
            video_url,
            link_url,
            pages,
            exclude_pages,
            ..self
        })
    }
}

/// 拖拽排序的单项
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReorderItem {
    pub id: i64,
    pub sort_order: i64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ReorderRequest {
    pub items: Vec<ReorderItem>,
}

impl ReorderRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.items.is_empty() {
            return Err(AppError::validation("items must not be empty"));
        }
        let mut ids = HashSet::new();
        if let Some(dup) = self.items.iter().find(|item| !ids.insert(item.id)) {
            return Err(AppError::validation(format!("advertisement {} listed twice", dup.id)));
        }
        Ok(())
    }
}

/// 广告效果统计
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdStats {
    pub id: i64,
    pub title: String,
    pub position: AdPosition,
    pub is_active: bool,
    pub impressions: i64,
    pub clicks: i64,
    pub ctr: f64, // 点击率（百分比）
}

impl From<&Advertisement> for AdStats {
    fn from(ad: &Advertisement) -> Self {
        let ctr = if ad.impressions > 0 {
            (ad.clicks as f64 / ad.impressions as f64) * 100.0
        } else {
            0.0
        };
        Self {
            id: ad.id,
            title: ad.title.clone(),
            position: ad.position,
            is_active: ad.is_active,
            impressions: ad.impressions,
            clicks: ad.clicks,
            ctr,
        }
    }
}
