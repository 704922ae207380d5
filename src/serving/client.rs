// src/serving/client.rs

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use reqwest::Client;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::engine::{self, AdRequest, FeedItem, Placement};
use super::rotation::{RotationCursor, RotationTimer};
use super::tracking::ImpressionTracker;
use crate::model::advertisement::{Advertisement, DisplayMode};

const DEFAULT_TIMEOUT_MS: u64 = 2_000;

/// **广告接口客户端**
///
/// 拉取失败时返回空集合，展示/点击上报失败只记日志，不向调用方抛错。
#[derive(Debug, Clone)]
pub struct AdClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl AdClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 拉取合格广告列表（已按优先级排序）
    pub async fn fetch_active(&self, request: &AdRequest) -> Vec<Advertisement> {
        let url = format!("{}/api/advertisements/active", self.base_url);
        let query = [
            ("position", request.position.as_str()),
            ("page", request.page.as_str()),
            ("device", request.device.as_str()),
        ];
        let response = timeout(self.timeout, self.client.get(&url).query(&query).send()).await;

        let response = match response {
            Ok(Ok(resp)) if resp.status().is_success() => resp,
            Ok(Ok(resp)) => {
                warn!(status = %resp.status(), position = %request.position, "ad fetch rejected");
                return Vec::new();
            }
            Ok(Err(e)) => {
                warn!(error = %e, position = %request.position, "ad fetch failed");
                return Vec::new();
            }
            Err(_) => {
                warn!(position = %request.position, "ad fetch timed out");
                return Vec::new();
            }
        };

        match response.json::<Vec<Advertisement>>().await {
            Ok(ads) => ads,
            Err(e) => {
                warn!(error = %e, position = %request.position, "ad fetch returned malformed body");
                Vec::new()
            }
        }
    }

    async fn post_counter(&self, ad_id: i64, action: &str) -> bool {
        let url = format!("{}/api/advertisements/{}/{}", self.base_url, ad_id, action);
        match timeout(self.timeout, self.client.post(&url).send()).await {
            Ok(Ok(resp)) if resp.status().is_success() => true,
            Ok(Ok(resp)) => {
                warn!(ad_id, action, status = %resp.status(), "ad tracking rejected");
                false
            }
            Ok(Err(e)) => {
                warn!(ad_id, action, error = %e, "ad tracking failed");
                false
            }
            Err(_) => {
                warn!(ad_id, action, "ad tracking timed out");
                false
            }
        }
    }

    pub async fn record_impression(&self, ad_id: i64) -> bool {
        self.post_counter(ad_id, "impression").await
    }

    pub async fn record_click(&self, ad_id: i64) -> bool {
        self.post_counter(ad_id, "click").await
    }
}

/// **一个已挂载的广告位**
///
/// 持有缩减后的广告、轮播游标和本次挂载的展示去重集合。
#[derive(Debug)]
pub struct AdSlot {
    client: Arc<AdClient>,
    request: AdRequest,
    placement: Placement,
    cursor: RotationCursor,
    tracker: ImpressionTracker,
}

impl AdSlot {
    /// 拉取、缩减，然后为首屏可见的广告上报展示
    pub async fn mount(client: Arc<AdClient>, request: AdRequest) -> Self {
        let eligible = client.fetch_active(&request).await;
        let placement = engine::reduce(eligible, request.position, &mut rand::thread_rng());
        debug!(
            position = %request.position,
            mode = %placement.display_mode,
            ads = placement.ads.len(),
            "ad slot mounted"
        );
        let mut slot = Self {
            client,
            request,
            cursor: RotationCursor::new(placement.ads.len()),
            placement,
            tracker: ImpressionTracker::new(),
        };
        slot.track_visible().await;
        slot
    }

    pub fn request(&self) -> &AdRequest {
        &self.request
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn tracker(&self) -> &ImpressionTracker {
        &self.tracker
    }

    /// 当前应该渲染的广告
    pub fn visible(&self) -> Vec<&Advertisement> {
        let ads = &self.placement.ads;
        match self.placement.display_mode {
            DisplayMode::All => ads.iter().collect(),
            DisplayMode::Rotation => self.cursor.current().and_then(|i| ads.get(i)).into_iter().collect(),
            DisplayMode::Random | DisplayMode::Priority => ads.first().into_iter().collect(),
        }
    }

    /// 轮播前进一格；非轮播模式什么也不做
    pub async fn tick(&mut self) -> Option<&Advertisement> {
        if self.placement.display_mode != DisplayMode::Rotation {
            return None;
        }
        let index = self.cursor.tick()?;
        self.track_visible().await;
        self.placement.ads.get(index)
    }

    /// 按轮播间隔启动定时器；非轮播模式或只有一条广告时为 None
    pub fn rotation_timer(&self) -> Option<RotationTimer> {
        if self.placement.display_mode != DisplayMode::Rotation {
            return None;
        }
        let period = Duration::from_secs(self.placement.rotation_interval.max(0) as u64);
        RotationTimer::start(self.placement.ads.len(), period)
    }

    /// 上报点击，无论上报成功与否都返回跳转地址
    pub async fn click(&self, ad_id: i64) -> Option<String> {
        let ad = self.placement.ads.iter().find(|ad| ad.id == ad_id)?;
        self.client.record_click(ad_id).await;
        ad.link_url.clone()
    }

    /// between-articles 广告位：把本次挂载拿到的广告按间隔插入文章列表
    pub fn feed<'a, T>(&'a self, articles: &'a [T]) -> Vec<FeedItem<'a, T>> {
        engine::interleave(articles, &self.placement.ads)
    }

    async fn track_visible(&mut self) {
        let visible: Vec<i64> = self.visible().iter().map(|ad| ad.id).collect();
        let fresh: Vec<i64> = visible.into_iter().filter(|id| self.tracker.mark(*id)).collect();
        if fresh.is_empty() {
            return;
        }
        let client = &self.client;
        join_all(fresh.into_iter().map(|id| client.record_impression(id))).await;
    }
}
