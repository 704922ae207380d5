// src/serving/engine.rs

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::advertisement::{
    AdPosition, Advertisement, DeviceTarget, DisplayMode, DEFAULT_ROTATION_INTERVAL, MAX_ROTATION_INTERVAL,
    MIN_ROTATION_INTERVAL, PAGE_ALL, PAGE_HOME,
};

/// **一次广告位请求**：(广告位, 页面, 设备)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdRequest {
    pub position: AdPosition,
    pub page: String,
    pub device: DeviceTarget,
}

impl AdRequest {
    /// 页面统一小写，缺省为 home；设备缺省为 all（不做设备过滤）
    pub fn new(position: AdPosition, page: Option<&str>, device: Option<DeviceTarget>) -> Self {
        let page = page
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| PAGE_HOME.to_string());
        Self {
            position,
            page,
            device: device.unwrap_or(DeviceTarget::All),
        }
    }
}

/// 投放时间窗：起止时间为空表示不限
pub fn within_window(ad: &Advertisement, now: DateTime<Utc>) -> bool {
    ad.start_date.map_or(true, |start| start <= now) && ad.end_date.map_or(true, |end| end >= now)
}

/// 请求设备为 all 时不过滤
pub fn device_matches(ad: &Advertisement, device: DeviceTarget) -> bool {
    device == DeviceTarget::All || ad.device_target == DeviceTarget::All || ad.device_target == device
}

/// 页面匹配：pages 含 "all" 或含请求页面，且请求页面不在 exclude_pages 中
pub fn page_matches(ad: &Advertisement, page: &str) -> bool {
    let excluded = ad.exclude_pages.iter().any(|p| p == page);
    let included = ad.pages.iter().any(|p| p == PAGE_ALL || p == page);
    included && !excluded
}

/// **合格判定**，所有条件同时满足
pub fn is_eligible(ad: &Advertisement, request: &AdRequest, now: DateTime<Utc>) -> bool {
    ad.is_active
        && within_window(ad, now)
        && ad.position == request.position
        && device_matches(ad, request.device)
        && page_matches(ad, &request.page)
}

/// 排序：priority 降序，sort_order 升序；稳定排序，相同键保持原有顺序
pub fn rank(ads: &mut [Advertisement]) {
    ads.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.sort_order.cmp(&b.sort_order)));
}

/// **计算合格集合**：过滤 + 排序
pub fn eligible_set(ads: Vec<Advertisement>, request: &AdRequest, now: DateTime<Utc>) -> Vec<Advertisement> {
    let mut eligible: Vec<Advertisement> = ads
        .into_iter()
        .filter(|ad| is_eligible(ad, request, now))
        .collect();
    rank(&mut eligible);
    eligible
}

/// 轮播间隔限定在 3..=60 秒
pub fn rotation_interval(ad: &Advertisement) -> i64 {
    if ad.rotation_interval <= 0 {
        return DEFAULT_ROTATION_INTERVAL;
    }
    ad.rotation_interval.clamp(MIN_ROTATION_INTERVAL, MAX_ROTATION_INTERVAL)
}

/// **按展示方式缩减后的广告位内容**
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub position: AdPosition,
    pub display_mode: DisplayMode,
    pub rotation_interval: i64,
    /// 浮层广告位，脱离正常布局渲染
    pub overlay: bool,
    pub ads: Vec<Advertisement>,
}

impl Placement {
    pub fn empty(position: AdPosition) -> Self {
        Self {
            position,
            display_mode: DisplayMode::default(),
            rotation_interval: DEFAULT_ROTATION_INTERVAL,
            overlay: position.is_overlay(),
            ads: Vec::new(),
        }
    }
}

/// priority 模式：只保留最高优先级的广告（可能并列）
pub fn top_priority(eligible: Vec<Advertisement>) -> Vec<Advertisement> {
    let Some(max) = eligible.iter().map(|ad| ad.priority).max() else {
        return eligible;
    };
    eligible.into_iter().filter(|ad| ad.priority == max).collect()
}

/// **按展示方式缩减合格集合**
///
/// 生效的展示方式取排序后第一条广告的 display_mode。
/// rotation / all 返回完整列表，random 随机取一条，priority 只保留最高优先级。
pub fn reduce<R: Rng + ?Sized>(eligible: Vec<Advertisement>, position: AdPosition, rng: &mut R) -> Placement {
    let Some(lead) = eligible.first() else {
        return Placement::empty(position);
    };
    let display_mode = lead.display_mode;
    let interval = rotation_interval(lead);

    let ads = match display_mode {
        DisplayMode::Rotation | DisplayMode::All => eligible,
        DisplayMode::Random => eligible.choose(rng).cloned().into_iter().collect(),
        DisplayMode::Priority => top_priority(eligible),
    };

    Placement {
        position,
        display_mode,
        rotation_interval: interval,
        overlay: position.is_overlay(),
        ads,
    }
}

/// between-articles：第 `article_index` 篇（从 1 开始）文章之后可以插入的广告。
/// article_position = N 时只在 N 的整数倍位置出现，未设置则每篇之后都可出现。
pub fn between_articles(ads: &[Advertisement], article_index: usize) -> Vec<&Advertisement> {
    if article_index == 0 {
        return Vec::new();
    }
    ads.iter()
        .filter(|ad| match ad.article_position {
            Some(n) if n > 0 => article_index % n as usize == 0,
            Some(_) => false,
            None => true,
        })
        .collect()
}

/// 文章流中的一项
#[derive(Debug, PartialEq)]
pub enum FeedItem<'a, T> {
    Article(&'a T),
    Ad(&'a Advertisement),
}

/// 把合格的 between-articles 广告插入文章列表；每个间隔位置只插入排序最靠前的一条
pub fn interleave<'a, T>(articles: &'a [T], ads: &'a [Advertisement]) -> Vec<FeedItem<'a, T>> {
    let mut feed = Vec::with_capacity(articles.len() * 2);
    for (i, article) in articles.iter().enumerate() {
        feed.push(FeedItem::Article(article));
        if let Some(ad) = between_articles(ads, i + 1).into_iter().next() {
            feed.push(FeedItem::Ad(ad));
        }
    }
    feed
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::advertisement::AdType;
    use chrono::Duration;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    pub(crate) fn ad(id: i64, position: AdPosition) -> Advertisement {
        let now = Utc::now();
        Advertisement {
            id,
            title: format!("ad-{}", id),
            ad_type: AdType::Text,
            content: Some("Buy now".into()),
            image_url: None,
            video_url: None,
            link_url: Some(format!("https://example.com/{}", id)),
            position,
            size: "300x250".into(),
            width: Some(300),
            height: Some(250),
            pages: vec![PAGE_ALL.into()],
            exclude_pages: vec![],
            device_target: DeviceTarget::All,
            start_date: None,
            end_date: None,
            priority: 0,
            sort_order: 0,
            is_active: true,
            impressions: 0,
            clicks: 0,
            display_mode: DisplayMode::Rotation,
            rotation_interval: DEFAULT_ROTATION_INTERVAL,
            article_position: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn request(position: AdPosition, page: &str, device: DeviceTarget) -> AdRequest {
        AdRequest::new(position, Some(page), Some(device))
    }

    #[test]
    fn mobile_ad_excluded_from_desktop_request() {
        let mut mobile = ad(1, AdPosition::SidebarRight);
        mobile.device_target = DeviceTarget::Mobile;
        let req = request(AdPosition::SidebarRight, "home", DeviceTarget::Desktop);
        assert!(eligible_set(vec![mobile.clone()], &req, Utc::now()).is_empty());

        // 请求设备为 all 时跳过设备过滤
        let req = request(AdPosition::SidebarRight, "home", DeviceTarget::All);
        assert_eq!(eligible_set(vec![mobile], &req, Utc::now()).len(), 1);
    }

    #[test]
    fn wildcard_page_matches_any_page() {
        let wildcard = ad(1, AdPosition::HeaderTop);
        for page in ["home", "sports", "article-123", "contact"] {
            let req = request(AdPosition::HeaderTop, page, DeviceTarget::All);
            assert!(is_eligible(&wildcard, &req, Utc::now()), "page {}", page);
        }
    }

    #[test]
    fn page_list_is_enforced() {
        let mut sports_only = ad(1, AdPosition::HeaderTop);
        sports_only.pages = vec!["sports".into()];
        let now = Utc::now();
        assert!(is_eligible(&sports_only, &request(AdPosition::HeaderTop, "sports", DeviceTarget::All), now));
        assert!(!is_eligible(&sports_only, &request(AdPosition::HeaderTop, "home", DeviceTarget::All), now));
    }

    #[test]
    fn exclusion_beats_wildcard() {
        let mut not_on_contact = ad(1, AdPosition::FooterTop);
        not_on_contact.exclude_pages = vec!["contact".into()];
        let now = Utc::now();
        assert!(!is_eligible(&not_on_contact, &request(AdPosition::FooterTop, "contact", DeviceTarget::All), now));
        assert!(is_eligible(&not_on_contact, &request(AdPosition::FooterTop, "home", DeviceTarget::All), now));
    }

    #[test]
    fn request_page_defaults_to_home_and_is_normalized() {
        let req = AdRequest::new(AdPosition::ContentTop, None, None);
        assert_eq!(req.page, "home");
        assert_eq!(req.device, DeviceTarget::All);
        let req = AdRequest::new(AdPosition::ContentTop, Some("  Sports "), None);
        assert_eq!(req.page, "sports");
    }

    #[test]
    fn schedule_window_is_inclusive() {
        let now = Utc::now();
        let mut scheduled = ad(1, AdPosition::ContentTop);
        scheduled.start_date = Some(now);
        scheduled.end_date = Some(now);
        assert!(within_window(&scheduled, now));
        scheduled.start_date = Some(now + Duration::seconds(1));
        assert!(!within_window(&scheduled, now));
    }

    #[test]
    fn inactive_and_wrong_position_excluded() {
        let mut inactive = ad(1, AdPosition::ContentTop);
        inactive.is_active = false;
        let other_slot = ad(2, AdPosition::ContentBottom);
        let req = request(AdPosition::ContentTop, "home", DeviceTarget::All);
        assert!(eligible_set(vec![inactive, other_slot], &req, Utc::now()).is_empty());
    }

    #[test]
    fn ranking_uses_priority_then_sort_order() {
        let mut a = ad(1, AdPosition::ContentTop);
        a.priority = 1;
        a.sort_order = 5;
        let mut b = ad(2, AdPosition::ContentTop);
        b.priority = 3;
        let mut c = ad(3, AdPosition::ContentTop);
        c.priority = 1;
        c.sort_order = 2;
        let req = request(AdPosition::ContentTop, "home", DeviceTarget::All);
        let ids: Vec<i64> = eligible_set(vec![a, b, c], &req, Utc::now()).iter().map(|ad| ad.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn random_mode_picks_exactly_one() {
        let mut ads: Vec<Advertisement> = (1..=4).map(|id| ad(id, AdPosition::SidebarLeft)).collect();
        for a in &mut ads {
            a.display_mode = DisplayMode::Random;
        }
        let mut rng = StdRng::seed_from_u64(7);
        let placement = reduce(ads, AdPosition::SidebarLeft, &mut rng);
        assert_eq!(placement.display_mode, DisplayMode::Random);
        assert_eq!(placement.ads.len(), 1);
    }

    #[test]
    fn lead_ad_sets_mode_and_clamped_interval() {
        let mut lead = ad(1, AdPosition::HeaderTop);
        lead.rotation_interval = 600;
        let placement = reduce(vec![lead, ad(2, AdPosition::HeaderTop)], AdPosition::HeaderTop, &mut rand::thread_rng());
        assert_eq!(placement.display_mode, DisplayMode::Rotation);
        assert_eq!(placement.rotation_interval, MAX_ROTATION_INTERVAL);
        assert_eq!(placement.ads.len(), 2);
    }

    #[test]
    fn overlay_flag_survives_reduction() {
        let mut overlay = ad(1, AdPosition::OverlayCenter);
        overlay.display_mode = DisplayMode::Priority;
        let placement = reduce(vec![overlay], AdPosition::OverlayCenter, &mut rand::thread_rng());
        assert!(placement.overlay);
        assert!(Placement::empty(AdPosition::FloatingCorner).overlay);
    }

    #[test]
    fn between_articles_spacing() {
        let mut every_third = ad(1, AdPosition::BetweenArticles);
        every_third.article_position = Some(3);
        let every = ad(2, AdPosition::BetweenArticles);
        let ads = vec![every_third, every];

        let ids = |i: usize| between_articles(&ads, i).iter().map(|ad| ad.id).collect::<Vec<_>>();
        assert_eq!(ids(1), vec![2]);
        assert_eq!(ids(3), vec![1, 2]);
        assert_eq!(ids(6), vec![1, 2]);
        assert!(ids(0).is_empty());
    }

    #[test]
    fn interleave_inserts_after_matching_articles() {
        let mut every_second = ad(9, AdPosition::BetweenArticles);
        every_second.article_position = Some(2);
        let articles = ["a", "b", "c", "d"];
        let ads = [every_second];
        let feed = interleave(&articles, &ads);
        assert_eq!(feed.len(), 6);
        assert_eq!(feed[2], FeedItem::Ad(&ads[0]));
        assert_eq!(feed[5], FeedItem::Ad(&ads[0]));
    }

    fn arb_ad() -> impl Strategy<Value = Advertisement> {
        (
            1i64..1000,
            -5i64..5,
            0i64..5,
            any::<bool>(),
            prop::option::of(-3i64..3),
            prop::option::of(-3i64..3),
            prop::sample::select(vec![DeviceTarget::All, DeviceTarget::Desktop, DeviceTarget::Mobile]),
            prop::sample::select(vec![
                DisplayMode::Rotation,
                DisplayMode::Random,
                DisplayMode::Priority,
                DisplayMode::All,
            ]),
        )
            .prop_map(|(id, priority, sort_order, is_active, start, end, device, mode)| {
                let now = Utc::now();
                let mut a = ad(id, AdPosition::ContentMiddle);
                a.priority = priority;
                a.sort_order = sort_order;
                a.is_active = is_active;
                a.start_date = start.map(|d| now + Duration::days(d));
                a.end_date = end.map(|d| now + Duration::days(d));
                a.device_target = device;
                a.display_mode = mode;
                a
            })
    }

    proptest! {
        #[test]
        fn expired_ads_never_eligible(mut ads in prop::collection::vec(arb_ad(), 0..20)) {
            let now = Utc::now();
            for a in ads.iter_mut().step_by(2) {
                a.end_date = Some(now - Duration::seconds(1));
            }
            let req = AdRequest::new(AdPosition::ContentMiddle, Some("home"), None);
            let eligible = eligible_set(ads, &req, now);
            prop_assert!(eligible.iter().all(|a| a.end_date.map_or(true, |end| end >= now)));
        }

        #[test]
        fn eligible_order_is_monotonic_in_priority(ads in prop::collection::vec(arb_ad(), 0..30)) {
            let req = AdRequest::new(AdPosition::ContentMiddle, Some("home"), None);
            let eligible = eligible_set(ads, &req, Utc::now());
            for pair in eligible.windows(2) {
                prop_assert!(pair[0].priority >= pair[1].priority);
                if pair[0].priority == pair[1].priority {
                    prop_assert!(pair[0].sort_order <= pair[1].sort_order);
                }
            }
        }

        #[test]
        fn priority_mode_keeps_only_maximum(ads in prop::collection::vec(arb_ad(), 1..30)) {
            let req = AdRequest::new(AdPosition::ContentMiddle, Some("home"), None);
            let mut eligible = eligible_set(ads, &req, Utc::now());
            prop_assume!(!eligible.is_empty());
            eligible[0].display_mode = DisplayMode::Priority;
            let max = eligible.iter().map(|a| a.priority).max().unwrap();
            let placement = reduce(eligible, AdPosition::ContentMiddle, &mut rand::thread_rng());
            prop_assert!(!placement.ads.is_empty());
            prop_assert!(placement.ads.iter().all(|a| a.priority == max));
        }
    }
}
