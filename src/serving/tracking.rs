// src/serving/tracking.rs

use std::collections::HashSet;

/// 一次挂载内已经上报过展示的广告 id；每条广告最多上报一次
#[derive(Debug, Default, Clone)]
pub struct ImpressionTracker {
    seen: HashSet<i64>,
}

impl ImpressionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 第一次看到该 id 时返回 true
    pub fn mark(&mut self, ad_id: i64) -> bool {
        self.seen.insert(ad_id)
    }

    pub fn contains(&self, ad_id: i64) -> bool {
        self.seen.contains(&ad_id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_each_id_once() {
        let mut tracker = ImpressionTracker::new();
        assert!(tracker.mark(4));
        assert!(!tracker.mark(4));
        assert!(tracker.mark(5));
        assert_eq!(tracker.len(), 2);
        assert!(tracker.contains(4));
    }
}
