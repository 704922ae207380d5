// src/serving/rotation.rs

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

/// **轮播游标**，到末尾后回到开头
#[derive(Debug, Clone, Default)]
pub struct RotationCursor {
    index: usize,
    len: usize,
}

impl RotationCursor {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn current(&self) -> Option<usize> {
        (self.len > 0).then_some(self.index)
    }

    /// 前进一格并返回新位置
    pub fn tick(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.index = (self.index + 1) % self.len;
        Some(self.index)
    }

    /// 广告集合变化后重置
    pub fn reset(&mut self, len: usize) {
        self.index = 0;
        self.len = len;
    }
}

/// **轮播定时器**
///
/// 后台任务按固定间隔推进游标，通过 watch 通道广播当前下标。
/// 句柄被丢弃时任务随之取消。
#[derive(Debug)]
pub struct RotationTimer {
    handle: JoinHandle<()>,
    rx: watch::Receiver<usize>,
}

impl RotationTimer {
    /// 只有一条或没有广告时不需要轮播
    pub fn start(len: usize, period: Duration) -> Option<Self> {
        if len <= 1 || period.is_zero() {
            return None;
        }
        let (tx, rx) = watch::channel(0usize);
        let handle = tokio::spawn(async move {
            let mut cursor = RotationCursor::new(len);
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(index) = cursor.tick() else { break };
                trace!(index, "rotation tick");
                if tx.send(index).is_err() {
                    break;
                }
            }
        });
        Some(Self { handle, rx })
    }

    pub fn current(&self) -> usize {
        *self.rx.borrow()
    }

    /// 等待下一次切换；定时器已停止时返回 None
    pub async fn changed(&mut self) -> Option<usize> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for RotationTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn cursor_wraps_after_len_ticks() {
        let mut cursor = RotationCursor::new(3);
        assert_eq!(cursor.current(), Some(0));
        let seen: Vec<usize> = (0..3).filter_map(|_| cursor.tick()).collect();
        assert_eq!(seen, vec![1, 2, 0]);
        assert_eq!(cursor.current(), Some(0));
    }

    proptest! {
        #[test]
        fn cursor_returns_to_start_after_len_ticks(len in 1usize..50, start in 0usize..50) {
            let mut cursor = RotationCursor::new(len);
            for _ in 0..start {
                cursor.tick();
            }
            let origin = cursor.current();
            prop_assert_eq!(origin, Some(start % len));

            for step in 1..=len {
                let index = cursor.tick();
                prop_assert_eq!(index, Some((start + step) % len));
            }
            prop_assert_eq!(cursor.current(), origin);
        }
    }

    #[test]
    fn empty_cursor_never_advances() {
        let mut cursor = RotationCursor::new(0);
        assert_eq!(cursor.current(), None);
        assert_eq!(cursor.tick(), None);
        cursor.reset(2);
        assert_eq!(cursor.tick(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_advances_on_each_period() {
        let mut timer = RotationTimer::start(2, Duration::from_secs(5)).unwrap();
        assert_eq!(timer.current(), 0);
        assert_eq!(timer.changed().await, Some(1));
        assert_eq!(timer.changed().await, Some(0));
    }

    #[tokio::test]
    async fn single_ad_does_not_rotate() {
        assert!(RotationTimer::start(1, Duration::from_secs(5)).is_none());
        assert!(RotationTimer::start(0, Duration::from_secs(5)).is_none());
    }
}
