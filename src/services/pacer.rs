//! 节奏控制
//!
//! 所有等待都是刻意的时间间隔（不是重试退避），集中在固定的挂起点：
//! 翻页之间、打开职位之后、向导每次前进的前后。等待会被取消信号提前唤醒。

use rand::Rng;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::models::PacingMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    min: Duration,
    max: Duration,
}

impl Span {
    const ZERO: Span = Span::millis(0, 0);

    const fn millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }

    fn pick(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let millis =
            rand::thread_rng().gen_range(self.min.as_millis() as u64..=self.max.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

/// 节奏控制器
#[derive(Debug, Clone)]
pub struct Pacer {
    after_open: Span,
    advance: Span,
    page_floor: Duration,
    long_pause: Span,
    long_pause_every: usize,
}

impl Pacer {
    pub fn for_mode(mode: PacingMode) -> Self {
        match mode {
            PacingMode::Fast => Self {
                after_open: Span::millis(1000, 2500),
                advance: Span::millis(500, 1500),
                page_floor: Duration::from_secs(10),
                long_pause: Span::millis(20000, 40000),
                long_pause_every: 5,
            },
            PacingMode::Slow => Self {
                after_open: Span::millis(3000, 6000),
                advance: Span::millis(1500, 3500),
                page_floor: Duration::from_secs(30),
                long_pause: Span::millis(60000, 120000),
                long_pause_every: 3,
            },
        }
    }

    /// 不等待，测试用
    pub fn instant() -> Self {
        Self {
            after_open: Span::ZERO,
            advance: Span::ZERO,
            page_floor: Duration::ZERO,
            long_pause: Span::ZERO,
            long_pause_every: 0,
        }
    }

    pub async fn after_open(&self, cancel: &CancellationToken) {
        pause(self.after_open.pick(), cancel).await;
    }

    /// 向导前进前后各调用一次
    pub async fn around_advance(&self, cancel: &CancellationToken) {
        pause(self.advance.pick(), cancel).await;
    }

    /// 一页处理完毕：补足每页最短耗时，每隔几页额外长休
    pub async fn page_done(&self, started: Instant, pages_done: usize, cancel: &CancellationToken) {
        let elapsed = started.elapsed();
        if elapsed < self.page_floor {
            let remaining = self.page_floor - elapsed;
            debug!("本页耗时 {:?}，补足最短间隔 {:?}", elapsed, remaining);
            pause(remaining, cancel).await;
        }
        if self.long_pause_every > 0 && pages_done > 0 && pages_done % self.long_pause_every == 0 {
            let long = self.long_pause.pick();
            debug!("已处理 {} 页，长休 {:?}", pages_done, long);
            pause(long, cancel).await;
        }
    }
}

async fn pause(duration: Duration, cancel: &CancellationToken) {
    if duration.is_zero() || cancel.is_cancelled() {
        return;
    }
    tokio::select! {
        _ = sleep(duration) => {}
        _ = cancel.cancelled() => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_pick_stays_in_range() {
        let span = Span::millis(500, 1500);
        for _ in 0..100 {
            let d = span.pick();
            assert!(d >= Duration::from_millis(500) && d <= Duration::from_millis(1500));
        }
        assert_eq!(Span::ZERO.pick(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_cancelled_pause_returns_immediately() {
        let pacer = Pacer::for_mode(PacingMode::Slow);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let started = Instant::now();
        pacer.page_done(started, 3, &cancel).await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
