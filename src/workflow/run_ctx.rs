//! 运行上下文
//!
//! 一次运行中所有可变状态都集中在这里，按引用传递给各层

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::events::EventSink;
use crate::models::{Profile, SearchTarget};
use crate::services::Ledger;

/// 按角色名记录的申请配额
#[derive(Debug, Default, Clone)]
pub struct QuotaBook {
    limits: HashMap<String, u32>,
    applied: HashMap<String, u32>,
}

impl QuotaBook {
    pub fn from_targets(targets: &[SearchTarget]) -> Self {
        let limits = targets
            .iter()
            .filter_map(|t| t.quota_limit.map(|limit| (t.name.clone(), limit)))
            .collect();
        Self {
            limits,
            applied: HashMap::new(),
        }
    }

    pub fn limit(&self, target: &str) -> Option<u32> {
        self.limits.get(target).copied()
    }

    pub fn applied(&self, target: &str) -> u32 {
        self.applied.get(target).copied().unwrap_or(0)
    }

    /// 有配额且已用完
    pub fn is_exhausted(&self, target: &str) -> bool {
        self.limit(target)
            .map(|limit| self.applied(target) >= limit)
            .unwrap_or(false)
    }

    /// 记录一次成功申请，返回新的计数
    pub fn record(&mut self, target: &str) -> u32 {
        let count = self.applied.entry(target.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}

/// 单个目标的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TargetStats {
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// 运行统计（按目标汇总）
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    per_target: BTreeMap<String, TargetStats>,
}

impl RunStats {
    fn entry(&mut self, target: &str) -> &mut TargetStats {
        self.per_target.entry(target.to_string()).or_default()
    }

    pub fn record_applied(&mut self, target: &str) {
        self.entry(target).applied += 1;
    }

    pub fn record_skipped(&mut self, target: &str) {
        self.entry(target).skipped += 1;
    }

    pub fn record_failed(&mut self, target: &str) {
        self.entry(target).failed += 1;
    }

    pub fn get(&self, target: &str) -> TargetStats {
        self.per_target.get(target).copied().unwrap_or_default()
    }

    pub fn total_applied(&self) -> usize {
        self.per_target.values().map(|s| s.applied).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TargetStats)> {
        self.per_target.iter()
    }
}

/// 运行上下文
///
/// 职责：
/// - 持有 Ledger（唯一的共享可变资源）
/// - 持有本次运行已评估的 URL 集合，只增不减
/// - 持有配额、统计、取消信号、事件通道
pub struct RunContext {
    pub profile: Arc<Profile>,
    pub ledger: Ledger,
    pub session_seen: HashSet<String>,
    pub quotas: QuotaBook,
    pub stats: RunStats,
    pub cancel: CancellationToken,
    pub events: EventSink,
}

impl RunContext {
    pub fn new(
        profile: Arc<Profile>,
        ledger: Ledger,
        cancel: CancellationToken,
        events: EventSink,
    ) -> Self {
        let quotas = QuotaBook::from_targets(&profile.targets);
        Self {
            profile,
            ledger,
            session_seen: HashSet::new(),
            quotas,
            stats: RunStats::default(),
            cancel,
            events,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(name: &str, quota: Option<u32>) -> SearchTarget {
        SearchTarget {
            name: name.to_string(),
            locations: Vec::new(),
            quota_limit: quota,
        }
    }

    #[test]
    fn test_quota_book() {
        let mut quotas = QuotaBook::from_targets(&[target("sales", Some(2)), target("support", None)]);

        assert!(!quotas.is_exhausted("sales"));
        assert_eq!(quotas.record("sales"), 1);
        assert!(!quotas.is_exhausted("sales"));
        assert_eq!(quotas.record("sales"), 2);
        assert!(quotas.is_exhausted("sales"));

        for _ in 0..10 {
            quotas.record("support");
        }
        assert!(!quotas.is_exhausted("support"));
        assert_eq!(quotas.limit("support"), None);
    }

    #[test]
    fn test_run_stats() {
        let mut stats = RunStats::default();
        stats.record_applied("sales");
        stats.record_applied("sales");
        stats.record_failed("sales");
        stats.record_skipped("support");

        assert_eq!(
            stats.get("sales"),
            TargetStats {
                applied: 2,
                skipped: 0,
                failed: 1
            }
        );
        assert_eq!(stats.get("support").skipped, 1);
        assert_eq!(stats.total_applied(), 2);
        assert_eq!(stats.get("unknown"), TargetStats::default());
    }
}
