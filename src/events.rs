//! 运行事件 - 单向通知通道
//!
//! 引擎只负责发送，不关心是否有人接收

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::models::{JobSummary, SkipReason};
use crate::orchestrator::RunOutcome;

/// 运行事件
#[derive(Clone, Debug, Serialize)]
pub enum RunEvent {
    /// 一页搜索结果扫描完成
    PageScanned {
        target: String,
        location: String,
        page: u32,
        candidates: usize,
        skipped: usize,
        timestamp: DateTime<Utc>,
    },

    JobSkipped {
        job: JobSummary,
        reason: SkipReason,
        timestamp: DateTime<Utc>,
    },

    JobApplied {
        target: String,
        job: JobSummary,
        timestamp: DateTime<Utc>,
    },

    JobFailed {
        target: String,
        job: JobSummary,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// 配额用完，该目标不再调度
    QuotaReached {
        target: String,
        limit: u32,
        timestamp: DateTime<Utc>,
    },

    RunAborted {
        reason: String,
        timestamp: DateTime<Utc>,
    },

    RunFinished {
        outcome: RunOutcome,
        applied: usize,
        timestamp: DateTime<Utc>,
    },
}

pub type EventReceiver = mpsc::UnboundedReceiver<RunEvent>;

/// 事件发送端；接收端关闭后发送静默失败
#[derive(Clone, Debug, Default)]
pub struct EventSink {
    sender: Option<mpsc::UnboundedSender<RunEvent>>,
}

impl EventSink {
    /// 创建事件通道
    pub fn channel() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { sender: Some(tx) }, rx)
    }

    /// 不发送任何事件
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn emit(&self, event: RunEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_reaches_receiver() {
        let (sink, mut rx) = EventSink::channel();
        sink.emit(RunEvent::RunAborted {
            reason: "daily limit".to_string(),
            timestamp: Utc::now(),
        });

        match rx.recv().await {
            Some(RunEvent::RunAborted { reason, .. }) => assert_eq!(reason, "daily limit"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_emit_without_receiver_is_silent() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        sink.emit(RunEvent::RunAborted {
            reason: "closed".to_string(),
            timestamp: Utc::now(),
        });
        EventSink::disabled().emit(RunEvent::RunAborted {
            reason: "none".to_string(),
            timestamp: Utc::now(),
        });
    }
}
