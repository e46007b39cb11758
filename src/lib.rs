//! # JobPilot
//!
//! 一个用于在招聘站点上自动搜索并完成站内申请的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `BoardDriver` - 站点能力接口（搜索、打开职位、读写向导字段）
//! - `DomDriver` - 基于 `JsExecutor` 的 Chromium 实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个问题或单条记录
//! - `classify` - 问题归类
//! - `AnswerPipeline` - 自定义回答 → 档案规则 → 协作方 → 默认值
//! - `Ledger` - 已申请职位台账（跨运行持久化）
//! - `Pacer` - 操作节奏
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个职位"的完整处理流程
//! - `JobCtx` - 上下文封装（目标 + 地点 + 页码 + 序号）
//! - `JobApplicator` - 流程编排（打开 → 评估 → 向导 → 提交）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 应用入口，管理资源
//! - `orchestrator/scheduler` - 目标 × 地点 × 页的调度和配额
//! - `orchestrator/page_scanner` - 结果页过滤
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod events;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod test_support;

// 重新导出常用类型
pub use config::Config;
pub use error::AppError;
pub use events::{EventReceiver, EventSink, RunEvent};
pub use infrastructure::{BoardDriver, DomDriver, JsExecutor};
pub use models::{JobSummary, Profile, SkipReason};
pub use orchestrator::{App, RunOutcome, Scheduler};
pub use workflow::{Flow, JobApplicator, JobCtx, RunContext};
