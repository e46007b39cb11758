//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责搜索调度和资源管理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行、关闭浏览器）
//! - 组装驱动、协作方、回答管线
//!
//! ### `scheduler` - 搜索 / 配额调度器
//! - 遍历目标 × 地点 × 结果页
//! - 维护配额和台账，处理运行级终止
//!
//! ### `page_scanner` - 结果页扫描器
//! - 按固定优先级计算跳过原因
//!
//! ## 层次关系
//!
//! ```text
//! app
//!     ↓
//! scheduler (目标 × 地点 × 页)
//!     ↓
//! page_scanner (一页 Vec<JobSummary>)
//!     ↓
//! workflow::JobApplicator (单个职位)
//!     ↓
//! services (能力层：classifier / pipeline / ledger / collaborator)
//!     ↓
//! infrastructure (基础设施：BoardDriver)
//! ```

pub mod app;
pub mod page_scanner;
pub mod scheduler;

pub use app::App;
pub use page_scanner::{scan_page, skip_reason, PageScan};
pub use scheduler::{RunOutcome, Scheduler};
