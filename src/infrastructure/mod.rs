//! 基础设施层
//!
//! 持有浏览器页面，向上只暴露 `BoardDriver` 能力

pub mod board_driver;
pub mod dom_driver;
pub mod js_executor;

pub use board_driver::{is_submit_label, BoardDriver, JobListView, PageSignal};
pub use dom_driver::{DomDriver, DomSelectors};
pub use js_executor::JsExecutor;
