pub mod history_step;
pub mod job_ctx;
pub mod job_flow;
pub mod run_ctx;

pub use job_ctx::JobCtx;
pub use job_flow::{FatalKind, Flow, JobApplicator, StepKind, MAX_STEPS};
pub use run_ctx::{QuotaBook, RunContext, RunStats, TargetStats};
