use std::process::ExitCode;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use jobpilot::utils::logging;
use jobpilot::{App, Config, EventSink};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    // Ctrl-C 只发出取消信号，由调度器在安全点停下
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 收到中断信号，完成当前操作后停止...");
            ctrl_c.cancel();
        }
    });

    let (events, mut rx) = EventSink::channel();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Ok(line) = serde_json::to_string(&event) {
                debug!("事件: {}", line);
            }
        }
    });

    // 初始化并运行应用
    let outcome = App::initialize(config, cancel, events).await?.run().await?;

    Ok(ExitCode::from(outcome.exit_code()))
}
