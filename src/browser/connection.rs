use anyhow::{Context, Result};
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// 连接到已开启调试端口的浏览器，复用已登录的会话
///
/// # 参数
/// - `port`: 浏览器调试端口
/// - `target_url`: 找不到匹配页面时新建页面并打开的地址
/// - `target_host`: 优先复用地址中包含该主机名的已有页面
pub async fn connect_to_browser_and_page(
    port: u16,
    target_url: Option<&str>,
    target_host: Option<&str>,
) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);
    debug!("目标 URL: {:?}, 目标主机: {:?}", target_url, target_host);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        e
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    if let Some(host) = target_host {
        for p in pages.iter() {
            if let Ok(Some(url)) = p.url().await {
                if url.contains(host) {
                    info!("✓ 复用已打开的页面: {}", url);
                    return Ok((browser, p.clone()));
                }
            }
        }
        debug!("没有 {} 的页面，将创建新页面", host);
    }

    let page = browser
        .new_page(target_url.unwrap_or("about:blank"))
        .await
        .context("创建新页面失败")?;
    if let Some(url) = target_url {
        info!("已打开: {}", url);
    }

    Ok((browser, page))
}
