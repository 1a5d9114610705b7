// 观众帧采集器 - 命令行入口

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use audience_collector::capture::WebcamBackend;
use audience_collector::collector::FrameCollector;
use audience_collector::logger;
use audience_collector::settings::SettingsManager;
use audience_collector::status::LogStatusSink;
use audience_collector::upload::HttpFrameUploader;

/// 配置文件路径
fn config_path() -> PathBuf {
    if cfg!(target_os = "macos") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join("Library/Application Support/audience-collector/config.json")
    } else if cfg!(target_os = "windows") {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata)
            .join("audience-collector")
            .join("config.json")
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".config/audience-collector/config.json")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logger::init() {
        eprintln!("日志初始化失败: {}", e);
    }

    let settings = SettingsManager::new(config_path()).await?;
    let config = settings.get().await;

    let client = reqwest::Client::new();
    let uploader = Arc::new(HttpFrameUploader::new(
        client,
        config.frame_api_url.clone(),
    ));
    let backend = Arc::new(WebcamBackend::new(0));
    let sink = Arc::new(LogStatusSink);

    let collector = Arc::new(FrameCollector::new(config.clone(), backend, uploader, sink));
    collector.initialize();

    if config.auto_start {
        if let Err(e) = collector.start().await {
            error!("启动采集失败: {}", e);
        }
    } else {
        info!("自动启动未开启，采集器保持待命");
    }

    // Ctrl-C 退出并释放设备
    tokio::signal::ctrl_c().await?;
    collector.stop().await;

    Ok(())
}
