// 帧上报模块 - 将采集到的帧发送到远端推理接口

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, trace};

use crate::models::FramePayload;

/// 帧上报接口
///
/// 每次调用发送一帧；非2xx响应视为失败。实现方不做重试，
/// 单帧失败由调用方记录日志后忽略，不影响后续tick
#[async_trait]
pub trait FrameUploader: Send + Sync {
    /// 发送单帧
    async fn send_frame(&self, payload: &FramePayload) -> Result<()>;
}

/// 基于HTTP的帧上报实现
pub struct HttpFrameUploader {
    api_url: String,
    client: Client,
}

impl HttpFrameUploader {
    /// 创建新的上报客户端（接受共享的HTTP客户端以复用连接池）
    ///
    /// 不设置请求超时：挂起的请求只会悬而不决，对应tick的结果随之丢失
    pub fn new(client: Client, api_url: String) -> Self {
        Self { api_url, client }
    }

    /// 上报接口地址
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl FrameUploader for HttpFrameUploader {
    async fn send_frame(&self, payload: &FramePayload) -> Result<()> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("帧上报失败: HTTP {}", status.as_u16()));
        }

        // 响应体解析后暂不使用，预留给后续功能
        let body: Value = response.json().await?;
        trace!("帧上报成功，响应字段数: {}", body.as_object().map(|o| o.len()).unwrap_or(0));
        debug!("帧已上报: client_id={}", payload.client_id);

        Ok(())
    }
}
