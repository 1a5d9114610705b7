// 数据模型模块 - 定义所有的数据结构

use serde::{Deserialize, Serialize};

/// 客户端ID的占位符，客户未配置时保持此值
///
/// 采集器启动前必须替换为账户页面分发的真实ID，否则拒绝启动
pub const CLIENT_ID_PLACEHOLDER: &str = "YOUR_CLIENT_ID_HERE";

/// 帧上报接口的默认地址
pub const DEFAULT_FRAME_API_URL: &str = "http://127.0.0.1:5000/predict_frame";

/// 采集器配置（部分更新用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// 客户端ID
    pub client_id: Option<String>,
    /// 帧上报接口地址
    pub frame_api_url: Option<String>,
    /// 启动后是否自动开始采集
    pub auto_start: Option<bool>,
    /// 采集设置
    pub capture_settings: Option<CaptureSettings>,
}

/// 采集设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// 请求的采集宽度
    pub width: u32,
    /// 请求的采集高度
    pub height: u32,
    /// 图片质量(1-100)
    pub image_quality: u8,
    /// 帧处理间隔（毫秒）
    pub frame_interval_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            image_quality: 80,
            frame_interval_ms: 500,
        }
    }
}

/// 持久化的采集器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedCollectorConfig {
    /// 客户端ID
    pub client_id: String,
    /// 帧上报接口地址
    pub frame_api_url: String,
    /// 启动后是否自动开始采集
    pub auto_start: bool,
    /// 采集设置
    pub capture_settings: CaptureSettings,
}

impl Default for PersistedCollectorConfig {
    fn default() -> Self {
        Self {
            client_id: CLIENT_ID_PLACEHOLDER.to_string(),
            frame_api_url: DEFAULT_FRAME_API_URL.to_string(),
            auto_start: true,
            capture_settings: CaptureSettings::default(),
        }
    }
}

impl PersistedCollectorConfig {
    /// 客户端ID是否已配置（非空且不等于占位符）
    pub fn client_id_configured(&self) -> bool {
        !self.client_id.is_empty() && self.client_id != CLIENT_ID_PLACEHOLDER
    }
}

/// 帧上报载荷，每个tick新建一份，发送后即丢弃
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramePayload {
    /// data URL形式的JPEG图像（data:image/jpeg;base64,...）
    pub image_data: String,
    /// 客户端ID
    pub client_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_placeholder() {
        let config = PersistedCollectorConfig::default();
        assert_eq!(config.client_id, CLIENT_ID_PLACEHOLDER);
        assert!(!config.client_id_configured());
    }

    #[test]
    fn test_configured_client_id() {
        let config = PersistedCollectorConfig {
            client_id: "acme123".to_string(),
            ..Default::default()
        };
        assert!(config.client_id_configured());

        let empty = PersistedCollectorConfig {
            client_id: String::new(),
            ..Default::default()
        };
        assert!(!empty.client_id_configured());
    }

    #[test]
    fn test_payload_wire_format() {
        let payload = FramePayload {
            image_data: "data:image/jpeg;base64,abc".to_string(),
            client_id: "acme123".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["image_data"], "data:image/jpeg;base64,abc");
        assert_eq!(json["client_id"], "acme123");
    }
}
