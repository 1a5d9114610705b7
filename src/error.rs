// 采集器错误类型

use thiserror::Error;

/// 启动采集时可能出现的错误
///
/// 每个tick内部的网络/HTTP失败不在此列：它们只记录日志，
/// 不影响会话状态，也不会上抛给调用方
#[derive(Error, Debug)]
pub enum CollectorError {
    /// 客户端ID未配置（仍为占位符或为空）
    #[error("客户端ID未配置，请先在配置中填入账户页面分发的ID")]
    Configuration,

    /// 采集设备不可用或权限被拒绝
    #[error("采集设备不可用: {0}")]
    CaptureDevice(String),
}
