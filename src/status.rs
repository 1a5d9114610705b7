// 状态反馈模块 - 向宿主暴露采集状态
//
// 原版部署在客户网页时通过页面上的状态文本和弹窗反馈；
// 这里收敛为一个窄接口，宿主可自行决定呈现方式

use tracing::{info, warn};

/// 状态输出接口
///
/// `report` 对应可选的状态文本更新，`alert` 对应需要用户立即关注的告警
pub trait StatusSink: Send + Sync {
    /// 更新状态文本
    fn report(&self, message: &str);

    /// 弹出告警
    fn alert(&self, message: &str);
}

/// 将状态写入日志的默认实现
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn report(&self, message: &str) {
        info!("状态: {}", message);
    }

    fn alert(&self, message: &str) {
        warn!("告警: {}", message);
    }
}

/// 丢弃所有状态的实现，宿主不关心状态时使用
pub struct NullStatusSink;

impl StatusSink for NullStatusSink {
    fn report(&self, _message: &str) {}

    fn alert(&self, _message: &str) {}
}
