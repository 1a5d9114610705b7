// 观众帧采集器 - 主库
//
// 在客户站点/设备上按固定节奏截取摄像头帧，
// 携带客户端ID上报到远端推理接口

pub mod capture;
pub mod collector;
pub mod error;
pub mod logger;
pub mod models;
pub mod settings;
pub mod status;
pub mod upload;

pub use capture::{CaptureBackend, CaptureConstraints, CaptureStream, WebcamBackend};
pub use collector::FrameCollector;
pub use error::CollectorError;
pub use models::{CollectorConfig, FramePayload, PersistedCollectorConfig};
pub use settings::SettingsManager;
pub use status::{LogStatusSink, NullStatusSink, StatusSink};
pub use upload::{FrameUploader, HttpFrameUploader};
