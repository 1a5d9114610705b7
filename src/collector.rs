// 帧采集器 - 管理采集生命周期，按固定节奏将帧推送到远端
//
// 两个状态：空闲与采集中。start成功后进入采集中，stop回到空闲；
// 采集中重复start是无害的空操作，start失败停留在空闲。
// 没有自动状态迁移：单帧上报失败不会停止采集。

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{error, info, trace, warn};

use crate::capture::{CaptureBackend, CaptureConstraints, CaptureStream, RenderSurface};
use crate::error::CollectorError;
use crate::models::{FramePayload, PersistedCollectorConfig};
use crate::status::StatusSink;
use crate::upload::FrameUploader;

/// 会话状态
///
/// 不变量: capturing 为 true 时 device 与 timer 必为 Some
struct SessionState {
    capturing: bool,
    device: Option<Box<dyn CaptureStream>>,
    surface: Option<RenderSurface>,
    timer: Option<JoinHandle<()>>,
}

impl SessionState {
    fn idle() -> Self {
        Self {
            capturing: false,
            device: None,
            surface: None,
            timer: None,
        }
    }
}

/// 帧采集器
pub struct FrameCollector {
    config: PersistedCollectorConfig,
    backend: Arc<dyn CaptureBackend>,
    uploader: Arc<dyn FrameUploader>,
    sink: Arc<dyn StatusSink>,
    session: Mutex<SessionState>,
}

impl FrameCollector {
    /// 创建新的采集器，此时不会访问任何设备
    pub fn new(
        config: PersistedCollectorConfig,
        backend: Arc<dyn CaptureBackend>,
        uploader: Arc<dyn FrameUploader>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            config,
            backend,
            uploader,
            sink,
            session: Mutex::new(SessionState::idle()),
        }
    }

    /// 初始化：汇报待命状态。可重复调用，不触碰设备
    pub fn initialize(&self) {
        self.sink.report("观众分析：摄像头未开启，等待启动。");
        info!("采集器已就绪，调用 start() 开始采集");
    }

    /// 开始采集
    ///
    /// 客户端ID未配置时拒绝启动且不访问设备；已在采集中时为空操作。
    /// 设备打开失败只记录并汇报，状态停留在空闲，不自动重试
    pub async fn start(self: &Arc<Self>) -> Result<(), CollectorError> {
        if !self.config.client_id_configured() {
            error!("客户端ID未配置，无法启动采集");
            self.sink.alert("观众分析：客户端ID未配置，请联系支持人员。");
            return Err(CollectorError::Configuration);
        }

        {
            let session = self.session.lock().await;
            if session.capturing {
                warn!("采集器已在运行中");
                return Ok(());
            }
        }

        // 在锁外等待设备打开。此期间的stop拿不到任何句柄，
        // 打开完成后设备仍会被接入——与原有行为一致的已知竞态
        let constraints = CaptureConstraints {
            width: self.config.capture_settings.width,
            height: self.config.capture_settings.height,
            audio: false,
        };
        let mut device = match self.backend.open(constraints).await {
            Ok(device) => device,
            Err(e) => {
                error!("访问采集设备失败: {}", e);
                self.sink
                    .report("观众分析：摄像头启动失败，请检查权限。");
                return Err(CollectorError::CaptureDevice(e.to_string()));
            }
        };

        let (width, height) = match device.wait_for_dimensions().await {
            Ok(dims) => dims,
            Err(e) => {
                error!("等待设备尺寸失败: {}", e);
                self.sink
                    .report("观众分析：摄像头启动失败，请检查权限。");
                return Err(CollectorError::CaptureDevice(e.to_string()));
            }
        };

        let surface = RenderSurface::new(width, height);
        let timer = self.clone().spawn_tick_task();

        let mut session = self.session.lock().await;
        session.device = Some(device);
        session.surface = Some(surface);
        session.timer = Some(timer);
        session.capturing = true;

        info!(
            "摄像头已启动（{}x{}），每 {}ms 处理一帧",
            width, height, self.config.capture_settings.frame_interval_ms
        );
        self.sink.report("观众分析：摄像头已开启。");
        Ok(())
    }

    /// 停止采集并释放所有临时资源
    ///
    /// 各步骤均有空值保护，未在采集时调用等同于空操作，可重复调用
    pub async fn stop(&self) {
        let mut session = self.session.lock().await;

        if let Some(mut device) = session.device.take() {
            device.stop_tracks();
        }
        if let Some(timer) = session.timer.take() {
            timer.abort();
        }
        session.surface = None;
        session.capturing = false;

        info!("摄像头已停止");
        self.sink.report("观众分析：摄像头已关闭。");
    }

    /// 当前是否处于采集中
    pub async fn is_capturing(&self) -> bool {
        self.session.lock().await.capturing
    }

    /// 启动定时任务，按固定间隔驱动帧处理
    fn spawn_tick_task(self: Arc<Self>) -> JoinHandle<()> {
        let interval_ms = self.config.capture_settings.frame_interval_ms;
        tokio::task::spawn(async move {
            let mut interval = interval(Duration::from_millis(interval_ms));
            loop {
                interval.tick().await;
                self.process_frame().await;
            }
        })
    }

    /// 处理单个tick：截取当前帧，编码后上报
    ///
    /// 设备或表面不存在、或设备数据尚未就绪时直接跳过本次tick，
    /// 这不是错误——设备可能仍在初始化
    pub async fn process_frame(&self) {
        let payload = {
            let mut session = self.session.lock().await;
            let state = &mut *session;
            let (device, surface) = match (state.device.as_mut(), state.surface.as_mut()) {
                (Some(device), Some(surface)) => (device, surface),
                _ => return,
            };

            if !device.is_ready() {
                trace!("采集设备尚未就绪，跳过本次帧处理");
                return;
            }

            let frame = match device.grab_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("截取帧失败: {}", e);
                    return;
                }
            };

            surface.draw_image(&frame.image);
            let image_data =
                match surface.to_jpeg_data_url(self.config.capture_settings.image_quality) {
                    Ok(data) => data,
                    Err(e) => {
                        error!("编码帧失败: {}", e);
                        return;
                    }
                };

            trace!("帧已编码: {}", frame.timestamp);
            FramePayload {
                image_data,
                client_id: self.config.client_id.clone(),
            }
        };

        // 在锁外发送：上报不阻塞后续tick，在途请求允许重叠
        if let Err(e) = self.uploader.send_frame(&payload).await {
            error!("帧上报失败: {}", e);
        }
    }
}
