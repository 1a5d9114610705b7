// 摄像头采集模块 - 负责打开采集设备并提供离屏渲染表面

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tracing::{info, trace, warn};

/// 采集约束
#[derive(Debug, Clone, Copy)]
pub struct CaptureConstraints {
    /// 请求的宽度
    pub width: u32,
    /// 请求的高度
    pub height: u32,
    /// 是否采集音频（本系统恒为 false）
    pub audio: bool,
}

/// 单帧采集结果
#[derive(Clone, Debug)]
pub struct CapturedFrame {
    /// 时间戳
    pub timestamp: DateTime<Utc>,
    /// 图像数据
    pub image: RgbImage,
}

/// 采集设备后端 - 按约束请求设备访问
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// 请求访问采集设备；权限被拒绝或无可用设备时返回错误
    async fn open(&self, constraints: CaptureConstraints) -> Result<Box<dyn CaptureStream>>;
}

/// 已打开的采集流
#[async_trait]
pub trait CaptureStream: Send {
    /// 等待设备上报原生帧尺寸
    async fn wait_for_dimensions(&mut self) -> Result<(u32, u32)>;

    /// 设备是否已有足够数据可供截取
    fn is_ready(&self) -> bool;

    /// 截取当前帧
    fn grab_frame(&mut self) -> Result<CapturedFrame>;

    /// 释放底层硬件轨道
    fn stop_tracks(&mut self);
}

/// 基于 nokhwa 的摄像头后端
pub struct WebcamBackend {
    device_index: u32,
}

impl WebcamBackend {
    /// 创建指定设备序号的后端
    pub fn new(device_index: u32) -> Self {
        Self { device_index }
    }
}

#[async_trait]
impl CaptureBackend for WebcamBackend {
    async fn open(&self, constraints: CaptureConstraints) -> Result<Box<dyn CaptureStream>> {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let ready = Arc::new(AtomicBool::new(false));
        let latest = Arc::new(Mutex::new(None));
        let (init_tx, init_rx) = tokio::sync::oneshot::channel();

        let device_index = self.device_index;
        let thread = {
            let stop_signal = stop_signal.clone();
            let ready = ready.clone();
            let latest = latest.clone();
            thread::Builder::new()
                .name("webcam-capture".to_string())
                .spawn(move || {
                    capture_loop(device_index, constraints, init_tx, stop_signal, ready, latest)
                })?
        };

        let dimensions = match init_rx.await {
            Ok(Ok(dims)) => dims,
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow!("采集线程在初始化前退出")),
        };
        info!("摄像头已打开: {}x{}", dimensions.0, dimensions.1);

        Ok(Box::new(WebcamStream {
            dimensions,
            stop_signal,
            ready,
            latest,
            thread: Some(thread),
        }))
    }
}

/// 采集线程主循环：打开设备后持续刷新最新一帧
fn capture_loop(
    device_index: u32,
    constraints: CaptureConstraints,
    init_tx: tokio::sync::oneshot::Sender<Result<(u32, u32)>>,
    stop_signal: Arc<AtomicBool>,
    ready: Arc<AtomicBool>,
    latest: Arc<Mutex<Option<RgbImage>>>,
) {
    use nokhwa::pixel_format::RgbFormat;
    use nokhwa::utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    };
    use nokhwa::Camera;

    // MJPEG优先，驱动不支持时回退到未压缩格式
    let target = CameraFormat::new(
        Resolution::new(constraints.width, constraints.height),
        FrameFormat::MJPEG,
        30,
    );
    let requested = RequestedFormat::with_formats(
        RequestedFormatType::Closest(target),
        &[FrameFormat::MJPEG, FrameFormat::YUYV, FrameFormat::RAWRGB],
    );

    let mut camera = match Camera::new(CameraIndex::Index(device_index), requested) {
        Ok(camera) => camera,
        Err(e) => {
            let _ = init_tx.send(Err(anyhow!("打开摄像头失败: {}", e)));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = init_tx.send(Err(anyhow!("打开摄像头数据流失败: {}", e)));
        return;
    }

    let resolution = camera.resolution();
    if init_tx
        .send(Ok((resolution.width(), resolution.height())))
        .is_err()
    {
        // 调用方已放弃等待
        let _ = camera.stop_stream();
        return;
    }

    while !stop_signal.load(Ordering::Relaxed) {
        match camera.frame() {
            Ok(buffer) => match buffer.decode_image::<RgbFormat>() {
                Ok(image) => {
                    if let Ok(mut slot) = latest.lock() {
                        *slot = Some(image);
                    }
                    ready.store(true, Ordering::Release);
                }
                Err(e) => warn!("解码摄像头帧失败: {}", e),
            },
            Err(e) => {
                warn!("读取摄像头帧失败: {}", e);
                thread::sleep(std::time::Duration::from_millis(50));
            }
        }
    }

    if let Err(e) = camera.stop_stream() {
        warn!("停止摄像头数据流失败: {}", e);
    }
    trace!("采集线程已退出");
}

/// nokhwa 采集流的句柄，实际采集在专用线程中进行
pub struct WebcamStream {
    dimensions: (u32, u32),
    stop_signal: Arc<AtomicBool>,
    ready: Arc<AtomicBool>,
    latest: Arc<Mutex<Option<RgbImage>>>,
    thread: Option<thread::JoinHandle<()>>,
}

#[async_trait]
impl CaptureStream for WebcamStream {
    async fn wait_for_dimensions(&mut self) -> Result<(u32, u32)> {
        // 打开设备时即已拿到原生尺寸
        Ok(self.dimensions)
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn grab_frame(&mut self) -> Result<CapturedFrame> {
        let image = self
            .latest
            .lock()
            .map_err(|_| anyhow!("帧缓冲锁已失效"))?
            .clone()
            .ok_or_else(|| anyhow!("尚无可用帧"))?;
        Ok(CapturedFrame {
            timestamp: Utc::now(),
            image,
        })
    }

    fn stop_tracks(&mut self) {
        self.stop_signal.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for WebcamStream {
    fn drop(&mut self) {
        self.stop_signal.store(true, Ordering::Relaxed);
    }
}

/// 离屏渲染表面 - 帧在编码前先绘制到这里
///
/// 尺寸在采集开始时按设备原生尺寸确定，之后保持不变
pub struct RenderSurface {
    width: u32,
    height: u32,
    canvas: RgbImage,
}

impl RenderSurface {
    /// 创建指定尺寸的渲染表面
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            canvas: RgbImage::new(width, height),
        }
    }

    /// 表面宽度
    pub fn width(&self) -> u32 {
        self.width
    }

    /// 表面高度
    pub fn height(&self) -> u32 {
        self.height
    }

    /// 将图像绘制到表面上，尺寸不一致时缩放到表面大小
    pub fn draw_image(&mut self, source: &RgbImage) {
        if source.width() == self.width && source.height() == self.height {
            self.canvas.copy_from_slice(source.as_raw());
        } else {
            self.canvas = image::imageops::resize(
                source,
                self.width,
                self.height,
                image::imageops::FilterType::Lanczos3,
            );
        }
    }

    /// 编码为JPEG并包装成data URL
    pub fn to_jpeg_data_url(&self, quality: u8) -> Result<String> {
        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
        encoder.encode(
            self.canvas.as_raw(),
            self.width,
            self.height,
            image::ColorType::Rgb8,
        )?;

        Ok(format!(
            "data:image/jpeg;base64,{}",
            general_purpose::STANDARD.encode(&buf)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, image::Rgb(rgb))
    }

    #[test]
    fn test_data_url_is_jpeg() {
        let mut surface = RenderSurface::new(8, 8);
        surface.draw_image(&solid_image(8, 8, [120, 30, 200]));

        let data_url = surface.to_jpeg_data_url(80).unwrap();
        let encoded = data_url
            .strip_prefix("data:image/jpeg;base64,")
            .expect("data URL前缀缺失");

        let bytes = general_purpose::STANDARD.decode(encoded).unwrap();
        // JPEG魔数
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_draw_image_resizes_mismatched_source() {
        let mut surface = RenderSurface::new(4, 4);
        surface.draw_image(&solid_image(16, 16, [10, 20, 30]));

        assert_eq!(surface.width(), 4);
        assert_eq!(surface.height(), 4);
        assert!(surface.to_jpeg_data_url(80).is_ok());
    }
}
