// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 处理流水线 (Processing Pipeline)
//!
//! 单线程同步: 取帧 → 检测 → 标注 → 显示, 每一步阻塞到完成。
//! - 图片模式: 只处理一帧, 阻塞等待任意按键后关闭窗口
//! - 视频模式: 循环处理, 按 'q' 或读帧失败结束, 先释放摄像头再关闭窗口

use anyhow::Result;
use image::RgbImage;

use crate::config::{KEY_POLL_MS, QUIT_KEY};
use crate::detection::Detector;
use crate::display::{is_key, Display};
use crate::error::PipelineError;
use crate::input::FrameSource;
use crate::renderer::Annotator;

/// 结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 用户按下退出键
    QuitKey,
    /// 帧来源结束 (读帧失败/设备断开)
    EndOfStream,
}

/// 视频会话状态, Stopped 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Stopped(StopReason),
}

impl SessionState {
    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running)
    }
}

/// 会话统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// 已显示的帧数
    pub frames: u64,
    pub reason: StopReason,
}

pub struct Pipeline<D> {
    detector: D,
    annotator: Annotator,
    conf: f32,
}

impl<D: Detector> Pipeline<D> {
    /// 检测器在进程启动时创建一次, 由流水线独占
    pub fn new(detector: D, annotator: Annotator, conf: f32) -> Self {
        Self {
            detector,
            annotator,
            conf,
        }
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// 检测并原地标注, 返回画出的人数
    pub fn process(&mut self, frame: &mut RgbImage) -> Result<usize> {
        let detections = self.detector.detect(frame, self.conf)?;
        self.annotator.annotate(frame, &detections);
        Ok(detections.iter().filter(|d| d.is_person()).count())
    }

    /// 图片模式: 显示一帧, 阻塞到任意按键后关闭窗口
    pub fn run_image<S, W>(&mut self, mut source: S, display: &mut W) -> Result<u64>
    where
        S: FrameSource,
        W: Display,
    {
        let Some(mut frame) = source.next_frame()? else {
            return Ok(0);
        };
        let shown = (|| -> Result<()> {
            let persons = self.process(&mut frame)?;
            log::debug!("{} person(s) detected", persons);
            display.show(&frame)?;
            display.wait_key(0)?;
            Ok(())
        })();
        let closed = display.close();
        shown?;
        closed?;
        Ok(1)
    }

    /// 视频模式: 循环到按 'q' 或帧来源结束
    ///
    /// `source` 按值传入, 函数返回前 (包括出错时) 被释放, 然后关闭窗口。
    pub fn run_video<S, W>(&mut self, mut source: S, display: &mut W) -> Result<SessionSummary>
    where
        S: FrameSource,
        W: Display,
    {
        let result = self.video_loop(&mut source, display);
        drop(source);
        let closed = display.close();
        let summary = result?;
        closed?;
        log::info!(
            "session stopped after {} frame(s): {:?}",
            summary.frames,
            summary.reason
        );
        Ok(summary)
    }

    fn video_loop<S, W>(&mut self, source: &mut S, display: &mut W) -> Result<SessionSummary>
    where
        S: FrameSource,
        W: Display,
    {
        let mut state = SessionState::Running;
        let mut frames = 0u64;

        loop {
            if let SessionState::Stopped(reason) = state {
                return Ok(SessionSummary { frames, reason });
            }
            state = match source.next_frame()? {
                None => SessionState::Stopped(StopReason::EndOfStream),
                Some(mut frame) => {
                    self.process(&mut frame)?;
                    display.show(&frame)?;
                    frames += 1;
                    if is_key(display.wait_key(KEY_POLL_MS)?, QUIT_KEY) {
                        SessionState::Stopped(StopReason::QuitKey)
                    } else {
                        SessionState::Running
                    }
                }
            };
        }
    }
}

/// 图片模式入口
///
/// 先打开图片: 不存在时打印错误并返回 `Ok(None)`, 此时不加载检测器, 窗口也不会打开。
pub fn image_session<S, D, W>(
    open: impl FnOnce() -> Result<S, PipelineError>,
    load: impl FnOnce() -> Result<Pipeline<D>>,
    display: &mut W,
) -> Result<Option<u64>>
where
    S: FrameSource,
    D: Detector,
    W: Display,
{
    let source = match open() {
        Ok(source) => source,
        Err(e) => {
            e.report();
            return Ok(None);
        }
    };
    let mut pipeline = load()?;
    pipeline.run_image(source, display).map(Some)
}

/// 视频模式入口
///
/// 先加载检测器再打开摄像头; 摄像头不可用时打印错误并返回 `Ok(None)`, 不进入帧循环。
pub fn video_session<S, D, W>(
    load: impl FnOnce() -> Result<Pipeline<D>>,
    open: impl FnOnce() -> Result<S, PipelineError>,
    display: &mut W,
) -> Result<Option<SessionSummary>>
where
    S: FrameSource,
    D: Detector,
    W: Display,
{
    let mut pipeline = load()?;
    let source = match open() {
        Ok(source) => source,
        Err(e) => {
            e.report();
            return Ok(None);
        }
    };
    println!("Webcam successfully opened. Press 'q' to exit.");
    pipeline.run_video(source, display).map(Some)
}
