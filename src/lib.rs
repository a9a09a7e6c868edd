// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod config; // 运行参数与默认常量
pub mod detection; // 检测接口与数据结构
pub mod display; // 显示窗口
pub mod error; // 输入错误
pub mod input; // 帧来源 (图片/摄像头)
pub mod models; // 模型实现
pub mod pipeline; // 取帧 → 检测 → 标注 → 显示
pub mod renderer; // 画框与标签

#[cfg(feature = "onnx")]
pub mod ort_backend;

pub use crate::config::{ImageArgs, ModelArgs, VideoArgs};
pub use crate::detection::{BBox, Detection, Detector};
pub use crate::display::Display;
pub use crate::error::PipelineError;
pub use crate::input::{FrameSource, ImageSource};
pub use crate::pipeline::{
    image_session, video_session, Pipeline, SessionState, SessionSummary, StopReason,
};
pub use crate::renderer::Annotator;

#[cfg(feature = "onnx")]
pub use crate::models::YOLOv8;
#[cfg(feature = "onnx")]
pub use crate::ort_backend::{OrtBackend, OrtConfig, OrtEP};

#[cfg(feature = "opencv")]
pub use crate::display::HighguiWindow;
#[cfg(feature = "opencv")]
pub use crate::input::Camera;
