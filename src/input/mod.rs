// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 视频输入系统 (Frame Source)
///
/// - ImageSource: 单张图片, 只产出一帧
/// - Camera:      本地摄像头 (OpenCV videoio), 读失败即视为流结束
#[cfg(feature = "opencv")]
pub mod camera;

#[cfg(feature = "opencv")]
pub use camera::Camera;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbImage;

use crate::error::PipelineError;

/// 帧来源
pub trait FrameSource {
    /// 读取下一帧; `Ok(None)` 表示流结束
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        (**self).next_frame()
    }
}

/// 单张图片
#[derive(Debug)]
pub struct ImageSource {
    path: PathBuf,
    done: bool,
}

impl ImageSource {
    /// 文件不存在时返回 `PipelineError::MissingImage`, 此时尚未解码任何数据
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::MissingImage(path.to_path_buf()));
        }
        Ok(Self {
            path: path.to_path_buf(),
            done: false,
        })
    }
}

impl FrameSource for ImageSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;
        let img = image::open(&self.path)
            .with_context(|| format!("Failed to decode image {}", self.path.display()))?;
        Ok(Some(img.to_rgb8()))
    }
}
