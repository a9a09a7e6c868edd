// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 检测系统 (Detection System)
///
/// - Detector: 检测能力接口,给定图片与置信度阈值返回检测框
/// - types:    检测框/检测结果
pub mod types;

pub use types::{BBox, Detection};

use anyhow::Result;
use image::RgbImage;

/// 检测器接口
///
/// 每帧独立调用,不保留跨帧状态。具体实现见 `models::YOLOv8`。
pub trait Detector {
    /// 检测 `image` 中置信度不低于 `conf` 的目标
    fn detect(&mut self, image: &RgbImage, conf: f32) -> Result<Vec<Detection>>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn detect(&mut self, image: &RgbImage, conf: f32) -> Result<Vec<Detection>> {
        (**self).detect(image, conf)
    }
}

impl<D: Detector + ?Sized> Detector for &mut D {
    fn detect(&mut self, image: &RgbImage, conf: f32) -> Result<Vec<Detection>> {
        (**self).detect(image, conf)
    }
}
