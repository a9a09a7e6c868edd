// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 摄像头输入模块
//!
//! OpenCV videoio 打开本地摄像头, 逐帧同步读取 (BGR → RGB)。
//! 设备在 Drop 时释放, 无论循环是正常结束、按键退出还是出错返回。

use anyhow::{bail, Result};
use image::RgbImage;
use opencv::core::{Mat, CV_8UC3};
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

use super::FrameSource;
use crate::error::PipelineError;

pub struct Camera {
    index: i32,
    cap: VideoCapture,
    frame: Mat,
}

impl Camera {
    /// 打开摄像头, 失败返回 `PipelineError::CameraUnavailable`
    pub fn open(index: i32) -> Result<Self, PipelineError> {
        let cap = match VideoCapture::new(index, videoio::CAP_ANY) {
            Ok(cap) => cap,
            Err(e) => {
                log::debug!("VideoCapture::new({}) failed: {}", index, e);
                return Err(PipelineError::CameraUnavailable(index));
            }
        };
        if !cap.is_opened().unwrap_or(false) {
            return Err(PipelineError::CameraUnavailable(index));
        }
        Ok(Self {
            index,
            cap,
            frame: Mat::default(),
        })
    }
}

impl FrameSource for Camera {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        match self.cap.read(&mut self.frame) {
            Ok(true) if !self.frame.empty() => {}
            Ok(_) => {
                log::debug!("camera {}: no more frames", self.index);
                return Ok(None);
            }
            Err(e) => {
                log::debug!("camera {}: read failed: {}", self.index, e);
                return Ok(None);
            }
        }
        mat_to_rgb(&self.frame).map(Some)
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        if let Err(e) = self.cap.release() {
            log::warn!("camera {}: release failed: {}", self.index, e);
        } else {
            log::debug!("camera {} released", self.index);
        }
    }
}

/// BGR Mat → RgbImage
pub fn mat_to_rgb(mat: &Mat) -> Result<RgbImage> {
    if mat.typ() != CV_8UC3 {
        bail!("Unsupported frame type {}", mat.typ());
    }
    let width = mat.cols() as u32;
    let height = mat.rows() as u32;
    let owned;
    let mat = if mat.is_continuous() {
        mat
    } else {
        owned = mat.try_clone()?;
        &owned
    };
    let bgr = mat.data_bytes()?;
    let mut rgb = Vec::with_capacity(bgr.len());
    for px in bgr.chunks_exact(3) {
        rgb.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    match RgbImage::from_raw(width, height, rgb) {
        Some(img) => Ok(img),
        None => bail!("Frame buffer does not match {}x{}", width, height),
    }
}
