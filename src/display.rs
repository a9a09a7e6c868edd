// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 显示窗口

use anyhow::Result;
use image::RgbImage;

/// 显示面
///
/// `wait_key` 与 OpenCV 语义一致: `delay_ms <= 0` 一直阻塞到按键,
/// 返回按键码, 超时返回 -1。
pub trait Display {
    fn show(&mut self, frame: &RgbImage) -> Result<()>;
    fn wait_key(&mut self, delay_ms: i32) -> Result<i32>;
    /// 关闭所有窗口
    fn close(&mut self) -> Result<()>;
}

impl<D: Display + ?Sized> Display for Box<D> {
    fn show(&mut self, frame: &RgbImage) -> Result<()> {
        (**self).show(frame)
    }

    fn wait_key(&mut self, delay_ms: i32) -> Result<i32> {
        (**self).wait_key(delay_ms)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// 按键码是否等于 `key` (只比较低 8 位)
pub fn is_key(code: i32, key: char) -> bool {
    code >= 0 && (code & 0xFF) == key as i32
}

#[cfg(feature = "opencv")]
pub use highgui_window::HighguiWindow;

#[cfg(feature = "opencv")]
mod highgui_window {
    use anyhow::{bail, Result};
    use image::RgbImage;
    use opencv::core::Mat;
    use opencv::highgui;
    use opencv::prelude::*;

    use super::Display;

    /// OpenCV highgui 命名窗口, 首次 show 时创建
    pub struct HighguiWindow {
        name: String,
        created: bool,
    }

    impl HighguiWindow {
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                created: false,
            }
        }
    }

    impl Display for HighguiWindow {
        fn show(&mut self, frame: &RgbImage) -> Result<()> {
            if !self.created {
                highgui::named_window(&self.name, highgui::WINDOW_AUTOSIZE)?;
                self.created = true;
            }
            let mat = rgb_to_mat(frame)?;
            highgui::imshow(&self.name, &mat)?;
            Ok(())
        }

        fn wait_key(&mut self, delay_ms: i32) -> Result<i32> {
            Ok(highgui::wait_key(delay_ms)?)
        }

        fn close(&mut self) -> Result<()> {
            if self.created {
                highgui::destroy_all_windows()?;
                self.created = false;
            }
            Ok(())
        }
    }

    /// RgbImage → BGR Mat
    fn rgb_to_mat(frame: &RgbImage) -> Result<Mat> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            bail!("Cannot show an empty frame");
        }
        let mut bgr = Vec::with_capacity(frame.as_raw().len());
        for px in frame.as_raw().chunks_exact(3) {
            bgr.extend_from_slice(&[px[2], px[1], px[0]]);
        }
        let flat = Mat::from_slice(&bgr)?;
        let mat = flat.reshape(3, height as i32)?.try_clone()?;
        Ok(mat)
    }
}
