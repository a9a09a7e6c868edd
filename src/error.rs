// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::PathBuf;

/// 可预期的输入错误,调用方据此决定是否优雅退出
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Error: The image file '{}' was not found.", .0.display())]
    MissingImage(PathBuf),

    #[error("Error: Could not open webcam.")]
    CameraUnavailable(i32),
}

impl PipelineError {
    /// 给用户的补充提示
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            PipelineError::MissingImage(_) => Some(
                "Please make sure you have an image file in the same folder and have updated the image path.",
            ),
            PipelineError::CameraUnavailable(_) => None,
        }
    }

    /// 打印到标准输出
    pub fn report(&self) {
        println!("{}", self);
        if let Some(hint) = self.hint() {
            println!("{}", hint);
        }
    }
}
