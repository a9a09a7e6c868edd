// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 模型实现
///
/// ## YOLOv8
/// - 预处理 (letterbox) 与后处理 (解码 + 按类别 NMS) 为纯 ndarray 计算, 不依赖推理引擎
/// - `YOLOv8` 完整模型需要 `onnx` 特性: 加载 → 预处理 → OrtBackend 推理 → 后处理
///
/// ## 使用示例
/// ```ignore
/// use yolov8_person::{Detector, OrtConfig, YOLOv8};
///
/// let mut model = YOLOv8::new(OrtConfig::from(&args.model), args.model.iou, false)?;
/// let detections = model.detect(&image, 0.5)?;
/// ```
pub mod yolov8;

pub use yolov8::{YOLOv8Config, YOLOv8Postprocessor};

#[cfg(feature = "onnx")]
pub use yolov8::YOLOv8;
