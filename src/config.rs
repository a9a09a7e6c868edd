// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 运行参数
//!
//! 所有默认值都是常量; 命令行参数只是覆盖这些常量,不带参数运行时行为完全一致。

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser};

// ========== 默认常量 ==========

/// 默认待检测图片
pub const DEFAULT_IMAGE_PATH: &str = "person.jpg";
/// 默认摄像头索引
pub const DEFAULT_CAMERA_INDEX: i32 = 0;
/// 默认模型 (yolov8n.pt 导出的 ONNX)
pub const DEFAULT_MODEL_PATH: &str = "yolov8n.onnx";
/// 置信度阈值
pub const CONF_THRESHOLD: f32 = 0.5;
/// NMS IOU 阈值
pub const IOU_THRESHOLD: f32 = 0.7;
/// 单帧最多保留的检测框
pub const MAX_DETECTIONS: usize = 300;
/// 模型输入尺寸 (动态输入时使用)
pub const INF_SIZE: u32 = 640;

/// COCO 数据集中 person 的类别 ID
pub const PERSON_CLASS_ID: usize = 0;
/// 框与标签颜色 (RGB 绿色)
pub const BOX_COLOR: [u8; 3] = [0, 255, 0];
/// 框线宽 (像素)
pub const BOX_THICKNESS: u32 = 2;
/// 标签基线距离框左上角的高度
pub const LABEL_OFFSET: i32 = 10;
/// 标签字号 (像素)
pub const LABEL_SCALE: f32 = 16.0;

/// 图片模式窗口名
pub const IMAGE_WINDOW: &str = "Human Detection";
/// 视频模式窗口名
pub const VIDEO_WINDOW: &str = "Live Human Detection";
/// 视频模式退出键
pub const QUIT_KEY: char = 'q';
/// 视频模式按键轮询 (毫秒)
pub const KEY_POLL_MS: i32 = 1;

// ========== 命令行参数 ==========

/// 模型相关参数 (两个程序共用)
#[derive(ClapArgs, Debug, Clone)]
pub struct ModelArgs {
    /// ONNX 模型路径
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// 置信度阈值
    #[arg(long, default_value_t = CONF_THRESHOLD)]
    pub conf: f32,

    /// NMS IOU 阈值
    #[arg(long, default_value_t = IOU_THRESHOLD)]
    pub iou: f32,

    /// 模型输入宽度 (仅动态输入模型生效)
    #[arg(long)]
    pub width: Option<u32>,

    /// 模型输入高度 (仅动态输入模型生效)
    #[arg(long)]
    pub height: Option<u32>,

    /// 使用 CUDA
    #[arg(long)]
    pub cuda: bool,

    /// 使用 TensorRT
    #[arg(long)]
    pub trt: bool,

    /// TensorRT 使用 FP16
    #[arg(long)]
    pub fp16: bool,

    /// GPU 设备号
    #[arg(long, default_value_t = 0)]
    pub device_id: i32,

    /// 标签字体 (TTF/OTF), 不指定时自动查找系统字体
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// 打印模型信息与各阶段耗时
    #[arg(long)]
    pub verbose: bool,
}

/// 图片检测参数
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Detect people in a single image", long_about = None)]
pub struct ImageArgs {
    /// 输入图片
    #[arg(short, long, default_value = DEFAULT_IMAGE_PATH)]
    pub source: PathBuf,

    #[command(flatten)]
    pub model: ModelArgs,
}

/// 摄像头实时检测参数
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Detect people in a live camera feed", long_about = None)]
pub struct VideoArgs {
    /// 摄像头索引
    #[arg(short, long, default_value_t = DEFAULT_CAMERA_INDEX)]
    pub camera: i32,

    #[command(flatten)]
    pub model: ModelArgs,
}
