// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 摄像头实时人体检测
//!
//! 打开摄像头 (默认 0), 逐帧检测并在 "Live Human Detection" 窗口显示,
//! 按 'q' 退出; 读帧失败视为视频结束。

use anyhow::Result;
use clap::Parser;
use yolov8_person::config::VIDEO_WINDOW;
use yolov8_person::{
    video_session, Annotator, Camera, HighguiWindow, OrtConfig, Pipeline, VideoArgs, YOLOv8,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = VideoArgs::parse();

    let mut window = HighguiWindow::new(VIDEO_WINDOW);
    // 模型只加载一次, 交给流水线
    video_session(
        || {
            let model = YOLOv8::new(
                OrtConfig::from(&args.model),
                args.model.iou,
                args.model.verbose,
            )?;
            if args.model.verbose {
                model.summary();
            }
            let annotator = Annotator::with_font_path(args.model.font.as_deref())?;
            Ok(Pipeline::new(model, annotator, args.model.conf))
        },
        || Camera::open(args.camera),
        &mut window,
    )?;

    Ok(())
}
