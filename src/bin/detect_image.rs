// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 图片人体检测
//!
//! 读取一张图片 (默认 person.jpg), 画出所有 person 的框与置信度,
//! 在 "Human Detection" 窗口中显示, 任意键关闭。

use anyhow::Result;
use clap::Parser;
use yolov8_person::config::IMAGE_WINDOW;
use yolov8_person::{
    image_session, Annotator, HighguiWindow, ImageArgs, ImageSource, OrtConfig, Pipeline, YOLOv8,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = ImageArgs::parse();

    let mut window = HighguiWindow::new(IMAGE_WINDOW);
    image_session(
        || ImageSource::open(&args.source),
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
        &mut window,
    )?;

    Ok(())
}
