// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 标注器: 在帧上画人体框与置信度标签

use std::path::Path;

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::config::{BOX_COLOR, BOX_THICKNESS, LABEL_OFFSET, LABEL_SCALE};
use crate::detection::{BBox, Detection};

/// 随程序打包的标签字体 (DejaVu Sans)
const BUNDLED_FONT: &[u8] = include_bytes!("../assets/font/DejaVuSans.ttf");

/// 标签文本, 置信度保留两位小数
pub fn person_label(confidence: f32) -> String {
    format!("Person {:.2}", confidence)
}

pub struct Annotator {
    font: Option<FontVec>,
    color: Rgb<u8>,
    thickness: u32,
    scale: PxScale,
}

/// 不带字体, 只画框
impl Default for Annotator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Annotator {
    pub fn new(font: Option<FontVec>) -> Self {
        Self {
            font,
            color: Rgb(BOX_COLOR),
            thickness: BOX_THICKNESS,
            scale: PxScale::from(LABEL_SCALE),
        }
    }

    /// 加载指定字体; 未指定时使用打包的 DejaVu Sans
    pub fn with_font_path(path: Option<&Path>) -> Result<Self> {
        let font = match path {
            Some(path) => load_font(path)?,
            None => FontVec::try_from_vec(BUNDLED_FONT.to_vec())
                .context("Invalid bundled label font")?,
        };
        Ok(Self::new(Some(font)))
    }

    /// 只处理 person, 其余类别不改动画面
    pub fn annotate(&self, frame: &mut RgbImage, detections: &[Detection]) {
        for det in detections.iter().filter(|d| d.is_person()) {
            self.draw_box(frame, &det.bbox);
            self.draw_label(frame, &det.bbox, &person_label(det.confidence));
        }
    }

    fn draw_box(&self, frame: &mut RgbImage, bbox: &BBox) {
        let (left, right) = (bbox.x1.min(bbox.x2), bbox.x1.max(bbox.x2));
        let (top, bottom) = (bbox.y1.min(bbox.y2), bbox.y1.max(bbox.y2));
        for i in 0..self.thickness as i32 {
            let w = right - left + 1 - 2 * i;
            let h = bottom - top + 1 - 2 * i;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(left + i, top + i).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(frame, rect, self.color);
        }
    }

    fn draw_label(&self, frame: &mut RgbImage, bbox: &BBox, text: &str) {
        let Some(font) = &self.font else {
            return;
        };
        // draw_text 的 y 是文本顶部, 基线在其下方 ascent 处
        let ascent = font.as_scaled(self.scale).ascent().ceil() as i32;
        let y = bbox.y1 - LABEL_OFFSET - ascent;
        draw_text_mut(frame, self.color, bbox.x1, y, self.scale, font, text);
    }
}

fn load_font(path: &Path) -> Result<FontVec> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read font {}", path.display()))?;
    FontVec::try_from_vec(bytes).with_context(|| format!("Invalid font {}", path.display()))
}
