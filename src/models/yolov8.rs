// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// YOLOv8 检测模型
// 包含: 预处理(letterbox)、后处理(解码 + NMS)、基于 OrtBackend 的完整模型

use anyhow::{bail, Result};
use image::{imageops, RgbImage};
use ndarray::{s, Array, Axis, IxDyn};
use regex::Regex;

use crate::config::{IOU_THRESHOLD, MAX_DETECTIONS};
use crate::detection::{BBox, Detection};

/// letterbox 填充值
const PAD_VALUE: f32 = 144.0 / 255.0;
const CXYWH_OFFSET: usize = 4;

/// 解码阶段的候选框 (浮点, 原图坐标)
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub class_id: usize,
    pub confidence: f32,
}

impl Candidate {
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.) * (self.y2 - self.y1).max(0.)
    }

    pub fn intersection_area(&self, another: &Candidate) -> f32 {
        let l = self.x1.max(another.x1);
        let r = self.x2.min(another.x2);
        let t = self.y1.max(another.y1);
        let b = self.y2.min(another.y2);
        (r - l).max(0.) * (b - t).max(0.)
    }

    pub fn iou(&self, another: &Candidate) -> f32 {
        let inter = self.intersection_area(another);
        let union = self.area() + another.area() - inter;
        if union <= 0. {
            0.
        } else {
            inter / union
        }
    }

    fn into_detection(self) -> Detection {
        Detection::new(
            self.class_id,
            self.confidence,
            BBox::from_xyxy(self.x1, self.y1, self.x2, self.y2),
        )
    }
}

/// 按类别做 NMS, 结果按置信度降序
pub fn non_max_suppression(xs: &mut Vec<Candidate>, iou_threshold: f32) {
    xs.sort_by(|b1, b2| b2.confidence.total_cmp(&b1.confidence));

    let mut current_index = 0;
    for index in 0..xs.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            if xs[prev_index].class_id == xs[index].class_id
                && xs[prev_index].iou(&xs[index]) > iou_threshold
            {
                drop = true;
                break;
            }
        }
        if !drop {
            xs.swap(current_index, index);
            current_index += 1;
        }
    }
    xs.truncate(current_index);
}

/// 等比缩放: 返回 (比例, 新宽, 新高)
pub fn scale_wh(w0: f32, h0: f32, w1: f32, h1: f32) -> (f32, f32, f32) {
    let r = (w1 / w0).min(h1 / h0);
    (r, (w0 * r).round(), (h0 * r).round())
}

/// 预处理: RGB 图片 → NCHW 张量 (1, 3, height, width)
///
/// 等比缩放后贴在左上角, 其余区域用固定值填充, 像素归一化到 [0, 1]。
pub fn letterbox(image: &RgbImage, width: u32, height: u32) -> Array<f32, IxDyn> {
    let mut ys = Array::ones((1, 3, height as usize, width as usize)).into_dyn();
    ys.fill(PAD_VALUE);

    let (w0, h0) = image.dimensions();
    let (_, w_new, h_new) = scale_wh(w0 as f32, h0 as f32, width as f32, height as f32);
    let w_new = (w_new as u32).clamp(1, width);
    let h_new = (h_new as u32).clamp(1, height);
    let img = imageops::resize(image, w_new, h_new, imageops::FilterType::Triangle);

    for (x, y, rgb) in img.enumerate_pixels() {
        let x = x as usize;
        let y = y as usize;
        let [r, g, b] = rgb.0;
        ys[[0, 0, y, x]] = (r as f32) / 255.0;
        ys[[0, 1, y, x]] = (g as f32) / 255.0;
        ys[[0, 2, y, x]] = (b as f32) / 255.0;
    }
    ys
}

/// 解析 ultralytics 导出时写入 metadata 的类别表, 形如 `{0: 'person', 1: 'bicycle'}`
pub fn parse_names(raw: &str) -> Vec<String> {
    let re = match Regex::new(r#"(\d+)\s*:\s*['"]([^'"]*)['"]"#) {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    let mut pairs: Vec<(usize, String)> = re
        .captures_iter(raw)
        .filter_map(|c| Some((c[1].parse().ok()?, c[2].to_string())))
        .collect();
    pairs.sort_by_key(|(id, _)| *id);
    pairs.into_iter().map(|(_, name)| name).collect()
}

/// YOLOv8 后处理配置
#[derive(Debug, Clone)]
pub struct YOLOv8Config {
    /// 模型输入宽
    pub width: usize,
    /// 模型输入高
    pub height: usize,
    pub iou: f32,
    pub max_det: usize,
}

impl YOLOv8Config {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            iou: IOU_THRESHOLD,
            max_det: MAX_DETECTIONS,
        }
    }
}

/// YOLOv8 检测头后处理器
pub struct YOLOv8Postprocessor {
    config: YOLOv8Config,
}

impl YOLOv8Postprocessor {
    pub fn new(config: YOLOv8Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &YOLOv8Config {
        &self.config
    }

    /// 解码模型输出 `[1, 4 + nc, anchors]`
    ///
    /// `original` 为原图 (宽, 高), 用于坐标还原与裁剪。
    pub fn postprocess(
        &self,
        preds: &Array<f32, IxDyn>,
        original: (u32, u32),
        conf: f32,
    ) -> Result<Vec<Detection>> {
        if preds.ndim() != 3 || preds.shape()[0] == 0 || preds.shape()[1] <= CXYWH_OFFSET {
            bail!("Unexpected YOLOv8 output shape {:?}", preds.shape());
        }

        let width_original = original.0 as f32;
        let height_original = original.1 as f32;
        let ratio = (self.config.width as f32 / width_original)
            .min(self.config.height as f32 / height_original);

        let anchor = preds.index_axis(Axis(0), 0);
        let mut data: Vec<Candidate> = Vec::new();
        for pred in anchor.axis_iter(Axis(1)) {
            let bbox = pred.slice(s![0..CXYWH_OFFSET]);
            let clss = pred.slice(s![CXYWH_OFFSET..]);

            let Some((id, &confidence)) = clss
                .iter()
                .enumerate()
                .reduce(|max, x| if x.1 > max.1 { x } else { max })
            else {
                continue;
            };

            if confidence <= conf {
                continue;
            }

            let cx = bbox[0] / ratio;
            let cy = bbox[1] / ratio;
            let w = bbox[2] / ratio;
            let h = bbox[3] / ratio;
            data.push(Candidate {
                x1: (cx - w / 2.).clamp(0., width_original),
                y1: (cy - h / 2.).clamp(0., height_original),
                x2: (cx + w / 2.).clamp(0., width_original),
                y2: (cy + h / 2.).clamp(0., height_original),
                class_id: id,
                confidence,
            });
        }

        non_max_suppression(&mut data, self.config.iou);
        data.truncate(self.config.max_det);

        Ok(data.into_iter().map(Candidate::into_detection).collect())
    }
}

#[cfg(feature = "onnx")]
pub use model::YOLOv8;

#[cfg(feature = "onnx")]
mod model {
    use std::time::Instant;

    use anyhow::{Context, Result};
    use image::RgbImage;

    use super::{letterbox, YOLOv8Config, YOLOv8Postprocessor};
    use crate::detection::{Detection, Detector};
    use crate::{OrtBackend, OrtConfig, OrtEP};

    /// YOLOv8 完整模型: 预处理 → ONNX 推理 → 后处理
    pub struct YOLOv8 {
        engine: OrtBackend,
        postprocessor: YOLOv8Postprocessor,
        profile: bool,
    }

    impl YOLOv8 {
        /// 加载模型 (进程内只调用一次)
        pub fn new(config: OrtConfig, iou: f32, profile: bool) -> Result<Self> {
            let engine = OrtBackend::build(config)?;
            let mut pp_config =
                YOLOv8Config::new(engine.width() as usize, engine.height() as usize);
            pp_config.iou = iou;

            Ok(Self {
                engine,
                postprocessor: YOLOv8Postprocessor::new(pp_config),
                profile,
            })
        }

        pub fn run(&mut self, image: &RgbImage, conf: f32) -> Result<Vec<Detection>> {
            let t_pre = Instant::now();
            let xs = letterbox(image, self.engine.width(), self.engine.height());
            if self.profile {
                log::info!("[Model Preprocess]: {:?}", t_pre.elapsed());
            }

            let t_run = Instant::now();
            let ys = self.engine.run(xs, self.profile)?;
            if self.profile {
                log::info!("[Model Inference]: {:?}", t_run.elapsed());
            }

            let t_post = Instant::now();
            let preds = ys.first().context("Model produced no outputs")?;
            let detections = self
                .postprocessor
                .postprocess(preds, image.dimensions(), conf)?;
            if self.profile {
                log::info!("[Model Postprocess]: {:?}", t_post.elapsed());
            }

            Ok(detections)
        }

        pub fn summary(&self) {
            log::info!(
                "Summary: EP: {:?}{} | Dtype: {:?} | Height: {} ({}) | Width: {} ({}) | nc: {} | iou: {}{}",
                self.engine.ep(),
                if let OrtEP::CPU = self.engine.ep() {
                    ""
                } else {
                    " (May still fall back to CPU)"
                },
                self.engine.dtype(),
                self.engine.height(),
                if self.engine.is_height_dynamic() { "Dynamic" } else { "Const" },
                self.engine.width(),
                if self.engine.is_width_dynamic() { "Dynamic" } else { "Const" },
                self.engine.names().len(),
                self.postprocessor.config().iou,
                match self.engine.author().zip(self.engine.version()) {
                    Some((author, ver)) => format!(" | {} {}", author, ver),
                    None => String::new(),
                },
            );
        }
    }

    impl Detector for YOLOv8 {
        fn detect(&mut self, image: &RgbImage, conf: f32) -> Result<Vec<Detection>> {
            self.run(image, conf)
        }
    }
}
