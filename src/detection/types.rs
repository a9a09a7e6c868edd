// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 检测数据结构定义

use crate::config::PERSON_CLASS_ID;

/// 检测框 (像素坐标, 左上 → 右下)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 浮点坐标截断为整数 (向零取整)
    pub fn from_xyxy(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1: x1 as i32,
            y1: y1 as i32,
            x2: x2 as i32,
            y2: y2 as i32,
        }
    }
}

/// 单个检测结果
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: BBox,
}

impl Detection {
    pub fn new(class_id: usize, confidence: f32, bbox: BBox) -> Self {
        Self {
            class_id,
            confidence,
            bbox,
        }
    }

    pub fn is_person(&self) -> bool {
        self.class_id == PERSON_CLASS_ID
    }
}
