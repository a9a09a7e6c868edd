// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! ONNX Runtime 推理后端

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use half::f16;
use ndarray::{Array, IxDyn};
use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch,
    TensorRTExecutionProvider,
};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::tensor::TensorElementType;
use ort::value::Tensor;

use crate::config::{ModelArgs, INF_SIZE};
use crate::models::yolov8::parse_names;

/// 执行设备
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrtEP {
    CPU,
    CUDA(i32),
    Trt(i32),
}

/// 后端构建参数
#[derive(Debug, Clone)]
pub struct OrtConfig {
    pub f: PathBuf,
    pub ep: OrtEP,
    pub trt_fp16: bool,
    /// (height, width), 仅对动态输入生效
    pub image_size: (Option<u32>, Option<u32>),
}

impl From<&ModelArgs> for OrtConfig {
    fn from(args: &ModelArgs) -> Self {
        let ep = if args.trt {
            OrtEP::Trt(args.device_id)
        } else if args.cuda {
            OrtEP::CUDA(args.device_id)
        } else {
            OrtEP::CPU
        };
        Self {
            f: args.model.clone(),
            ep,
            trt_fp16: args.fp16,
            image_size: (args.height, args.width),
        }
    }
}

pub struct OrtBackend {
    session: Session,
    ep: OrtEP,
    dtype: TensorElementType,
    height: u32,
    width: u32,
    height_dynamic: bool,
    width_dynamic: bool,
    names: Vec<String>,
    author: Option<String>,
    version: Option<String>,
}

impl OrtBackend {
    pub fn build(config: OrtConfig) -> Result<Self> {
        if !config.f.exists() {
            bail!("Model file '{}' was not found", config.f.display());
        }

        let provider: ExecutionProviderDispatch = match config.ep {
            OrtEP::CPU => CPUExecutionProvider::default().build(),
            OrtEP::CUDA(id) => CUDAExecutionProvider::default().with_device_id(id).build(),
            OrtEP::Trt(id) => TensorRTExecutionProvider::default()
                .with_device_id(id)
                .with_fp16(config.trt_fp16)
                .build(),
        };

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_execution_providers([provider])?
            .commit_from_file(&config.f)
            .with_context(|| format!("Failed to load model '{}'", config.f.display()))?;

        // 输入形状 (N, C, H, W), 非正数表示动态维度
        let input = session.inputs.first().context("Model has no inputs")?;
        let dims = input
            .input_type
            .tensor_dimensions()
            .context("Model input is not a tensor")?
            .clone();
        let dtype = input
            .input_type
            .tensor_type()
            .context("Model input is not a tensor")?;
        if dims.len() != 4 {
            bail!("Expected a 4-d image input, got {:?}", dims);
        }

        let (height, height_dynamic) = match dims[2] {
            h if h > 0 => (h as u32, false),
            _ => (config.image_size.0.unwrap_or(INF_SIZE), true),
        };
        let (width, width_dynamic) = match dims[3] {
            w if w > 0 => (w as u32, false),
            _ => (config.image_size.1.unwrap_or(INF_SIZE), true),
        };

        // ultralytics 导出时写入的自定义元数据
        let (names, author, version) = {
            let metadata = session.metadata()?;
            (
                metadata
                    .custom("names")?
                    .map(|raw| parse_names(&raw))
                    .unwrap_or_default(),
                metadata.custom("author")?,
                metadata.custom("version")?,
            )
        };

        log::debug!(
            "model '{}' loaded: input {:?} {:?}",
            config.f.display(),
            dims,
            dtype
        );

        Ok(Self {
            session,
            ep: config.ep,
            dtype,
            height,
            width,
            height_dynamic,
            width_dynamic,
            names,
            author,
            version,
        })
    }

    /// 前向推理, 返回全部输出 (统一为 f32)
    pub fn run(&self, xs: Array<f32, IxDyn>, profile: bool) -> Result<Vec<Array<f32, IxDyn>>> {
        let t = Instant::now();
        let outputs = match self.dtype {
            TensorElementType::Float16 => {
                let xs = Tensor::from_array(xs.mapv(f16::from_f32))?;
                self.session.run(ort::inputs![xs]?)?
            }
            _ => {
                let xs = Tensor::from_array(xs)?;
                self.session.run(ort::inputs![xs]?)?
            }
        };
        if profile {
            log::info!("[ORT Run]: {:?}", t.elapsed());
        }

        let mut ys = Vec::with_capacity(self.session.outputs.len());
        for output in &self.session.outputs {
            let value = &outputs[output.name.as_str()];
            let y = match value.try_extract_tensor::<f32>() {
                Ok(y) => y.into_owned(),
                Err(_) => value.try_extract_tensor::<f16>()?.mapv(f16::to_f32),
            };
            ys.push(y);
        }
        Ok(ys)
    }

    pub fn ep(&self) -> &OrtEP {
        &self.ep
    }

    pub fn dtype(&self) -> TensorElementType {
        self.dtype
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn is_height_dynamic(&self) -> bool {
        self.height_dynamic
    }

    pub fn is_width_dynamic(&self) -> bool {
        self.width_dynamic
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}
