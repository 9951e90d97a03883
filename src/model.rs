// 该文件是 Yaogan （遥感） 项目的一部分。
// src/model.rs - 检测模型
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use serde::Deserialize;
use thiserror::Error;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

impl<M: Model + ?Sized> Model for &M {
  type Input = M::Input;
  type Output = M::Output;
  type Error = M::Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    (**self).infer(input)
  }
}

/// 推理服务返回的一个原始检测结果（像素坐标）
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DetectItem {
  #[serde(rename = "class")]
  pub class_id: i64,
  pub confidence: f64,
  #[serde(rename = "box")]
  pub bbox: [f64; 4], // [x1, y1, x2, y2]
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectResult {
  pub items: Box<[DetectItem]>,
}

impl DetectResult {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

impl From<Vec<DetectItem>> for DetectResult {
  fn from(items: Vec<DetectItem>) -> Self {
    DetectResult {
      items: items.into_boxed_slice(),
    }
  }
}

#[derive(Deserialize)]
struct PredictResponse {
  detections: Vec<DetectItem>,
}

/// 解析推理服务响应体 `{"detections": [{"box": [..], "class": .., "confidence": ..}]}`
pub fn parse_response(body: &str) -> Result<DetectResult, DetectionError> {
  let response: PredictResponse = serde_json::from_str(body)?;
  Ok(response.detections.into())
}

/// 单次推理请求失败，总是可以重试
#[derive(Error, Debug)]
pub enum AttemptError {
  #[error("传输错误: {0}")]
  Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("推理服务返回错误状态: {status} - {body}")]
  Status { status: u16, body: String },
}

impl From<reqwest::Error> for AttemptError {
  fn from(err: reqwest::Error) -> Self {
    AttemptError::Transport(Box::new(err))
  }
}

#[derive(Error, Debug)]
pub enum DetectionError {
  #[error("重试 {attempts} 次后仍然失败, 最后错误: {last}")]
  RetriesExhausted {
    attempts: u32,
    #[source]
    last: AttemptError,
  },
  #[error("推理响应格式错误: {0}")]
  MalformedResponse(#[from] serde_json::Error),
  #[error("图像编码错误: {0}")]
  Encode(#[from] image::ImageError),
}

/// 检测器构造错误
#[derive(Error, Debug)]
pub enum ModelError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("HTTP 客户端创建失败: {0}")]
  Client(#[from] reqwest::Error),
}

mod remote;
mod retry;
pub use self::remote::{HttpTransport, PredictTransport, RemoteDetector, RemoteDetectorBuilder};
pub use self::retry::{RetryExhausted, RetryPolicy};
