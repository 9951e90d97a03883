// 该文件是 Yaogan （遥感） 项目的一部分。
// tests/common/mod.rs - 测试公共工具
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

#![allow(dead_code)]

use std::{
  collections::VecDeque,
  sync::{
    Mutex,
    atomic::{AtomicU32, Ordering},
  },
};

use image::{DynamicImage, RgbImage};

pub use yaogan::{
  frame::RasterImage,
  geo::GeoBoundingBox,
  input::{FetchError, ImageSource},
  model::{AttemptError, PredictTransport},
  output::Render,
  task::TileResult,
};

/// 返回纯色影像，或固定的 HTTP 错误
pub struct BlankImagery {
  pub status: Option<u16>,
  pub fetches: AtomicU32,
}

impl BlankImagery {
  pub fn ok() -> Self {
    BlankImagery {
      status: None,
      fetches: AtomicU32::new(0),
    }
  }

  pub fn failing(status: u16) -> Self {
    BlankImagery {
      status: Some(status),
      fetches: AtomicU32::new(0),
    }
  }
}

impl ImageSource for BlankImagery {
  fn fetch_image(
    &self,
    bbox: &GeoBoundingBox,
    width: u32,
    height: u32,
  ) -> Result<RasterImage, FetchError> {
    self.fetches.fetch_add(1, Ordering::SeqCst);
    if let Some(status) = self.status {
      return Err(FetchError::Status {
        status,
        body: "error".into(),
      });
    }
    let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
    RasterImage::new(*bbox, image).ok_or(FetchError::EmptyImage)
  }
}

/// 按脚本依次返回响应的推理传输层，脚本耗尽后一直超时
pub struct ScriptedPredict {
  pub attempts: AtomicU32,
  script: Mutex<VecDeque<Result<String, AttemptError>>>,
}

impl ScriptedPredict {
  pub fn new(script: Vec<Result<String, AttemptError>>) -> Self {
    ScriptedPredict {
      attempts: AtomicU32::new(0),
      script: Mutex::new(script.into()),
    }
  }

  pub fn attempts(&self) -> u32 {
    self.attempts.load(Ordering::SeqCst)
  }
}

impl PredictTransport for ScriptedPredict {
  fn post_image(&self, _png: &[u8]) -> Result<String, AttemptError> {
    self.attempts.fetch_add(1, Ordering::SeqCst);
    self
      .script
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(|| Err(timed_out()))
  }
}

pub fn timed_out() -> AttemptError {
  AttemptError::Transport("request timed out".into())
}

pub fn detections(items: &[([f64; 4], i64, f64)]) -> String {
  let detections: Vec<_> = items
    .iter()
    .map(|(bbox, class, confidence)| {
      serde_json::json!({ "box": bbox, "class": class, "confidence": confidence })
    })
    .collect();
  serde_json::json!({ "detections": detections }).to_string()
}

pub fn san_francisco() -> GeoBoundingBox {
  GeoBoundingBox::new(-122.5, 37.6, -122.3, 37.8).unwrap()
}

#[derive(Default)]
pub struct Collected(pub Mutex<Vec<TileResult>>);

impl Render for Collected {
  type Error = std::io::Error;

  fn render_result(&self, result: &TileResult) -> Result<(), Self::Error> {
    self.0.lock().unwrap().push(result.clone());
    Ok(())
  }
}
