// 该文件是 Yaogan （遥感） 项目的一部分。
// src/task.rs - 瓦片处理流程与任务
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

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
    mpsc,
  },
  thread,
  time::Instant,
};

use tracing::{error, info, warn};

use crate::{
  feature::{FeatureBuilder, FeatureCollection},
  frame::RasterImage,
  geo::GeoBoundingBox,
  input::{DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH, ImageSource},
  model::{DetectResult, DetectionError, Model},
  output::Render,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileStatus {
  Success,
  FetchFailed(String),
  DetectionFailed(String),
}

impl TileStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      TileStatus::Success => "success",
      TileStatus::FetchFailed(_) => "fetch_failed",
      TileStatus::DetectionFailed(_) => "detection_failed",
    }
  }

  pub fn message(&self) -> Option<&str> {
    match self {
      TileStatus::Success => None,
      TileStatus::FetchFailed(msg) | TileStatus::DetectionFailed(msg) => Some(msg),
    }
  }

  pub fn is_success(&self) -> bool {
    matches!(self, TileStatus::Success)
  }
}

/// 单个瓦片的处理结果；失败时要素集合为空
#[derive(Debug, Clone, PartialEq)]
pub struct TileResult {
  pub bbox: GeoBoundingBox,
  pub collection: FeatureCollection,
  pub status: TileStatus,
}

impl TileResult {
  pub fn to_geojson(&self, stringify: bool) -> serde_json::Value {
    let mut value = self.collection.to_geojson(stringify);
    if let Some(object) = value.as_object_mut() {
      object.insert("bbox".into(), serde_json::json!(self.bbox.bounds()));
      object.insert("status".into(), self.status.as_str().into());
      if let Some(msg) = self.status.message() {
        object.insert("message".into(), msg.into());
      }
    }
    value
  }
}

/// 获取影像 -> 检测 -> 构建要素
///
/// 每次调用互相独立且无共享可变状态，可在多个线程中并发调用。
pub struct TilePipeline<S, M> {
  source: S,
  model: M,
  features: FeatureBuilder,
  width: u32,
  height: u32,
}

impl<S, M> TilePipeline<S, M>
where
  S: ImageSource,
  M: Model<Input = RasterImage, Output = DetectResult, Error = DetectionError>,
{
  pub fn new(source: S, model: M) -> Self {
    TilePipeline {
      source,
      model,
      features: FeatureBuilder::default(),
      width: DEFAULT_IMAGE_WIDTH,
      height: DEFAULT_IMAGE_HEIGHT,
    }
  }

  pub fn with_features(mut self, features: FeatureBuilder) -> Self {
    self.features = features;
    self
  }

  pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
    self.width = width;
    self.height = height;
    self
  }

  /// 处理一个瓦片，未提供边界框时使用回退区域。失败不会以 `Err` 返回。
  pub fn process_tile(&self, bbox: Option<GeoBoundingBox>) -> TileResult {
    let bbox = bbox.unwrap_or_default();
    info!("处理瓦片: [{}]", bbox);
    let empty = |status: TileStatus| TileResult {
      bbox,
      collection: FeatureCollection::empty(self.features.crs_name()),
      status,
    };

    let image = match self.source.fetch_image(&bbox, self.width, self.height) {
      Ok(image) => image,
      Err(e) => {
        error!("获取影像失败: {}", e);
        return empty(TileStatus::FetchFailed(e.to_string()));
      }
    };

    let now = Instant::now();
    let detections = match self.model.infer(&image) {
      Ok(detections) => detections,
      Err(e) => {
        error!("获取检测结果失败: {}", e);
        return empty(TileStatus::DetectionFailed(e.to_string()));
      }
    };
    info!("检测完成, 原始结果 {} 个, 耗时: {:.2?}", detections.len(), now.elapsed());

    let collection = self.features.build(
      &detections.items,
      image.bbox(),
      image.width(),
      image.height(),
    );
    info!(
      "生成 {} 个要素 (置信度 >= {})",
      collection.len(),
      self.features.threshold()
    );

    TileResult {
      bbox,
      collection,
      status: TileStatus::Success,
    }
  }
}

pub trait Task<P, O>: Sized {
  type Output;
  type Error;
  fn run_task(self, pipeline: P, output: O) -> Result<Self::Output, Self::Error>;
}

/// 处理单个瓦片并输出
#[derive(Default, Debug)]
pub struct OneShotTask {
  bbox: Option<GeoBoundingBox>,
}

impl OneShotTask {
  pub fn new(bbox: Option<GeoBoundingBox>) -> Self {
    OneShotTask { bbox }
  }
}

impl<'a, 'b, S, M, O, RE> Task<&'a TilePipeline<S, M>, &'b O> for OneShotTask
where
  S: ImageSource,
  M: Model<Input = RasterImage, Output = DetectResult, Error = DetectionError>,
  RE: std::error::Error + Send + Sync + 'static,
  O: Render<Error = RE>,
{
  type Output = TileResult;
  type Error = anyhow::Error;

  fn run_task(
    self,
    pipeline: &'a TilePipeline<S, M>,
    output: &'b O,
  ) -> Result<Self::Output, Self::Error> {
    info!("开始任务...");
    let result = pipeline.process_tile(self.bbox);
    output.render_result(&result)?;
    info!("任务完成: {}", result.status.as_str());
    Ok(result)
  }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
  pub tiles: usize,
  pub succeeded: usize,
  pub fetch_failed: usize,
  pub detection_failed: usize,
  pub features: usize,
}

impl BatchSummary {
  fn record(&mut self, result: &TileResult) {
    self.tiles += 1;
    self.features += result.collection.len();
    match result.status {
      TileStatus::Success => self.succeeded += 1,
      TileStatus::FetchFailed(_) => self.fetch_failed += 1,
      TileStatus::DetectionFailed(_) => self.detection_failed += 1,
    }
  }
}

/// 并发处理多个瓦片，单个瓦片失败不影响其他瓦片
#[derive(Debug)]
pub struct BatchTask {
  tiles: Vec<GeoBoundingBox>,
  concurrency: usize,
  handle_interrupt: bool,
}

impl BatchTask {
  pub fn new(tiles: Vec<GeoBoundingBox>) -> Self {
    BatchTask {
      tiles,
      concurrency: 1,
      handle_interrupt: false,
    }
  }

  pub fn with_concurrency(mut self, concurrency: usize) -> Self {
    self.concurrency = concurrency.max(1);
    self
  }

  /// 收到 Ctrl-C 后停止派发新的瓦片，已开始的瓦片继续完成
  pub fn with_interrupt(mut self, handle_interrupt: bool) -> Self {
    self.handle_interrupt = handle_interrupt;
    self
  }
}

impl<'a, 'b, S, M, O, RE> Task<&'a TilePipeline<S, M>, &'b O> for BatchTask
where
  S: ImageSource + Sync,
  M: Model<Input = RasterImage, Output = DetectResult, Error = DetectionError> + Sync,
  RE: std::error::Error + Send + Sync + 'static,
  O: Render<Error = RE>,
{
  type Output = BatchSummary;
  type Error = anyhow::Error;

  fn run_task(
    self,
    pipeline: &'a TilePipeline<S, M>,
    output: &'b O,
  ) -> Result<Self::Output, Self::Error> {
    info!(
      "开始批量任务: {} 个瓦片, {} 个工作线程",
      self.tiles.len(),
      self.concurrency
    );

    let stop = Arc::new(AtomicBool::new(false));
    if self.handle_interrupt {
      let stop = stop.clone();
      ctrlc::set_handler(move || {
        warn!("收到中断信号，停止派发新的瓦片...");
        stop.store(true, Ordering::SeqCst);
      })?;
    }

    let next = AtomicUsize::new(0);
    let tiles = &self.tiles;
    let (tx, rx) = mpsc::channel();
    let mut summary = BatchSummary::default();

    thread::scope(|scope| -> anyhow::Result<()> {
      for _ in 0..self.concurrency.min(tiles.len()) {
        let tx = tx.clone();
        let (next, stop) = (&next, &stop);
        scope.spawn(move || {
          loop {
            if stop.load(Ordering::SeqCst) {
              break;
            }
            let index = next.fetch_add(1, Ordering::SeqCst);
            let Some(bbox) = tiles.get(index) else {
              break;
            };
            let result = pipeline.process_tile(Some(*bbox));
            if tx.send((index, result)).is_err() {
              break;
            }
          }
        });
      }
      drop(tx);

      for (index, result) in rx {
        info!(
          "瓦片 {} 完成: {}, {} 个要素",
          index,
          result.status.as_str(),
          result.collection.len()
        );
        summary.record(&result);
        if let Err(e) = output.render_result(&result) {
          stop.store(true, Ordering::SeqCst);
          return Err(e.into());
        }
      }
      Ok(())
    })?;

    if summary.tiles < tiles.len() {
      warn!("批量任务提前结束: {}/{} 个瓦片", summary.tiles, tiles.len());
    }
    info!("批量任务完成: {:?}", summary);
    Ok(summary)
  }
}
