// 该文件是 Yaogan （遥感） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use yaogan::{
  FromUrl,
  feature::FeatureBuilder,
  input::InputWrapper,
  model::RemoteDetectorBuilder,
  output::OutputWrapper,
  task::{BatchTask, OneShotTask, Task, TilePipeline},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("影像来源: {}", yaogan::redact_url(args.imagery.as_str()));
  info!("推理服务: {}", args.detector);
  info!("输出路径: {}", args.output);
  info!("置信度阈值: {}", args.confidence);

  let source = InputWrapper::from_url_with_token(&args.imagery, args.access_token.as_deref())?;
  let model = RemoteDetectorBuilder::from_url(&args.detector)?
    .max_retries(args.max_retries)
    .retry_delay(Duration::from_secs(args.retry_delay))
    .timeout(Duration::from_secs(args.timeout))
    .build()?;
  let output = OutputWrapper::from_url(&args.output)?.stringify(args.stringify_confidence);

  let features = FeatureBuilder::default()
    .confidence_threshold(args.confidence)
    .crs(&args.crs);
  let pipeline = TilePipeline::new(source, model)
    .with_features(features)
    .with_image_size(args.width, args.height);

  if args.bbox.len() <= 1 {
    let result = OneShotTask::new(args.bbox.first().copied()).run_task(&pipeline, &output)?;
    info!(
      "处理完成: {}, {} 个要素",
      result.status.as_str(),
      result.collection.len()
    );
  } else {
    let summary = BatchTask::new(args.bbox)
      .with_concurrency(args.concurrency)
      .with_interrupt(true)
      .run_task(&pipeline, &output)?;
    info!(
      "处理完成: {} 个瓦片, 成功 {}, 影像失败 {}, 检测失败 {}, 共 {} 个要素",
      summary.tiles,
      summary.succeeded,
      summary.fetch_failed,
      summary.detection_failed,
      summary.features
    );
  }

  Ok(())
}
