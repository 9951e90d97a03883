// 该文件是 Yaogan （遥感） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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
  path::PathBuf,
  sync::atomic::{AtomicU16, Ordering},
};

use chrono::{Datelike, Utc};
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{OutputError, Render, decoded_path, stringify_from_url},
  task::TileResult,
};

/// 每个瓦片一个 GeoJSON 文件，按 `年/月/日` 分目录
///
/// 默认只记录有要素的瓦片，查询参数 `always` 使空结果与失败结果也被记录。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  frame_counter: AtomicU16,
  always: bool,
  stringify: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = OutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(OutputError::SchemeMismatch(uri.scheme().to_string()));
    }

    let always = uri.query_pairs().any(|(k, _)| k == "always");

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(decoded_path(uri)),
      frame_counter: AtomicU16::new(0),
      always,
      stringify: stringify_from_url(uri),
    })
  }
}

impl DirectoryRecordOutput {
  pub fn stringify(mut self, stringify: bool) -> Self {
    self.stringify = stringify;
    self
  }

  fn tile_id(&self) -> u16 {
    self.frame_counter.fetch_add(1, Ordering::SeqCst).wrapping_add(1)
  }

  fn tile_path(&self) -> Result<PathBuf, std::io::Error> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:04X}.geojson",
      now.format("%H-%M-%S"),
      self.tile_id()
    )))
  }
}

impl Render for DirectoryRecordOutput {
  type Error = OutputError;

  fn render_result(&self, result: &TileResult) -> Result<(), Self::Error> {
    if !self.always && result.collection.is_empty() {
      debug!("瓦片 [{}] 无要素, 跳过记录", result.bbox);
      return Ok(());
    }

    let path = self.tile_path()?;
    std::fs::write(&path, serde_json::to_vec(&result.to_geojson(self.stringify))?)?;
    info!("记录瓦片 [{}] 到: {}", result.bbox, path.display());
    Ok(())
  }
}
