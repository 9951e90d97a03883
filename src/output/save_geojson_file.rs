// 该文件是 Yaogan （遥感） 项目的一部分。
// src/output/save_geojson_file.rs - 保存 GeoJSON 文件
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
  fs::File,
  io::{BufWriter, Write},
  path::PathBuf,
  sync::Mutex,
};

use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  feature::FeatureCollection,
  output::{OutputError, Render, decoded_path, ensure_parent, stringify_from_url},
  task::TileResult,
};

/// 把目前为止所有瓦片的要素合并写入同一个 GeoJSON 文件
pub struct SaveGeoJsonFileOutput {
  path: PathBuf,
  stringify: bool,
  merged: Mutex<Option<FeatureCollection>>,
}

impl FromUrlWithScheme for SaveGeoJsonFileOutput {
  const SCHEME: &'static str = "geojson";
}

impl FromUrl for SaveGeoJsonFileOutput {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(OutputError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    Ok(SaveGeoJsonFileOutput {
      path: PathBuf::from(decoded_path(url)),
      stringify: stringify_from_url(url),
      merged: Mutex::new(None),
    })
  }
}

impl SaveGeoJsonFileOutput {
  pub fn stringify(mut self, stringify: bool) -> Self {
    self.stringify = stringify;
    self
  }
}

impl Render for SaveGeoJsonFileOutput {
  type Error = OutputError;

  fn render_result(&self, result: &TileResult) -> Result<(), Self::Error> {
    let mut guard = self.merged.lock().unwrap_or_else(|e| e.into_inner());
    let merged = guard.get_or_insert_with(|| FeatureCollection::empty(&result.collection.crs));
    merged
      .features
      .extend(result.collection.features.iter().cloned());

    ensure_parent(&self.path)?;
    let mut writer = BufWriter::new(File::create(&self.path)?);
    serde_json::to_writer(&mut writer, &merged.to_geojson(self.stringify))?;
    writer.flush()?;

    info!(
      "保存 {} 个要素到文件: {}",
      merged.len(),
      self.path.display()
    );
    Ok(())
  }
}
