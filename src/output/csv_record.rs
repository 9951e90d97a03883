// 该文件是 Yaogan （遥感） 项目的一部分。
// src/output/csv_record.rs - 表格记录输出
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
  fs::OpenOptions,
  io::Write,
  path::PathBuf,
  sync::Mutex,
};

use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  feature::GeoFeature,
  output::{OutputError, Render, decoded_path, ensure_parent},
  task::TileResult,
};

const CSV_HEADER: &str = "label,confidence,geometry";

/// 以 `label,confidence,geometry` 三列追加记录，几何为 WKT
///
/// 首次写入时截断文件并写表头。CSV 单元格本身就是文本，置信度不做字符串化区分。
pub struct CsvRecordOutput {
  path: PathBuf,
  started: Mutex<bool>,
}

impl FromUrlWithScheme for CsvRecordOutput {
  const SCHEME: &'static str = "csv";
}

impl FromUrl for CsvRecordOutput {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(OutputError::SchemeMismatch(url.scheme().to_string()));
    }
    Ok(CsvRecordOutput {
      path: PathBuf::from(decoded_path(url)),
      started: Mutex::new(false),
    })
  }
}

fn record(feature: &GeoFeature) -> String {
  format!(
    "{},{},\"{}\"",
    feature.label,
    feature.confidence,
    feature.geometry.to_wkt()
  )
}

impl Render for CsvRecordOutput {
  type Error = OutputError;

  fn render_result(&self, result: &TileResult) -> Result<(), Self::Error> {
    let mut started = self.started.lock().unwrap_or_else(|e| e.into_inner());

    let mut lines = Vec::with_capacity(result.collection.len() + 1);
    if !*started {
      ensure_parent(&self.path)?;
      lines.push(CSV_HEADER.to_string());
    }
    lines.extend(result.collection.iter().map(record));

    let mut file = OpenOptions::new()
      .create(true)
      .write(true)
      .append(*started)
      .truncate(!*started)
      .open(&self.path)?;
    for line in &lines {
      writeln!(file, "{}", line)?;
    }
    *started = true;

    info!(
      "追加 {} 条记录到: {}",
      result.collection.len(),
      self.path.display()
    );
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    feature::FeatureCollection,
    geo::{GeoBoundingBox, Polygon},
    task::TileStatus,
  };

  #[test]
  fn writes_header_once_and_appends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    std::fs::write(&path, "stale\n").unwrap();
    let url = Url::parse(&format!("csv://{}", path.display())).unwrap();
    let output = CsvRecordOutput::from_url(&url).unwrap();

    let rect = GeoBoundingBox::new(0.0, 0.0, 1.0, 2.0).unwrap();
    let result = TileResult {
      bbox: rect,
      collection: FeatureCollection {
        crs: "EPSG:4326".into(),
        features: vec![GeoFeature {
          label: "Class_3".into(),
          confidence: 0.5,
          geometry: Polygon::from_rect(&rect),
        }],
      },
      status: TileStatus::Success,
    };
    output.render_result(&result).unwrap();
    output.render_result(&result).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(
      lines[1],
      "Class_3,0.5,\"POLYGON ((1 0, 1 2, 0 2, 0 0, 1 0))\""
    );
  }
}
