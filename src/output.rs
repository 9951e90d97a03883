// 该文件是 Yaogan （遥感） 项目的一部分。
// src/output.rs - 输出定义
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

use std::path::Path;

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, task::TileResult};

pub trait Render {
  type Error;
  fn render_result(&self, result: &TileResult) -> Result<(), Self::Error>;
}

mod stdout;
pub use self::stdout::StdoutOutput;

mod save_geojson_file;
pub use self::save_geojson_file::SaveGeoJsonFileOutput;

mod csv_record;
pub use self::csv_record::CsvRecordOutput;

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::DirectoryRecordOutput;

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 查询参数 `stringify` 存在时置信度以字符串输出
fn stringify_from_url(url: &Url) -> bool {
  url.query_pairs().any(|(k, _)| k == "stringify")
}

fn decoded_path(url: &Url) -> String {
  urlencoding::decode(url.path())
    .map(|p| p.into_owned())
    .unwrap_or_else(|_| url.path().to_string())
}

fn ensure_parent(path: &Path) -> Result<(), std::io::Error> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)?;
  }
  Ok(())
}

pub enum OutputWrapper {
  Stdout(StdoutOutput),
  SaveGeoJsonFile(SaveGeoJsonFileOutput),
  CsvRecord(CsvRecordOutput),
  #[cfg(feature = "directory_record")]
  DirectoryRecord(DirectoryRecordOutput),
}

impl OutputWrapper {
  /// 命令行开关可以强制置信度以字符串输出
  pub fn stringify(self, stringify: bool) -> Self {
    if !stringify {
      return self;
    }
    match self {
      OutputWrapper::Stdout(output) => OutputWrapper::Stdout(output.stringify(true)),
      OutputWrapper::SaveGeoJsonFile(output) => {
        OutputWrapper::SaveGeoJsonFile(output.stringify(true))
      }
      OutputWrapper::CsvRecord(output) => {
        warn!("CSV 输出中置信度总是文本, 忽略字符串化选项");
        OutputWrapper::CsvRecord(output)
      }
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecord(output) => {
        OutputWrapper::DirectoryRecord(output.stringify(true))
      }
    }
  }
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      StdoutOutput::SCHEME => Ok(OutputWrapper::Stdout(StdoutOutput::from_url(url)?)),
      SaveGeoJsonFileOutput::SCHEME => Ok(OutputWrapper::SaveGeoJsonFile(
        SaveGeoJsonFileOutput::from_url(url)?,
      )),
      CsvRecordOutput::SCHEME => Ok(OutputWrapper::CsvRecord(CsvRecordOutput::from_url(url)?)),
      #[cfg(feature = "directory_record")]
      DirectoryRecordOutput::SCHEME => Ok(OutputWrapper::DirectoryRecord(
        DirectoryRecordOutput::from_url(url)?,
      )),
      other => Err(OutputError::SchemeMismatch(other.to_string())),
    }
  }
}

impl Render for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, result: &TileResult) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::Stdout(output) => output.render_result(result),
      OutputWrapper::SaveGeoJsonFile(output) => output.render_result(result),
      OutputWrapper::CsvRecord(output) => output.render_result(result),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecord(output) => output.render_result(result),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dispatches_on_scheme() {
    let parse = |s: &str| OutputWrapper::from_url(&Url::parse(s).unwrap());
    assert!(matches!(parse("stdout:"), Ok(OutputWrapper::Stdout(_))));
    assert!(matches!(
      parse("geojson:///tmp/out.geojson"),
      Ok(OutputWrapper::SaveGeoJsonFile(_))
    ));
    assert!(matches!(parse("csv:///tmp/out.csv"), Ok(OutputWrapper::CsvRecord(_))));
    assert!(matches!(
      parse("s3://bucket/key"),
      Err(OutputError::SchemeMismatch(s)) if s == "s3"
    ));
  }

  #[test]
  fn stringify_keeps_csv_records_numeric_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let url = Url::parse(&format!("csv://{}", path.display())).unwrap();
    let output = OutputWrapper::from_url(&url).unwrap().stringify(true);
    assert!(matches!(output, OutputWrapper::CsvRecord(_)));

    let bbox = crate::geo::GeoBoundingBox::FALLBACK;
    let result = TileResult {
      bbox,
      collection: crate::feature::FeatureCollection {
        crs: "EPSG:4326".into(),
        features: vec![crate::feature::GeoFeature {
          label: "Class_1".into(),
          confidence: 0.25,
          geometry: crate::geo::Polygon::from_rect(&bbox),
        }],
      },
      status: crate::task::TileStatus::Success,
    };
    output.render_result(&result).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.lines().nth(1).unwrap().starts_with("Class_1,0.25,"));
  }
}
