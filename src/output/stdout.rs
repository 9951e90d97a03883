// 该文件是 Yaogan （遥感） 项目的一部分。
// src/output/stdout.rs - 标准输出
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

use std::io::Write;

use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{OutputError, Render, stringify_from_url},
  task::TileResult,
};

/// 每个瓦片输出一行 GeoJSON FeatureCollection
pub struct StdoutOutput {
  stringify: bool,
}

impl FromUrlWithScheme for StdoutOutput {
  const SCHEME: &'static str = "stdout";
}

impl FromUrl for StdoutOutput {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(OutputError::SchemeMismatch(url.scheme().to_string()));
    }
    Ok(StdoutOutput {
      stringify: stringify_from_url(url),
    })
  }
}

impl StdoutOutput {
  pub fn stringify(mut self, stringify: bool) -> Self {
    self.stringify = stringify;
    self
  }
}

impl Render for StdoutOutput {
  type Error = OutputError;

  fn render_result(&self, result: &TileResult) -> Result<(), Self::Error> {
    let line = serde_json::to_string(&result.to_geojson(self.stringify))?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()?;
    Ok(())
  }
}
