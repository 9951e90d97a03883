// 该文件是 Yaogan （遥感） 项目的一部分。
// src/input/static_map.rs - 静态地图影像服务输入
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

//! # 静态地图影像输入
//!
//! 通过静态地图 HTTP 接口按边界框获取渲染好的卫星影像：
//!
//! ```text
//! GET {endpoint}/{style_id}/static/[{minx},{miny},{maxx},{maxy}]/{width}x{height}?access_token={token}
//! ```
//!
//! ## URL 配置
//!
//! ```no_run
//! use yaogan::{FromUrl, input::StaticMapInputBuilder};
//! use url::Url;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let url = Url::parse("mapbox://mapbox/satellite-v9?access_token=pk.xxx")?;
//! let input = StaticMapInputBuilder::from_url(&url)?.build()?;
//! # Ok(())
//! # }
//! ```
//!
//! 可选查询参数 `endpoint` 用于替换默认服务地址。

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, redact_url,
  frame::RasterImage,
  geo::GeoBoundingBox,
  input::{FetchError, ImageSource, InputError},
};

const DEFAULT_ENDPOINT: &str = "https://api.mapbox.com/styles/v1";
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

pub struct StaticMapInputBuilder {
  endpoint: String,
  style_id: String,
  access_token: Option<String>,
  timeout: Duration,
}

impl FromUrlWithScheme for StaticMapInputBuilder {
  const SCHEME: &'static str = "mapbox";
}

impl FromUrl for StaticMapInputBuilder {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(InputError::SchemeMismatch(url.scheme().to_string()));
    }

    let owner = url.host_str().unwrap_or_default();
    let style = url.path().trim_matches('/');
    if owner.is_empty() || style.is_empty() {
      return Err(InputError::MissingStyle(url.to_string()));
    }

    let mut builder = StaticMapInputBuilder {
      endpoint: DEFAULT_ENDPOINT.to_string(),
      style_id: format!("{}/{}", owner, style),
      access_token: None,
      timeout: DEFAULT_FETCH_TIMEOUT,
    };

    for (k, v) in url.query_pairs() {
      match k.as_ref() {
        "access_token" => builder.access_token = Some(v.into_owned()),
        "endpoint" => builder.endpoint = v.trim_end_matches('/').to_string(),
        _ => debug!("忽略未知参数: {}", k),
      }
    }

    Ok(builder)
  }
}

impl StaticMapInputBuilder {
  pub fn access_token(mut self, token: &str) -> Self {
    self.access_token = Some(token.to_string());
    self
  }

  pub fn endpoint(mut self, endpoint: &str) -> Self {
    self.endpoint = endpoint.trim_end_matches('/').to_string();
    self
  }

  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn build(self) -> Result<StaticMapInput, InputError> {
    let access_token = self
      .access_token
      .filter(|t| !t.is_empty())
      .ok_or(InputError::MissingAccessToken)?;
    let client = Client::builder().timeout(self.timeout).build()?;

    info!("静态地图影像源: {} 样式 {}", self.endpoint, self.style_id);
    Ok(StaticMapInput {
      endpoint: self.endpoint,
      style_id: self.style_id,
      access_token,
      client,
    })
  }
}

pub struct StaticMapInput {
  endpoint: String,
  style_id: String,
  access_token: String,
  client: Client,
}

impl StaticMapInput {
  pub fn request_url(&self, bbox: &GeoBoundingBox, width: u32, height: u32) -> String {
    format!(
      "{}/{}/static/[{}]/{}x{}?access_token={}",
      self.endpoint,
      self.style_id,
      bbox,
      width,
      height,
      urlencoding::encode(&self.access_token)
    )
  }
}

impl ImageSource for StaticMapInput {
  fn fetch_image(
    &self,
    bbox: &GeoBoundingBox,
    width: u32,
    height: u32,
  ) -> Result<RasterImage, FetchError> {
    let url = self.request_url(bbox, width, height);
    info!("请求影像: {}", redact_url(&url));

    let response = self.client.get(&url).send()?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().unwrap_or_default();
      error!("影像服务返回 {}: {}", status, body);
      return Err(FetchError::Status {
        status: status.as_u16(),
        body,
      });
    }

    let bytes = response.bytes()?;
    debug!("影像大小: {:.2} KB", bytes.len() as f64 / 1024.0);

    let image = RasterImage::decode(*bbox, &bytes)?.ok_or(FetchError::EmptyImage)?;
    info!("影像获取成功: {}x{}", image.width(), image.height());
    Ok(image)
  }
}
