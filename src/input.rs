// 该文件是 Yaogan （遥感） 项目的一部分。
// src/input.rs - 影像输入
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

use thiserror::Error;

use crate::{FromUrl, FromUrlWithScheme, frame::RasterImage, geo::GeoBoundingBox};

/// 默认请求的图像宽度（像素）
pub const DEFAULT_IMAGE_WIDTH: u32 = 1024;
/// 默认请求的图像高度（像素）
pub const DEFAULT_IMAGE_HEIGHT: u32 = 1024;

/// 按地理边界框获取栅格图像的能力
pub trait ImageSource {
  fn fetch_image(
    &self,
    bbox: &GeoBoundingBox,
    width: u32,
    height: u32,
  ) -> Result<RasterImage, FetchError>;
}

impl<S: ImageSource + ?Sized> ImageSource for &S {
  fn fetch_image(
    &self,
    bbox: &GeoBoundingBox,
    width: u32,
    height: u32,
  ) -> Result<RasterImage, FetchError> {
    (**self).fetch_image(bbox, width, height)
  }
}

/// 影像获取失败，本层不重试
#[derive(Error, Debug)]
pub enum FetchError {
  #[error("影像服务返回错误状态: {status} - {body}")]
  Status { status: u16, body: String },
  #[error("影像请求传输错误: {0}")]
  Transport(#[source] reqwest::Error),
  #[error("影像解码错误: {0}")]
  Decode(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("影像为空")]
  EmptyImage,
}

/// 请求 URL 中带有访问令牌，错误信息里不保留 URL
impl From<reqwest::Error> for FetchError {
  fn from(e: reqwest::Error) -> Self {
    FetchError::Transport(e.without_url())
  }
}

/// 输入源构造错误
#[derive(Error, Debug)]
pub enum InputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("缺少地图样式: {0}")]
  MissingStyle(String),
  #[error("缺少访问令牌")]
  MissingAccessToken,
  #[error("HTTP 客户端创建失败: {0}")]
  Client(#[from] reqwest::Error),
}

mod static_map;
pub use self::static_map::{StaticMapInput, StaticMapInputBuilder};

#[cfg(feature = "read_image_file")]
mod read_image_file;
#[cfg(feature = "read_image_file")]
pub use self::read_image_file::ImageFileInput;

pub enum InputWrapper {
  StaticMap(StaticMapInput),
  #[cfg(feature = "read_image_file")]
  ReadImageFile(ImageFileInput),
}

impl InputWrapper {
  /// 与 `from_url` 相同，额外允许从命令行/环境变量注入访问令牌
  pub fn from_url_with_token(url: &url::Url, access_token: Option<&str>) -> Result<Self, InputError> {
    if url.scheme() == StaticMapInputBuilder::SCHEME {
      let mut builder = StaticMapInputBuilder::from_url(url)?;
      if let Some(token) = access_token {
        builder = builder.access_token(token);
      }
      return Ok(InputWrapper::StaticMap(builder.build()?));
    }
    Self::from_url(url)
  }
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      StaticMapInputBuilder::SCHEME => {
        let input = StaticMapInputBuilder::from_url(url)?.build()?;
        Ok(InputWrapper::StaticMap(input))
      }
      #[cfg(feature = "read_image_file")]
      ImageFileInput::SCHEME => {
        let input = ImageFileInput::from_url(url)?;
        Ok(InputWrapper::ReadImageFile(input))
      }
      other => Err(InputError::SchemeMismatch(other.to_string())),
    }
  }
}

impl ImageSource for InputWrapper {
  fn fetch_image(
    &self,
    bbox: &GeoBoundingBox,
    width: u32,
    height: u32,
  ) -> Result<RasterImage, FetchError> {
    match self {
      InputWrapper::StaticMap(input) => input.fetch_image(bbox, width, height),
      #[cfg(feature = "read_image_file")]
      InputWrapper::ReadImageFile(input) => input.fetch_image(bbox, width, height),
    }
  }
}
