// 该文件是 Yaogan （遥感） 项目的一部分。
// src/input/read_image_file.rs - 本地图像文件输入
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

use std::path::PathBuf;

use image::ImageReader;
use tracing::{error, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::RasterImage,
  geo::GeoBoundingBox,
  input::{FetchError, ImageSource, InputError},
};

/// 离线影像：读取本地文件，并与请求的边界框配对
///
/// 请求的像素尺寸被忽略，坐标映射使用文件本身的尺寸。
pub struct ImageFileInput {
  path: PathBuf,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
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

    let path = urlencoding::decode(url.path())
      .map(|p| p.into_owned())
      .unwrap_or_else(|_| url.path().to_string());

    Ok(ImageFileInput {
      path: PathBuf::from(path),
    })
  }
}

impl ImageSource for ImageFileInput {
  fn fetch_image(
    &self,
    bbox: &GeoBoundingBox,
    width: u32,
    height: u32,
  ) -> Result<RasterImage, FetchError> {
    info!("读取影像文件: {}", self.path.display());
    let image = ImageReader::open(&self.path)?.decode()?;
    let image = RasterImage::new(*bbox, image).ok_or(FetchError::EmptyImage)?;

    if image.dimensions() != (width, height) {
      warn!(
        "影像文件尺寸 {}x{} 与请求尺寸 {}x{} 不一致，按文件尺寸映射坐标",
        image.width(),
        image.height(),
        width,
        height
      );
    }
    Ok(image)
  }
}
