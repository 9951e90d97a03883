// 该文件是 Yaogan （遥感） 项目的一部分。
// src/frame.rs - 带地理范围的栅格图像
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

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage};

use crate::geo::GeoBoundingBox;

/// 栅格图像及其获取时对应的地理边界框
///
/// 图像与边界框总是成对出现，避免把图像与过期的边界框混用。
#[derive(Debug, Clone)]
pub struct RasterImage {
  bbox: GeoBoundingBox,
  image: RgbImage,
}

impl RasterImage {
  /// 返回 `None` 表示图像为空 (宽或高为 0)
  pub fn new(bbox: GeoBoundingBox, image: DynamicImage) -> Option<Self> {
    if image.width() == 0 || image.height() == 0 {
      return None;
    }
    Some(RasterImage {
      bbox,
      image: image.into_rgb8(),
    })
  }

  pub fn decode(bbox: GeoBoundingBox, bytes: &[u8]) -> Result<Option<Self>, image::ImageError> {
    let image = image::load_from_memory(bytes)?;
    Ok(Self::new(bbox, image))
  }

  pub fn bbox(&self) -> &GeoBoundingBox {
    &self.bbox
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  pub fn dimensions(&self) -> (u32, u32) {
    self.image.dimensions()
  }

  pub fn as_rgb_image(&self) -> &RgbImage {
    &self.image
  }

  /// 无损编码为 PNG
  pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    self.image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn png_encoding_is_lossless() {
    let mut image = RgbImage::new(4, 3);
    image.put_pixel(1, 2, image::Rgb([10, 20, 30]));
    let raster = RasterImage::new(GeoBoundingBox::FALLBACK, DynamicImage::ImageRgb8(image)).unwrap();

    let png = raster.to_png().unwrap();
    let decoded = RasterImage::decode(GeoBoundingBox::FALLBACK, &png)
      .unwrap()
      .unwrap();
    assert_eq!(decoded.dimensions(), (4, 3));
    assert_eq!(decoded.as_rgb_image(), raster.as_rgb_image());
  }

  #[test]
  fn empty_image_is_rejected() {
    let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 10));
    assert!(RasterImage::new(GeoBoundingBox::FALLBACK, empty).is_none());
  }

  #[test]
  fn rgba_input_is_converted() {
    let rgba = DynamicImage::ImageRgba8(image::RgbaImage::new(2, 2));
    let raster = RasterImage::new(GeoBoundingBox::FALLBACK, rgba).unwrap();
    assert_eq!(raster.as_rgb_image().len(), 2 * 2 * 3);
  }
}
