// 该文件是 Yaogan （遥感） 项目的一部分。
// src/geo.rs - 地理坐标与像素坐标映射
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

use std::{fmt, str::FromStr};

use thiserror::Error;

/// 默认坐标参考系
pub const DEFAULT_CRS: &str = "EPSG:4326";

#[derive(Error, Debug, PartialEq)]
pub enum GeoError {
  #[error("边界无效: ({minx}, {miny}, {maxx}, {maxy})")]
  InvalidBounds {
    minx: f64,
    miny: f64,
    maxx: f64,
    maxy: f64,
  },
  #[error("边界格式错误, 期望 'minx,miny,maxx,maxy': {0}")]
  ParseError(String),
}

/// 轴对齐的地理边界框，满足 minx <= maxx, miny <= maxy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBoundingBox {
  minx: f64,
  miny: f64,
  maxx: f64,
  maxy: f64,
}

impl GeoBoundingBox {
  /// 未提供瓦片时使用的回退区域（旧金山湾区）
  pub const FALLBACK: GeoBoundingBox = GeoBoundingBox {
    minx: -122.549,
    miny: 37.681,
    maxx: -122.341,
    maxy: 37.818,
  };

  pub fn new(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Result<Self, GeoError> {
    let finite = [minx, miny, maxx, maxy].iter().all(|v| v.is_finite());
    if !finite || minx > maxx || miny > maxy {
      return Err(GeoError::InvalidBounds {
        minx,
        miny,
        maxx,
        maxy,
      });
    }
    Ok(GeoBoundingBox {
      minx,
      miny,
      maxx,
      maxy,
    })
  }

  /// 由任意两个角点构造，自动按轴取 min/max
  pub fn from_corners((x1, y1): (f64, f64), (x2, y2): (f64, f64)) -> Self {
    GeoBoundingBox {
      minx: x1.min(x2),
      miny: y1.min(y2),
      maxx: x1.max(x2),
      maxy: y1.max(y2),
    }
  }

  pub fn minx(&self) -> f64 {
    self.minx
  }

  pub fn miny(&self) -> f64 {
    self.miny
  }

  pub fn maxx(&self) -> f64 {
    self.maxx
  }

  pub fn maxy(&self) -> f64 {
    self.maxy
  }

  pub fn width(&self) -> f64 {
    self.maxx - self.minx
  }

  pub fn height(&self) -> f64 {
    self.maxy - self.miny
  }

  pub fn bounds(&self) -> [f64; 4] {
    [self.minx, self.miny, self.maxx, self.maxy]
  }

  pub fn contains(&self, other: &GeoBoundingBox) -> bool {
    self.minx <= other.minx
      && self.miny <= other.miny
      && self.maxx >= other.maxx
      && self.maxy >= other.maxy
  }
}

impl Default for GeoBoundingBox {
  fn default() -> Self {
    GeoBoundingBox::FALLBACK
  }
}

/// 按 `minx,miny,maxx,maxy` 顺序逗号连接
impl fmt::Display for GeoBoundingBox {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{},{},{},{}", self.minx, self.miny, self.maxx, self.maxy)
  }
}

impl FromStr for GeoBoundingBox {
  type Err = GeoError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let values = s
      .trim()
      .trim_start_matches('[')
      .trim_end_matches(']')
      .split(',')
      .map(|v| v.trim().parse::<f64>())
      .collect::<Result<Vec<_>, _>>()
      .map_err(|_| GeoError::ParseError(s.to_string()))?;

    match values.as_slice() {
      &[minx, miny, maxx, maxy] => GeoBoundingBox::new(minx, miny, maxx, maxy),
      _ => Err(GeoError::ParseError(s.to_string())),
    }
  }
}

/// 简单多边形，外环首尾闭合
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
  exterior: Vec<[f64; 2]>,
}

impl Polygon {
  /// 由矩形构造，逆时针方向，起点为 (maxx, miny)
  pub fn from_rect(rect: &GeoBoundingBox) -> Self {
    let GeoBoundingBox {
      minx,
      miny,
      maxx,
      maxy,
    } = *rect;
    Polygon {
      exterior: vec![
        [maxx, miny],
        [maxx, maxy],
        [minx, maxy],
        [minx, miny],
        [maxx, miny],
      ],
    }
  }

  pub fn exterior(&self) -> &[[f64; 2]] {
    &self.exterior
  }

  pub fn bounds(&self) -> GeoBoundingBox {
    let mut minx = f64::INFINITY;
    let mut miny = f64::INFINITY;
    let mut maxx = f64::NEG_INFINITY;
    let mut maxy = f64::NEG_INFINITY;
    for [x, y] in &self.exterior {
      minx = minx.min(*x);
      miny = miny.min(*y);
      maxx = maxx.max(*x);
      maxy = maxy.max(*y);
    }
    GeoBoundingBox {
      minx,
      miny,
      maxx,
      maxy,
    }
  }

  pub fn to_wkt(&self) -> String {
    let ring = self
      .exterior
      .iter()
      .map(|[x, y]| format!("{} {}", x, y))
      .collect::<Vec<_>>()
      .join(", ");
    format!("POLYGON (({}))", ring)
  }
}

/// 像素坐标转地理坐标
///
/// 图像第 0 行为北边界，因此 y 轴取反。超出图像范围的像素坐标按线性外推，不做截断。
pub fn pixel_to_geo(
  x: f64,
  y: f64,
  bbox: &GeoBoundingBox,
  img_width: u32,
  img_height: u32,
) -> (f64, f64) {
  debug_assert!(img_width > 0 && img_height > 0);
  let geo_x = bbox.minx + (x / img_width as f64) * bbox.width();
  let geo_y = bbox.maxy - (y / img_height as f64) * bbox.height();
  (geo_x, geo_y)
}

/// 像素框 `[x1, y1, x2, y2]` 转为有序的地理矩形
pub fn pixel_box_to_geo(
  pixel_box: &[f64; 4],
  bbox: &GeoBoundingBox,
  img_width: u32,
  img_height: u32,
) -> GeoBoundingBox {
  let [x1, y1, x2, y2] = *pixel_box;
  let a = pixel_to_geo(x1, y1, bbox, img_width, img_height);
  let b = pixel_to_geo(x2, y2, bbox, img_width, img_height);
  GeoBoundingBox::from_corners(a, b)
}
