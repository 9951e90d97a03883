// 该文件是 Yaogan （遥感） 项目的一部分。
// src/feature.rs - 检测结果转地理要素
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

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::{
  geo::{DEFAULT_CRS, GeoBoundingBox, Polygon, pixel_box_to_geo},
  model::DetectItem,
};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.3;

/// 类别编号对应的标签
pub fn class_label(class_id: i64) -> String {
  format!("Class_{}", class_id)
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeature {
  pub label: String,
  pub confidence: f64,
  pub geometry: Polygon,
}

impl GeoFeature {
  /// 转为 GeoJSON Feature；`stringify` 为真时置信度以字符串输出
  pub fn to_geojson(&self, stringify: bool) -> Value {
    let confidence = if stringify {
      Value::String(self.confidence.to_string())
    } else {
      json!(self.confidence)
    };
    json!({
      "type": "Feature",
      "properties": {
        "label": self.label,
        "confidence": confidence,
      },
      "geometry": {
        "type": "Polygon",
        "coordinates": [self.geometry.exterior()],
      },
    })
  }
}

/// 共享同一坐标参考系的有序要素集合，可以为空
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
  pub crs: String,
  pub features: Vec<GeoFeature>,
}

impl Default for FeatureCollection {
  fn default() -> Self {
    FeatureCollection::empty(DEFAULT_CRS)
  }
}

impl FeatureCollection {
  pub fn empty(crs: &str) -> Self {
    FeatureCollection {
      crs: crs.to_string(),
      features: Vec::new(),
    }
  }

  pub fn len(&self) -> usize {
    self.features.len()
  }

  pub fn is_empty(&self) -> bool {
    self.features.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, GeoFeature> {
    self.features.iter()
  }

  pub fn to_geojson(&self, stringify: bool) -> Value {
    let mut object = Map::new();
    object.insert("type".into(), json!("FeatureCollection"));
    object.insert(
      "crs".into(),
      json!({ "type": "name", "properties": { "name": self.crs } }),
    );
    object.insert(
      "features".into(),
      Value::Array(self.iter().map(|f| f.to_geojson(stringify)).collect()),
    );
    Value::Object(object)
  }
}

impl<'a> IntoIterator for &'a FeatureCollection {
  type Item = &'a GeoFeature;
  type IntoIter = std::slice::Iter<'a, GeoFeature>;

  fn into_iter(self) -> Self::IntoIter {
    self.features.iter()
  }
}

/// 按置信度过滤检测结果并映射到地理坐标
///
/// 不做去重或重叠抑制，保持输入顺序。
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
  confidence_threshold: f64,
  crs: String,
}

impl Default for FeatureBuilder {
  fn default() -> Self {
    FeatureBuilder {
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      crs: DEFAULT_CRS.to_string(),
    }
  }
}

impl FeatureBuilder {
  pub fn confidence_threshold(mut self, threshold: f64) -> Self {
    self.confidence_threshold = threshold;
    self
  }

  pub fn crs(mut self, crs: &str) -> Self {
    self.crs = crs.to_string();
    self
  }

  pub fn threshold(&self) -> f64 {
    self.confidence_threshold
  }

  pub fn crs_name(&self) -> &str {
    &self.crs
  }

  pub fn build(
    &self,
    detections: &[DetectItem],
    bbox: &GeoBoundingBox,
    img_width: u32,
    img_height: u32,
  ) -> FeatureCollection {
    let mut collection = FeatureCollection::empty(&self.crs);
    if img_width == 0 || img_height == 0 {
      return collection;
    }

    for item in detections {
      // 阈值本身保留
      if item.confidence < self.confidence_threshold {
        continue;
      }

      let rect = pixel_box_to_geo(&item.bbox, bbox, img_width, img_height);
      let feature = GeoFeature {
        label: class_label(item.class_id),
        confidence: item.confidence,
        geometry: Polygon::from_rect(&rect),
      };
      debug!(
        "保留检测 {}: {:.2}, 像素框 {:?} -> 地理框 {:?}",
        feature.label,
        feature.confidence,
        item.bbox,
        rect.bounds()
      );
      collection.features.push(feature);
    }

    collection
  }
}

/// 使用给定阈值与默认坐标参考系构建要素集合
pub fn build_features(
  detections: &[DetectItem],
  bbox: &GeoBoundingBox,
  img_width: u32,
  img_height: u32,
  confidence_threshold: f64,
) -> FeatureCollection {
  FeatureBuilder::default()
    .confidence_threshold(confidence_threshold)
    .build(detections, bbox, img_width, img_height)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(class_id: i64, confidence: f64, bbox: [f64; 4]) -> DetectItem {
    DetectItem {
      class_id,
      confidence,
      bbox,
    }
  }

  fn sf() -> GeoBoundingBox {
    GeoBoundingBox::new(-122.5, 37.6, -122.3, 37.8).unwrap()
  }

  #[test]
  fn threshold_is_inclusive() {
    let detections = [
      item(0, 0.1, [0.0, 0.0, 10.0, 10.0]),
      item(1, 0.3, [0.0, 0.0, 10.0, 10.0]),
      item(2, 0.5, [0.0, 0.0, 10.0, 10.0]),
    ];
    let collection = build_features(&detections, &sf(), 1024, 1024, 0.3);
    assert_eq!(collection.len(), 2);
    let labels: Vec<_> = collection.iter().map(|f| f.label.as_str()).collect();
    assert_eq!(labels, ["Class_1", "Class_2"]);
  }

  #[test]
  fn single_detection_lands_inside_tile() {
    let detections = [item(0, 0.9, [100.0, 100.0, 200.0, 200.0])];
    let collection = build_features(&detections, &sf(), 1024, 1024, 0.3);
    assert_eq!(collection.len(), 1);

    let feature = &collection.features[0];
    assert_eq!(feature.label, "Class_0");
    assert_eq!(feature.confidence, 0.9);

    let bounds = feature.geometry.bounds();
    let tile = sf();
    assert!(bounds.minx() > tile.minx() && bounds.maxx() < tile.maxx());
    assert!(bounds.miny() > tile.miny() && bounds.maxy() < tile.maxy());
    assert_eq!(collection.crs, DEFAULT_CRS);
  }

  #[test]
  fn empty_input_or_all_filtered_gives_empty_collection() {
    assert!(build_features(&[], &sf(), 1024, 1024, 0.3).is_empty());
    let low = [item(3, 0.05, [1.0, 1.0, 2.0, 2.0])];
    assert!(build_features(&low, &sf(), 1024, 1024, 0.3).is_empty());
  }

  #[test]
  fn overlapping_boxes_are_kept_in_order() {
    let detections = [
      item(5, 0.7, [10.0, 10.0, 50.0, 50.0]),
      item(5, 0.8, [12.0, 12.0, 52.0, 52.0]),
    ];
    let collection = build_features(&detections, &sf(), 1024, 1024, 0.3);
    let confidences: Vec<_> = collection.iter().map(|f| f.confidence).collect();
    assert_eq!(confidences, [0.7, 0.8]);
  }

  #[test]
  fn building_is_idempotent() {
    let detections = [
      item(0, 0.9, [100.0, 100.0, 200.0, 200.0]),
      item(1, 0.4, [300.0, 20.0, 250.0, 90.0]),
    ];
    let builder = FeatureBuilder::default().crs("EPSG:3857");
    let a = builder.build(&detections, &sf(), 1024, 768);
    let b = builder.build(&detections, &sf(), 1024, 768);
    assert_eq!(a, b);
    assert_eq!(a.crs, "EPSG:3857");
  }

  #[test]
  fn geojson_carries_properties_and_crs() {
    let detections = [item(2, 0.5, [0.0, 0.0, 512.0, 512.0])];
    let collection = build_features(&detections, &sf(), 1024, 1024, 0.3);

    let value = collection.to_geojson(false);
    assert_eq!(value["type"], "FeatureCollection");
    assert_eq!(value["crs"]["properties"]["name"], "EPSG:4326");
    let feature = &value["features"][0];
    assert_eq!(feature["properties"]["label"], "Class_2");
    assert_eq!(feature["properties"]["confidence"], 0.5);
    assert_eq!(feature["geometry"]["type"], "Polygon");
    assert_eq!(feature["geometry"]["coordinates"][0].as_array().unwrap().len(), 5);

    let value = collection.to_geojson(true);
    assert_eq!(value["features"][0]["properties"]["confidence"], "0.5");
  }
}
