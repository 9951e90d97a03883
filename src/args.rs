// 该文件是 Yaogan （遥感） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

use yaogan::geo::GeoBoundingBox;

/// Yaogan 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 影像来源
  /// 支持格式:
  /// - 静态地图服务: mapbox://<owner>/<style>[?access_token=..&endpoint=..]
  /// - 本地文件: image:///path/to/tile.png
  #[arg(long, value_name = "SOURCE", default_value = "mapbox://mapbox/satellite-v9")]
  pub imagery: Url,

  /// 静态地图服务访问令牌
  #[arg(long, env = "MAPBOX_ACCESS_TOKEN", hide_env_values = true, value_name = "TOKEN")]
  pub access_token: Option<String>,

  /// 推理服务地址，例如 http://localhost:8000/predict
  #[arg(long, value_name = "ENDPOINT")]
  pub detector: Url,

  /// 输出路径
  /// 支持格式:
  /// - stdout:
  /// - geojson:///path/out.geojson
  /// - csv:///path/out.csv
  /// - folder:///path/dir[?always]
  #[arg(long, value_name = "OUTPUT", default_value = "stdout:")]
  pub output: Url,

  /// 瓦片边界 minx,miny,maxx,maxy，可重复；未提供时使用默认区域
  #[arg(long, value_name = "BBOX", allow_hyphen_values = true)]
  pub bbox: Vec<GeoBoundingBox>,

  /// 请求影像宽度（像素）
  #[arg(long, default_value = "1024", value_name = "PIXELS")]
  pub width: u32,

  /// 请求影像高度（像素）
  #[arg(long, default_value = "1024", value_name = "PIXELS")]
  pub height: u32,

  /// 置信度阈值 (0.0 - 1.0)，等于阈值的检测会保留
  #[arg(long, default_value = "0.3", value_name = "THRESHOLD")]
  pub confidence: f64,

  /// 推理请求最大尝试次数
  #[arg(long, default_value = "3", value_name = "COUNT")]
  pub max_retries: u32,

  /// 推理请求重试间隔（秒）
  #[arg(long, default_value = "5", value_name = "SECONDS")]
  pub retry_delay: u64,

  /// 单次推理请求超时（秒）
  #[arg(long, default_value = "30", value_name = "SECONDS")]
  pub timeout: u64,

  /// 输出坐标参考系
  #[arg(long, default_value = "EPSG:4326", value_name = "CRS")]
  pub crs: String,

  /// 置信度以字符串输出
  #[arg(long)]
  pub stringify_confidence: bool,

  /// 并发处理的瓦片数
  #[arg(long, default_value = "1", value_name = "COUNT")]
  pub concurrency: usize,
}
