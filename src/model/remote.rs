// 该文件是 Yaogan （遥感） 项目的一部分。
// src/model/remote.rs - 远程推理服务客户端
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

use std::time::{Duration, Instant};

use reqwest::blocking::{
  Client,
  multipart::{Form, Part},
};
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl,
  frame::RasterImage,
  model::{
    AttemptError, DetectResult, DetectionError, Model, ModelError, RetryPolicy, parse_response,
  },
};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_FIELD: &str = "file";
const UPLOAD_FILE_NAME: &str = "image.png";
const UPLOAD_MIME: &str = "image/png";

/// 提交图像进行检测的能力；返回成功响应的原始响应体
pub trait PredictTransport {
  fn post_image(&self, png: &[u8]) -> Result<String, AttemptError>;
}

impl<T: PredictTransport + ?Sized> PredictTransport for &T {
  fn post_image(&self, png: &[u8]) -> Result<String, AttemptError> {
    (**self).post_image(png)
  }
}

/// 以 multipart 表单上传 PNG 到推理服务
pub struct HttpTransport {
  endpoint: Url,
  client: Client,
}

impl HttpTransport {
  pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, ModelError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(HttpTransport { endpoint, client })
  }

  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }
}

impl PredictTransport for HttpTransport {
  fn post_image(&self, png: &[u8]) -> Result<String, AttemptError> {
    let part = Part::bytes(png.to_vec())
      .file_name(UPLOAD_FILE_NAME)
      .mime_str(UPLOAD_MIME)?;
    let form = Form::new().part(UPLOAD_FIELD, part);

    let response = self
      .client
      .post(self.endpoint.clone())
      .multipart(form)
      .send()?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().unwrap_or_default();
      return Err(AttemptError::Status {
        status: status.as_u16(),
        body,
      });
    }

    Ok(response.text()?)
  }
}

pub struct RemoteDetectorBuilder {
  endpoint: Url,
  retry: RetryPolicy,
  timeout: Duration,
}

impl FromUrl for RemoteDetectorBuilder {
  type Error = ModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      "http" | "https" => Ok(RemoteDetectorBuilder {
        endpoint: url.clone(),
        retry: RetryPolicy::default(),
        timeout: DEFAULT_REQUEST_TIMEOUT,
      }),
      other => {
        error!("推理服务地址必须使用 http 或 https 方案, 实际为 '{}'", other);
        Err(ModelError::SchemeMismatch(other.to_string()))
      }
    }
  }
}

impl RemoteDetectorBuilder {
  pub fn max_retries(mut self, max_retries: u32) -> Self {
    self.retry = RetryPolicy::new(max_retries, self.retry.delay());
    self
  }

  pub fn retry_delay(mut self, delay: Duration) -> Self {
    self.retry = RetryPolicy::new(self.retry.max_attempts(), delay);
    self
  }

  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn build(self) -> Result<RemoteDetector<HttpTransport>, ModelError> {
    info!(
      "推理服务: {} (最多 {} 次尝试, 间隔 {:?}, 超时 {:?})",
      self.endpoint,
      self.retry.max_attempts(),
      self.retry.delay(),
      self.timeout
    );
    let transport = HttpTransport::new(self.endpoint, self.timeout)?;
    Ok(RemoteDetector::new(transport, self.retry))
  }
}

/// 远程检测客户端：编码图像、带重试提交、解析响应
pub struct RemoteDetector<T> {
  transport: T,
  retry: RetryPolicy,
}

impl<T: PredictTransport> RemoteDetector<T> {
  pub fn new(transport: T, retry: RetryPolicy) -> Self {
    RemoteDetector { transport, retry }
  }

  pub fn with_transport(transport: T) -> Self {
    Self::new(transport, RetryPolicy::default())
  }

  pub fn transport(&self) -> &T {
    &self.transport
  }

  pub fn retry_policy(&self) -> &RetryPolicy {
    &self.retry
  }

  /// 提交已编码的 PNG；传输失败与非成功状态均重试，响应格式错误不重试
  pub fn detect_png(&self, png: &[u8]) -> Result<DetectResult, DetectionError> {
    let body = self
      .retry
      .run(|attempt| {
        debug!("提交推理请求, 第 {} 次尝试", attempt);
        self.transport.post_image(png)
      })
      .map_err(|exhausted| {
        error!("推理请求重试 {} 次后放弃", exhausted.attempts);
        DetectionError::RetriesExhausted {
          attempts: exhausted.attempts,
          last: exhausted.last,
        }
      })?;

    let result = parse_response(&body)?;
    debug!("原始检测结果: {:?}", result.items);
    Ok(result)
  }
}

impl<T: PredictTransport> Model for RemoteDetector<T> {
  type Input = RasterImage;
  type Output = DetectResult;
  type Error = DetectionError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let png = input.to_png()?;
    debug!("PNG 编码完成: {} 字节", png.len());

    let now = Instant::now();
    let result = self.detect_png(&png)?;
    info!("推理完成, {} 个检测, 耗时: {:.2?}", result.len(), now.elapsed());
    Ok(result)
  }
}
