// 该文件是 Yaogan （遥感） 项目的一部分。
// src/model/retry.rs - 固定间隔重试
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

use std::{fmt::Display, thread, time::Duration};

use tracing::warn;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// 有界重试策略：最多 `max_attempts` 次尝试，两次尝试之间固定等待 `delay`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  max_attempts: u32,
  delay: Duration,
}

#[derive(Debug)]
pub struct RetryExhausted<E> {
  pub attempts: u32,
  pub last: E,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    RetryPolicy::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY)
  }
}

impl RetryPolicy {
  /// `max_attempts` 为 0 时按 1 次处理
  pub fn new(max_attempts: u32, delay: Duration) -> Self {
    RetryPolicy {
      max_attempts: max_attempts.max(1),
      delay,
    }
  }

  pub fn max_attempts(&self) -> u32 {
    self.max_attempts
  }

  pub fn delay(&self) -> Duration {
    self.delay
  }

  /// 依次执行 `op`（参数为从 1 开始的尝试序号），首次成功即返回
  ///
  /// 等待只阻塞当前调用线程。最后一次失败后不再等待。
  pub fn run<T, E, F>(&self, mut op: F) -> Result<T, RetryExhausted<E>>
  where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
  {
    let mut attempt = 1;
    loop {
      match op(attempt) {
        Ok(value) => return Ok(value),
        Err(err) => {
          warn!("第 {} 次尝试失败: {}", attempt, err);
          if attempt >= self.max_attempts {
            return Err(RetryExhausted {
              attempts: attempt,
              last: err,
            });
          }
          warn!("{:.2?} 后重试...", self.delay);
          if !self.delay.is_zero() {
            thread::sleep(self.delay);
          }
          attempt += 1;
        }
      }
    }
  }
}
