// 该文件是 Yaogan （遥感） 项目的一部分。
// src/http_stub.rs - 单元测试用的本地 HTTP 桩服务
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

use std::{
  io::{Read, Write},
  net::TcpListener,
  sync::mpsc::{self, Receiver},
  thread,
};

/// 收到的原始请求
pub struct Captured {
  pub head: String,
  pub body: Vec<u8>,
}

impl Captured {
  pub fn request_line(&self) -> &str {
    self.head.lines().next().unwrap_or_default()
  }

  pub fn header(&self, name: &str) -> Option<String> {
    self.head.lines().skip(1).find_map(|line| {
      let (k, v) = line.split_once(':')?;
      k.trim()
        .eq_ignore_ascii_case(name)
        .then(|| v.trim().to_string())
    })
  }
}

/// 只应答一次的 HTTP 服务，返回服务地址与收到请求的接收端
pub fn serve_once(status: &str, content_type: &str, body: Vec<u8>) -> (String, Receiver<Captured>) {
  let listener = TcpListener::bind("127.0.0.1:0").unwrap();
  let addr = format!("http://{}", listener.local_addr().unwrap());
  let (tx, rx) = mpsc::channel();
  let status = status.to_string();
  let content_type = content_type.to_string();

  thread::spawn(move || {
    let (mut stream, _) = listener.accept().unwrap();
    let captured = read_request(&mut stream);

    let mut response = format!(
      "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
      status,
      content_type,
      body.len()
    )
    .into_bytes();
    response.extend_from_slice(&body);
    stream.write_all(&response).unwrap();
    stream.flush().unwrap();
    let _ = tx.send(captured);
  });

  (addr, rx)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
  haystack.windows(needle.len()).position(|w| w == needle)
}

fn read_request(stream: &mut impl Read) -> Captured {
  let mut data = Vec::new();
  let mut chunk = [0u8; 4096];

  let head_end = loop {
    if let Some(idx) = find(&data, b"\r\n\r\n") {
      break idx;
    }
    let n = stream.read(&mut chunk).unwrap();
    assert!(n > 0, "连接在请求头结束前关闭");
    data.extend_from_slice(&chunk[..n]);
  };

  let head = String::from_utf8_lossy(&data[..head_end]).into_owned();
  let mut captured = Captured {
    head,
    body: data[head_end + 4..].to_vec(),
  };

  if let Some(len) = captured.header("content-length") {
    let len: usize = len.parse().unwrap();
    while captured.body.len() < len {
      let n = stream.read(&mut chunk).unwrap();
      assert!(n > 0, "连接在请求体结束前关闭");
      captured.body.extend_from_slice(&chunk[..n]);
    }
  } else if captured
    .header("transfer-encoding")
    .is_some_and(|v| v.eq_ignore_ascii_case("chunked"))
  {
    while find(&captured.body, b"0\r\n\r\n").is_none() {
      let n = stream.read(&mut chunk).unwrap();
      assert!(n > 0, "连接在分块请求体结束前关闭");
      captured.body.extend_from_slice(&chunk[..n]);
    }
  }

  captured
}
