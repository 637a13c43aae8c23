// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求解析模块
//!
//! 宿主服务器只需要请求行中的方法与请求目标即可驱动调度器，因此这里
//! 只解析请求行与少量用于日志的标头。方法名按原样保留，大小写敏感的比较
//! 交给路由定义完成。

use crate::{exception::Exception, param::*};
use log::error;

/// 分发所需的请求元数据
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP 请求方法，按客户端发送的原样保存
    method: String,
    /// 请求目标（包含查询字符串）
    target: String,
    /// HTTP 协议版本
    version: HttpVersion,
    /// 客户端标识字符串
    user_agent: String,
}

impl Request {
    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 参数
    /// * `buffer` - 从网络 Socket 读取的原始数据。
    /// * `id` - 全局请求 ID，用于在多线程环境下追踪日志。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let request_string = match std::str::from_utf8(buffer) {
            Ok(string) => string,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let mut request_lines = request_string.split(CRLF);
        let request_line = request_lines.next().unwrap_or_default();

        // 请求行 (e.g., "GET /users/42 HTTP/1.1")
        let parts: Vec<&str> = request_line.split(' ').filter(|p| !p.is_empty()).collect();
        let &[method, target, version_str] = parts.as_slice() else {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_line);
            return Err(Exception::MalformedRequestLine);
        };

        let version = match version_str.to_uppercase().as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            "HTTP/1.0" => HttpVersion::V1_0,
            _ => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, version_str);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        let mut user_agent = String::new();
        for line in request_lines {
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.trim().eq_ignore_ascii_case("user-agent") {
                    user_agent = value.trim().to_string();
                }
            }
        }

        Ok(Self {
            method: method.to_string(),
            target: target.to_string(),
            version,
            user_agent,
        })
    }
}

// --- Getter 访问器实现 ---

impl Request {
    /// 获取 HTTP 协议版本
    pub fn version(&self) -> HttpVersion {
        self.version
    }

    /// 获取请求目标（含查询参数）
    pub fn target(&self) -> &str {
        &self.target
    }

    /// 获取请求方法
    pub fn method(&self) -> &str {
        &self.method
    }

    /// 获取用户代理字符串
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}
