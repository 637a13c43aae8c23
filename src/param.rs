// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 调度器常量模块
//!
//! 该模块集中定义了调度器与其宿主服务器共用的常量，包括：
//! - 常见的 HTTP 状态码及其原因短语（Reason Phrase）。
//! - 路由表的默认方法集合。
//! - 接口类型的命名约定标记。

use std::collections::HashMap;
use lazy_static::lazy_static;

/// 服务器名称标识，用于 HTTP 响应头的 `Server` 字段
pub const SERVER_NAME: &str = "shaneyale-dispatcher";

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

/// 路径分隔符，规范化 URI 与路由键时从两端剥离
pub const PATH_SEPARATOR: char = '/';

/// 绝对形式请求目标中协议名与主机之间的分隔符
pub const SCHEME_SEPARATOR: &str = "://";

/// 只返回标头的请求方法
pub const HEAD_METHOD: &str = "HEAD";

/// 路由未声明 `methods` 时允许的唯一方法
pub const DEFAULT_METHOD: &str = "GET";

/// 接口类型名称的后缀标记，例如 `UserRepositoryInterface`
pub const INTERFACE_SUFFIX: &str = "Interface";

/// 存放接口类型的命名空间段，例如 `app::interfaces::UserRepositoryInterface`
pub const INTERFACE_NAMESPACE: &str = "interfaces";

/// 类型标识符中命名空间的分隔符
pub const NAMESPACE_SEPARATOR: &str = "::";

lazy_static! {
    /// HTTP 状态码与其对应的标准原因短语映射表。
    ///
    /// 参考标准：[RFC 9110: HTTP Semantics](https://www.rfc-editor.org/rfc/rfc9110.html)。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        // 2xx: 成功响应 (Successful)
        map.insert(200, "OK");
        map.insert(204, "No Content");

        // 4xx: 客户端错误 (Client Error)
        map.insert(400, "Bad Request");
        map.insert(404, "Not Found");
        map.insert(405, "Method Not Allowed");

        // 5xx: 服务端错误 (Server Error)
        map.insert(500, "Internal Server Error");
        map.insert(505, "HTTP Version Not Supported");
        map
    };
}

/// 支持的 HTTP 协议版本
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpVersion {
    /// HTTP/1.0 版本
    V1_0,
    /// HTTP/1.1 版本
    V1_1,
}

use std::fmt;

impl fmt::Display for HttpVersion {
    /// 将枚举格式化为 HTTP 报文中的版本字符串
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpVersion::V1_0 => write!(f, "1.0"),
            HttpVersion::V1_1 => write!(f, "1.1"),
        }
    }
}
