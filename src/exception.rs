// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了调度器在一次请求分发的生命周期中可能产生的各类异常情况。
//!
//! ## 设计意图
//! - **可恢复异常**：路由未命中（404）、方法不被允许（405）、控制器或动作缺失（500）。
//!   这些异常在调度器内部被转换为状态码与提示信息，不会向外传播。
//! - **硬失败**：依赖解析失败（接口无法绑定、未知类型、循环依赖等）会直接从
//!   `dispatch` 调用中以 `Err` 形式返回。
//! - **宿主错误**：请求解析与配置加载失败，供二进制程序使用。

use std::{error, fmt};

/// 调度过程中发生的异常类型。
#[derive(Debug, Clone, PartialEq)]
pub enum Exception {
    /// 规范化后的 URI 既不是路由表的精确键，也不匹配任何模式。对应 `404 Not Found`。
    RouteNotFound,
    /// 路由存在，但请求方法不在其允许的方法集合中。对应 `405 Method Not Allowed`。
    MethodNotAllowed,
    /// 路由声明的控制器标识符没有对应的已注册类型。对应 `500`。
    ControllerNotFound(String),
    /// 控制器实例上不存在路由声明的动作。对应 `500`。
    ActionNotFound(String),
    /// 接口既没有显式绑定，也无法通过命名约定推导出已注册的具体类型。
    UnresolvableInterface(String),
    /// 构造参数声明的依赖类型没有注册。
    UnknownType(String),
    /// 依赖图中存在环，携带从起点到重复类型的完整链路。
    CyclicDependency(Vec<String>),
    /// 具体类型的构造函数拒绝了解析得到的参数。
    ConstructionFailed(String, String),
    /// 路由模式无法编译为匹配器。
    InvalidPattern(String),
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 请求行不符合 `METHOD TARGET VERSION` 的格式。
    MalformedRequestLine,
    /// 客户端使用了服务器不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// 配置文件无法读取。
    ConfigUnreadable(String),
    /// 配置文件内容无法解析。
    ConfigInvalid(String),
}

use Exception::*;

impl Exception {
    /// 可恢复异常对应的 HTTP 状态码；硬失败返回 `None`。
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RouteNotFound => Some(404),
            MethodNotAllowed => Some(405),
            ControllerNotFound(_) | ActionNotFound(_) => Some(500),
            RequestIsNotUtf8 | MalformedRequestLine => Some(400),
            UnsupportedHttpVersion => Some(505),
            _ => None,
        }
    }

    /// 是否应当在调度器内部转换为状态码与提示信息，而不是向外传播。
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RouteNotFound | MethodNotAllowed | ControllerNotFound(_) | ActionNotFound(_)
        )
    }
}

impl fmt::Display for Exception {
    /// 根据错误类型写入人类可读的描述文本。
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteNotFound => write!(f, "Page not found."),
            MethodNotAllowed => write!(f, "Method not allowed."),
            ControllerNotFound(name) => write!(f, "Controller {} not found.", name),
            ActionNotFound(name) => write!(f, "Action {} not found.", name),
            UnresolvableInterface(name) => {
                write!(f, "Unable to resolve interface {} to a concrete type", name)
            }
            UnknownType(name) => write!(f, "Type {} is not registered", name),
            CyclicDependency(chain) => {
                write!(f, "Cyclic dependency detected: {}", chain.join(" -> "))
            }
            ConstructionFailed(name, reason) => {
                write!(f, "Failed to construct {}: {}", name, reason)
            }
            InvalidPattern(pattern) => write!(f, "Invalid route pattern: {}", pattern),
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            MalformedRequestLine => write!(f, "Malformed request line"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            ConfigUnreadable(path) => write!(f, "Couldn't read config file {}", path),
            ConfigInvalid(reason) => write!(f, "Invalid config: {}", reason),
        }
    }
}

impl error::Error for Exception {}
