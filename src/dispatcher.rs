// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 调度器
//!
//! 一次请求的分发是一个同步的状态机：
//!
//! ```text
//! Start → Normalized → RouteResolved → MethodValidated
//!       → MiddlewaresRun → ControllerResolved → ActionInvoked
//! ```
//!
//! 任一状态都可能以失败终止：
//! - 路由未找到 → `404`
//! - 方法不被允许 → `405`（此时不执行中间件，也不构造控制器）
//! - 控制器或动作不存在 → `500`
//!
//! 以上失败在本地转换为 [`Outcome::Rejected`]。依赖解析失败则作为 `Err` 返回给调用者。

use crate::{
    container::Container,
    exception::Exception,
    middleware::{self, MiddlewareCatalog, MiddlewareRegistry},
    route::{normalize_uri, RouteDefinition, RouteTable},
};

use log::{debug, error, warn};

use std::collections::HashMap;

/// 一次分发的终止结果
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 动作已被调用，携带其输出
    Invoked { output: String },
    /// 分发在本地失败终止
    Rejected {
        status: u16,
        message: String,
        /// 仅在 `405` 时非空，列出路由允许的方法
        allow: Vec<String>,
    },
}

impl Outcome {
    pub fn status_code(&self) -> u16 {
        match self {
            Outcome::Invoked { .. } => 200,
            Outcome::Rejected { status, .. } => *status,
        }
    }

    fn rejected(exception: Exception, allow: Vec<String>) -> Self {
        let status = exception.status_code().unwrap_or(500);
        warn!("分发终止：{} {}", status, exception);
        Outcome::Rejected {
            status,
            message: exception.to_string(),
            allow,
        }
    }
}

/// 持有类型表与中间件目录的调度器。
///
/// 构造完成并调用 `set_dependency_map` 之后，调度器只以 `&self` 使用，
/// 可以放进 `Arc` 在多个连接之间共享。
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    container: Container,
    middlewares: MiddlewareCatalog,
}

impl Dispatcher {
    pub fn new(container: Container, middlewares: MiddlewareCatalog) -> Self {
        Self {
            container,
            middlewares,
        }
    }

    /// 整体替换依赖绑定表，应在开始处理请求之前调用
    pub fn set_dependency_map(&mut self, bindings: HashMap<String, String>) {
        self.container.set_dependency_map(bindings);
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// 由原始路由序列即时构建路由表并分发
    pub fn resolve<K: AsRef<str>>(
        &self,
        routes: &[(K, RouteDefinition)],
        registry: &MiddlewareRegistry,
        method: &str,
        target: &str,
    ) -> Result<Outcome, Exception> {
        let table = RouteTable::from_routes(
            routes
                .iter()
                .map(|(key, definition)| (key.as_ref(), definition.clone())),
        )?;
        self.dispatch(&table, registry, method, target)
    }

    /// 在预先构建好的路由表上分发一次请求
    pub fn dispatch(
        &self,
        table: &RouteTable,
        registry: &MiddlewareRegistry,
        method: &str,
        target: &str,
    ) -> Result<Outcome, Exception> {
        let uri = normalize_uri(target);
        debug!("请求目标 {} 规范化为 {}", target, uri);

        let Some((route, params)) = table.resolve(uri) else {
            return Ok(Outcome::rejected(Exception::RouteNotFound, Vec::new()));
        };
        let definition = route.definition();
        debug!("命中路由 {}，参数{}个", route.key(), params.len());

        if !definition.allows(method) {
            return Ok(Outcome::rejected(
                Exception::MethodNotAllowed,
                definition.methods.clone(),
            ));
        }

        let invoked = middleware::run(&definition.middlewares, registry, &self.middlewares);
        debug!(
            "中间件执行完毕，声明{}个，实际调用{}个",
            definition.middlewares.len(),
            invoked
        );

        if !self.container.contains(&definition.controller) {
            return Ok(Outcome::rejected(
                Exception::ControllerNotFound(definition.controller.clone()),
                Vec::new(),
            ));
        }
        let controller = self
            .container
            .construct(&definition.controller)
            .map_err(|e| {
                error!("无法构造控制器 {}：{}", definition.controller, e);
                e
            })?;

        let params = if params.is_empty() { None } else { Some(&params) };
        match controller.call(&definition.action, params) {
            Some(output) => {
                debug!(
                    "动作 {}::{} 调用完成",
                    definition.controller, definition.action
                );
                Ok(Outcome::Invoked { output })
            }
            None => Ok(Outcome::rejected(
                Exception::ActionNotFound(definition.action.clone()),
                Vec::new(),
            )),
        }
    }
}
