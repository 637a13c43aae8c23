// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由表模块
//!
//! 负责路由定义的数据模型、URI 规范化以及路由解析顺序：
//! 1. 所有路由键剥离首尾的 `/`。
//! 2. 规范化后的 URI 与某个键完全相同时直接选中，参数集为空，不再尝试任何模式匹配。
//! 3. 否则按声明顺序逐条尝试模式匹配，第一条匹配成功的路由胜出。
//! 4. 全部失败则视为未找到。

use crate::{
    exception::Exception,
    param::{DEFAULT_METHOD, PATH_SEPARATOR, SCHEME_SEPARATOR},
    pattern::{Params, PathPattern},
};

use log::{debug, warn};
use serde_derive::{Deserialize, Serialize};

use std::collections::HashMap;

/// 一条路由的定义：允许的方法、控制器、动作以及需要执行的中间件。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
    pub controller: String,
    #[serde(alias = "method")]
    pub action: String,
    #[serde(default)]
    pub middlewares: Vec<String>,
}

fn default_methods() -> Vec<String> {
    vec![DEFAULT_METHOD.to_string()]
}

impl RouteDefinition {
    /// 构造一条只允许 `GET`、不带中间件的路由
    pub fn new(controller: &str, action: &str) -> Self {
        Self {
            methods: default_methods(),
            controller: controller.to_string(),
            action: action.to_string(),
            middlewares: Vec::new(),
        }
    }

    pub fn with_methods(mut self, methods: &[&str]) -> Self {
        self.methods = methods.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn with_middlewares(mut self, middlewares: &[&str]) -> Self {
        self.middlewares = middlewares.iter().map(|m| m.to_string()).collect();
        self
    }

    /// 方法名大小写敏感地与声明值逐一比较
    pub fn allows(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m == method)
    }
}

/// 规范化请求目标：绝对形式先去掉协议与主机部分，再去掉查询串与片段，
/// 最后剥离首尾的 `/`。
pub fn normalize_uri(target: &str) -> &str {
    let target = strip_origin(target);
    let path = match target.find(|c: char| c == '?' || c == '#') {
        Some(index) => &target[..index],
        None => target,
    };
    path.trim_matches(PATH_SEPARATOR)
}

/// `http://host:port/path?query` 只保留 `/path?query`
fn strip_origin(target: &str) -> &str {
    let Some(position) = target.find(SCHEME_SEPARATOR) else {
        return target;
    };
    let scheme = &target[..position];
    let is_scheme = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !is_scheme {
        return target;
    }
    let rest = &target[position + SCHEME_SEPARATOR.len()..];
    match rest.find(|c: char| c == PATH_SEPARATOR || c == '?' || c == '#') {
        Some(index) => &rest[index..],
        None => "",
    }
}

/// 路由表中的一项
#[derive(Debug, Clone)]
pub struct Route {
    pattern: PathPattern,
    definition: RouteDefinition,
}

impl Route {
    /// 规范化后的路由键
    pub fn key(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn definition(&self) -> &RouteDefinition {
        &self.definition
    }
}

/// 保持声明顺序的路由表。
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    index: HashMap<String, usize>,
}

impl RouteTable {
    /// 从原始的 `(模式, 定义)` 序列构建路由表。
    ///
    /// 两个原始键规范化后相同时，后者的定义覆盖前者，但保留前者的位置。
    pub fn from_routes<I, K>(raw: I) -> Result<Self, Exception>
    where
        I: IntoIterator<Item = (K, RouteDefinition)>,
        K: AsRef<str>,
    {
        let mut table = Self::default();
        for (key, definition) in raw {
            let key = key.as_ref().trim_matches(PATH_SEPARATOR);
            let pattern = PathPattern::compile(key)?;
            match table.index.get(key) {
                Some(&position) => {
                    warn!("路由 {} 被重复声明，后声明的定义将覆盖先前的定义", key);
                    table.routes[position] = Route { pattern, definition };
                }
                None => {
                    table.index.insert(key.to_string(), table.routes.len());
                    table.routes.push(Route { pattern, definition });
                }
            }
        }
        debug!("路由表构建完成，共{}条路由", table.routes.len());
        Ok(table)
    }

    /// 按“精确优先，其次声明顺序”的规则解析一个已规范化的 URI。
    pub fn resolve(&self, uri: &str) -> Option<(&Route, Params)> {
        if let Some(&position) = self.index.get(uri) {
            debug!("URI {} 精确命中路由", uri);
            return Some((&self.routes[position], Params::new()));
        }
        self.routes.iter().find_map(|route| {
            route.pattern.matches(uri).map(|params| {
                debug!("URI {} 匹配路由模式 {}", uri, route.key());
                (route, params)
            })
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}
