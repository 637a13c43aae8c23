// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 示例应用
//!
//! 宿主程序注册到调度器中的控制器、服务与中间件。
//! `UserController` 依赖 `UserRepositoryInterface`，后者默认按命名约定解析为
//! `UserRepository`，也可以在配置文件的 `[bindings]` 中改写为 `CachedUserRepository`。
//! 控制器只通过仓储的 `find`/`all` 动作访问数据，不关心绑定的具体类型。

use dispatcher::{
    container::{instance, Arguments, Component, Container, Dependency, Instance},
    exception::Exception,
    middleware::{Middleware, MiddlewareCatalog},
    pattern::Params,
};

use chrono::Local;
use log::info;
use serde_json::json;

pub struct HomeController;

impl Component for HomeController {
    fn call(&self, action: &str, _params: Option<&Params>) -> Option<String> {
        match action {
            "index" => Some("Welcome to shaneyale-dispatcher.".to_string()),
            _ => None,
        }
    }
}

pub struct UserRepository {
    table: String,
}

impl UserRepository {
    fn build(args: &Arguments) -> Result<Instance, Exception> {
        let table = args
            .str(0)
            .ok_or_else(|| args.fail("table name is required"))?;
        Ok(instance(UserRepository {
            table: table.to_string(),
        }))
    }
}

impl Component for UserRepository {
    fn call(&self, action: &str, params: Option<&Params>) -> Option<String> {
        match action {
            "find" => params
                .and_then(|p| p.get("id"))
                .map(|id| format!("{} #{}", self.table, id)),
            "all" => Some(format!("all rows of {}", self.table)),
            _ => None,
        }
    }
}

/// 带读缓存的仓储实现，需通过 `[bindings]` 显式选用
pub struct CachedUserRepository {
    inner: Instance,
}

impl Component for CachedUserRepository {
    fn call(&self, action: &str, params: Option<&Params>) -> Option<String> {
        self.inner
            .call(action, params)
            .map(|rows| format!("{} (cached)", rows))
    }
}

pub struct UserController {
    repository: Instance,
}

impl Component for UserController {
    fn call(&self, action: &str, params: Option<&Params>) -> Option<String> {
        match (action, params) {
            ("index", _) => self.repository.call("all", None),
            ("show", Some(params)) => self.repository.call("find", Some(params)),
            ("show", None) => Some("missing user id".to_string()),
            _ => None,
        }
    }
}

/// 应用的类型表
pub fn container() -> Container {
    let mut container = Container::new();
    container
        .register("HomeController", vec![], |_| Ok(instance(HomeController)))
        .register(
            "UserRepository",
            vec![Dependency::builtin("table", Some(json!("users")))],
            UserRepository::build,
        )
        .register(
            "CachedUserRepository",
            vec![Dependency::service("UserRepository")],
            |args| {
                Ok(instance(CachedUserRepository {
                    inner: args.service(0)?,
                }))
            },
        )
        .register_interface("UserRepositoryInterface")
        .register(
            "UserController",
            vec![Dependency::service("UserRepositoryInterface")],
            |args| {
                Ok(instance(UserController {
                    repository: args.service(0)?,
                }))
            },
        );
    container
}

/// 记录一次访问
pub struct AccessLog;

impl Middleware for AccessLog {
    fn invoke(&self) {
        info!("AccessLog 中间件已执行");
    }
}

/// 记录中间件链开始执行的时间
pub struct Stopwatch {
    started: chrono::DateTime<Local>,
}

impl Middleware for Stopwatch {
    fn invoke(&self) {
        info!("Stopwatch 中间件已执行，开始时间 {}", self.started.format("%H:%M:%S%.3f"));
    }
}

/// 应用的中间件目录
pub fn middleware_catalog() -> MiddlewareCatalog {
    let mut catalog = MiddlewareCatalog::new();
    catalog
        .register("AccessLog", || Box::new(AccessLog) as Box<dyn Middleware>)
        .register("Stopwatch", || {
            Box::new(Stopwatch {
                started: Local::now(),
            }) as Box<dyn Middleware>
        });
    catalog
}
