// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 中间件模块
//!
//! 中间件是无参数、无返回值的可调用单元，在控制器构造之前按路由声明的顺序依次执行。
//! 它们只产生副作用，无法中断请求的分发。
//!
//! 名称先经 [`MiddlewareRegistry`] 映射为类型标识符，再由 [`MiddlewareCatalog`]
//! 实例化。任何一步查找失败都视为空操作，直接跳过。

use log::debug;

use std::{collections::HashMap, fmt, sync::Arc};

/// 中间件名称到类型标识符的映射，由宿主在每次分发时提供
pub type MiddlewareRegistry = HashMap<String, String>;

/// 无参构造函数
pub type MiddlewareConstructor = Arc<dyn Fn() -> Box<dyn Middleware> + Send + Sync>;

#[cfg_attr(test, mockall::automock)]
pub trait Middleware: Send + Sync {
    fn invoke(&self);
}

/// 类型表中登记的中间件类型
#[derive(Clone)]
pub enum MiddlewareUnit {
    /// 可以实例化并调用
    Invokable(MiddlewareConstructor),
    /// 类型存在但不可调用，执行时跳过
    Inert,
}

/// 类型标识符到中间件类型的映射
#[derive(Clone, Default)]
pub struct MiddlewareCatalog {
    units: HashMap<String, MiddlewareUnit>,
}

impl MiddlewareCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, type_name: &str, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Middleware> + Send + Sync + 'static,
    {
        self.units.insert(
            type_name.to_string(),
            MiddlewareUnit::Invokable(Arc::new(constructor)),
        );
        self
    }

    pub fn register_inert(&mut self, type_name: &str) -> &mut Self {
        self.units
            .insert(type_name.to_string(), MiddlewareUnit::Inert);
        self
    }

    /// 实例化一个可调用的中间件；类型不存在或不可调用时返回 `None`
    pub fn instantiate(&self, type_name: &str) -> Option<Box<dyn Middleware>> {
        match self.units.get(type_name)? {
            MiddlewareUnit::Invokable(constructor) => Some(constructor()),
            MiddlewareUnit::Inert => None,
        }
    }
}

impl fmt::Debug for MiddlewareCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.units.keys().collect();
        names.sort();
        f.debug_struct("MiddlewareCatalog")
            .field("units", &names)
            .finish()
    }
}

/// 按 `names` 的顺序执行中间件，返回实际被调用的数量。
pub fn run(names: &[String], registry: &MiddlewareRegistry, catalog: &MiddlewareCatalog) -> usize {
    let mut invoked = 0;
    for name in names {
        let middleware = registry
            .get(name)
            .and_then(|type_name| catalog.instantiate(type_name));
        match middleware {
            Some(middleware) => {
                debug!("执行中间件 {}", name);
                middleware.invoke();
                invoked += 1;
            }
            None => debug!("中间件 {} 未注册或不可调用，已跳过", name),
        }
    }
    invoked
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::Sequence;
    use std::sync::Mutex;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// 把预先设置好期望的 mock 放进目录，构造函数只会被调用一次
    fn register_mock(catalog: &mut MiddlewareCatalog, type_name: &str, mock: MockMiddleware) {
        let slot = Mutex::new(Some(mock));
        catalog.register(type_name, move || {
            let mock = slot.lock().unwrap().take().expect("constructed twice");
            Box::new(mock) as Box<dyn Middleware>
        });
    }

    #[test]
    fn test_invocation_follows_declaration_order() {
        let mut seq = Sequence::new();
        let mut a = MockMiddleware::new();
        a.expect_invoke().times(1).in_sequence(&mut seq).return_const(());
        let mut b = MockMiddleware::new();
        b.expect_invoke().times(1).in_sequence(&mut seq).return_const(());

        let mut catalog = MiddlewareCatalog::new();
        register_mock(&mut catalog, "mw::A", a);
        register_mock(&mut catalog, "mw::B", b);
        let registry = MiddlewareRegistry::from([
            ("a".to_string(), "mw::A".to_string()),
            ("b".to_string(), "mw::B".to_string()),
        ]);

        assert_eq!(run(&names(&["a", "b"]), &registry, &catalog), 2);
    }

    #[test]
    fn test_unregistered_name_is_skipped() {
        let mut a = MockMiddleware::new();
        a.expect_invoke().times(1).return_const(());
        let mut b = MockMiddleware::new();
        b.expect_invoke().times(1).return_const(());

        let mut catalog = MiddlewareCatalog::new();
        register_mock(&mut catalog, "mw::A", a);
        register_mock(&mut catalog, "mw::B", b);
        let registry = MiddlewareRegistry::from([
            ("a".to_string(), "mw::A".to_string()),
            ("b".to_string(), "mw::B".to_string()),
        ]);

        assert_eq!(run(&names(&["a", "c", "b"]), &registry, &catalog), 2);
    }

    #[test]
    fn test_missing_type_and_inert_type_are_skipped() {
        let mut catalog = MiddlewareCatalog::new();
        catalog.register_inert("mw::Plain");
        let registry = MiddlewareRegistry::from([
            ("ghost".to_string(), "mw::Ghost".to_string()),
            ("plain".to_string(), "mw::Plain".to_string()),
        ]);

        assert_eq!(run(&names(&["ghost", "plain"]), &registry, &catalog), 0);
        assert!(catalog.instantiate("mw::Plain").is_none());
    }

    #[test]
    fn test_each_run_constructs_a_fresh_instance() {
        let built = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&built);
        let mut catalog = MiddlewareCatalog::new();
        catalog.register("mw::Count", move || {
            *counter.lock().unwrap() += 1;
            let mut mock = MockMiddleware::new();
            mock.expect_invoke().return_const(());
            Box::new(mock) as Box<dyn Middleware>
        });
        let registry = MiddlewareRegistry::from([("count".to_string(), "mw::Count".to_string())]);

        run(&names(&["count", "count"]), &registry, &catalog);
        assert_eq!(*built.lock().unwrap(), 2);
    }

    #[test]
    fn test_empty_list_is_trivially_satisfied() {
        let catalog = MiddlewareCatalog::new();
        assert_eq!(run(&[], &MiddlewareRegistry::new(), &catalog), 0);
    }
}
