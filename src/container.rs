// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 依赖解析模块
//!
//! 控制器及其依赖不通过运行时反射构造，而是在启动阶段注册到一张静态的构造描述表中：
//! 每个具体类型声明一组有序的依赖描述（服务类型，或带可选默认值的内建参数），
//! 以及一个接收解析结果并返回实例的工厂函数。
//!
//! ## 解析规则
//! 1. 接口类型先查显式绑定表，再按命名约定推导候选具体类型
//!    （去掉 `interfaces` 命名空间段与 `Interface` 后缀），两者都失败则报错。
//! 2. 按声明顺序逐个解析构造参数：服务类型递归解析，内建参数取默认值或 `None`。
//! 3. 沿当前解析链记录已访问的类型，一旦重复即返回 `CyclicDependency`，
//!    不会无限递归。
//!
//! 绑定表只能通过 `&mut self` 的 `set_dependency_map` 整体替换，
//! 因此在容器被共享给并发的调度之前必须完成写入。

use crate::{
    exception::Exception,
    param::{INTERFACE_NAMESPACE, INTERFACE_SUFFIX, NAMESPACE_SEPARATOR},
    pattern::Params,
};

use log::debug;
use serde_json::Value;

use std::{any::Any, collections::HashMap, fmt, sync::Arc};

/// 已构造的实例
pub type Instance = Arc<dyn Component>;

/// 具体类型的工厂函数
pub type Factory = Arc<dyn Fn(&Arguments) -> Result<Instance, Exception> + Send + Sync>;

/// 向下转型辅助，所有 `'static + Send + Sync` 类型自动实现
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// 可由容器构造的组件。
///
/// 控制器通过覆盖 `call` 暴露其动作；普通服务保持默认实现即可。
pub trait Component: AsAny {
    /// 调用名为 `action` 的动作。
    ///
    /// `params` 仅在路由提取出参数时为 `Some`。动作不存在时返回 `None`。
    fn call(&self, action: &str, params: Option<&Params>) -> Option<String> {
        let _ = (action, params);
        None
    }
}

/// 将组件包装为共享实例
pub fn instance<T: Component>(component: T) -> Instance {
    Arc::new(component)
}

/// 将实例向下转型为具体类型的引用
pub fn downcast<T: Component>(instance: &Instance) -> Option<&T> {
    (**instance).as_any().downcast_ref::<T>()
}

/// 构造参数的依赖描述
#[derive(Debug, Clone, PartialEq)]
pub enum Dependency {
    /// 类或接口类型，递归解析
    Service(String),
    /// 内建类型参数，提供默认值时使用默认值，否则为空
    Builtin { name: String, default: Option<Value> },
}

impl Dependency {
    pub fn service(type_name: &str) -> Self {
        Dependency::Service(type_name.to_string())
    }

    pub fn builtin(name: &str, default: Option<Value>) -> Self {
        Dependency::Builtin {
            name: name.to_string(),
            default,
        }
    }
}

/// 解析得到的单个构造参数
#[derive(Clone)]
pub enum Argument {
    Service(Instance),
    Value(Option<Value>),
}

/// 传给工厂函数的全部构造参数，顺序与依赖描述一致。
pub struct Arguments {
    type_name: String,
    values: Vec<Argument>,
}

impl Arguments {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 第 `index` 个参数作为服务实例
    pub fn service(&self, index: usize) -> Result<Instance, Exception> {
        match self.values.get(index) {
            Some(Argument::Service(instance)) => Ok(Arc::clone(instance)),
            _ => Err(self.fail(&format!("argument {} is not a service", index))),
        }
    }

    /// 第 `index` 个参数向下转型为具体类型
    pub fn concrete<T: Component>(&self, index: usize) -> Result<Arc<T>, Exception> {
        self.service(index)?
            .into_any()
            .downcast::<T>()
            .map_err(|_| self.fail(&format!("argument {} has an unexpected type", index)))
    }

    /// 第 `index` 个内建参数的值，缺省时为 `None`
    pub fn value(&self, index: usize) -> Option<&Value> {
        match self.values.get(index) {
            Some(Argument::Value(value)) => value.as_ref(),
            _ => None,
        }
    }

    pub fn str(&self, index: usize) -> Option<&str> {
        self.value(index).and_then(Value::as_str)
    }

    pub fn fail(&self, reason: &str) -> Exception {
        Exception::ConstructionFailed(self.type_name.clone(), reason.to_string())
    }
}

#[derive(Clone)]
enum TypeDescriptor {
    Concrete {
        dependencies: Vec<Dependency>,
        factory: Factory,
    },
    Interface,
}

/// 按命名约定从接口名推导具体类型名。
///
/// `app::interfaces::UserRepositoryInterface` 推导为 `app::UserRepository`，
/// `LoggerInterface` 推导为 `Logger`。名称不带任何接口标记时返回 `None`。
pub fn conventional_concrete_name(interface: &str) -> Option<String> {
    let segments: Vec<&str> = interface.split(NAMESPACE_SEPARATOR).collect();
    let (last, namespace) = segments.split_last()?;

    let stripped = last
        .strip_suffix(INTERFACE_SUFFIX)
        .filter(|base| !base.is_empty());
    let in_interface_namespace = namespace.contains(&INTERFACE_NAMESPACE);
    if stripped.is_none() && !in_interface_namespace {
        return None;
    }

    let mut candidate: Vec<&str> = namespace
        .iter()
        .copied()
        .filter(|segment| *segment != INTERFACE_NAMESPACE)
        .collect();
    candidate.push(stripped.unwrap_or(*last));
    Some(candidate.join(NAMESPACE_SEPARATOR))
}

/// 构造描述表与接口绑定表
#[derive(Clone, Default)]
pub struct Container {
    types: HashMap<String, TypeDescriptor>,
    bindings: HashMap<String, String>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个具体类型及其构造依赖
    pub fn register<F>(&mut self, type_name: &str, dependencies: Vec<Dependency>, factory: F) -> &mut Self
    where
        F: Fn(&Arguments) -> Result<Instance, Exception> + Send + Sync + 'static,
    {
        self.types.insert(
            type_name.to_string(),
            TypeDescriptor::Concrete {
                dependencies,
                factory: Arc::new(factory),
            },
        );
        self
    }

    /// 注册一个接口类型
    pub fn register_interface(&mut self, type_name: &str) -> &mut Self {
        self.types
            .insert(type_name.to_string(), TypeDescriptor::Interface);
        self
    }

    /// 整体替换接口绑定表（不合并）
    pub fn set_dependency_map(&mut self, bindings: HashMap<String, String>) {
        debug!("依赖绑定表已替换，共{}条绑定", bindings.len());
        self.bindings = bindings;
    }

    pub fn bindings(&self) -> &HashMap<String, String> {
        &self.bindings
    }

    /// 标识符是否对应一个已注册的类型
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn is_interface(&self, type_name: &str) -> bool {
        matches!(self.types.get(type_name), Some(TypeDescriptor::Interface))
    }

    /// 将接口映射为具体类型：显式绑定优先，其次命名约定。
    pub fn bind(&self, interface: &str) -> Result<String, Exception> {
        if let Some(concrete) = self.bindings.get(interface) {
            debug!("接口 {} 通过绑定表映射到 {}", interface, concrete);
            return Ok(concrete.clone());
        }
        match conventional_concrete_name(interface) {
            Some(candidate) if self.contains(&candidate) && !self.is_interface(&candidate) => {
                debug!("接口 {} 通过命名约定映射到 {}", interface, candidate);
                Ok(candidate)
            }
            _ => Err(Exception::UnresolvableInterface(interface.to_string())),
        }
    }

    /// 递归构造一个类型的实例
    pub fn construct(&self, type_name: &str) -> Result<Instance, Exception> {
        let mut chain = Vec::new();
        self.construct_in(type_name, &mut chain)
    }

    fn construct_in(&self, type_name: &str, chain: &mut Vec<String>) -> Result<Instance, Exception> {
        if chain.iter().any(|visited| visited == type_name) {
            let mut cycle = chain.clone();
            cycle.push(type_name.to_string());
            return Err(Exception::CyclicDependency(cycle));
        }

        let descriptor = self
            .types
            .get(type_name)
            .ok_or_else(|| Exception::UnknownType(type_name.to_string()))?;

        let (dependencies, factory) = match descriptor {
            TypeDescriptor::Interface => {
                let concrete = self.bind(type_name)?;
                chain.push(type_name.to_string());
                let resolved = self.construct_in(&concrete, chain);
                chain.pop();
                return resolved;
            }
            TypeDescriptor::Concrete {
                dependencies,
                factory,
            } => (dependencies, factory),
        };

        chain.push(type_name.to_string());
        let mut values = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            let argument = match dependency {
                Dependency::Service(dep) => match self.construct_in(dep, chain) {
                    Ok(instance) => Argument::Service(instance),
                    Err(e) => {
                        chain.pop();
                        return Err(e);
                    }
                },
                Dependency::Builtin { default, .. } => Argument::Value(default.clone()),
            };
            values.push(argument);
        }
        chain.pop();

        debug!("构造 {}，共{}个构造参数", type_name, values.len());
        factory(&Arguments {
            type_name: type_name.to_string(),
            values,
        })
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&String> = self.types.keys().collect();
        types.sort();
        f.debug_struct("Container")
            .field("types", &types)
            .field("bindings", &self.bindings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Clock;
    impl Component for Clock {}

    struct Mailer {
        sender: String,
        retries: Option<Value>,
    }
    impl Component for Mailer {}

    struct Notifier {
        mailer: Arc<Mailer>,
        clock: Instance,
    }
    impl Component for Notifier {}

    fn base() -> Container {
        let mut c = Container::new();
        c.register("Clock", vec![], |_| Ok(instance(Clock)));
        c.register(
            "app::Mailer",
            vec![
                Dependency::builtin("sender", Some(json!("noreply@example.com"))),
                Dependency::builtin("retries", None),
            ],
            |args| {
                Ok(instance(Mailer {
                    sender: args.str(0).unwrap_or_default().to_string(),
                    retries: args.value(1).cloned(),
                }))
            },
        );
        c.register_interface("app::interfaces::MailerInterface");
        c.register(
            "Notifier",
            vec![
                Dependency::service("app::interfaces::MailerInterface"),
                Dependency::service("Clock"),
            ],
            |args| {
                Ok(instance(Notifier {
                    mailer: args.concrete::<Mailer>(0)?,
                    clock: args.service(1)?,
                }))
            },
        );
        c
    }

    #[test]
    fn test_conventional_name() {
        assert_eq!(
            conventional_concrete_name("LoggerInterface").as_deref(),
            Some("Logger")
        );
        assert_eq!(
            conventional_concrete_name("app::interfaces::UserRepositoryInterface").as_deref(),
            Some("app::UserRepository")
        );
        assert_eq!(
            conventional_concrete_name("app::interfaces::Cache").as_deref(),
            Some("app::Cache")
        );
        assert_eq!(conventional_concrete_name("Logger"), None);
        assert_eq!(conventional_concrete_name("Interface"), None);
    }

    #[test]
    fn test_zero_argument_constructor() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut c = Container::new();
        c.register("Clock", vec![], move |args| {
            assert!(args.is_empty());
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(instance(Clock))
        });
        let built = c.construct("Clock").unwrap();
        assert!(downcast::<Clock>(&built).is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_builtin_defaults_and_absent_values() {
        let built = base().construct("app::Mailer").unwrap();
        let mailer = downcast::<Mailer>(&built).unwrap();
        assert_eq!(mailer.sender, "noreply@example.com");
        assert_eq!(mailer.retries, None);
    }

    #[test]
    fn test_interface_resolved_by_convention() {
        let built = base().construct("Notifier").unwrap();
        let notifier = downcast::<Notifier>(&built).unwrap();
        assert_eq!(notifier.mailer.sender, "noreply@example.com");
        assert!(downcast::<Clock>(&notifier.clock).is_some());
    }

    #[test]
    fn test_explicit_binding_takes_priority() {
        struct FakeMailer;
        impl Component for FakeMailer {}

        let mut c = base();
        c.register("FakeMailer", vec![], |_| Ok(instance(FakeMailer)));
        c.set_dependency_map(HashMap::from([(
            "app::interfaces::MailerInterface".to_string(),
            "FakeMailer".to_string(),
        )]));
        let built = c.construct("app::interfaces::MailerInterface").unwrap();
        assert!(downcast::<FakeMailer>(&built).is_some());
    }

    #[test]
    fn test_binding_to_another_interface_is_followed() {
        let mut c = base();
        c.register_interface("app::interfaces::TransportInterface");
        c.set_dependency_map(HashMap::from([
            (
                "app::interfaces::TransportInterface".to_string(),
                "app::interfaces::MailerInterface".to_string(),
            ),
        ]));
        // TransportInterface -> MailerInterface（绑定）-> app::Mailer（命名约定）
        let built = c.construct("app::interfaces::TransportInterface").unwrap();
        let mailer = downcast::<Mailer>(&built).unwrap();
        assert_eq!(mailer.sender, "noreply@example.com");
    }

    #[test]
    fn test_bindings_between_interfaces_can_cycle() {
        let mut c = Container::new();
        c.register_interface("AInterface");
        c.register_interface("BInterface");
        c.set_dependency_map(HashMap::from([
            ("AInterface".to_string(), "BInterface".to_string()),
            ("BInterface".to_string(), "AInterface".to_string()),
        ]));
        assert_eq!(
            c.construct("AInterface").err(),
            Some(Exception::CyclicDependency(vec![
                "AInterface".to_string(),
                "BInterface".to_string(),
                "AInterface".to_string()
            ]))
        );
    }

    #[test]
    fn test_binding_to_unregistered_type() {
        let mut c = base();
        c.set_dependency_map(HashMap::from([(
            "app::interfaces::MailerInterface".to_string(),
            "app::SmtpMailer".to_string(),
        )]));
        assert_eq!(
            c.bind("app::interfaces::MailerInterface").as_deref(),
            Ok("app::SmtpMailer")
        );
        assert_eq!(
            c.construct("Notifier").err(),
            Some(Exception::UnknownType("app::SmtpMailer".to_string()))
        );
    }

    #[test]
    fn test_set_dependency_map_replaces_wholesale() {
        let mut c = Container::new();
        c.set_dependency_map(HashMap::from([("AInterface".to_string(), "A".to_string())]));
        c.set_dependency_map(HashMap::from([("BInterface".to_string(), "B".to_string())]));
        assert_eq!(c.bindings().len(), 1);
        assert!(c.bindings().contains_key("BInterface"));
    }

    #[test]
    fn test_unbound_interface_fails_with_its_name() {
        let mut c = Container::new();
        c.register_interface("PaymentGatewayInterface");
        c.register(
            "CheckoutController",
            vec![Dependency::service("PaymentGatewayInterface")],
            |args| {
                args.service(0)?;
                Ok(instance(Clock))
            },
        );
        let err = c.construct("CheckoutController").err().unwrap();
        assert_eq!(
            err,
            Exception::UnresolvableInterface("PaymentGatewayInterface".to_string())
        );
    }

    #[test]
    fn test_unknown_dependency() {
        let mut c = Container::new();
        c.register("A", vec![Dependency::service("Missing")], |_| Ok(instance(Clock)));
        assert_eq!(
            c.construct("A").err(),
            Some(Exception::UnknownType("Missing".to_string()))
        );
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut c = Container::new();
        c.register("Node", vec![Dependency::service("Node")], |_| Ok(instance(Clock)));
        assert_eq!(
            c.construct("Node").err(),
            Some(Exception::CyclicDependency(vec![
                "Node".to_string(),
                "Node".to_string()
            ]))
        );
    }

    #[test]
    fn test_mutual_reference_through_interface_is_a_cycle() {
        let mut c = Container::new();
        c.register("A", vec![Dependency::service("BInterface")], |_| Ok(instance(Clock)));
        c.register_interface("BInterface");
        c.register("B", vec![Dependency::service("A")], |_| Ok(instance(Clock)));
        let err = c.construct("A").err().unwrap();
        assert_eq!(
            err,
            Exception::CyclicDependency(vec![
                "A".to_string(),
                "BInterface".to_string(),
                "B".to_string(),
                "A".to_string()
            ])
        );
    }

    #[test]
    fn test_shared_dependency_is_not_a_cycle() {
        let mut c = Container::new();
        c.register("Clock", vec![], |_| Ok(instance(Clock)));
        c.register("Left", vec![Dependency::service("Clock")], |_| Ok(instance(Clock)));
        c.register(
            "Root",
            vec![
                Dependency::service("Left"),
                Dependency::service("Clock"),
            ],
            |_| Ok(instance(Clock)),
        );
        assert!(c.construct("Root").is_ok());
    }

    #[test]
    fn test_wrong_downcast_reports_construction_failure() {
        let mut c = Container::new();
        c.register("Clock", vec![], |_| Ok(instance(Clock)));
        c.register("Bad", vec![Dependency::service("Clock")], |args| {
            let mailer = args.concrete::<Mailer>(0)?;
            Ok(instance(Notifier {
                clock: args.service(0)?,
                mailer,
            }))
        });
        match c.construct("Bad") {
            Err(Exception::ConstructionFailed(name, _)) => assert_eq!(name, "Bad"),
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }
}
