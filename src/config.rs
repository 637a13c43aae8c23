use num_cpus;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::{
    exception::Exception,
    middleware::MiddlewareRegistry,
    route::{RouteDefinition, RouteTable},
};

use log::warn;
use std::collections::HashMap;
use std::fs;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    port: u16,
    worker_threads: usize,
    local: bool,
    #[serde(default = "default_log_config")]
    log_config: String,
    #[serde(default)]
    routes: Vec<RouteEntry>,
    #[serde(default)]
    middlewares: HashMap<String, String>,
    #[serde(default)]
    bindings: HashMap<String, String>,
}

/// 配置文件中的一条路由，`path` 之外的字段与路由定义一致
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RouteEntry {
    pub path: String,
    #[serde(flatten)]
    pub definition: RouteDefinition,
}

fn default_log_config() -> String {
    "config/log4rs.yaml".to_string()
}

impl Config {
    pub fn new() -> Self {
        Self {
            port: 7878,
            worker_threads: 0,
            local: true,
            log_config: default_log_config(),
            routes: Vec::new(),
            middlewares: HashMap::new(),
            bindings: HashMap::new(),
        }
    }

    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let str_val = fs::read_to_string(filename)
            .map_err(|e| Exception::ConfigUnreadable(format!("{}: {}", filename, e)))?;
        Self::parse(&str_val)
    }

    pub fn parse(str_val: &str) -> Result<Self, Exception> {
        let mut raw_config: Config =
            toml::from_str(str_val).map_err(|e| Exception::ConfigInvalid(e.to_string()))?;
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.routes.is_empty() {
            warn!("配置文件中没有声明任何路由，所有请求都将返回404");
        }
        Ok(raw_config)
    }

    /// 按声明顺序构建路由表
    pub fn route_table(&self) -> Result<RouteTable, Exception> {
        RouteTable::from_routes(
            self.routes
                .iter()
                .map(|entry| (entry.path.as_str(), entry.definition.clone())),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn log_config(&self) -> &str {
        &self.log_config
    }

    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    pub fn middlewares(&self) -> &MiddlewareRegistry {
        &self.middlewares
    }

    pub fn bindings(&self) -> &HashMap<String, String> {
        &self.bindings
    }
}
