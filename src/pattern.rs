// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路径模式匹配模块
//!
//! 将形如 `users/{id}/posts/{post}` 的路由模式编译为锚定的正则表达式，
//! 并从具体路径中提取命名参数。
//!
//! - 每个 `{name}` 占位符只匹配单个路径段，不能跨越 `/`。
//! - 字面量部分逐字节、大小写敏感地匹配。
//! - 路径结构与模式不符时返回 `None`，这是正常的高频结果，而非错误。

use crate::exception::Exception;

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use serde_derive::Serialize;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([^/{}]+)\}").unwrap();
}

/// 单段捕获
const SEGMENT_CAPTURE: &str = "([^/]+)";

/// 从一次匹配中提取出的参数集合，保持占位符在模式中的出现顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入参数。同名参数已存在时原位覆盖其值。
    pub fn insert(&mut self, name: &str, value: &str) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// 编译完成的路由模式。
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    names: Vec<String>,
}

impl PathPattern {
    /// 编译路由模式。
    ///
    /// 字面量部分会经过转义，因此模式中出现的 `.`、`+` 等字符只匹配其自身。
    /// 同一模式中重复的参数名会被接受，但匹配时以最后一次出现的值为准，并记录警告。
    pub fn compile(pattern: &str) -> Result<Self, Exception> {
        let mut expr = String::with_capacity(pattern.len() + 16);
        let mut names: Vec<String> = Vec::new();
        let mut last = 0;

        expr.push('^');
        for caps in PLACEHOLDER.captures_iter(pattern) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            expr.push_str(&regex::escape(&pattern[last..whole.start()]));
            expr.push_str(SEGMENT_CAPTURE);

            let name = name.as_str().to_string();
            if names.contains(&name) {
                warn!(
                    "路由模式 {} 中参数名 {} 重复出现，匹配时以最后一次出现的值为准",
                    pattern, name
                );
            }
            names.push(name);
            last = whole.end();
        }
        expr.push_str(&regex::escape(&pattern[last..]));
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|_| Exception::InvalidPattern(pattern.to_string()))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            names,
        })
    }

    /// 尝试匹配一个已规范化的路径，成功时返回提取出的参数。
    pub fn matches(&self, path: &str) -> Option<Params> {
        let caps = self.regex.captures(path)?;
        let mut params = Params::new();
        for (index, name) in self.names.iter().enumerate() {
            if let Some(value) = caps.get(index + 1) {
                params.insert(name, value.as_str());
            }
        }
        Some(params)
    }

    /// 模式是否不含任何占位符
    pub fn is_static(&self) -> bool {
        self.names.is_empty()
    }

    /// 模式中声明的参数名，按出现顺序排列（可能含重复）
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}
