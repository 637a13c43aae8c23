use crate::{dispatcher::Outcome, exception::Exception, param::*};

use bytes::Bytes;
use chrono::prelude::*;
use log::error;

#[derive(Debug, Clone)]
pub struct Response {
    version: HttpVersion,
    status_code: u16,
    information: String,
    content_type: Option<String>,
    content_length: u64,
    date: DateTime<Utc>,
    server_name: String,
    allow: Option<Vec<String>>,
    content: Option<Bytes>,
}

impl Response {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: 200,
            information: "OK".to_string(),
            content_type: None,
            content_length: 0,
            date: Utc::now(),
            server_name: SERVER_NAME.to_string(),
            allow: None,
            content: None,
        }
    }

    /// 将一次分发的结果转换为响应。
    ///
    /// 动作的输出原样作为响应体；失败结果使用状态码与简短的提示信息。
    pub fn from_outcome(outcome: &Outcome) -> Self {
        let mut response = Self::new();
        match outcome {
            Outcome::Invoked { output } => {
                response.set_body(output);
            }
            Outcome::Rejected {
                status,
                message,
                allow,
            } => {
                response.set_code(*status).set_body(message);
                if !allow.is_empty() {
                    response.allow = Some(allow.clone());
                }
            }
        }
        response.set_date().to_owned()
    }

    /// 请求解析失败或依赖解析失败时使用
    pub fn from_exception(exception: &Exception, id: u128) -> Self {
        let code = exception.status_code().unwrap_or(500);
        if code >= 500 {
            error!("[ID{}]请求处理失败：{}", id, exception);
        }
        let information = STATUS_CODES.get(&code).copied().unwrap_or("Internal Server Error");
        Self::new()
            .set_code(code)
            .set_body(information)
            .set_date()
            .to_owned()
    }

    /// HEAD 请求只返回标头，`Content-Length` 仍按完整响应体计算
    pub fn head_only(&mut self) -> &mut Self {
        self.content = None;
        self
    }

    fn set_body(&mut self, body: &str) -> &mut Self {
        let content = Bytes::from(body.to_string());
        self.content_length = content.len() as u64;
        self.content_type = Some("text/plain;charset=utf-8".to_string());
        self.content = Some(content);
        self
    }

    fn set_date(&mut self) -> &mut Self {
        self.date = Utc::now();
        self
    }

    fn set_code(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.information = match STATUS_CODES.get(&code) {
            Some(&information) => information.to_string(),
            None => {
                error!("未登记的状态码：{}，使用500代替", code);
                self.status_code = 500;
                "Internal Server Error".to_string()
            }
        };
        self
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let version: &str = match self.version {
            HttpVersion::V1_0 => "HTTP/1.0",
            HttpVersion::V1_1 => "HTTP/1.1",
        };
        let status_code: &str = &self.status_code.to_string();
        let content_length: &str = &self.content_length.to_string();
        let date: &str = &format_date(&self.date);

        let header = [
            version,
            " ",
            status_code,
            " ",
            &self.information,
            CRLF,
            match &self.content_type {
                Some(t) => ["Content-Type: ", t, CRLF].concat(),
                None => "".to_string(),
            }
            .as_str(),
            "Content-Length: ",
            content_length,
            CRLF,
            "Date: ",
            date,
            CRLF,
            "Server: ",
            &self.server_name,
            CRLF,
            match &self.allow {
                Some(a) => ["Allow: ", &a.join(", "), CRLF].concat(),
                None => "".to_string(),
            }
            .as_str(),
            "Connection: close",
            CRLF,
            CRLF,
        ]
        .concat();
        [
            header.as_bytes(),
            self.content.as_deref().unwrap_or_default(),
        ]
        .concat()
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc2822()
}
