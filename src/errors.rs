use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeygateError {
    Validation(String),
    Auth(String),
    NotFound(String),
    GatewayTimeout(String),
    GatewayAuth(String),
    Gateway(String),
    Storage(String),
}

impl KeygateError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            KeygateError::Validation(_) => "E001",
            KeygateError::Auth(_) => "E002",
            KeygateError::NotFound(_) => "E003",
            KeygateError::GatewayTimeout(_) => "E004",
            KeygateError::GatewayAuth(_) => "E005",
            KeygateError::Gateway(_) => "E006",
            KeygateError::Storage(_) => "E007",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            KeygateError::Validation(_) => "Validation Error",
            KeygateError::Auth(_) => "Authentication Error",
            KeygateError::NotFound(_) => "Key Not Found",
            KeygateError::GatewayTimeout(_) => "Gateway Timeout",
            KeygateError::GatewayAuth(_) => "Gateway Authentication Error",
            KeygateError::Gateway(_) => "Gateway Error",
            KeygateError::Storage(_) => "Storage Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            KeygateError::Validation(msg) => msg,
            KeygateError::Auth(msg) => msg,
            KeygateError::NotFound(msg) => msg,
            KeygateError::GatewayTimeout(msg) => msg,
            KeygateError::GatewayAuth(msg) => msg,
            KeygateError::Gateway(msg) => msg,
            KeygateError::Storage(msg) => msg,
        }
    }

    /// HTTP status this error degrades to at the request boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            KeygateError::Validation(_) => 400,
            KeygateError::Auth(_) => 403,
            KeygateError::NotFound(_) => 404,
            KeygateError::GatewayTimeout(_) => 408,
            KeygateError::GatewayAuth(_) => 401,
            KeygateError::Gateway(_) | KeygateError::Storage(_) => 500,
        }
    }

    /// Internal failures whose detail must not reach clients in production.
    pub fn is_internal(&self) -> bool {
        matches!(self, KeygateError::Gateway(_) | KeygateError::Storage(_))
    }

    /// 格式化为彩色输出（用于 CLI 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for KeygateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for KeygateError {}

// 便捷的构造函数
impl KeygateError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        KeygateError::Validation(msg.into())
    }

    pub fn auth<T: Into<String>>(msg: T) -> Self {
        KeygateError::Auth(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        KeygateError::NotFound(msg.into())
    }

    pub fn gateway_timeout<T: Into<String>>(msg: T) -> Self {
        KeygateError::GatewayTimeout(msg.into())
    }

    pub fn gateway_auth<T: Into<String>>(msg: T) -> Self {
        KeygateError::GatewayAuth(msg.into())
    }

    pub fn gateway<T: Into<String>>(msg: T) -> Self {
        KeygateError::Gateway(msg.into())
    }

    pub fn storage<T: Into<String>>(msg: T) -> Self {
        KeygateError::Storage(msg.into())
    }
}

impl From<std::io::Error> for KeygateError {
    fn from(err: std::io::Error) -> Self {
        KeygateError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for KeygateError {
    fn from(err: serde_json::Error) -> Self {
        KeygateError::Storage(format!("serialization failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, KeygateError>;
