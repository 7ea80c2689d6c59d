use std::fmt;

use serde::Deserialize;

// =========================================================
// 错误状态枚举
// =========================================================

/// 客户端视角的错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolioErrorKind {
    /// 没有收到响应 (DNS、连接被拒、TLS、超时)
    Network,
    /// 401: token 缺失、过期或被拒绝
    Unauthorized,
    /// 400 / 422: 后端拒绝了请求体，或表单本地校验失败
    InvalidInput,
    /// 404
    NotFound,
    /// 409: 实体仍被引用或已存在
    Conflict,
    /// 5xx 及其他意外状态码
    Server,
    /// 请求体或响应体无法编解码
    Serialization,
    /// Token 持久化失败
    Storage,
}

impl FolioErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => FolioErrorKind::InvalidInput,
            401 => FolioErrorKind::Unauthorized,
            404 => FolioErrorKind::NotFound,
            409 => FolioErrorKind::Conflict,
            _ => FolioErrorKind::Server,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            FolioErrorKind::Network => "NETWORK_ERROR",
            FolioErrorKind::Unauthorized => "UNAUTHORIZED",
            FolioErrorKind::InvalidInput => "INVALID_INPUT",
            FolioErrorKind::NotFound => "RESOURCE_NOT_FOUND",
            FolioErrorKind::Conflict => "RESOURCE_CONFLICT",
            FolioErrorKind::Server => "SERVER_ERROR",
            FolioErrorKind::Serialization => "JSON_PARSE_ERROR",
            FolioErrorKind::Storage => "STORAGE_ERROR",
        }
    }
}

pub const CONNECTION_ERROR_MESSAGE: &str = "Could not connect to the server";
pub const SERVER_ERROR_MESSAGE: &str = "The server could not complete the request";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired, please log in again";

// =========================================================
// 错误上下文追踪
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSpan {
    /// 例如 "session.login"、"admin.delete_skill"
    pub operation: String,
    pub detail: Option<String>,
}

impl ErrorSpan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: None,
        }
    }

    pub fn with_detail(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: Some(detail.into()),
        }
    }
}

// =========================================================
// 核心错误类型
// =========================================================

/// 客户端错误
///
/// - `kind`: 错误分类
/// - `status`: 收到响应时的 HTTP 状态码
/// - `server_message`: 后端返回的 `message` 字段 (如有)
/// - `spans`: 错误经过的操作链
#[derive(Debug)]
pub struct FolioError {
    pub kind: FolioErrorKind,
    pub message: String,
    status: Option<u16>,
    server_message: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    spans: Vec<ErrorSpan>,
}

/// 后端异常处理器返回的错误体结构
#[derive(Deserialize)]
struct ServerErrorBody {
    message: Option<String>,
}

impl FolioError {
    pub fn new(kind: FolioErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            server_message: None,
            source: None,
            spans: Vec::new(),
        }
    }

    // --- 便捷构造函数 ---

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FolioErrorKind::Network, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(FolioErrorKind::Unauthorized, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(FolioErrorKind::InvalidInput, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(FolioErrorKind::Serialization, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(FolioErrorKind::Storage, message)
    }

    /// 从非 2xx 响应构造错误，响应体带有 `message` 时保留之
    pub fn from_response(status: u16, body: &str) -> Self {
        let server_message = serde_json::from_str::<ServerErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());

        let kind = FolioErrorKind::from_status(status);
        let message = match &server_message {
            Some(m) => format!("HTTP {}: {}", status, m),
            None => format!("HTTP {}", status),
        };

        Self {
            kind,
            message,
            status: Some(status),
            server_message,
            source: None,
            spans: Vec::new(),
        }
    }

    // --- 上下文构建 ---

    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::new(operation));
        self
    }

    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::with_detail(operation, detail));
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // --- 访问器 ---

    /// HTTP 状态码，未收到响应时为 `None`
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn server_message(&self) -> Option<&str> {
        self.server_message.as_deref()
    }

    pub fn spans(&self) -> &[ErrorSpan] {
        &self.spans
    }

    pub fn is_network(&self) -> bool {
        self.kind == FolioErrorKind::Network
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == FolioErrorKind::Unauthorized
    }

    /// 面向用户的提示文本。
    ///
    /// 优先使用后端的 message；否则按错误分类决定，没有更合适措辞的回退到连接错误提示。
    pub fn user_message(&self) -> String {
        if let Some(m) = &self.server_message {
            return m.clone();
        }
        match self.kind {
            FolioErrorKind::Server => SERVER_ERROR_MESSAGE.to_string(),
            FolioErrorKind::Unauthorized => SESSION_EXPIRED_MESSAGE.to_string(),
            FolioErrorKind::InvalidInput if self.status.is_none() => self.message.clone(),
            _ => CONNECTION_ERROR_MESSAGE.to_string(),
        }
    }
}

impl fmt::Display for FolioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)?;

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for FolioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

pub type FolioResult<T> = std::result::Result<T, FolioError>;

// =========================================================
// 类型转换实现
// =========================================================

impl From<serde_json::Error> for FolioError {
    fn from(e: serde_json::Error) -> Self {
        FolioError::serialization(e.to_string()).with_source(e)
    }
}

impl From<folio_shared::date::DateError> for FolioError {
    fn from(e: folio_shared::date::DateError) -> Self {
        FolioError::invalid_input(e.to_string()).with_source(e)
    }
}

impl From<crate::storage::StorageError> for FolioError {
    fn from(e: crate::storage::StorageError) -> Self {
        FolioError::storage(e.to_string()).with_source(e)
    }
}

impl From<crate::config::ConfigError> for FolioError {
    fn from(e: crate::config::ConfigError) -> Self {
        FolioError::invalid_input(e.to_string()).with_source(e)
    }
}
