use thiserror::Error;

/// 对象存储统一错误类型
#[derive(Error, Debug)]
pub enum ObjectStoreError {
    /// 配置或凭证错误，初始化阶段返回
    #[error("配置错误: {0}")]
    Configuration(String),

    /// 客户端创建失败，初始化阶段返回
    #[error("创建 OBS 客户端失败: {message}")]
    Client {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// 单次操作的后端错误，不做任何重试
    #[error("{operation} 失败 [{bucket}/{key}]: {source}")]
    Storage {
        operation: &'static str,
        bucket: String,
        key: String,
        #[source]
        source: BackendError,
    },
}

impl ObjectStoreError {
    /// 包装后端错误，附带操作名和对象位置
    pub fn storage(operation: &'static str, bucket: &str, key: &str, source: BackendError) -> Self {
        ObjectStoreError::Storage {
            operation,
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        }
    }

    /// 原始后端错误（仅 Storage 有）
    pub fn backend(&self) -> Option<&BackendError> {
        match self {
            ObjectStoreError::Storage { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// 后端（SDK）返回的错误
///
/// 保留 HTTP 状态码和服务端错误码，供 [`ObsBackend::is_not_found`](crate::oss::ObsBackend::is_not_found)
/// 之类的分类函数判断错误类别。
#[derive(Error, Debug)]
#[error("{message}")]
pub struct BackendError {
    pub status: Option<u16>,
    pub code: Option<String>,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
            source: None,
        }
    }

    /// 404 Not Found
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message).with_status(404).with_code("NoSuchKey")
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }
}
