use chrono::{DateTime, Utc};
use tokio::io::AsyncRead;

/// 对象内容读取流，由调用方持有，drop 时释放
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// 对象元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub etag: Option<String>,
    pub content_type: Option<String>,
}

/// 单页列举请求
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListObjectsInput {
    pub bucket: String,
    pub prefix: String,
    /// 为空时不按层级分组
    pub delimiter: String,
    /// 上一页返回的 next_marker，首页为空
    pub marker: String,
}

/// 单页列举结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListObjectsOutput {
    pub contents: Vec<ObjectMeta>,
    pub common_prefixes: Vec<String>,
    pub is_truncated: bool,
    pub next_marker: String,
}

/// 签名 URL 请求，只签 GET 下载
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSignedUrlInput {
    pub bucket: String,
    pub key: String,
    /// 有效期（整秒）
    pub expires: u64,
}
