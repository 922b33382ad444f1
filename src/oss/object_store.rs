use async_trait::async_trait;
use std::time::Duration;

use crate::oss::{ObjectReader, ObjectStoreError};

/// 备份编排系统要求的对象存储能力接口
///
/// 与厂商无关，bucket 在每次调用时传入。
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// 上传对象，读取 body 直到 EOF
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ObjectReader,
    ) -> Result<(), ObjectStoreError>;

    /// 对象是否存在
    ///
    /// 对象不存在时返回 `Ok(false)`，其他错误照常返回。
    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, ObjectStoreError>;

    /// 打开对象内容流，调用方负责释放
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectReader, ObjectStoreError>;

    /// 列出 prefix 下按 delimiter 分组的公共前缀，保持后端返回顺序
    async fn list_common_prefixes(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
    ) -> Result<Vec<String>, ObjectStoreError>;

    /// 列出 prefix 下的全部 key，按字典序倒序排列
    async fn list_objects(&self, bucket: &str, prefix: &str)
        -> Result<Vec<String>, ObjectStoreError>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError>;

    /// 生成只读（GET）预签名 URL，有效期按整秒截断
    async fn create_signed_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, ObjectStoreError>;
}
