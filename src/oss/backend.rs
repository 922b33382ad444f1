use async_trait::async_trait;

use crate::oss::{
    BackendError, CreateSignedUrlInput, ListObjectsInput, ListObjectsOutput, ObjectMeta,
    ObjectReader,
};

/// 存储客户端抽象
///
/// 每个方法对应一次后端调用，不做重试。换用其他厂商的 SDK 时只需要提供新的实现，
/// 包括与之匹配的 [`is_not_found`](ObsBackend::is_not_found) 分类函数。
///
/// 实现必须可以被多个调用方并发使用。
#[async_trait]
pub trait ObsBackend: Send + Sync {
    /// 上传对象，读取 body 直到 EOF
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ObjectReader,
    ) -> Result<(), BackendError>;

    /// 只获取元数据（HEAD）
    async fn get_object_metadata(&self, bucket: &str, key: &str)
        -> Result<ObjectMeta, BackendError>;

    /// 打开对象内容流
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectReader, BackendError>;

    /// 列举一页
    async fn list_objects(&self, input: &ListObjectsInput)
        -> Result<ListObjectsOutput, BackendError>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BackendError>;

    /// 生成预签名 URL
    async fn create_signed_url(&self, input: &CreateSignedUrlInput)
        -> Result<String, BackendError>;

    /// 判断错误是否表示对象不存在
    fn is_not_found(&self, err: &BackendError) -> bool {
        err.status == Some(404)
    }
}
