use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::ops::Bound;
use std::sync::RwLock;
use tokio::io::AsyncReadExt;

use crate::oss::{
    BackendError, CreateSignedUrlInput, ListObjectsInput, ListObjectsOutput,
    ObjectMeta, ObjectReader, ObsBackend,
};

/// 与 OBS 单页上限一致
pub const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    last_modified: DateTime<Utc>,
}

/// 内存实现的 ObsBackend
///
/// 列举语义与 OBS 的 ListObjects 一致：按 key 字典序返回，
/// 指定 delimiter 时分组为 common prefix，每页最多 `page_size` 项。
pub struct MemoryBackend {
    objects: RwLock<BTreeMap<(String, String), StoredObject>>,
    page_size: usize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
        }
    }

    /// 对象个数（所有桶）
    pub fn len(&self) -> usize {
        self.read().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<(String, String), StoredObject>>, BackendError>
    {
        self.objects
            .read()
            .map_err(|_| BackendError::new("memory backend lock poisoned").with_status(500))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<(String, String), StoredObject>>, BackendError>
    {
        self.objects
            .write()
            .map_err(|_| BackendError::new("memory backend lock poisoned").with_status(500))
    }

    fn lookup(&self, bucket: &str, key: &str) -> Result<StoredObject, BackendError> {
        self.read()?
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| BackendError::not_found(format!("object {}/{} not found", bucket, key)))
    }
}

#[async_trait]
impl ObsBackend for MemoryBackend {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        mut body: ObjectReader,
    ) -> Result<(), BackendError> {
        if key.is_empty() {
            return Err(BackendError::new("object key is empty")
                .with_status(400)
                .with_code("InvalidArgument"));
        }

        let mut buffer = Vec::new();
        body.read_to_end(&mut buffer)
            .await
            .map_err(|e| BackendError::new(format!("读取上传内容失败: {}", e)).with_source(e))?;

        self.write()?.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data: Bytes::from(buffer),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get_object_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<ObjectMeta, BackendError> {
        let object = self.lookup(bucket, key)?;
        Ok(ObjectMeta {
            key: key.to_string(),
            size: object.data.len() as u64,
            last_modified: object.last_modified,
            etag: None,
            content_type: None,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectReader, BackendError> {
        let object = self.lookup(bucket, key)?;
        Ok(Box::new(Cursor::new(object.data)))
    }

    async fn list_objects(
        &self,
        input: &ListObjectsInput,
    ) -> Result<ListObjectsOutput, BackendError> {
        let objects = self.read()?;
        let mut output = ListObjectsOutput::default();
        let mut count = 0;
        let mut last = String::new();

        let start = (input.bucket.clone(), input.marker.clone());
        for ((bucket, key), object) in objects.range((Bound::Excluded(start), Bound::Unbounded)) {
            if bucket != &input.bucket {
                break;
            }
            if !key.starts_with(&input.prefix) {
                continue;
            }

            let rest = &key[input.prefix.len()..];
            let common_prefix = match input.delimiter.as_str() {
                "" => None,
                delimiter => rest
                    .find(delimiter)
                    .map(|idx| format!("{}{}", input.prefix, &rest[..idx + delimiter.len()])),
            };

            if let Some(common_prefix) = common_prefix {
                // 上一页以该前缀结尾，或本页已经收录
                if common_prefix == input.marker
                    || output.common_prefixes.last() == Some(&common_prefix)
                {
                    continue;
                }
                if count == self.page_size {
                    output.is_truncated = true;
                    break;
                }
                last = common_prefix.clone();
                output.common_prefixes.push(common_prefix);
            } else {
                if count == self.page_size {
                    output.is_truncated = true;
                    break;
                }
                last = key.clone();
                output.contents.push(ObjectMeta {
                    key: key.clone(),
                    size: object.data.len() as u64,
                    last_modified: object.last_modified,
                    etag: None,
                    content_type: None,
                });
            }
            count += 1;
        }

        if output.is_truncated {
            output.next_marker = last;
        }
        Ok(output)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BackendError> {
        // 与 OBS 一致，删除不存在的对象也返回成功
        self.write()?.remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }

    async fn create_signed_url(
        &self,
        input: &CreateSignedUrlInput,
    ) -> Result<String, BackendError> {
        Ok(format!(
            "memory://{}/{}?method=GET&expires={}",
            input.bucket, input.key, input.expires
        ))
    }
}
