use async_trait::async_trait;
use garde::Validate;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, Span};

use crate::oss::{
    AwsS3Backend, BackendError, CreateSignedUrlInput, Credentials, ListObjectsInput,
    ListObjectsOutput, ObjectReader, ObjectStore, ObjectStoreError, ObsBackend,
    ObsObjectStoreConfig,
};

/// 华为云 OBS ObjectStore 实现
///
/// 每个操作都直接转发给 [`ObsBackend`]，不重试也不缓存。
/// 后端客户端在初始化时创建一次，之后不再替换，并发安全性由后端保证。
pub struct ObsObjectStore {
    backend: Arc<dyn ObsBackend>,
    span: Span,
}

impl ObsObjectStore {
    /// 插件初始化
    ///
    /// 1. 配置中只允许出现 `endpoint`
    /// 2. 从 `HUAWEI_CLOUD_CREDENTIALS_FILE` 指向的文件加载凭证
    /// 3. 校验 endpoint 和凭证
    /// 4. 创建 aws-sdk-s3 客户端
    pub fn new(config: &HashMap<String, String>) -> Result<Self, ObjectStoreError> {
        Self::new_with(config, |config, credentials| {
            let backend = AwsS3Backend::new(config, credentials)?;
            Ok(Arc::new(backend) as Arc<dyn ObsBackend>)
        })
    }

    /// 与 [`new`](Self::new) 流程相同，由 `build` 创建后端
    pub fn new_with<F>(config: &HashMap<String, String>, build: F) -> Result<Self, ObjectStoreError>
    where
        F: FnOnce(&ObsObjectStoreConfig, &Credentials) -> Result<Arc<dyn ObsBackend>, ObjectStoreError>,
    {
        let config = ObsObjectStoreConfig::from_map(config)?;
        let credentials = Credentials::load()?;
        validate(&config, &credentials)?;

        let backend = build(&config, &credentials)?;
        Ok(Self::with_backend(&config, backend))
    }

    /// 直接使用已创建的后端，不加载凭证
    pub fn with_backend(config: &ObsObjectStoreConfig, backend: Arc<dyn ObsBackend>) -> Self {
        let span = tracing::info_span!("obs_object_store", endpoint = %config.endpoint);
        debug!(parent: &span, "obs object store initialized");
        Self { backend, span }
    }

    /// 按 marker 翻页直到结果不再截断，任一页失败则丢弃已获取的结果
    async fn list_pages<T, F>(
        &self,
        mut input: ListObjectsInput,
        mut extract: F,
    ) -> Result<Vec<T>, ObjectStoreError>
    where
        T: Send,
        F: FnMut(ListObjectsOutput) -> Vec<T> + Send,
    {
        let mut result = Vec::new();
        loop {
            let output = self.backend.list_objects(&input).await.map_err(|e| {
                ObjectStoreError::storage("list_objects", &input.bucket, &input.prefix, e)
            })?;

            let is_truncated = output.is_truncated;
            let next_marker = output.next_marker.clone();
            result.extend(extract(output));

            if !is_truncated {
                break;
            }
            if next_marker.is_empty() || next_marker == input.marker {
                return Err(ObjectStoreError::storage(
                    "list_objects",
                    &input.bucket,
                    &input.prefix,
                    BackendError::new(format!(
                        "truncated listing returned unusable next marker {:?}",
                        next_marker
                    )),
                ));
            }

            debug!(parent: &self.span, bucket = %input.bucket, marker = %next_marker, "listing next page");
            input.marker = next_marker;
        }
        Ok(result)
    }
}

/// 校验 endpoint 和凭证，AK/SK 必须同时存在
fn validate(config: &ObsObjectStoreConfig, credentials: &Credentials) -> Result<(), ObjectStoreError> {
    if config.validate().is_err() {
        return Err(ObjectStoreError::Configuration(
            "no obs endpoint in config file".to_string(),
        ));
    }

    let message = match (
        credentials.access_key.is_empty(),
        credentials.secret_key.is_empty(),
    ) {
        (false, false) => return Ok(()),
        (true, false) => "no obs access_key specified",
        (false, true) => "no obs secret_key specified",
        (true, true) => "no obs secret_key and access_key specified",
    };
    Err(ObjectStoreError::Configuration(message.to_string()))
}

#[async_trait]
impl ObjectStore for ObsObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ObjectReader,
    ) -> Result<(), ObjectStoreError> {
        debug!(parent: &self.span, bucket, key, "putting object");
        self.backend
            .put_object(bucket, key, body)
            .await
            .map_err(|e| ObjectStoreError::storage("put_object", bucket, key, e))
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, ObjectStoreError> {
        debug!(parent: &self.span, bucket, key, "checking if object exists");

        match self.backend.get_object_metadata(bucket, key).await {
            Ok(_) => {
                debug!(parent: &self.span, bucket, key, "object exists");
                Ok(true)
            }
            Err(err) => {
                debug!(
                    parent: &self.span,
                    bucket,
                    key,
                    status = ?err.status,
                    code = ?err.code,
                    message = %err.message,
                    "obs error contents"
                );

                if self.backend.is_not_found(&err) {
                    debug!(parent: &self.span, bucket, key, "object doesn't exist - got not found");
                    return Ok(false);
                }
                Err(ObjectStoreError::storage("get_object_metadata", bucket, key, err))
            }
        }
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectReader, ObjectStoreError> {
        self.backend
            .get_object(bucket, key)
            .await
            .map_err(|e| ObjectStoreError::storage("get_object", bucket, key, e))
    }

    async fn list_common_prefixes(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
    ) -> Result<Vec<String>, ObjectStoreError> {
        let input = ListObjectsInput {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            delimiter: delimiter.to_string(),
            marker: String::new(),
        };

        self.list_pages(input, |output| output.common_prefixes).await
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<String>, ObjectStoreError> {
        let input = ListObjectsInput {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            delimiter: String::new(),
            marker: String::new(),
        };

        let mut keys = self
            .list_pages(input, |output| {
                output.contents.into_iter().map(|obj| obj.key).collect()
            })
            .await?;

        // 倒序，时间戳前缀的 key 最新的在前
        keys.sort_unstable_by(|a, b| b.cmp(a));
        Ok(keys)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        debug!(parent: &self.span, bucket, key, "deleting object");
        self.backend
            .delete_object(bucket, key)
            .await
            .map_err(|e| ObjectStoreError::storage("delete_object", bucket, key, e))
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, ObjectStoreError> {
        let input = CreateSignedUrlInput {
            bucket: bucket.to_string(),
            key: key.to_string(),
            expires: ttl.as_secs(),
        };

        self.backend
            .create_signed_url(&input)
            .await
            .map_err(|e| ObjectStoreError::storage("create_signed_url", bucket, key, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oss::credentials::{ACCESS_KEY_ENV, CREDENTIALS_FILE_ENV, SECRET_KEY_ENV};
    use crate::oss::{MemoryBackend, ObjectMeta};
    use serial_test::serial;
    use std::collections::VecDeque;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    /// 按脚本返回结果并记录请求的后端
    #[derive(Default)]
    struct ScriptedBackend {
        pages: Mutex<VecDeque<Result<ListObjectsOutput, BackendError>>>,
        list_inputs: Mutex<Vec<ListObjectsInput>>,
        metadata: Mutex<Option<BackendError>>,
        delete: Mutex<Option<BackendError>>,
        signed_inputs: Mutex<Vec<CreateSignedUrlInput>>,
    }

    impl ScriptedBackend {
        fn with_pages(pages: Vec<Result<ListObjectsOutput, BackendError>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ObsBackend for ScriptedBackend {
        async fn put_object(&self, _: &str, _: &str, _: ObjectReader) -> Result<(), BackendError> {
            Ok(())
        }

        async fn get_object_metadata(&self, _: &str, key: &str) -> Result<ObjectMeta, BackendError> {
            match self.metadata.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(ObjectMeta {
                    key: key.to_string(),
                    size: 0,
                    last_modified: chrono::Utc::now(),
                    etag: None,
                    content_type: None,
                }),
            }
        }

        async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectReader, BackendError> {
            Err(BackendError::not_found(format!("{}/{}", bucket, key)))
        }

        async fn list_objects(
            &self,
            input: &ListObjectsInput,
        ) -> Result<ListObjectsOutput, BackendError> {
            self.list_inputs.lock().unwrap().push(input.clone());
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ListObjectsOutput::default()))
        }

        async fn delete_object(&self, _: &str, _: &str) -> Result<(), BackendError> {
            match self.delete.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        async fn create_signed_url(
            &self,
            input: &CreateSignedUrlInput,
        ) -> Result<String, BackendError> {
            self.signed_inputs.lock().unwrap().push(input.clone());
            Ok(format!("https://signed/{}/{}", input.bucket, input.key))
        }
    }

    fn new_store(backend: Arc<dyn ObsBackend>) -> ObsObjectStore {
        let config = ObsObjectStoreConfig {
            endpoint: "obs.example.com".to_string(),
        };
        ObsObjectStore::with_backend(&config, backend)
    }

    fn keys_page(keys: &[&str], next_marker: &str) -> Result<ListObjectsOutput, BackendError> {
        Ok(ListObjectsOutput {
            contents: keys
                .iter()
                .map(|k| ObjectMeta {
                    key: k.to_string(),
                    size: 1,
                    last_modified: chrono::Utc::now(),
                    etag: None,
                    content_type: None,
                })
                .collect(),
            common_prefixes: Vec::new(),
            is_truncated: !next_marker.is_empty(),
            next_marker: next_marker.to_string(),
        })
    }

    fn prefixes_page(prefixes: &[&str], next_marker: &str) -> Result<ListObjectsOutput, BackendError> {
        Ok(ListObjectsOutput {
            contents: Vec::new(),
            common_prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            is_truncated: !next_marker.is_empty(),
            next_marker: next_marker.to_string(),
        })
    }

    #[tokio::test]
    async fn test_list_objects_reverse_sorted_across_pages() {
        let backend = Arc::new(ScriptedBackend::with_pages(vec![
            keys_page(&["2020-a", "2021-a"], "2021-a"),
            keys_page(&["2019-a"], ""),
        ]));
        let store = new_store(backend.clone());

        let keys = store.list_objects("bucket", "").await.unwrap();
        assert_eq!(keys, vec!["2021-a", "2020-a", "2019-a"]);

        let markers: Vec<String> = backend
            .list_inputs
            .lock()
            .unwrap()
            .iter()
            .map(|i| i.marker.clone())
            .collect();
        assert_eq!(markers, vec!["", "2021-a"]);
    }

    #[tokio::test]
    async fn test_list_common_prefixes_keeps_page_order() {
        let backend = Arc::new(ScriptedBackend::with_pages(vec![
            prefixes_page(&["backups/b/", "backups/c/"], "backups/c/"),
            prefixes_page(&["backups/a/"], "backups/a/"),
            prefixes_page(&["backups/d/"], ""),
        ]));
        let store = new_store(backend.clone());

        let prefixes = store
            .list_common_prefixes("bucket", "backups/", "/")
            .await
            .unwrap();
        assert_eq!(prefixes, vec!["backups/b/", "backups/c/", "backups/a/", "backups/d/"]);

        let inputs = backend.list_inputs.lock().unwrap();
        assert_eq!(inputs.len(), 3);
        assert!(inputs.iter().all(|i| i.delimiter == "/" && i.prefix == "backups/"));
        assert_eq!(inputs[2].marker, "backups/a/");
    }

    #[tokio::test]
    async fn test_list_objects_page_failure_discards_results() {
        let backend = Arc::new(ScriptedBackend::with_pages(vec![
            keys_page(&["a", "b"], "b"),
            Err(BackendError::new("internal error").with_status(500)),
        ]));
        let store = new_store(backend);

        let err = store.list_objects("bucket", "prefix/").await.unwrap_err();
        assert_eq!(err.backend().and_then(|e| e.status), Some(500));
        assert!(err.to_string().contains("bucket/prefix/"));
    }

    #[tokio::test]
    async fn test_list_objects_truncated_without_marker() {
        let mut page = keys_page(&["a"], "").unwrap();
        page.is_truncated = true;
        let backend = Arc::new(ScriptedBackend::with_pages(vec![Ok(page)]));
        let store = new_store(backend.clone());

        assert!(store.list_objects("bucket", "").await.is_err());
        assert_eq!(backend.list_inputs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_object_exists() {
        let backend = Arc::new(ScriptedBackend::default());
        let store = new_store(backend.clone());
        assert!(store.object_exists("bucket", "key").await.unwrap());

        *backend.metadata.lock().unwrap() = Some(BackendError::not_found("404 Not Found"));
        assert!(!store.object_exists("bucket", "key").await.unwrap());

        *backend.metadata.lock().unwrap() =
            Some(BackendError::new("forbidden").with_status(403).with_code("AccessDenied"));
        let err = store.object_exists("bucket", "key").await.unwrap_err();
        assert_eq!(err.backend().and_then(|e| e.code.as_deref()), Some("AccessDenied"));
    }

    /// 只按错误码判断不存在的后端
    struct CodeClassifiedBackend(ScriptedBackend);

    #[async_trait]
    impl ObsBackend for CodeClassifiedBackend {
        async fn put_object(&self, b: &str, k: &str, body: ObjectReader) -> Result<(), BackendError> {
            self.0.put_object(b, k, body).await
        }

        async fn get_object_metadata(&self, b: &str, k: &str) -> Result<ObjectMeta, BackendError> {
            self.0.get_object_metadata(b, k).await
        }

        async fn get_object(&self, b: &str, k: &str) -> Result<ObjectReader, BackendError> {
            self.0.get_object(b, k).await
        }

        async fn list_objects(
            &self,
            input: &ListObjectsInput,
        ) -> Result<ListObjectsOutput, BackendError> {
            self.0.list_objects(input).await
        }

        async fn delete_object(&self, b: &str, k: &str) -> Result<(), BackendError> {
            self.0.delete_object(b, k).await
        }

        async fn create_signed_url(
            &self,
            input: &CreateSignedUrlInput,
        ) -> Result<String, BackendError> {
            self.0.create_signed_url(input).await
        }

        fn is_not_found(&self, err: &BackendError) -> bool {
            err.code.as_deref() == Some("ObjectMissing")
        }
    }

    #[tokio::test]
    async fn test_object_exists_uses_backend_classifier() {
        let inner = ScriptedBackend::default();
        *inner.metadata.lock().unwrap() = Some(BackendError::new("gone").with_code("ObjectMissing"));
        let store = new_store(Arc::new(CodeClassifiedBackend(inner)));
        assert!(!store.object_exists("bucket", "key").await.unwrap());

        let inner = ScriptedBackend::default();
        *inner.metadata.lock().unwrap() = Some(BackendError::not_found("404 Not Found"));
        let store = new_store(Arc::new(CodeClassifiedBackend(inner)));
        assert!(store.object_exists("bucket", "key").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_object_error_keeps_kind() {
        let backend = Arc::new(ScriptedBackend::default());
        *backend.delete.lock().unwrap() = Some(BackendError::not_found("no such key"));
        let store = new_store(backend.clone());

        let err = store.delete_object("bucket", "missing-key").await.unwrap_err();
        match &err {
            ObjectStoreError::Storage { operation, key, source, .. } => {
                assert_eq!(*operation, "delete_object");
                assert_eq!(key, "missing-key");
                assert_eq!(source.status, Some(404));
            }
            other => panic!("unexpected error: {}", other),
        }

        assert!(store.delete_object("bucket", "key").await.is_ok());
    }

    #[tokio::test]
    async fn test_get_object_error() {
        let store = new_store(Arc::new(ScriptedBackend::default()));
        let err = store.get_object("bucket", "key").await.err().unwrap();
        assert!(err.to_string().contains("get_object"));
    }

    #[tokio::test]
    async fn test_create_signed_url_truncates_ttl() {
        let backend = Arc::new(ScriptedBackend::default());
        let store = new_store(backend.clone());

        let url = store
            .create_signed_url("bucket", "key", Duration::from_millis(90_900))
            .await
            .unwrap();
        assert_eq!(url, "https://signed/bucket/key");

        store
            .create_signed_url("bucket", "key", Duration::from_millis(500))
            .await
            .unwrap();

        let inputs = backend.signed_inputs.lock().unwrap();
        assert_eq!(inputs[0].expires, 90);
        assert_eq!(inputs[1].expires, 0);
    }

    // === 初始化 ===

    fn set_credentials_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        std::env::set_var(CREDENTIALS_FILE_ENV, file.path());
        file
    }

    fn clear_env() {
        std::env::remove_var(CREDENTIALS_FILE_ENV);
        std::env::remove_var(ACCESS_KEY_ENV);
        std::env::remove_var(SECRET_KEY_ENV);
    }

    fn config(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn memory_store(config: &HashMap<String, String>) -> Result<ObsObjectStore, ObjectStoreError> {
        ObsObjectStore::new_with(config, |_, _| Ok(Arc::new(MemoryBackend::new()) as Arc<dyn ObsBackend>))
    }

    fn config_error(result: Result<ObsObjectStore, ObjectStoreError>) -> String {
        match result {
            Err(ObjectStoreError::Configuration(msg)) => msg,
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected configuration error"),
        }
    }

    #[test]
    #[serial]
    fn test_init_rejects_unknown_key() {
        clear_env();
        let _file = set_credentials_file("OBS_ACCESS_KEY=ak\nOBS_SECRET_KEY=sk\n");

        let msg = config_error(memory_store(&config(&[
            ("endpoint", "obs.example.com"),
            ("bucket_region", "cn-north-4"),
        ])));
        assert!(msg.contains("bucket_region"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_init_requires_credentials_file_env() {
        clear_env();
        let msg = config_error(memory_store(&config(&[("endpoint", "obs.example.com")])));
        assert_eq!(msg, "credentials file not found");
    }

    #[test]
    #[serial]
    fn test_init_validates_credentials() {
        let cases = [
            ("OBS_SECRET_KEY=sk\n", "no obs access_key specified"),
            ("OBS_ACCESS_KEY=ak\n", "no obs secret_key specified"),
            ("# empty\n", "no obs secret_key and access_key specified"),
        ];

        for (content, expected) in cases {
            clear_env();
            let _file = set_credentials_file(content);
            let msg = config_error(memory_store(&config(&[("endpoint", "obs.example.com")])));
            assert_eq!(msg, expected);
        }
        clear_env();
    }

    #[test]
    #[serial]
    fn test_init_requires_endpoint() {
        clear_env();
        let _file = set_credentials_file("OBS_ACCESS_KEY=ak\nOBS_SECRET_KEY=sk\n");

        let msg = config_error(memory_store(&config(&[("endpoint", "")])));
        assert_eq!(msg, "no obs endpoint in config file");

        let msg = config_error(memory_store(&HashMap::new()));
        assert_eq!(msg, "no obs endpoint in config file");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_init_with_aws_s3_backend() {
        clear_env();
        let _file = set_credentials_file("OBS_ACCESS_KEY=ak\nOBS_SECRET_KEY=sk\n");

        assert!(ObsObjectStore::new(&config(&[("endpoint", "obs.cn-north-4.myhuaweicloud.com")])).is_ok());

        match ObsObjectStore::new(&config(&[("endpoint", "obs example com")])) {
            Err(ObjectStoreError::Client { .. }) => {}
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected client error"),
        }
        clear_env();
    }
}
