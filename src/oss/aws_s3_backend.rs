// OBS 兼容 S3 接口，这里使用 aws-sdk-s3 访问：
// aws-sdk-s3 crate: https://docs.rs/aws-sdk-s3
// OBS 兼容 S3 说明: https://support.huaweicloud.com/api-obs/obs_04_0001.html

use async_trait::async_trait;
use aws_credential_types::Credentials as AwsCredentials;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::{
    BehaviorVersion, Region, RequestChecksumCalculation, ResponseChecksumValidation,
};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::oss::{
    BackendError, CreateSignedUrlInput, Credentials, ListObjectsInput, ListObjectsOutput,
    ObjectMeta, ObjectReader, ObjectStoreError, ObsBackend, ObsObjectStoreConfig,
};

/// 基于 aws-sdk-s3 的 OBS 后端
///
/// `aws_sdk_s3::Client` 内部自带连接池，可以被多个任务并发使用。
pub struct AwsS3Backend {
    client: Client,
}

impl AwsS3Backend {
    /// 使用静态凭证创建客户端，不会发起网络请求
    pub fn new(
        config: &ObsObjectStoreConfig,
        credentials: &Credentials,
    ) -> Result<Self, ObjectStoreError> {
        let endpoint = config.endpoint_url();
        let uri = endpoint
            .parse::<http::Uri>()
            .map_err(|e| ObjectStoreError::Client {
                message: format!("无效的 endpoint: {}", endpoint),
                source: Some(Box::new(e)),
            })?;
        if uri.host().map_or(true, str::is_empty) {
            return Err(ObjectStoreError::Client {
                message: format!("endpoint 缺少主机名: {}", endpoint),
                source: None,
            });
        }

        let aws_credentials = AwsCredentials::new(
            &credentials.access_key,
            &credentials.secret_key,
            None,
            None,
            "obs",
        );

        // OBS 默认使用虚拟主机风格访问桶，IP 或 localhost 的 endpoint 除外；
        // OBS 不支持 aws-chunked 上传，只在接口要求时计算校验和
        let s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region()))
            .credentials_provider(aws_credentials)
            .endpoint_url(endpoint)
            .force_path_style(config.force_path_style())
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
        })
    }
}

fn io_error(context: &str, err: std::io::Error) -> BackendError {
    BackendError::new(format!("{}: {}", context, err)).with_source(err)
}

/// 把上传内容写入临时文件，返回文件和字节数
///
/// 临时文件在返回值 drop 时删除，上传完成前必须持有。
async fn spool_body(body: &mut ObjectReader) -> Result<(NamedTempFile, u64), BackendError> {
    let tmp = NamedTempFile::new().map_err(|e| io_error("创建临时文件失败", e))?;
    let std_file = tmp
        .as_file()
        .try_clone()
        .map_err(|e| io_error("创建临时文件失败", e))?;

    let mut file = tokio::fs::File::from_std(std_file);
    let size = tokio::io::copy(body, &mut file)
        .await
        .map_err(|e| io_error("读取上传内容失败", e))?;
    file.flush().await.map_err(|e| io_error("写入临时文件失败", e))?;

    Ok((tmp, size))
}

/// SDK 错误转为 BackendError，保留 HTTP 状态码和错误码
fn backend_error<E>(err: SdkError<E, HttpResponse>) -> BackendError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|resp| resp.status().as_u16());
    let code = err.code().map(str::to_string);
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

    let mut backend_err = BackendError::new(message).with_source(err);
    backend_err.status = status;
    backend_err.code = code;
    backend_err
}

/// 截断页缺少 NextMarker 时的续页位置
///
/// 未指定 delimiter 时 OBS 不返回 NextMarker。key 和公共前缀都按字典序返回，
/// 取两者中较大的一个，避免只有公共前缀的页面重复列举。
fn fallback_marker(contents: &[ObjectMeta], common_prefixes: &[String]) -> String {
    let last_key = contents.last().map(|o| o.key.as_str());
    let last_prefix = common_prefixes.last().map(String::as_str);
    last_key.max(last_prefix).unwrap_or_default().to_string()
}

fn to_chrono(dt: Option<&aws_sdk_s3::primitives::DateTime>) -> chrono::DateTime<chrono::Utc> {
    dt.and_then(|dt| chrono::DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
        .unwrap_or_default()
}

#[async_trait]
impl ObsBackend for AwsS3Backend {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        mut body: ObjectReader,
    ) -> Result<(), BackendError> {
        // 不做分片上传：先落盘得到确定的长度，再一次 PUT 流式发送
        let (tmp, size) = spool_body(&mut body).await?;
        let stream = ByteStream::from_path(tmp.path())
            .await
            .map_err(|e| BackendError::new(format!("打开临时文件失败: {}", e)).with_source(e))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_length(size as i64)
            .body(stream)
            .send()
            .await
            .map_err(backend_error)?;

        drop(tmp);
        Ok(())
    }

    async fn get_object_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<ObjectMeta, BackendError> {
        let output = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(backend_error)?;

        Ok(ObjectMeta {
            key: key.to_string(),
            size: output.content_length().unwrap_or(0).max(0) as u64,
            last_modified: to_chrono(output.last_modified()),
            etag: output.e_tag().map(|s| s.trim_matches('"').to_string()),
            content_type: output.content_type().map(|s| s.to_string()),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectReader, BackendError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(backend_error)?;

        Ok(Box::new(output.body.into_async_read()))
    }

    async fn list_objects(
        &self,
        input: &ListObjectsInput,
    ) -> Result<ListObjectsOutput, BackendError> {
        let mut request = self.client.list_objects().bucket(&input.bucket);
        if !input.prefix.is_empty() {
            request = request.prefix(&input.prefix);
        }
        if !input.delimiter.is_empty() {
            request = request.delimiter(&input.delimiter);
        }
        if !input.marker.is_empty() {
            request = request.marker(&input.marker);
        }

        let output = request.send().await.map_err(backend_error)?;

        let contents: Vec<ObjectMeta> = output
            .contents
            .unwrap_or_default()
            .into_iter()
            .map(|obj| ObjectMeta {
                key: obj.key.unwrap_or_default(),
                size: obj.size.unwrap_or(0).max(0) as u64,
                last_modified: to_chrono(obj.last_modified.as_ref()),
                etag: obj.e_tag.map(|s| s.trim_matches('"').to_string()),
                content_type: None,
            })
            .collect();

        let common_prefixes: Vec<String> = output
            .common_prefixes
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.prefix)
            .collect();

        let is_truncated = output.is_truncated.unwrap_or(false);

        let next_marker = match output.next_marker {
            Some(marker) if !marker.is_empty() => marker,
            _ if is_truncated => fallback_marker(&contents, &common_prefixes),
            _ => String::new(),
        };

        Ok(ListObjectsOutput {
            contents,
            common_prefixes,
            is_truncated,
            next_marker,
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BackendError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn create_signed_url(
        &self,
        input: &CreateSignedUrlInput,
    ) -> Result<String, BackendError> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(input.expires))
            .map_err(|e| BackendError::new(e.to_string()).with_source(e))?;

        let request = self
            .client
            .get_object()
            .bucket(&input.bucket)
            .key(&input.key)
            .presigned(presigning)
            .await
            .map_err(backend_error)?;

        Ok(request.uri().to_string())
    }
}
