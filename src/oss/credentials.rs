use std::fmt;
use std::path::Path;

use crate::oss::ObjectStoreError;

/// 保存凭证文件路径的环境变量
pub const CREDENTIALS_FILE_ENV: &str = "HUAWEI_CLOUD_CREDENTIALS_FILE";

/// 凭证文件中的 Access Key
pub const ACCESS_KEY_ENV: &str = "OBS_ACCESS_KEY";

/// 凭证文件中的 Secret Key
pub const SECRET_KEY_ENV: &str = "OBS_SECRET_KEY";

/// OBS 访问凭证
///
/// 两个字段可能为空，是否完整由调用方校验。
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"******")
            .finish()
    }
}

impl Credentials {
    /// 按 `HUAWEI_CLOUD_CREDENTIALS_FILE` 指定的文件加载凭证
    pub fn load() -> Result<Self, ObjectStoreError> {
        // 路径不要求是 UTF-8
        let path = std::env::var_os(CREDENTIALS_FILE_ENV)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ObjectStoreError::Configuration("credentials file not found".to_string()))?;

        Self::from_file(&path)
    }

    /// 以当前进程环境变量为底，用凭证文件中的同名变量覆盖
    ///
    /// 不修改进程环境变量。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ObjectStoreError> {
        let path = path.as_ref();
        let load_error = |e: dotenvy::Error| {
            ObjectStoreError::Configuration(format!(
                "error loading environment from {} ({}): {}",
                CREDENTIALS_FILE_ENV,
                path.display(),
                e
            ))
        };

        let mut credentials = Self::from_env();
        for item in dotenvy::from_path_iter(path).map_err(load_error)? {
            let (key, value) = item.map_err(load_error)?;
            match key.as_str() {
                ACCESS_KEY_ENV => credentials.access_key = value,
                SECRET_KEY_ENV => credentials.secret_key = value,
                _ => {}
            }
        }

        Ok(credentials)
    }

    /// 只读取进程环境变量
    pub fn from_env() -> Self {
        Self {
            access_key: std::env::var(ACCESS_KEY_ENV).unwrap_or_default(),
            secret_key: std::env::var(SECRET_KEY_ENV).unwrap_or_default(),
        }
    }
}
