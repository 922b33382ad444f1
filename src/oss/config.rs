use garde::Validate;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::collections::HashMap;

use crate::oss::ObjectStoreError;

/// 配置项 endpoint
pub const ENDPOINT_KEY: &str = "endpoint";

/// 无法从 endpoint 推断区域时使用的默认区域
pub const DEFAULT_REGION: &str = "cn-north-4";

/// OBS ObjectStore 配置
///
/// 只接受 `endpoint` 一个配置项，出现其他配置项时初始化失败。
/// 凭证不在配置中，见 [`Credentials`](crate::oss::Credentials)。
#[derive(Debug, Deserialize, Serialize, SmartDefault, Clone, PartialEq, Eq, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ObsObjectStoreConfig {
    /// 服务端点，如 `obs.cn-north-4.myhuaweicloud.com` 或 `https://obs.example.com`
    #[garde(length(min = 1))]
    #[default = ""]
    pub endpoint: String,
}

impl ObsObjectStoreConfig {
    /// 从插件宿主传入的配置表解析
    ///
    /// 只检查配置项名称，endpoint 是否为空在凭证加载之后统一校验。
    pub fn from_map(config: &HashMap<String, String>) -> Result<Self, ObjectStoreError> {
        let value = serde_json::to_value(config)
            .map_err(|e| ObjectStoreError::Configuration(e.to_string()))?;

        serde_json::from_value(value).map_err(|e| ObjectStoreError::Configuration(e.to_string()))
    }

    /// 带协议的 endpoint，未指定协议时使用 https
    pub fn endpoint_url(&self) -> String {
        let endpoint = self.endpoint.trim().trim_end_matches('/');
        if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("https://{}", endpoint)
        }
    }

    /// endpoint 中的主机名，不含协议、端口和路径
    fn host(&self) -> &str {
        let endpoint = self.endpoint.trim();
        let host = endpoint
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(endpoint);
        host.split(['/', ':']).next().unwrap_or(host)
    }

    /// IP 或 localhost 无法使用虚拟主机风格，改用 path-style
    pub fn force_path_style(&self) -> bool {
        let host = self.host();
        host == "localhost" || host.parse::<std::net::IpAddr>().is_ok()
    }

    /// 从 `obs.<region>.myhuaweicloud.com` 形式的 endpoint 推断区域
    pub fn region(&self) -> String {
        let labels: Vec<&str> = self.host().split('.').collect();
        match labels.as_slice() {
            ["obs", region, _, _, ..] if !region.is_empty() => region.to_string(),
            _ => DEFAULT_REGION.to_string(),
        }
    }
}
