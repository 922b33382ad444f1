//! 华为云 OBS 对象存储插件
//!
//! 把备份编排系统的对象存储接口（put / get / exists / list / delete / sign）
//! 转换为 OBS 调用，统一错误类型并处理分页。
//!
//! ## 模块
//!
//! - **oss**: 对象存储接口、OBS 实现和后端抽象
//! - **cfg**: 配置辅助函数
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use obs_plugin::{ObjectStore, ObsObjectStore};
//! use std::collections::HashMap;
//!
//! # async fn example() -> Result<(), obs_plugin::ObjectStoreError> {
//! // 凭证从 HUAWEI_CLOUD_CREDENTIALS_FILE 指向的文件读取
//! let config = HashMap::from([(
//!     "endpoint".to_string(),
//!     "obs.cn-north-4.myhuaweicloud.com".to_string(),
//! )]);
//! let store = ObsObjectStore::new(&config)?;
//!
//! let keys = store.list_objects("velero-backups", "backups/").await?;
//! println!("{:?}", keys);
//! # Ok(())
//! # }
//! ```

pub mod cfg;
pub mod oss;

pub use oss::{BackendError, ObjectStore, ObjectStoreError, ObsBackend};
pub use oss::{AwsS3Backend, MemoryBackend, ObsObjectStore, ObsObjectStoreConfig};
pub use oss::{Credentials, ObjectReader};
