mod aws_s3_backend;
mod backend;
mod config;
pub mod credentials;
mod error;
mod memory_backend;
mod obs_object_store;
mod object_store;
mod object_store_types;

pub use aws_s3_backend::AwsS3Backend;
pub use backend::ObsBackend;
pub use config::{ObsObjectStoreConfig, DEFAULT_REGION, ENDPOINT_KEY};
pub use credentials::Credentials;
pub use error::{BackendError, ObjectStoreError};
pub use memory_backend::MemoryBackend;
pub use obs_object_store::ObsObjectStore;
pub use object_store::ObjectStore;
pub use object_store_types::{
    CreateSignedUrlInput, ListObjectsInput, ListObjectsOutput, ObjectMeta,
    ObjectReader,
};
