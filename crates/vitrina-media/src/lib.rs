pub mod blob;
pub mod client;
pub mod compress;
pub mod error;
pub mod orchestrator;
pub mod race;
pub mod storage;
pub mod store;
pub mod transform;

pub use blob::{ImageBlob, LocalBlobs};
pub use client::StorageClient;
pub use compress::CompressionPolicy;
pub use error::{CoverError, MaterializeError, StorageError, TransformError, UploadError};
pub use orchestrator::UploadOrchestrator;
pub use race::{upload_cover, upload_with_timeout, CoverUpload};
pub use storage::{cover_key, storage_key, RemoteFetcher, Storage, UploadOptions};
pub use store::{Direction, MediaGroupStore, StoreError};
pub use transform::{bake, clamp_crop};
