pub mod app_config;
pub mod colors;
pub mod config;
pub mod draft;
pub mod persistence;
pub mod products;
pub mod slug;
pub mod variants;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, COMPRESS_QUALITY_RANGE};
pub use colors::{code_of, hex_of, UNKNOWN_COLOR_CODE, UNKNOWN_COLOR_HEX};
pub use config::{load_app_config, load_app_config_from_env};
pub use draft::{load_draft, DraftColor, DraftImage, ProductDraftFile};
pub use persistence::{CategoryLookup, PersistenceError, ProductRepository};
pub use products::{
    ColorSpec, CropRect, CropTransform, ImageDescriptor, ImageOrigin, ManifestEntry, Pan,
    ProductFields, SubmissionPayload, Variant, VariantGroupKey,
};
pub use slug::{slugify, validate_slug};
pub use variants::{category_prefix, generate, VariantError, DEFAULT_CATEGORY_PREFIX};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read draft file {path}: {source}")]
    DraftFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse draft file: {0}")]
    DraftFileParse(#[from] serde_yaml::Error),

    #[error("invalid draft: {0}")]
    Validation(String),
}
