use std::fmt;

use thiserror::Error;
use vitrina_core::PersistenceError;
use vitrina_media::MaterializeError;

/// Step of a save attempt at which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStage {
    Validation,
    Media,
    Persistence,
}

impl fmt::Display for SubmitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validation => "validation",
            Self::Media => "media upload",
            Self::Persistence => "persistence",
        })
    }
}

/// Local precondition failures. Raised before anything leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("product name must be non-empty")]
    MissingName,

    #[error("invalid slug: {0}")]
    InvalidSlug(String),

    #[error("a category must be selected")]
    MissingCategory,

    #[error("at least one variant is required")]
    NoVariants,

    #[error("duplicate SKU '{0}'")]
    DuplicateSku(String),
}

/// Edits rejected by the session model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("color name must be non-empty")]
    EmptyColorName,

    #[error("color '{name}' is already part of this product")]
    DuplicateColor { name: String },
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("a submission is already in progress")]
    AlreadyInFlight,

    #[error("this session has already been saved")]
    AlreadyCompleted,

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("category lookup failed: {0}")]
    CategoryLookup(#[source] PersistenceError),

    #[error("media upload failed: {0}")]
    Media(#[from] MaterializeError),

    #[error("slug '{slug}' is already taken ({stage})")]
    SlugTaken { slug: String, stage: SubmitStage },

    #[error("saving the product failed: {0}")]
    Persistence(#[source] PersistenceError),
}

impl SubmitError {
    /// Where the attempt stopped; `None` when it never started.
    #[must_use]
    pub fn stage(&self) -> Option<SubmitStage> {
        match self {
            Self::AlreadyInFlight | Self::AlreadyCompleted => None,
            Self::Validation(_) | Self::CategoryLookup(_) => Some(SubmitStage::Validation),
            Self::Media(_) => Some(SubmitStage::Media),
            Self::SlugTaken { stage, .. } => Some(*stage),
            Self::Persistence(_) => Some(SubmitStage::Persistence),
        }
    }

    pub(crate) fn from_persistence(error: PersistenceError) -> Self {
        match error {
            PersistenceError::SlugTaken { slug } => Self::SlugTaken {
                slug,
                stage: SubmitStage::Persistence,
            },
            other => Self::Persistence(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_violation_at_write_time_is_distinguished() {
        let err = SubmitError::from_persistence(PersistenceError::SlugTaken {
            slug: "anillo".to_string(),
        });
        assert!(matches!(
            err,
            SubmitError::SlugTaken {
                stage: SubmitStage::Persistence,
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "slug 'anillo' is already taken (persistence)"
        );

        let err = SubmitError::from_persistence(PersistenceError::NotFound { id: 7 });
        assert_eq!(err.stage(), Some(SubmitStage::Persistence));
    }

    #[test]
    fn guard_errors_have_no_stage() {
        assert_eq!(SubmitError::AlreadyInFlight.stage(), None);
        assert_eq!(SubmitError::AlreadyCompleted.stage(), None);
        assert_eq!(
            SubmitError::from(ValidationError::NoVariants).stage(),
            Some(SubmitStage::Validation)
        );
    }
}
