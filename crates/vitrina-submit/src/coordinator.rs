//! End-to-end save of an edit session: validate, upload media, persist.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{watch, Mutex, MutexGuard};
use vitrina_core::{validate_slug, CategoryLookup, ProductRepository, Variant};
use vitrina_media::{CompressionPolicy, RemoteFetcher, Storage, UploadOptions, UploadOrchestrator};

use crate::error::{SubmitError, SubmitStage, ValidationError};
use crate::session::EditSession;

/// Progress of the current save attempt.
///
/// `Done` is terminal for the session. `Failed` can be retried with the same
/// session data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Validating,
    UploadingMedia,
    Persisting,
    Done,
    Failed,
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::UploadingMedia => "uploading media",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// Owns one [`EditSession`] and drives its saves, one at a time.
pub struct SubmissionCoordinator<R, C, S, F> {
    repository: R,
    categories: C,
    storage: S,
    fetcher: F,
    policy: CompressionPolicy,
    upload_options: UploadOptions,
    session: Mutex<EditSession>,
    state: watch::Sender<SubmissionState>,
    in_flight: AtomicBool,
}

impl<R, C, S, F> SubmissionCoordinator<R, C, S, F>
where
    R: ProductRepository,
    C: CategoryLookup,
    S: Storage,
    F: RemoteFetcher,
{
    pub fn new(
        session: EditSession,
        repository: R,
        categories: C,
        storage: S,
        fetcher: F,
        policy: CompressionPolicy,
    ) -> Self {
        let (state, _) = watch::channel(SubmissionState::Idle);
        Self {
            repository,
            categories,
            storage,
            fetcher,
            policy,
            upload_options: UploadOptions::default(),
            session: Mutex::new(session),
            state,
            in_flight: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_upload_options(mut self, options: UploadOptions) -> Self {
        self.upload_options = options;
        self
    }

    #[must_use]
    pub fn state(&self) -> SubmissionState {
        *self.state.borrow()
    }

    /// Follow state transitions, e.g. to report progress.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    /// Access the session between attempts. Waits while a save is running.
    pub async fn session(&self) -> MutexGuard<'_, EditSession> {
        self.session.lock().await
    }

    #[must_use]
    pub fn into_session(self) -> EditSession {
        self.session.into_inner()
    }

    /// Run one save attempt and return the product id.
    ///
    /// A second call while one is pending is rejected without waiting.
    ///
    /// # Errors
    ///
    /// - [`SubmitError::AlreadyInFlight`] / [`SubmitError::AlreadyCompleted`]
    ///   when no attempt was started.
    /// - Anything else carries the [`SubmitStage`] it failed at and leaves the
    ///   coordinator in [`SubmissionState::Failed`], ready for a retry.
    pub async fn submit(&self) -> Result<i64, SubmitError> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::warn!("submission ignored: another one is in progress");
            return Err(SubmitError::AlreadyInFlight);
        }
        let _guard = InFlight(&self.in_flight);

        if self.state() == SubmissionState::Done {
            return Err(SubmitError::AlreadyCompleted);
        }

        let mut session = self.session.lock().await;
        let result = self.attempt(&mut session).await;
        match &result {
            Ok(id) => {
                self.transition(SubmissionState::Done);
                tracing::info!(product_id = id, slug = %session.fields.slug, "product saved");
            }
            Err(e) => {
                self.transition(SubmissionState::Failed);
                tracing::warn!(stage = ?e.stage(), error = %e, "submission failed");
            }
        }
        result
    }

    async fn attempt(&self, session: &mut EditSession) -> Result<i64, SubmitError> {
        self.transition(SubmissionState::Validating);
        self.validate(session).await?;

        self.transition(SubmissionState::UploadingMedia);
        let slug = session.fields.slug.clone();
        let images = UploadOrchestrator::new(&self.storage, &self.fetcher, self.policy)
            .with_options(self.upload_options.clone())
            .materialize(&mut session.media, &slug)
            .await?;

        self.transition(SubmissionState::Persisting);
        let payload = session.payload(images);
        let id = match session.product_id {
            Some(id) => {
                self.repository
                    .update_product(id, &payload)
                    .await
                    .map_err(SubmitError::from_persistence)?;
                id
            }
            None => self
                .repository
                .create_product(&payload)
                .await
                .map_err(SubmitError::from_persistence)?,
        };
        session.mark_saved(id);
        Ok(id)
    }

    /// Local checks first, then the category lookup and the best-effort slug
    /// pre-check.
    async fn validate(&self, session: &mut EditSession) -> Result<(), SubmitError> {
        let fields = &session.fields;
        if fields.name.trim().is_empty() {
            return Err(ValidationError::MissingName.into());
        }
        validate_slug(&fields.slug).map_err(ValidationError::InvalidSlug)?;
        let category = fields
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(ValidationError::MissingCategory)?
            .to_owned();
        if session.variants().is_empty() {
            return Err(ValidationError::NoVariants.into());
        }
        if let Some(sku) = duplicate_sku(session.variants()) {
            return Err(ValidationError::DuplicateSku(sku).into());
        }

        let category_id = self
            .categories
            .category_id(&category)
            .await
            .map_err(SubmitError::CategoryLookup)?;
        if category_id.is_none() {
            tracing::warn!(category = %category, "category has no id; saving without one");
        }
        session.fields.category_id = category_id;

        if session.slug_changed() {
            let slug = &session.fields.slug;
            match self.repository.slug_available(slug, session.product_id).await {
                Ok(true) => {}
                Ok(false) => {
                    return Err(SubmitError::SlugTaken {
                        slug: slug.clone(),
                        stage: SubmitStage::Validation,
                    })
                }
                Err(e) => {
                    tracing::warn!(slug = %slug, error = %e, "slug pre-check failed; relying on write-time constraint");
                }
            }
        }
        Ok(())
    }

    fn transition(&self, next: SubmissionState) {
        let previous = self.state.send_replace(next);
        tracing::debug!(from = %previous, to = %next, "submission state");
    }
}

fn duplicate_sku(variants: &[Variant]) -> Option<String> {
    let mut seen = HashSet::new();
    variants
        .iter()
        .find(|v| !seen.insert(v.sku.as_str()))
        .map(|v| v.sku.clone())
}

/// Clears the re-entrancy flag when the attempt ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
