//! Draft-driven product submission.
//!
//! Builds an edit session from a YAML draft (hydrating the persisted product
//! first when the draft names one), then runs one save attempt against the
//! configured storage bucket and Postgres.

use std::path::Path;

use anyhow::Context;
use sqlx::PgPool;
use vitrina_core::{
    category_prefix, load_draft, AppConfig, CategoryLookup, CropTransform, ProductDraftFile,
    VariantGroupKey,
};
use vitrina_db::PgCatalog;
use vitrina_media::{CompressionPolicy, ImageBlob, StorageClient, UploadOptions};
use vitrina_submit::{EditSession, SubmissionCoordinator};

/// Load `draft_path`, save the product, and print the saved payload summary.
///
/// # Errors
///
/// Returns an error if the draft is invalid, an image cannot be read, the
/// edited product does not exist, or the submission fails at any stage.
pub(crate) async fn run_submit(
    config: &AppConfig,
    pool: PgPool,
    draft_path: &Path,
    regenerate: bool,
) -> anyhow::Result<()> {
    let draft = load_draft(draft_path)?;
    let catalog = PgCatalog::new(pool);

    let mut session = open_session(&catalog, &draft).await?;
    for color in draft.color_specs() {
        session.add_color(color)?;
    }
    session.sizes.clone_from(&draft.sizes);
    attach_images(&mut session, &draft)?;

    if regenerate || session.variants().is_empty() {
        let category_id = match draft.category.as_deref() {
            Some(name) => catalog.category_id(name).await?,
            None => None,
        };
        let discarded = session.regenerate_variants(&category_prefix(category_id))?;
        tracing::info!(
            variants = session.variants().len(),
            discarded,
            "variant matrix generated"
        );
    }

    let storage = StorageClient::from_app_config(config)?;
    let coordinator = SubmissionCoordinator::new(
        session,
        catalog.clone(),
        catalog,
        storage.clone(),
        storage,
        CompressionPolicy::from_app_config(config),
    )
    .with_upload_options(UploadOptions::with_cache_secs(config.cache_control_secs));

    let product_id = coordinator.submit().await?;
    let session = coordinator.into_session();

    let skus: Vec<&str> = session.variants().iter().map(|v| v.sku.as_str()).collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "product_id": product_id,
            "slug": session.fields.slug,
            "category_id": session.fields.category_id,
            "skus": skus,
            "images": session.media.len(),
        }))?
    );
    Ok(())
}

async fn open_session(catalog: &PgCatalog, draft: &ProductDraftFile) -> anyhow::Result<EditSession> {
    let Some(id) = draft.product_id else {
        return Ok(EditSession::create(draft.fields()));
    };

    let pool = catalog.pool();
    let saved = vitrina_db::get_product(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {id} not found"))?;
    let variants = vitrina_db::product_variants(pool, id).await?;
    let images = vitrina_db::product_images(pool, id).await?;

    let mut session = EditSession::edit(id, saved.into_fields(), Vec::new(), variants, &images);
    // The draft's fields win over the stored ones.
    session.fields = draft.fields();
    Ok(session)
}

fn attach_images(session: &mut EditSession, draft: &ProductDraftFile) -> anyhow::Result<()> {
    for image in &draft.images {
        let key = group_for(session, image.color.as_deref());
        let blob = ImageBlob::read(&image.path)
            .with_context(|| format!("failed to read image {}", image.path.display()))?;
        session.media.add_files(&key, [blob]);
        let index = session.media.images(&key).len().saturating_sub(1);

        if let Some(crop) = image.crop {
            session
                .media
                .apply_transform(&key, index, CropTransform::from_pixels(crop))?;
        }
        if image.primary {
            session.media.set_primary(&key, index)?;
        }
    }
    Ok(())
}

/// Image groups use the session's spelling of the color name.
fn group_for(session: &EditSession, color: Option<&str>) -> VariantGroupKey {
    let Some(color) = color.map(str::trim) else {
        return VariantGroupKey::Default;
    };
    session
        .colors()
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(color))
        .map_or_else(
            || VariantGroupKey::color(color),
            |c| VariantGroupKey::color(c.name.clone()),
        )
}
