//! Editable state of one product for the duration of an edit.

use vitrina_core::{
    generate, ColorSpec, ManifestEntry, ProductFields, SubmissionPayload, Variant, VariantError,
    VariantGroupKey,
};
use vitrina_media::MediaGroupStore;

use crate::error::SessionError;

/// Everything the user has entered for one product, held until an explicit
/// save. Nothing here is persisted on its own.
#[derive(Debug)]
pub struct EditSession {
    /// Set when editing a product that already exists.
    pub product_id: Option<i64>,
    pub fields: ProductFields,
    pub sizes: Vec<String>,
    pub media: MediaGroupStore,
    colors: Vec<ColorSpec>,
    variants: Vec<Variant>,
    saved_slug: Option<String>,
}

impl EditSession {
    /// Session for a product that does not exist yet.
    #[must_use]
    pub fn create(fields: ProductFields) -> Self {
        Self {
            product_id: None,
            fields,
            sizes: Vec::new(),
            media: MediaGroupStore::new(),
            colors: Vec::new(),
            variants: Vec::new(),
            saved_slug: None,
        }
    }

    /// Session over a persisted product; images come back as existing ones.
    #[must_use]
    pub fn edit(
        product_id: i64,
        fields: ProductFields,
        colors: Vec<ColorSpec>,
        variants: Vec<Variant>,
        images: &[ManifestEntry],
    ) -> Self {
        Self {
            product_id: Some(product_id),
            saved_slug: Some(fields.slug.clone()),
            fields,
            sizes: Vec::new(),
            media: MediaGroupStore::hydrate(images),
            colors,
            variants,
        }
    }

    #[must_use]
    pub fn colors(&self) -> &[ColorSpec] {
        &self.colors
    }

    #[must_use]
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// For per-variant edits such as stock or price adjustment.
    pub fn variants_mut(&mut self) -> &mut [Variant] {
        &mut self.variants
    }

    /// # Errors
    ///
    /// Rejects blank names and names already present (case-insensitive).
    pub fn add_color(&mut self, color: ColorSpec) -> Result<(), SessionError> {
        let name = color.name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyColorName);
        }
        if self.color_index(name).is_some() {
            return Err(SessionError::DuplicateColor {
                name: name.to_string(),
            });
        }
        self.colors.push(ColorSpec::new(name, color.hex));
        Ok(())
    }

    /// Drop a color together with its variants and its image group.
    pub fn remove_color(&mut self, name: &str) -> Option<ColorSpec> {
        let index = self.color_index(name)?;
        let removed = self.colors.remove(index);
        self.variants.retain(|v| {
            !v.color
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(&removed.name))
        });
        let images = self
            .media
            .remove_group(&VariantGroupKey::color(removed.name.clone()));
        tracing::debug!(color = %removed.name, images, "color removed");
        Some(removed)
    }

    /// Replace the variant list with a fresh matrix. Returns how many
    /// previous variants were discarded.
    ///
    /// # Errors
    ///
    /// Propagates the generator's precondition failures; the current list is
    /// left untouched in that case.
    pub fn regenerate_variants(&mut self, category_prefix: &str) -> Result<usize, VariantError> {
        let fresh = generate(category_prefix, &self.fields.slug, &self.colors, &self.sizes)?;
        let discarded = std::mem::replace(&mut self.variants, fresh).len();
        if discarded > 0 {
            tracing::info!(discarded, kept = self.variants.len(), "variant list regenerated");
        }
        Ok(discarded)
    }

    /// `true` until the current slug has been saved once.
    #[must_use]
    pub fn slug_changed(&self) -> bool {
        self.saved_slug.as_deref() != Some(self.fields.slug.as_str())
    }

    #[must_use]
    pub fn payload(&self, images: Vec<ManifestEntry>) -> SubmissionPayload {
        SubmissionPayload {
            product: self.fields.clone(),
            variants: self.variants.clone(),
            images,
        }
    }

    pub(crate) fn mark_saved(&mut self, product_id: i64) {
        self.product_id = Some(product_id);
        self.saved_slug = Some(self.fields.slug.clone());
    }

    fn color_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.colors
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use vitrina_media::ImageBlob;

    use super::*;

    fn fields(slug: &str) -> ProductFields {
        ProductFields {
            name: "Anillo Solitario".to_string(),
            slug: slug.to_string(),
            description: None,
            price: Decimal::new(129_900, 2),
            category: Some("Anillos".to_string()),
            category_id: None,
            material: None,
            is_active: true,
        }
    }

    fn session() -> EditSession {
        let mut session = EditSession::create(fields("anillo-solitario"));
        session.add_color(ColorSpec::from_name("Oro")).unwrap();
        session.add_color(ColorSpec::from_name("Plata")).unwrap();
        session.sizes = vec!["6".to_string(), "7".to_string()];
        session
    }

    #[test]
    fn add_color_rejects_duplicates_and_blanks() {
        let mut session = session();
        assert_eq!(
            session.add_color(ColorSpec::new(" oro ", "#000000")),
            Err(SessionError::DuplicateColor {
                name: "oro".to_string()
            })
        );
        assert_eq!(
            session.add_color(ColorSpec::new("  ", "#000000")),
            Err(SessionError::EmptyColorName)
        );
        assert_eq!(session.colors().len(), 2);
    }

    #[test]
    fn regenerate_replaces_and_reports_discarded() {
        let mut session = session();
        assert_eq!(session.regenerate_variants("01").unwrap(), 0);
        let first: Vec<String> = session.variants().iter().map(|v| v.sku.clone()).collect();
        assert_eq!(first.len(), 4);

        session.variants_mut()[0].stock = 11;
        assert_eq!(session.regenerate_variants("01").unwrap(), 4);
        assert_eq!(session.variants().len(), 4);
        assert!(session.variants().iter().all(|v| v.stock == 5));
    }

    #[test]
    fn failed_regeneration_keeps_current_variants() {
        let mut session = session();
        session.regenerate_variants("01").unwrap();
        session.fields.slug.clear();
        assert_eq!(
            session.regenerate_variants("01"),
            Err(VariantError::MissingSlug)
        );
        assert_eq!(session.variants().len(), 4);
    }

    #[test]
    fn remove_color_drops_variants_and_images() {
        let mut session = session();
        session.regenerate_variants("01").unwrap();
        session
            .media
            .add_files(&VariantGroupKey::color("Oro"), [ImageBlob::jpeg(vec![1])]);
        session
            .media
            .add_files(&VariantGroupKey::Default, [ImageBlob::jpeg(vec![2])]);

        let removed = session.remove_color("ORO").unwrap();
        assert_eq!(removed.name, "Oro");
        assert_eq!(session.variants().len(), 2);
        assert!(session
            .variants()
            .iter()
            .all(|v| v.color.as_deref() == Some("Plata")));
        assert_eq!(session.media.live_blob_count(), 1);
        assert!(session.remove_color("Oro").is_none());
    }

    #[test]
    fn slug_change_tracking() {
        let mut created = session();
        assert!(created.slug_changed());
        created.mark_saved(3);
        assert!(!created.slug_changed());
        assert_eq!(created.product_id, Some(3));

        let mut edited = EditSession::edit(9, fields("collar"), Vec::new(), Vec::new(), &[]);
        assert!(!edited.slug_changed());
        edited.fields.slug = "collar-perla".to_string();
        assert!(edited.slug_changed());
    }
}
