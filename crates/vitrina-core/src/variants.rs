//! SKU matrix generation.
//!
//! Every call draws one random four-digit model id shared by the whole batch
//! and emits one [`Variant`] per `(color, size)` pair, colors outer and sizes
//! inner. Generation is a full replacement of any earlier variant list.

use std::collections::HashSet;

use rand::Rng;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::colors::code_of;
use crate::products::{ColorSpec, Variant};

/// Prefix used when the product's category has no numeric id.
pub const DEFAULT_CATEGORY_PREFIX: &str = "90";

/// Stock seeded on freshly generated variants.
pub const SEED_STOCK: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariantError {
    #[error("at least one color is required to generate variants")]
    NoColors,

    #[error("at least one size is required to generate variants")]
    NoSizes,

    #[error("a product slug is required before generating SKUs")]
    MissingSlug,

    #[error("a category prefix is required before generating SKUs")]
    MissingCategoryPrefix,
}

/// SKU prefix for a category id: left-padded to two digits, or
/// [`DEFAULT_CATEGORY_PREFIX`] when there is no matching category.
#[must_use]
pub fn category_prefix(category_id: Option<i64>) -> String {
    match category_id {
        Some(id) if id >= 0 => format!("{id:02}"),
        _ => DEFAULT_CATEGORY_PREFIX.to_string(),
    }
}

/// Generate the full `colors × sizes` variant matrix with a fresh model id.
///
/// # Errors
///
/// Returns a [`VariantError`] when colors or sizes are empty (after trimming
/// blanks), or when the slug or category prefix is empty.
pub fn generate(
    category_prefix: &str,
    slug: &str,
    colors: &[ColorSpec],
    sizes: &[String],
) -> Result<Vec<Variant>, VariantError> {
    let model_id: u16 = rand::rng().random_range(1000..=9999);
    generate_with_model_id(category_prefix, slug, colors, sizes, model_id)
}

/// Same as [`generate`] with a caller-chosen model id.
///
/// # Errors
///
/// See [`generate`].
pub fn generate_with_model_id(
    category_prefix: &str,
    slug: &str,
    colors: &[ColorSpec],
    sizes: &[String],
    model_id: u16,
) -> Result<Vec<Variant>, VariantError> {
    let colors = distinct_colors(colors);
    if colors.is_empty() {
        return Err(VariantError::NoColors);
    }
    let sizes = distinct_sizes(sizes);
    if sizes.is_empty() {
        return Err(VariantError::NoSizes);
    }
    if slug.trim().is_empty() {
        return Err(VariantError::MissingSlug);
    }
    let prefix = category_prefix.trim();
    if prefix.is_empty() {
        return Err(VariantError::MissingCategoryPrefix);
    }

    let mut seen = HashSet::with_capacity(colors.len() * sizes.len());
    let mut variants = Vec::with_capacity(colors.len() * sizes.len());

    for color in &colors {
        let color_code = code_of(color);
        for size in &sizes {
            let base = format!("{prefix}-{model_id:04}-{color_code}-{size}");
            let sku = unique_sku(&mut seen, base);
            variants.push(Variant {
                sku,
                color: Some((*color).to_string()),
                size: Some((*size).to_string()),
                stock: SEED_STOCK,
                price_adjustment: Decimal::ZERO,
                material: None,
            });
        }
    }

    Ok(variants)
}

/// Unmapped colors share code `99`, so their SKUs can collide; later
/// duplicates get a numeric suffix.
fn unique_sku(seen: &mut HashSet<String>, base: String) -> String {
    if seen.insert(base.clone()) {
        return base;
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{base}-{n}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn distinct_colors(colors: &[ColorSpec]) -> Vec<&str> {
    let mut seen = HashSet::new();
    colors
        .iter()
        .map(|c| c.name.trim())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect()
}

fn distinct_sizes(sizes: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    sizes
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(*s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oro_plata() -> Vec<ColorSpec> {
        vec![
            ColorSpec::new("Oro", "#FFD700"),
            ColorSpec::new("Plata", "#C0C0C0"),
        ]
    }

    fn sizes(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    fn model_segment(sku: &str) -> &str {
        sku.split('-').nth(1).expect("sku has a model segment")
    }

    #[test]
    fn oro_plata_scenario_produces_four_ordered_variants() {
        let variants = generate("01", "anillo-solitario", &oro_plata(), &sizes(&["6", "7"]))
            .expect("generation succeeds");

        assert_eq!(variants.len(), 4);
        let model = model_segment(&variants[0].sku).to_string();
        assert_eq!(model.len(), 4);
        assert!(model.chars().all(|c| c.is_ascii_digit()));

        let expected = [
            format!("01-{model}-01-6"),
            format!("01-{model}-01-7"),
            format!("01-{model}-02-6"),
            format!("01-{model}-02-7"),
        ];
        let skus: Vec<&str> = variants.iter().map(|v| v.sku.as_str()).collect();
        assert_eq!(skus, expected.iter().map(String::as_str).collect::<Vec<_>>());

        assert_eq!(variants[0].color.as_deref(), Some("Oro"));
        assert_eq!(variants[3].color.as_deref(), Some("Plata"));
        assert_eq!(variants[3].size.as_deref(), Some("7"));
    }

    #[test]
    fn matrix_size_uniqueness_and_shared_model() {
        let colors = vec![
            ColorSpec::from_name("Oro"),
            ColorSpec::from_name("Plata"),
            ColorSpec::from_name("Oro Rosa"),
        ];
        let variants = generate("12", "aretes", &colors, &sizes(&["S", "M", "L", "XL"])).unwrap();

        assert_eq!(variants.len(), 12);
        let unique: HashSet<&str> = variants.iter().map(|v| v.sku.as_str()).collect();
        assert_eq!(unique.len(), 12);
        let models: HashSet<&str> = variants.iter().map(|v| model_segment(&v.sku)).collect();
        assert_eq!(models.len(), 1);
    }

    #[test]
    fn seeds_stock_and_zero_adjustment() {
        let variants = generate("01", "anillo", &oro_plata(), &sizes(&["6"])).unwrap();
        for v in &variants {
            assert_eq!(v.stock, SEED_STOCK);
            assert_eq!(v.price_adjustment, Decimal::ZERO);
        }
    }

    #[test]
    fn repeated_generation_varies_model_id() {
        let colors = oro_plata();
        let sizes = sizes(&["6"]);
        let models: HashSet<String> = (0..20)
            .map(|_| {
                let variants = generate("01", "anillo", &colors, &sizes).unwrap();
                model_segment(&variants[0].sku).to_string()
            })
            .collect();
        assert!(models.len() > 1, "model id never changed across 20 generations");
    }

    #[test]
    fn rejects_empty_colors() {
        let err = generate("01", "anillo", &[], &sizes(&["6"])).unwrap_err();
        assert_eq!(err, VariantError::NoColors);
    }

    #[test]
    fn rejects_blank_only_sizes() {
        let err = generate("01", "anillo", &oro_plata(), &sizes(&["", "  "])).unwrap_err();
        assert_eq!(err, VariantError::NoSizes);
    }

    #[test]
    fn rejects_missing_slug() {
        let err = generate("01", "  ", &oro_plata(), &sizes(&["6"])).unwrap_err();
        assert_eq!(err, VariantError::MissingSlug);
    }

    #[test]
    fn rejects_missing_prefix() {
        let err = generate("", "anillo", &oro_plata(), &sizes(&["6"])).unwrap_err();
        assert_eq!(err, VariantError::MissingCategoryPrefix);
    }

    #[test]
    fn unknown_colors_use_reserved_code_and_stay_unique() {
        let colors = vec![
            ColorSpec::from_name("Turquesa"),
            ColorSpec::from_name("Lavanda"),
        ];
        let variants =
            generate_with_model_id("90", "dije", &colors, &sizes(&["U"]), 4821).unwrap();
        assert_eq!(variants[0].sku, "90-4821-99-U");
        assert_eq!(variants[1].sku, "90-4821-99-U-2");
    }

    #[test]
    fn duplicate_inputs_are_collapsed() {
        let colors = vec![
            ColorSpec::from_name("Oro"),
            ColorSpec::from_name("oro"),
        ];
        let variants =
            generate_with_model_id("01", "anillo", &colors, &sizes(&["6", " 6 ", "7"]), 1000)
                .unwrap();
        let skus: Vec<&str> = variants.iter().map(|v| v.sku.as_str()).collect();
        assert_eq!(skus, ["01-1000-01-6", "01-1000-01-7"]);
    }

    #[test]
    fn category_prefix_pads_or_falls_back() {
        assert_eq!(category_prefix(Some(1)), "01");
        assert_eq!(category_prefix(Some(7)), "07");
        assert_eq!(category_prefix(Some(42)), "42");
        assert_eq!(category_prefix(Some(123)), "123");
        assert_eq!(category_prefix(None), "90");
        assert_eq!(category_prefix(Some(-3)), "90");
    }
}
