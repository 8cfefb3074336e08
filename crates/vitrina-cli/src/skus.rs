//! Offline SKU matrix preview.

use vitrina_core::{category_prefix, generate, ColorSpec, Variant};

/// Print the variant matrix for the given colors and sizes.
///
/// # Errors
///
/// Returns an error if generation preconditions fail or JSON encoding fails.
pub(crate) fn run_skus(
    category_id: Option<i64>,
    slug: &str,
    colors: &[String],
    sizes: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let variants = build_matrix(category_id, slug, colors, sizes)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&variants)?);
        return Ok(());
    }

    println!("{:<22}{:<16}{:<8}STOCK", "SKU", "COLOR", "SIZE");
    for variant in &variants {
        println!(
            "{:<22}{:<16}{:<8}{}",
            variant.sku,
            variant.color.as_deref().unwrap_or("-"),
            variant.size.as_deref().unwrap_or("-"),
            variant.stock
        );
    }
    Ok(())
}

pub(crate) fn build_matrix(
    category_id: Option<i64>,
    slug: &str,
    colors: &[String],
    sizes: &[String],
) -> anyhow::Result<Vec<Variant>> {
    let specs: Vec<ColorSpec> = colors.iter().map(ColorSpec::from_name).collect();
    let variants = generate(&category_prefix(category_id), slug, &specs, sizes)?;
    Ok(variants)
}
