use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::products::{ColorSpec, CropRect, ProductFields};
use crate::slug::{slugify, validate_slug};
use crate::ConfigError;

/// A color entry in a draft file; `hex` falls back to the color table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftColor {
    pub name: String,
    pub hex: Option<String>,
}

/// A local image to attach to the product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftImage {
    pub path: PathBuf,
    /// Group the image belongs to; `None` means the default group.
    pub color: Option<String>,
    #[serde(default)]
    pub primary: bool,
    pub crop: Option<CropRect>,
}

/// Product edit described as YAML, used to drive a submission from a script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDraftFile {
    /// Present when editing an existing product.
    pub product_id: Option<i64>,
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<String>,
    pub material: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub colors: Vec<DraftColor>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub images: Vec<DraftImage>,
}

fn default_active() -> bool {
    true
}

impl ProductDraftFile {
    /// The explicit slug, or one derived from the name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.slug.clone().unwrap_or_else(|| slugify(&self.name))
    }

    #[must_use]
    pub fn color_specs(&self) -> Vec<ColorSpec> {
        self.colors
            .iter()
            .map(|c| match &c.hex {
                Some(hex) => ColorSpec::new(c.name.trim(), hex.clone()),
                None => ColorSpec::from_name(c.name.trim()),
            })
            .collect()
    }

    #[must_use]
    pub fn fields(&self) -> ProductFields {
        ProductFields {
            name: self.name.trim().to_string(),
            slug: self.slug(),
            description: self.description.clone(),
            price: self.price,
            category: self.category.clone(),
            category_id: None,
            material: self.material.clone(),
            is_active: self.active,
        }
    }
}

/// Load and validate a product draft from a YAML file.
///
/// Image paths are resolved relative to the draft file's directory.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_draft(path: &Path) -> Result<ProductDraftFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::DraftFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut draft: ProductDraftFile =
        serde_yaml::from_str(&content).map_err(ConfigError::DraftFileParse)?;

    validate_draft(&draft)?;

    if let Some(base) = path.parent() {
        for image in &mut draft.images {
            if image.path.is_relative() {
                image.path = base.join(&image.path);
            }
        }
    }

    Ok(draft)
}

fn validate_draft(draft: &ProductDraftFile) -> Result<(), ConfigError> {
    if draft.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "product name must be non-empty".to_string(),
        ));
    }

    validate_slug(&draft.slug()).map_err(ConfigError::Validation)?;

    if draft.price.is_sign_negative() {
        return Err(ConfigError::Validation(format!(
            "price must not be negative (got {})",
            draft.price
        )));
    }

    let mut seen_colors = HashSet::new();
    for color in &draft.colors {
        if color.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "color name must be non-empty".to_string(),
            ));
        }
        if !seen_colors.insert(color.name.trim().to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate color name: '{}'",
                color.name
            )));
        }
    }

    let mut primaries = 0usize;
    for image in &draft.images {
        if let Some(color) = &image.color {
            if !seen_colors.contains(&color.trim().to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "image {} references unknown color '{color}'",
                    image.path.display()
                )));
            }
        }
        if let Some(crop) = image.crop {
            if crop.width == 0 || crop.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "image {} has an empty crop",
                    image.path.display()
                )));
            }
        }
        if image.primary {
            primaries += 1;
        }
    }
    if primaries > 1 {
        return Err(ConfigError::Validation(format!(
            "{primaries} images are marked primary; at most one is allowed"
        )));
    }

    Ok(())
}

#[cfg(test)]
#[path = "draft_test.rs"]
mod tests;
