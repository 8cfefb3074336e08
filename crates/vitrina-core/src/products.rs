use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A color offered for a product. `name` is unique within a product's color set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSpec {
    pub name: String,
    /// Swatch color, e.g. `"#FFD700"`.
    pub hex: String,
}

impl ColorSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, hex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hex: hex.into(),
        }
    }

    /// Builds a spec whose swatch comes from the color table.
    #[must_use]
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let hex = crate::colors::hex_of(&name).to_string();
        Self { name, hex }
    }
}

/// One purchasable SKU-level combination of a product.
///
/// `sku` is unique within a product's variant list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// Generated as `"{category}-{model}-{color}-{size}"`, e.g. `"01-4821-02-7"`.
    pub sku: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub stock: u32,
    /// Added to the product base price for this variant.
    pub price_adjustment: Decimal,
    pub material: Option<String>,
}

/// Key of one image group: a color name, or the general imagery of the product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VariantGroupKey {
    Default,
    Color(String),
}

impl VariantGroupKey {
    pub const DEFAULT_NAME: &'static str = "default";

    #[must_use]
    pub fn color(name: impl Into<String>) -> Self {
        Self::Color(name.into())
    }

    /// The color this group belongs to; `None` for the default group.
    #[must_use]
    pub fn color_name(&self) -> Option<&str> {
        match self {
            Self::Default => None,
            Self::Color(name) => Some(name),
        }
    }
}

impl From<String> for VariantGroupKey {
    fn from(value: String) -> Self {
        if value == Self::DEFAULT_NAME {
            Self::Default
        } else {
            Self::Color(value)
        }
    }
}

impl From<&str> for VariantGroupKey {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<VariantGroupKey> for String {
    fn from(value: VariantGroupKey) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for VariantGroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => f.write_str(Self::DEFAULT_NAME),
            Self::Color(name) => f.write_str(name),
        }
    }
}

/// Rectangle in source-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    #[must_use]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pan {
    pub x: f64,
    pub y: f64,
}

/// Framing chosen in the editor.
///
/// `pixel_crop` is the only field used when baking; `pan` and `zoom` are
/// editor state and are dropped together with the transform once baked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropTransform {
    pub pan: Pan,
    /// Always `>= 1.0`.
    pub zoom: f64,
    pub pixel_crop: CropRect,
}

impl CropTransform {
    /// Zoom values below 1 are clamped to 1.
    #[must_use]
    pub fn new(pan: Pan, zoom: f64, pixel_crop: CropRect) -> Self {
        Self {
            pan,
            zoom: if zoom.is_finite() { zoom.max(1.0) } else { 1.0 },
            pixel_crop,
        }
    }

    #[must_use]
    pub fn from_pixels(pixel_crop: CropRect) -> Self {
        Self::new(Pan::default(), 1.0, pixel_crop)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageOrigin {
    /// Already in storage; `storage_path` was recorded at upload time.
    Existing,
    /// Chosen locally during this session; `url` is a local blob URL.
    New,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub url: String,
    pub origin: ImageOrigin,
    pub storage_path: Option<String>,
    pub transform: Option<CropTransform>,
    pub is_primary: bool,
}

impl ImageDescriptor {
    #[must_use]
    pub fn existing(url: impl Into<String>, storage_path: Option<String>, is_primary: bool) -> Self {
        Self {
            url: url.into(),
            origin: ImageOrigin::Existing,
            storage_path,
            transform: None,
            is_primary,
        }
    }

    #[must_use]
    pub fn new_local(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            origin: ImageOrigin::New,
            storage_path: None,
            transform: None,
            is_primary: false,
        }
    }

    /// `true` when the image can be referenced as-is without a transfer.
    #[must_use]
    pub fn is_untouched_existing(&self) -> bool {
        self.origin == ImageOrigin::Existing && self.transform.is_none()
    }
}

/// One image reference in the manifest sent to persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub url: String,
    /// Omitted for the default group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub is_primary: bool,
    pub storage_path: Option<String>,
}

/// Product-level fields edited in the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFields {
    pub name: String,
    /// URL slug, e.g. `"anillo-solitario-oro"`. Unique across the catalog.
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// Category name as selected in the form.
    pub category: Option<String>,
    /// Resolved at submission time from `category`.
    pub category_id: Option<i64>,
    pub material: Option<String>,
    pub is_active: bool,
}

/// Flattened product sent to persistence after media has been materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    #[serde(flatten)]
    pub product: ProductFields,
    pub variants: Vec<Variant>,
    pub images: Vec<ManifestEntry>,
}

impl SubmissionPayload {
    /// The entry flagged primary, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&ManifestEntry> {
        self.images.iter().find(|i| i.is_primary)
    }

    #[must_use]
    pub fn total_stock(&self) -> u64 {
        self.variants.iter().map(|v| u64::from(v.stock)).sum()
    }
}
