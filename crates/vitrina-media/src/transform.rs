//! Crop baking: rasterize a pixel-space rectangle of a source image into a
//! new JPEG.

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use vitrina_core::CropRect;

use crate::blob::ImageBlob;
use crate::error::TransformError;

/// JPEG quality used for baked crops.
pub const BAKE_QUALITY: u8 = 95;

/// Copy exactly `crop` (clamped to the source bounds) out of `source` into a
/// new image of the clamped rectangle's size.
///
/// The output is never larger than the source; there is no resampling.
///
/// # Errors
///
/// - [`TransformError::UnreadableSource`] if `source` does not decode.
/// - [`TransformError::EmptyCrop`] if nothing of `crop` overlaps the source.
/// - [`TransformError::Encode`] if JPEG encoding fails.
pub fn bake(source: &ImageBlob, crop: CropRect) -> Result<ImageBlob, TransformError> {
    let image = decode(source)?;
    let rect = clamp_crop(crop, image.width(), image.height()).ok_or(TransformError::EmptyCrop {
        crop,
        width: image.width(),
        height: image.height(),
    })?;
    let cropped = image.crop_imm(rect.x, rect.y, rect.width, rect.height);
    encode_jpeg(&cropped, BAKE_QUALITY)
}

/// Intersect `crop` with a `width`x`height` image. `None` when the
/// intersection is empty.
#[must_use]
pub fn clamp_crop(crop: CropRect, width: u32, height: u32) -> Option<CropRect> {
    if crop.x >= width || crop.y >= height {
        return None;
    }
    let clamped = CropRect {
        x: crop.x,
        y: crop.y,
        width: crop.width.min(width - crop.x),
        height: crop.height.min(height - crop.y),
    };
    (clamped.width > 0 && clamped.height > 0).then_some(clamped)
}

pub(crate) fn decode(blob: &ImageBlob) -> Result<DynamicImage, TransformError> {
    image::load_from_memory(blob.bytes())
        .map_err(|e| TransformError::UnreadableSource(e.to_string()))
}

/// JPEG has no alpha channel, so pixels are flattened to RGB first.
pub(crate) fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<ImageBlob, TransformError> {
    let rgb = image.to_rgb8();
    let mut buf = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
        encoder
            .encode_image(&rgb)
            .map_err(TransformError::Encode)?;
    }
    Ok(ImageBlob::jpeg(buf))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};

    use super::*;

    fn png(width: u32, height: u32) -> ImageBlob {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([
                u8::try_from(x % 256).unwrap(),
                u8::try_from(y % 256).unwrap(),
                90,
                255,
            ])
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        ImageBlob::new(buf, "image/png")
    }

    fn dimensions(blob: &ImageBlob) -> (u32, u32) {
        image::load_from_memory(blob.bytes()).unwrap().dimensions()
    }

    #[test]
    fn full_bounds_crop_keeps_dimensions() {
        let source = png(64, 48);
        let baked = bake(&source, CropRect::new(0, 0, 64, 48)).unwrap();
        assert_eq!(baked.content_type(), "image/jpeg");
        assert_eq!(dimensions(&baked), (64, 48));
    }

    #[test]
    fn sub_rectangle_becomes_output_size() {
        let source = png(64, 48);
        let baked = bake(&source, CropRect::new(8, 4, 20, 30)).unwrap();
        assert_eq!(dimensions(&baked), (20, 30));
    }

    #[test]
    fn crop_is_clamped_to_source_bounds() {
        let source = png(64, 48);
        let baked = bake(&source, CropRect::new(50, 40, 100, 100)).unwrap();
        assert_eq!(dimensions(&baked), (14, 8));
    }

    #[test]
    fn crop_outside_source_is_rejected() {
        let source = png(16, 16);
        let err = bake(&source, CropRect::new(16, 0, 4, 4)).unwrap_err();
        assert!(matches!(
            err,
            TransformError::EmptyCrop {
                width: 16,
                height: 16,
                ..
            }
        ));
    }

    #[test]
    fn garbage_source_is_unreadable() {
        let source = ImageBlob::jpeg(vec![0xFF, 0xD8, 0x00, 0x01]);
        let err = bake(&source, CropRect::new(0, 0, 4, 4)).unwrap_err();
        assert!(matches!(err, TransformError::UnreadableSource(_)));
    }

    #[test]
    fn clamp_crop_cases() {
        assert_eq!(
            clamp_crop(CropRect::new(0, 0, 10, 10), 10, 10),
            Some(CropRect::new(0, 0, 10, 10))
        );
        assert_eq!(
            clamp_crop(CropRect::new(5, 5, 10, 10), 10, 10),
            Some(CropRect::new(5, 5, 5, 5))
        );
        assert_eq!(clamp_crop(CropRect::new(0, 0, 0, 10), 10, 10), None);
        assert_eq!(clamp_crop(CropRect::new(0, 10, 5, 5), 10, 10), None);
    }
}
