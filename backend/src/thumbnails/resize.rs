//! Thumbnail rendering

use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ImageResult, Rgb, RgbImage,
};
use tracing::debug;

/// Longest edge of a generated thumbnail
pub const THUMBNAIL_MAX_DIMENSION: u32 = 300;
/// JPEG quality used for thumbnails
pub const THUMBNAIL_JPEG_QUALITY: u8 = 85;

/// Renders a JPEG thumbnail that fits within `THUMBNAIL_MAX_DIMENSION` square
///
/// Transparent areas are composited over white. Images already small enough
/// keep their size.
///
/// # Errors
///
/// Returns an `ImageError` if the input cannot be decoded or the output cannot be encoded
pub fn create_thumbnail(original: &[u8]) -> ImageResult<Vec<u8>> {
    let image = image::load_from_memory(original)?;
    debug!(
        "Original image - Size: {}x{}, Color: {:?}",
        image.width(),
        image.height(),
        image.color()
    );

    let rgb = flatten_onto_white(&image);
    let (width, height) = fit_within(rgb.width(), rgb.height(), THUMBNAIL_MAX_DIMENSION);
    let thumbnail = if (width, height) == rgb.dimensions() {
        rgb
    } else {
        image::imageops::resize(&rgb, width, height, FilterType::Lanczos3)
    };
    debug!("Thumbnail size: {}x{}", thumbnail.width(), thumbnail.height());

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, THUMBNAIL_JPEG_QUALITY).encode_image(&thumbnail)?;
    Ok(encoded)
}

/// Largest size within `max` x `max` that keeps the aspect ratio, never upscaling
#[must_use]
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max {
        return (width, height);
    }

    let longest = u64::from(longest);
    let scale = |side: u32| {
        let scaled = (u64::from(side) * u64::from(max) + longest / 2) / longest;
        u32::try_from(scaled).unwrap_or(max).max(1)
    };
    (scale(width), scale(height))
}

fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u16::from(a);
        let blend = |channel: u8| {
            let mixed = (u16::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255;
            u8::try_from(mixed).unwrap_or(u8::MAX)
        };
        rgb.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    rgb
}
