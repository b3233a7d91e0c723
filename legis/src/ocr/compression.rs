use std::io::Write;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Uploads above this size are downscaled before being sent to OCR.space.
pub const COMPRESSION_THRESHOLD_BYTES: u64 = 1000 * 1024;

/// Longest side, in pixels, of a compressed upload.
pub const MAX_DIMENSION: u32 = 1500;

pub const JPEG_QUALITY: u8 = 60;

/// Why an image was uploaded uncompressed. Never fatal.
#[derive(Error, Debug)]
pub enum CompressionSkipped {
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode JPEG: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// JPEG derivative written to a temporary file. The file is deleted when
/// this value is dropped.
#[derive(Debug)]
pub struct CompressedImage {
    file: NamedTempFile,
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
}

impl CompressedImage {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

pub fn needs_compression(size_bytes: u64) -> bool {
    size_bytes > COMPRESSION_THRESHOLD_BYTES
}

/// Fits `(width, height)` inside a `max` x `max` box, preserving aspect
/// ratio. The longer side becomes exactly `max`; dimensions already inside
/// the box are returned unchanged.
pub fn target_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }

    let scale = |side: u32, long: u32| -> u32 {
        let scaled = (side as f64 * max as f64 / long as f64).round() as u32;
        scaled.clamp(1, max)
    };

    if width >= height {
        (max, scale(height, width))
    } else {
        (scale(width, height), max)
    }
}

/// Decodes `path`, downsizes it to fit [`MAX_DIMENSION`] and re-encodes it as
/// JPEG at [`JPEG_QUALITY`] into a fresh temporary file under `work_dir`.
pub fn compress_for_upload(
    path: &Path,
    work_dir: Option<&Path>,
) -> Result<CompressedImage, CompressionSkipped> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;

    match reader.format() {
        Some(
            ImageFormat::Jpeg
            | ImageFormat::Png
            | ImageFormat::Gif
            | ImageFormat::WebP
            | ImageFormat::Bmp,
        ) => {}
        Some(other) => {
            return Err(CompressionSkipped::UnsupportedFormat(format!("{other:?}")));
        }
        None => {
            return Err(CompressionSkipped::UnsupportedFormat(
                "unrecognized".to_string(),
            ));
        }
    }

    let img = reader
        .decode()
        .map_err(|e| CompressionSkipped::Decode(e.to_string()))?;

    let (width, height) = target_dimensions(img.width(), img.height(), MAX_DIMENSION);
    let img = if (width, height) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(width, height, FilterType::Lanczos3)
    };

    let rgb = flatten_onto_white(&img);

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| CompressionSkipped::Encode(e.to_string()))?;

    let mut builder = tempfile::Builder::new();
    builder.prefix("ocr_comp_").suffix(".jpg");
    let mut file = match work_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    file.write_all(&encoded)?;
    file.flush()?;

    Ok(CompressedImage {
        file,
        width,
        height,
        bytes: encoded.len() as u64,
    })
}

/// Composites any transparency onto a white page so scans with alpha stay
/// legible after JPEG encoding.
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        DynamicImage::new_rgb8(width, height)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    #[test]
    fn test_target_dimensions_within_cap_unchanged() {
        assert_eq!(target_dimensions(800, 600, 1500), (800, 600));
        assert_eq!(target_dimensions(1500, 1500, 1500), (1500, 1500));
    }

    #[test]
    fn test_target_dimensions_landscape() {
        assert_eq!(target_dimensions(3000, 2000, 1500), (1500, 1000));
    }

    #[test]
    fn test_target_dimensions_portrait_rounds() {
        assert_eq!(target_dimensions(2001, 3000, 1500), (1001, 1500));
    }

    #[test]
    fn test_target_dimensions_extreme_ratio_keeps_one_pixel() {
        assert_eq!(target_dimensions(10_000, 1, 1500), (1500, 1));
    }

    #[test]
    fn test_needs_compression_threshold() {
        assert!(!needs_compression(COMPRESSION_THRESHOLD_BYTES));
        assert!(needs_compression(COMPRESSION_THRESHOLD_BYTES + 1));
    }

    #[test]
    fn test_small_image_keeps_dimensions_and_becomes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_png(dir.path(), "small.png", 640, 480);

        let compressed = compress_for_upload(&source, Some(dir.path())).unwrap();
        assert_eq!((compressed.width, compressed.height), (640, 480));

        let reader = ImageReader::open(compressed.path())
            .unwrap()
            .with_guessed_format()
            .unwrap();
        assert_eq!(reader.format(), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_large_image_downscaled_to_cap() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_png(dir.path(), "large.png", 1800, 2400);

        let compressed = compress_for_upload(&source, Some(dir.path())).unwrap();
        assert_eq!((compressed.width, compressed.height), (1125, 1500));

        let decoded = image::open(compressed.path()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1125, 1500));
    }

    #[test]
    fn test_compressed_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_png(dir.path(), "scan.png", 100, 100);

        let compressed = compress_for_upload(&source, Some(dir.path())).unwrap();
        let path = compressed.path().to_path_buf();
        assert!(path.exists());
        drop(compressed);
        assert!(!path.exists());
    }

    #[test]
    fn test_every_supported_format_becomes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let formats = [
            (ImageFormat::Png, "png"),
            (ImageFormat::Jpeg, "jpg"),
            (ImageFormat::Gif, "gif"),
            (ImageFormat::WebP, "webp"),
            (ImageFormat::Bmp, "bmp"),
        ];
        let sizes = [((300, 200), (300, 200)), ((2000, 3100), (968, 1500))];

        for (format, ext) in formats {
            for ((width, height), expected) in sizes {
                let source = dir.path().join(format!("page-{width}x{height}.{ext}"));
                let image = match format {
                    ImageFormat::Gif => DynamicImage::new_rgba8(width, height),
                    _ => DynamicImage::new_rgb8(width, height),
                };
                image.save_with_format(&source, format).unwrap();

                let compressed = compress_for_upload(&source, Some(dir.path())).unwrap();
                assert_eq!(
                    (compressed.width, compressed.height),
                    expected,
                    "{format:?} {width}x{height}"
                );

                let reader = ImageReader::open(compressed.path())
                    .unwrap()
                    .with_guessed_format()
                    .unwrap();
                assert_eq!(reader.format(), Some(ImageFormat::Jpeg), "{format:?}");
                let decoded = reader.decode().unwrap();
                assert_eq!((decoded.width(), decoded.height()), expected);
            }
        }
    }

    #[test]
    fn test_unrecognized_bytes_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, b"plain text, not an image").unwrap();

        let result = compress_for_upload(&source, Some(dir.path()));
        assert!(matches!(result, Err(CompressionSkipped::UnsupportedFormat(_))));
    }

    #[test]
    fn test_truncated_png_is_decode_skip() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_png(dir.path(), "good.png", 50, 50);
        let mut bytes = std::fs::read(&good).unwrap();
        bytes.truncate(40);
        let broken = dir.path().join("broken.png");
        std::fs::write(&broken, bytes).unwrap();

        let result = compress_for_upload(&broken, Some(dir.path()));
        assert!(matches!(result, Err(CompressionSkipped::Decode(_))));
    }

    #[test]
    fn test_transparent_pixels_flatten_to_white() {
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([10, 20, 30, 255]));

        let flat = flatten_onto_white(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(flat.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(flat.get_pixel(1, 0), &Rgb([10, 20, 30]));
    }
}
