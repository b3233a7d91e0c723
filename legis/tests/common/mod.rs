#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use legis::config::{OcrConfig, OcrDriver};

/// Config pointing at a mock OCR.space endpoint, staging into `work_dir`.
pub fn test_config(endpoint: &str, work_dir: &Path) -> OcrConfig {
    OcrConfig {
        driver: OcrDriver::Auto,
        api_key: "test-key".to_string(),
        endpoint: endpoint.to_string(),
        engine_mode: "1".to_string(),
        timeout_secs: 10,
        tesseract_binary: "legis-test-missing-tesseract".to_string(),
        languages: "eng".to_string(),
        local_timeout_secs: 10,
        work_dir: Some(work_dir.to_path_buf()),
        max_upload_bytes: 20 * 1024 * 1024,
    }
}

/// Flat white PNG; compresses to a few hundred bytes.
pub fn blank_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    encode_png(DynamicImage::ImageRgb8(img))
}

/// Pseudo-random noise PNG. Noise defeats PNG compression, so the file is
/// roughly `width * height * 3` bytes.
pub fn noisy_png(width: u32, height: u32) -> Vec<u8> {
    // xorshift32
    let mut state: u32 = 0x1234_5678;
    let img = RgbImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [a, b, c, _] = state.to_le_bytes();
        Rgb([a, b, c])
    });
    encode_png(DynamicImage::ImageRgb8(img))
}

fn encode_png(img: DynamicImage) -> Vec<u8> {
    let mut output = Vec::new();
    img.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .expect("Failed to encode PNG fixture");
    output
}

pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes)
        .unwrap_or_else(|e| panic!("Failed to write fixture '{name}': {e}"));
    path
}

pub fn dir_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .expect("Failed to list directory")
        .count()
}

pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
