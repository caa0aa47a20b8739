use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Write a solid-color image; the format follows the extension
#[allow(dead_code)]
pub fn write_image(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.path().join(name);
    image::RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]))
        .save(&path)
        .expect("failed to write image");
    path
}

/// Gemini SSE body streaming one text part per event
#[allow(dead_code)]
pub fn sse_body(chunks: &[&str]) -> String {
    chunks
        .iter()
        .map(|text| {
            let event = serde_json::json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": text }] }
                }]
            });
            format!("data: {}\r\n\r\n", event)
        })
        .collect()
}
