#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// A 24-bit uncompressed BMP of the given size, all pixels black.
pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    const HEADER_LEN: u32 = 14 + 40;
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_bytes = row_stride * height;
    let file_len = HEADER_LEN + pixel_bytes;

    let mut bytes = Vec::with_capacity(file_len as usize);
    // File header.
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_len.to_le_bytes());
    bytes.extend_from_slice(&[0; 4]);
    bytes.extend_from_slice(&HEADER_LEN.to_le_bytes());
    // BITMAPINFOHEADER.
    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_bytes.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&[0; 8]);

    bytes.resize(file_len as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// Writes a det_20 label file with one single-car record per image name.
pub fn write_det20_labels(path: &Path, names: &[&str]) {
    let records: Vec<String> = names
        .iter()
        .map(|name| {
            format!(
                r#"{{"name": "{name}", "attributes": {{"weather": "clear"}}, "timestamp": 10000, "labels": [
                    {{"id": "1", "category": "car", "attributes": {{"occluded": false}},
                      "box2d": {{"x1": 1.0, "y1": 2.0, "x2": 3.0, "y2": 4.0}}}}
                ]}}"#
            )
        })
        .collect();
    fs::write(path, format!("[{}]", records.join(","))).expect("write det_20 labels");
}

/// Lays out `images/100k/val/<name>.bmp` plus `labels/det_20/det_val.json`
/// under `root` and returns `(images_dir, labels_path)`.
pub fn bdd100k_val_tree(root: &Path, images: &[(&str, u32, u32)]) -> (PathBuf, PathBuf) {
    let images_dir = root.join("images").join("100k").join("val");
    for (name, width, height) in images {
        write_bmp(&images_dir.join(name), *width, *height);
    }

    let labels_dir = root.join("labels").join("det_20");
    fs::create_dir_all(&labels_dir).expect("create labels dir");
    let labels_path = labels_dir.join("det_val.json");
    let names: Vec<&str> = images.iter().map(|(name, _, _)| *name).collect();
    write_det20_labels(&labels_path, &names);

    (images_dir, labels_path)
}
