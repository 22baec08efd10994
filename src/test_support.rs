//! Fixtures shared by unit tests.

use std::path::Path;

use image::{Rgb, RgbImage};

/// Distinct solid colour per class so a small network can separate them
pub fn class_color(label: usize) -> Rgb<u8> {
    const PALETTE: [[u8; 3]; 6] = [
        [220, 40, 40],
        [40, 200, 60],
        [40, 60, 220],
        [230, 220, 40],
        [200, 40, 200],
        [40, 210, 210],
    ];
    Rgb(PALETTE[label % PALETTE.len()])
}

/// Write `per_class` solid-colour PNGs of `size`×`size` into one folder per class
pub fn write_image_folder(root: &Path, classes: &[&str], per_class: usize, size: u32) {
    for (label, class) in classes.iter().enumerate() {
        let class_dir = root.join(class);
        std::fs::create_dir_all(&class_dir).unwrap();

        for i in 0..per_class {
            let img = RgbImage::from_pixel(size, size, class_color(label));
            img.save(class_dir.join(format!("img_{:03}.png", i))).unwrap();
        }
    }
}
