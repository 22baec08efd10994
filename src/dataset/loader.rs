//! Image Folder Dataset Loader
//!
//! Discovers a labelled image tree where every immediate sub-directory of the
//! root is one class and the directory name is the label.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::utils::error::{PlantDiseaseError, Result};

/// File extensions accepted as images (compared case-insensitively)
pub const IMAGE_EXTENSIONS: [&str; 9] = [
    "jpg", "jpeg", "png", "ppm", "bmp", "pgm", "tif", "tiff", "webp",
];

/// A single image sample with its label and metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSample {
    /// Path to the image file
    pub path: PathBuf,
    /// Class label index
    pub label: usize,
    /// Class name (e.g., "Tomato___Late_blight")
    pub class_name: String,
}

/// Labelled dataset discovered from a folder-per-class tree
#[derive(Debug, Clone)]
pub struct ImageFolderDataset {
    /// Root directory of the dataset
    pub root_dir: PathBuf,
    /// Class names in label order (sorted folder names)
    pub class_names: Vec<String>,
    /// All samples, grouped by class in label order
    pub samples: Vec<ImageSample>,
}

/// Whether the path carries one of the accepted image extensions
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

impl ImageFolderDataset {
    /// Discover classes and samples under `root_dir`
    ///
    /// The directory should be structured as:
    /// ```text
    /// root_dir/
    /// ├── Apple___Apple_scab/
    /// │   ├── image1.jpg
    /// │   └── image2.jpg
    /// ├── Apple___healthy/
    /// │   └── ...
    /// └── ...
    /// ```
    ///
    /// Images are collected recursively below each class folder. A root with
    /// no class folders, or a class folder with no images, is an error.
    pub fn new<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        info!("Loading image folder dataset from: {:?}", root_dir);

        if !root_dir.is_dir() {
            return Err(PlantDiseaseError::PathNotFound(root_dir));
        }

        let mut class_names: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(&root_dir)? {
            let entry = entry?;
            // Symlinked class folders count as classes
            if !entry.path().is_dir() {
                continue;
            }

            let name = entry.file_name().into_string().map_err(|name| {
                PlantDiseaseError::Dataset(format!(
                    "Class directory name {:?} in {:?} is not valid UTF-8",
                    name, root_dir
                ))
            })?;
            class_names.push(name);
        }
        class_names.sort();

        if class_names.is_empty() {
            return Err(PlantDiseaseError::Dataset(format!(
                "No class directories found in {:?}",
                root_dir
            )));
        }

        info!("Found {} classes", class_names.len());

        let mut samples = Vec::new();

        for (label, class_name) in class_names.iter().enumerate() {
            let class_dir = root_dir.join(class_name);

            let mut paths: Vec<PathBuf> = WalkDir::new(&class_dir)
                .min_depth(1)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| is_image_file(p))
                .collect();
            paths.sort();

            if paths.is_empty() {
                return Err(PlantDiseaseError::Dataset(format!(
                    "Class directory {:?} contains no images (accepted: {})",
                    class_dir,
                    IMAGE_EXTENSIONS.join(", ")
                )));
            }

            debug!(
                "Class '{}' (label {}): {} samples",
                class_name,
                label,
                paths.len()
            );

            samples.extend(paths.into_iter().map(|path| ImageSample {
                path,
                label,
                class_name: class_name.clone(),
            }));
        }

        info!("Loaded {} total samples", samples.len());

        Ok(Self {
            root_dir,
            class_names,
            samples,
        })
    }

    /// Get the number of samples in the dataset
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get the number of classes
    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Get the class name for a label index
    pub fn class_name(&self, label: usize) -> Option<&str> {
        self.class_names.get(label).map(String::as_str)
    }

    /// Get statistics about the dataset
    pub fn stats(&self) -> DatasetStats {
        let mut class_counts = vec![0usize; self.num_classes()];
        for sample in &self.samples {
            class_counts[sample.label] += 1;
        }

        DatasetStats {
            total_samples: self.samples.len(),
            num_classes: self.num_classes(),
            class_counts,
            class_names: self.class_names.clone(),
        }
    }
}

/// Statistics about the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_samples: usize,
    pub num_classes: usize,
    pub class_counts: Vec<usize>,
    pub class_names: Vec<String>,
}

impl DatasetStats {
    /// Print statistics to console
    pub fn print(&self) {
        println!("\n📊 Dataset Statistics:");
        println!("  Total samples: {}", self.total_samples);
        println!("  Number of classes: {}", self.num_classes);
        println!("\n  Samples per class:");

        for (idx, (name, count)) in self
            .class_names
            .iter()
            .zip(self.class_counts.iter())
            .enumerate()
        {
            let bar_len = (*count as f32 / self.total_samples.max(1) as f32 * 40.0) as usize;
            let bar: String = "█".repeat(bar_len);
            println!("    {:3}. {:40} {:5} {}", idx, name, count, bar);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_image_folder;

    #[cfg(unix)]
    #[test]
    fn test_symlinked_class_folder_is_discovered() {
        let data = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        write_image_folder(data.path(), &["a"], 2, 8);
        write_image_folder(elsewhere.path(), &["b"], 2, 8);
        std::os::unix::fs::symlink(elsewhere.path().join("b"), data.path().join("b")).unwrap();

        let dataset = ImageFolderDataset::new(data.path()).unwrap();

        assert_eq!(dataset.class_names, vec!["a", "b"]);
        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.samples[3].label, 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_class_folder_is_an_error() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        write_image_folder(dir.path(), &["a", "c"], 1, 8);
        std::fs::create_dir(dir.path().join(OsStr::from_bytes(b"b\xff"))).unwrap();

        let err = ImageFolderDataset::new(dir.path()).unwrap_err();
        assert!(matches!(err, PlantDiseaseError::Dataset(_)));
    }

    #[test]
    fn test_discovers_sorted_classes() {
        let dir = tempfile::tempdir().unwrap();
        write_image_folder(dir.path(), &["tomato_rust", "apple_scab", "healthy"], 3, 16);

        let dataset = ImageFolderDataset::new(dir.path()).unwrap();

        assert_eq!(dataset.class_names, vec!["apple_scab", "healthy", "tomato_rust"]);
        assert_eq!(dataset.len(), 9);
        assert!(dataset
            .samples
            .iter()
            .all(|s| dataset.class_names[s.label] == s.class_name));
    }

    #[test]
    fn test_nested_images_and_extension_filter() {
        let dir = tempfile::tempdir().unwrap();
        write_image_folder(dir.path(), &["a", "b"], 2, 8);

        let nested = dir.path().join("a").join("batch2");
        std::fs::create_dir_all(&nested).unwrap();
        image::RgbImage::new(8, 8).save(nested.join("extra.PNG")).unwrap();
        std::fs::write(dir.path().join("b").join("notes.txt"), "not an image").unwrap();

        let dataset = ImageFolderDataset::new(dir.path()).unwrap();
        let stats = dataset.stats();

        assert_eq!(stats.class_counts, vec![3, 2]);
        assert_eq!(stats.total_samples, 5);
    }

    #[test]
    fn test_missing_root_is_error() {
        let err = ImageFolderDataset::new("/definitely/not/a/dataset").unwrap_err();
        assert!(matches!(err, PlantDiseaseError::PathNotFound(_)));
    }

    #[test]
    fn test_root_without_classes_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageFolderDataset::new(dir.path()).unwrap_err();
        assert!(matches!(err, PlantDiseaseError::Dataset(_)));
    }

    #[test]
    fn test_empty_class_is_error() {
        let dir = tempfile::tempdir().unwrap();
        write_image_folder(dir.path(), &["full"], 2, 8);
        std::fs::create_dir(dir.path().join("empty")).unwrap();

        let err = ImageFolderDataset::new(dir.path()).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("leaf.JPG")));
        assert!(is_image_file(Path::new("leaf.webp")));
        assert!(!is_image_file(Path::new("leaf.txt")));
        assert!(!is_image_file(Path::new("leaf")));
    }
}
