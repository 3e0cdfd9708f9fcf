//! Loader for MNIST-style digit bitmaps stored one image per file.
//!
//! The label is the first character of the file name (`7_00123.png` is a 7). Pixels are turned
//! into ink intensity: `1 - floor(0.2126 R + 0.7152 G + 0.0722 B) / 255`, so dark strokes on a
//! light background map close to 1.0. Values are stored row-major.

use std::path::Path;

use tracing::debug;

use crate::data::sample::Sample;
use crate::error::{Error, Result};

/// Number of digit classes for classification targets.
pub const DIGIT_CLASSES: usize = 10;

/// A decoded bitmap plus the metadata needed to render it again.
#[derive(Debug, Clone, PartialEq)]
pub struct MnistImage {
    pub sample: Sample,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
}

/// Decodes one bitmap.
///
/// - `normalize` — shift every value down by half of the image maximum
/// - `encoder`   — use the values as the expected output instead of a one-hot label
pub fn read_image<P: AsRef<Path>>(path: P, normalize: bool, encoder: bool) -> Result<MnistImage> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Dataset(format!("'{}' has no file name", path.display())))?
        .to_owned();
    let label = label_from_file_name(&file_name)?;

    let img = image::open(path)?.to_rgb8();
    let (width, height) = img.dimensions();
    let values = ink_values(&img, normalize);

    let sample = if encoder {
        Sample::reconstruction(values, label)
    } else {
        Sample::classification(values, label, DIGIT_CLASSES)?
    };

    Ok(MnistImage {
        sample,
        width,
        height,
        file_name,
    })
}

/// Decodes every `*.png` in `dir`, ordered by file name.
pub fn read_all<P: AsRef<Path>>(dir: P, normalize: bool, encoder: bool) -> Result<Vec<MnistImage>> {
    let dir = dir.as_ref();
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .map_or(false, |e| e.eq_ignore_ascii_case("png"))
        })
        .collect();
    paths.sort();

    debug!(dir = %dir.display(), files = paths.len(), "reading bitmaps");

    paths
        .iter()
        .map(|p| read_image(p, normalize, encoder))
        .collect()
}

/// Convenience: the samples of [`read_all`] without the image metadata.
pub fn read_samples<P: AsRef<Path>>(dir: P, normalize: bool, encoder: bool) -> Result<Vec<Sample>> {
    Ok(read_all(dir, normalize, encoder)?
        .into_iter()
        .map(|img| img.sample)
        .collect())
}

fn label_from_file_name(file_name: &str) -> Result<usize> {
    file_name
        .chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .map(|d| d as usize)
        .ok_or_else(|| {
            Error::Dataset(format!("file name '{file_name}' does not start with a digit label"))
        })
}

fn ink_values(img: &image::RgbImage, normalize: bool) -> Vec<f64> {
    let mut values: Vec<f64> = img
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            let gray = (r as f64 * 0.2126 + g as f64 * 0.7152 + b as f64 * 0.0722).floor();
            1.0 - gray / 255.0
        })
        .collect();

    if normalize {
        let half_max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max) / 2.0;
        values.iter_mut().for_each(|v| *v -= half_max);
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mnist-mlp-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_digit(dir: &Path, file_name: &str) -> PathBuf {
        let mut img = RgbImage::from_pixel(3, 2, Rgb([255, 255, 255]));
        img.put_pixel(1, 0, Rgb([0, 0, 0]));
        img.put_pixel(2, 1, Rgb([128, 128, 128]));
        let path = dir.join(file_name);
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn decodes_ink_and_label() {
        let dir = scratch_dir("decode");
        let path = write_digit(&dir, "4_sample.png");

        let img = read_image(&path, false, false).unwrap();
        assert_eq!((img.width, img.height), (3, 2));
        assert_eq!(img.file_name, "4_sample.png");
        assert_eq!(img.sample.label, 4);
        assert_eq!(img.sample.expected[4], 1.0);
        assert_eq!(img.sample.expected.len(), DIGIT_CLASSES);

        let v = &img.sample.values;
        assert_eq!(v.len(), 6);
        // White is ~0 (the weighted sum may truncate one step below 255), black is exactly 1.
        assert!(v[0] >= 0.0 && v[0] <= 1.0 / 255.0 + 1e-12);
        assert_eq!(v[1], 1.0);
        assert!((v[5] - (1.0 - 128.0 / 255.0)).abs() <= 1.0 / 255.0 + 1e-12);
    }

    #[test]
    fn encoder_mode_targets_the_input_and_normalize_shifts_by_half_max() {
        let dir = scratch_dir("encoder");
        let path = write_digit(&dir, "2_a.png");

        let img = read_image(&path, true, true).unwrap();
        assert_eq!(img.sample.expected, img.sample.values);
        assert_eq!(img.sample.values[1], 0.5);
        assert!((img.sample.values[0] + 0.5).abs() <= 1.0 / 255.0 + 1e-12);
    }

    #[test]
    fn read_all_sorts_and_skips_other_files() {
        let dir = scratch_dir("all");
        write_digit(&dir, "9_b.png");
        write_digit(&dir, "1_a.png");
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let images = read_all(&dir, false, false).unwrap();
        let labels: Vec<_> = images.iter().map(|i| i.sample.label).collect();
        assert_eq!(labels, vec![1, 9]);
    }

    #[test]
    fn unlabeled_file_name_is_a_dataset_error() {
        let dir = scratch_dir("unlabeled");
        let path = write_digit(&dir, "x.png");
        assert!(matches!(read_image(&path, false, false), Err(Error::Dataset(_))));
    }
}
