//! Text and image renderings of input vectors, reconstructions and learned features.

use image::{GrayImage, Luma};

use crate::data::mnist::MnistImage;
use crate::error::{Error, Result};

/// Coarse ASCII art: `@` for strong ink, `+` for faint ink, blank otherwise.
///
/// Empty for a zero `width`.
pub fn print(values: &[f64], width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let mut out = String::with_capacity(values.len() + values.len() / width);
    for (i, &v) in values.iter().enumerate() {
        out.push(if v > 0.75 {
            '@'
        } else if v > 0.2 {
            '+'
        } else {
            ' '
        });
        if (i + 1) % width == 0 {
            out.push('\n');
        }
    }
    out
}

/// Every value as `floor(v * 255)`, left-aligned in three columns and `|`-separated.
///
/// Empty for a zero `width`.
pub fn to_matrix(values: &[f64], width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    for (i, &v) in values.iter().enumerate() {
        out.push_str(&format!("{:<3}", (v * 255.0).floor()));
        out.push(if (i + 1) % width == 0 { '\n' } else { '|' });
    }
    out
}

/// ASCII art of an image followed by its file name, label and dimensions.
pub fn dump(image: &MnistImage) -> String {
    format!(
        "{}Filename - {}\nLabel - {}\nWidth - {}\nHeight - {}",
        print(&image.sample.values, image.width as usize),
        image.file_name,
        image.sample.label,
        image.width,
        image.height
    )
}

/// [`dump`] on its own line, followed by the numeric [`to_matrix`] when `with_matrix` is set.
pub fn describe(image: &MnistImage, with_matrix: bool) -> String {
    let mut out = dump(image);
    out.push('\n');
    if with_matrix {
        out.push_str(&to_matrix(&image.sample.values, image.width as usize));
    }
    out
}

/// Grayscale image of a vector laid out row-major `width` values per row. Values are clamped
/// to `[0, 1]` and scaled to `[0, 255]`.
pub fn to_image(values: &[f64], width: usize) -> Result<GrayImage> {
    if width == 0 || values.len() % width != 0 {
        return Err(Error::InvalidArgument(format!(
            "cannot lay out {} values in rows of {width}",
            values.len()
        )));
    }
    let height = values.len() / width;
    Ok(GrayImage::from_fn(width as u32, height as u32, |x, y| {
        let v = values[y as usize * width + x as usize];
        Luma([(v.clamp(0.0, 1.0) * 255.0) as u8])
    }))
}

/// Rescales a feature vector (unit-norm weights, possibly negative) to `[0, 1]` so it can be
/// rendered with [`to_image`].
pub fn rescale(values: &[f64]) -> Vec<f64> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if !(span > 0.0) {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) / span).collect()
}
