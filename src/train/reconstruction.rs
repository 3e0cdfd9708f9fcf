use std::path::{Path, PathBuf};

use crate::data::viewer;
use crate::error::Result;

/// Directory receiving PNG snapshots of one training sample while an autoencoder trains:
/// `_original.png` once, then `<epoch>.png` with the network's reconstruction after every
/// verbose epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionLog {
    pub dir: PathBuf,
    /// Image width in pixels; the square root of the vector length when `None`.
    pub width: Option<usize>,
}

impl ReconstructionLog {
    pub fn new<P: AsRef<Path>>(dir: P) -> ReconstructionLog {
        ReconstructionLog {
            dir: dir.as_ref().to_path_buf(),
            width: None,
        }
    }

    pub fn with_width(mut self, width: usize) -> ReconstructionLog {
        self.width = Some(width);
        self
    }

    pub fn original_path(&self) -> PathBuf {
        self.dir.join("_original.png")
    }

    pub fn epoch_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("{epoch}.png"))
    }

    pub fn write_original(&self, values: &[f64]) -> Result<()> {
        self.write(&self.original_path(), values)
    }

    pub fn write_epoch(&self, epoch: usize, values: &[f64]) -> Result<()> {
        self.write(&self.epoch_path(epoch), values)
    }

    fn write(&self, path: &Path, values: &[f64]) -> Result<()> {
        let width = self
            .width
            .unwrap_or_else(|| (values.len() as f64).sqrt().round() as usize);
        let image = viewer::to_image(values, width)?;
        std::fs::create_dir_all(&self.dir)?;
        image.save(path)?;
        Ok(())
    }
}
