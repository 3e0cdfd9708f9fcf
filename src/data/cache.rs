use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::data::mnist;
use crate::data::sample::Sample;
use crate::error::Result;

/// Which split of the data a cached set plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetRole {
    Training,
    Validation,
    Test,
}

/// Everything that determines the decoded contents of a directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetKey {
    pub path: PathBuf,
    pub normalize: bool,
    pub encoder: bool,
}

impl DatasetKey {
    pub fn new<P: AsRef<Path>>(path: P, normalize: bool, encoder: bool) -> DatasetKey {
        DatasetKey {
            path: path.as_ref().to_path_buf(),
            normalize,
            encoder,
        }
    }
}

/// Holds at most one decoded dataset per role so repeated runs over the same directories
/// (e.g. an experiment sweep) decode each bitmap once.
///
/// A lookup whose key differs from the cached one for that role replaces the entry.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<DatasetRole, (DatasetKey, Vec<Sample>)>,
}

impl DatasetCache {
    pub fn new() -> DatasetCache {
        DatasetCache::default()
    }

    /// Returns the cached samples for `role`, decoding `key.path` when the cache is empty or
    /// was filled under another key.
    pub fn get_or_load(&mut self, role: DatasetRole, key: &DatasetKey) -> Result<&[Sample]> {
        self.load(role, key)?;
        Ok(self.samples(role))
    }

    /// Makes sure `role` holds the bitmaps under `key`, decoding them if needed.
    pub fn load(&mut self, role: DatasetRole, key: &DatasetKey) -> Result<()> {
        self.load_with(role, key, |k| mnist::read_samples(&k.path, k.normalize, k.encoder))
    }

    /// Same as [`load`](Self::load) with a custom loader.
    pub fn load_with<F>(&mut self, role: DatasetRole, key: &DatasetKey, load: F) -> Result<()>
    where
        F: FnOnce(&DatasetKey) -> Result<Vec<Sample>>,
    {
        if !self.contains(role, key) {
            debug!(?role, path = %key.path.display(), "loading dataset");
            let samples = load(key)?;
            self.entries.insert(role, (key.clone(), samples));
        }
        Ok(())
    }

    /// The samples currently cached for `role`; empty when nothing is loaded.
    pub fn samples(&self, role: DatasetRole) -> &[Sample] {
        self.entries.get(&role).map_or(&[], |(_, samples)| samples.as_slice())
    }

    pub fn contains(&self, role: DatasetRole, key: &DatasetKey) -> bool {
        self.entries.get(&role).map_or(false, |(cached, _)| cached == key)
    }

    pub fn invalidate(&mut self, role: DatasetRole) {
        self.entries.remove(&role);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
