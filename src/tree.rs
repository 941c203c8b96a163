use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::document::SOURCE_EXTENSION;

// -----
// The tree datastructure
// -----

/// the source directory as it should be processed
///
/// markdown files become pages, everything else in the tree is an asset that
/// gets copied next to them
#[derive(Debug, Default)]
pub struct Dir {
    pub path: PathBuf,
    pub pages: Vec<PathBuf>,
    pub assets: Vec<PathBuf>,
    pub dirs: Vec<Dir>,
}

impl Dir {
    /// read a directory recursively, skipping hidden and excluded names
    ///
    /// entries are sorted by file name
    pub fn load<T: AsRef<Path>>(path: T, exclude: &[String]) -> std::io::Result<Self> {
        let path = path.as_ref();
        let mut entries = path
            .read_dir()?
            .map(|e| e.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        let mut dir = Dir {
            path: path.into(),
            ..Default::default()
        };
        for entry in entries {
            let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
                log::warn!("Skipping `{}`, not valid utf-8", entry.display());
                continue;
            };
            if name.starts_with('.') || exclude.iter().any(|e| e == name) {
                continue;
            }
            if entry.is_dir() {
                dir.dirs.push(Dir::load(&entry, exclude)?);
            } else if entry.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
                dir.pages.push(entry);
            } else {
                dir.assets.push(entry);
            }
        }
        Ok(dir)
    }

    pub fn pages(&self) -> impl Iterator<Item = &Path> {
        self.pages.iter().map(PathBuf::as_path)
    }

    pub fn assets(&self) -> impl Iterator<Item = &Path> {
        self.assets.iter().map(PathBuf::as_path)
    }

    pub fn dirs(&self) -> impl Iterator<Item = &Dir> {
        self.dirs.iter()
    }

    /// number of pages in this directory and below
    pub fn page_count(&self) -> usize {
        self.pages.len() + self.dirs().map(Dir::page_count).sum::<usize>()
    }
}

/// copy a single file, creating the destination's directories
pub fn copy_file(from: impl AsRef<Path>, to: impl AsRef<Path>) -> std::io::Result<()> {
    if let Some(parent) = to.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to)?;
    Ok(())
}
