use ::zip::{CompressionMethod, ZipArchive};
use hashbrown::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::entry::{DeflatedEntry, StoredEntry};
use crate::config::ProviderConfig;
use crate::error::AssetError;
use crate::mapped::MappedBytes;
use crate::types::{OpenMode, SeekMode};
use crate::vfs::{AssetHandle, AssetProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Stored,
    Deflated,
    Unsupported,
}

#[derive(Debug, Clone, Copy)]
struct EntryInfo {
    data_start: u64,
    compressed_size: u64,
    size: u64,
    method: Method,
}

/// Assets packed in a zip container such as an APK.
pub struct ZipAssets {
    path: PathBuf,
    config: ProviderConfig,
    entries: HashMap<String, EntryInfo>,
}

impl ZipAssets {
    /// Indexes the entries of the package at `path` below the configured
    /// asset prefix.
    pub fn open<P: AsRef<Path>>(path: P, config: ProviderConfig) -> Result<ZipAssets, AssetError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(AssetError::Package)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let mut entries = HashMap::new();
        for i in 0..archive.len() {
            let index = archive.by_index_raw(i)?;
            if index.is_dir() {
                continue;
            }

            let name = match index.name().strip_prefix(config.asset_prefix.as_str()) {
                Some(v) if !v.is_empty() => v.to_string(),
                _ => continue,
            };

            let method = match index.compression() {
                CompressionMethod::Stored => Method::Stored,
                CompressionMethod::Deflated => Method::Deflated,
                _ => Method::Unsupported,
            };

            entries.insert(
                name,
                EntryInfo {
                    data_start: index.data_start(),
                    compressed_size: index.compressed_size(),
                    size: index.size(),
                    method,
                },
            );
        }

        log::debug!("indexed {} assets in {}", entries.len(), path.display());

        Ok(ZipAssets {
            path,
            config,
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AssetProvider for ZipAssets {
    type Handle = ZipAssetHandle;

    fn open(&self, name: &str, mode: OpenMode) -> Result<ZipAssetHandle, AssetError> {
        let info = self
            .entries
            .get(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))?;

        match info.method {
            Method::Stored => {
                let file = File::open(&self.path).map_err(|e| AssetError::Open(name.to_string(), e))?;
                Ok(ZipAssetHandle::Stored(StoredEntry::new(
                    file,
                    info.data_start,
                    info.size,
                    mode,
                    self.config.allow_mmap,
                )))
            }
            Method::Deflated => DeflatedEntry::new(
                &self.path,
                info.data_start,
                info.compressed_size,
                info.size,
                mode,
            )
            .map(ZipAssetHandle::Deflated)
            .map_err(|e| AssetError::Open(name.to_string(), e)),
            Method::Unsupported => Err(AssetError::UnsupportedCompression(name.to_string())),
        }
    }

    fn list(&self) -> Result<Vec<String>, AssetError> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[derive(Debug)]
pub enum ZipAssetHandle {
    Stored(StoredEntry),
    Deflated(DeflatedEntry),
}

impl AssetHandle for ZipAssetHandle {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            ZipAssetHandle::Stored(h) => h.read(buf),
            ZipAssetHandle::Deflated(h) => h.read(buf),
        }
    }

    fn seek(&mut self, offset: i64, mode: SeekMode) -> std::io::Result<u64> {
        match self {
            ZipAssetHandle::Stored(h) => h.seek(offset, mode),
            ZipAssetHandle::Deflated(h) => h.seek(offset, mode),
        }
    }

    fn len(&self) -> u64 {
        match self {
            ZipAssetHandle::Stored(h) => h.len(),
            ZipAssetHandle::Deflated(h) => h.len(),
        }
    }

    fn remaining(&self) -> u64 {
        match self {
            ZipAssetHandle::Stored(h) => h.remaining(),
            ZipAssetHandle::Deflated(h) => h.remaining(),
        }
    }

    fn buffer(&mut self) -> Option<MappedBytes> {
        match self {
            ZipAssetHandle::Stored(h) => h.buffer(),
            ZipAssetHandle::Deflated(h) => h.buffer(),
        }
    }

    fn is_allocated(&self) -> bool {
        match self {
            ZipAssetHandle::Stored(h) => h.is_allocated(),
            ZipAssetHandle::Deflated(h) => h.is_allocated(),
        }
    }
}
