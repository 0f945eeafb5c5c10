use std::fs::File;
use std::io::{Error, ErrorKind, Read, Result, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use memmap2::MmapOptions;

use crate::asset::Asset;
use crate::config::ProviderConfig;
use crate::error::AssetError;
use crate::mapped::MappedBytes;
use crate::types::{AccessHint, OpenMode, SeekMode};
use crate::util::seek_target;

/// Source of named, read-only assets.
pub trait AssetProvider {
    type Handle: AssetHandle;

    fn open(&self, name: &str, mode: OpenMode) -> std::result::Result<Self::Handle, AssetError>;

    /// Names of every asset that [`AssetProvider::open`] accepts, sorted.
    fn list(&self) -> std::result::Result<Vec<String>, AssetError>;

    fn open_asset(
        &self,
        name: &str,
        hint: AccessHint,
    ) -> std::result::Result<Asset<Self::Handle>, AssetError>
    where
        Self: Sized,
    {
        let mut asset = Asset::new();
        asset.open(self, name, hint)?;
        Ok(asset)
    }
}

/// An open asset as seen by its provider. Dropping the handle closes it.
pub trait AssetHandle {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
    fn seek(&mut self, offset: i64, mode: SeekMode) -> Result<u64>;
    fn len(&self) -> u64;
    fn remaining(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The complete contents in memory, if the handle can provide them.
    fn buffer(&mut self) -> Option<MappedBytes>;

    /// Whether the contents already live in process memory.
    fn is_allocated(&self) -> bool;
}

/// Assets stored as plain files below a root directory.
pub struct Fs {
    root: PathBuf,
    config: ProviderConfig,
}

impl Fs {
    pub fn new<P: AsRef<Path>>(root: P, config: ProviderConfig) -> Fs {
        Fs {
            root: root.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn relative_name(name: &str) -> std::result::Result<&Path, AssetError> {
    let path = Path::new(name);
    let is_plain = path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

    if name.is_empty() || !is_plain {
        return Err(AssetError::InvalidArgument(Error::new(
            ErrorKind::InvalidInput,
            format!("invalid asset name '{}'", name),
        )));
    }

    Ok(path)
}

impl AssetProvider for Fs {
    type Handle = FileHandle;

    fn open(&self, name: &str, mode: OpenMode) -> std::result::Result<FileHandle, AssetError> {
        let path = self.root.join(relative_name(name)?);
        let file = File::open(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AssetError::NotFound(name.to_string()),
            _ => AssetError::Open(name.to_string(), e),
        })?;
        let meta = file
            .metadata()
            .map_err(|e| AssetError::Open(name.to_string(), e))?;

        if !meta.is_file() {
            return Err(AssetError::NotFound(name.to_string()));
        }

        Ok(FileHandle {
            file,
            len: meta.len(),
            pos: 0,
            mode,
            allow_mmap: self.config.allow_mmap,
        })
    }

    fn list(&self) -> std::result::Result<Vec<String>, AssetError> {
        let mut names = vec![];

        for entry in walkdir::WalkDir::new(&self.root) {
            let entry = entry.map_err(|e| AssetError::Package(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let rel = match entry.path().strip_prefix(&self.root) {
                Ok(v) => v,
                Err(_) => continue,
            };
            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            names.push(name);
        }

        names.sort();
        Ok(names)
    }
}

#[derive(Debug)]
pub struct FileHandle {
    file: File,
    len: u64,
    pos: u64,
    mode: OpenMode,
    allow_mmap: bool,
}

impl AssetHandle for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let max = std::cmp::min(buf.len() as u64, self.remaining()) as usize;
        if max == 0 {
            return Ok(0);
        }
        let n = match self.file.read(&mut buf[..max])? {
            0 => return Err(Error::new(ErrorKind::UnexpectedEof, "file shrank after open")),
            n => n,
        };
        self.pos += n as u64;
        Ok(n)
    }

    fn seek(&mut self, offset: i64, mode: SeekMode) -> Result<u64> {
        let target = seek_target(self.pos, self.len, offset, mode)?;
        self.file.seek(SeekFrom::Start(target))?;
        self.pos = target;
        Ok(target)
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn remaining(&self) -> u64 {
        self.len - self.pos
    }

    fn buffer(&mut self) -> Option<MappedBytes> {
        if !self.mode.allows_buffer() || !self.allow_mmap {
            return None;
        }
        if self.len == 0 {
            return Some(MappedBytes::empty());
        }

        // SAFETY: assets are read-only; the file is not expected to be
        // truncated while it is mapped.
        match unsafe { MmapOptions::new().len(self.len as usize).map(&self.file) } {
            Ok(mmap) => Some(MappedBytes::Mapped(Arc::new(mmap))),
            Err(e) => {
                log::debug!("mmap failed: {}", e);
                None
            }
        }
    }

    fn is_allocated(&self) -> bool {
        false
    }
}
