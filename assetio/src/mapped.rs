//! In-memory views over an asset's bytes.
//!
//! A [`MapIo`] stands in for handle-based reads once the full contents of an
//! asset are addressable in memory, either as a read-only file mapping or as
//! a buffer the provider already holds.
use std::ops::Deref;
use std::sync::Arc;

use memmap2::Mmap;

use crate::types::{Advice, SeekMode};
use crate::util::seek_target;

/// Bytes backing a mapped view.
#[derive(Debug, Clone)]
pub enum MappedBytes {
    Mapped(Arc<Mmap>),
    Owned(Arc<[u8]>),
}

impl MappedBytes {
    pub fn empty() -> MappedBytes {
        MappedBytes::Owned(Arc::from(Vec::new()))
    }

    /// Forwards `advice` for `len` bytes at `offset` to the kernel.
    ///
    /// Only real mappings are advised; owned buffers are ignored.
    pub fn advise_range(&self, advice: Advice, offset: usize, len: usize) -> std::io::Result<()> {
        match self {
            MappedBytes::Mapped(mmap) => advise_mmap(mmap, advice, offset, len),
            MappedBytes::Owned(_) => Ok(()),
        }
    }
}

#[cfg(unix)]
fn advise_mmap(mmap: &Mmap, advice: Advice, offset: usize, len: usize) -> std::io::Result<()> {
    use memmap2::{Advice as MAdvice, UncheckedAdvice};

    let advice = match advice {
        Advice::Normal => MAdvice::Normal,
        Advice::Sequential => MAdvice::Sequential,
        Advice::Random => MAdvice::Random,
        Advice::WillNeed => MAdvice::WillNeed,
        Advice::DontNeed => {
            // SAFETY: the mapping is read-only and file backed, dropped pages
            // are faulted back in from the file unchanged.
            return unsafe { mmap.unchecked_advise_range(UncheckedAdvice::DontNeed, offset, len) };
        }
    };
    mmap.advise_range(advice, offset, len)
}

#[cfg(not(unix))]
fn advise_mmap(_mmap: &Mmap, _advice: Advice, _offset: usize, _len: usize) -> std::io::Result<()> {
    Ok(())
}

impl Deref for MappedBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            MappedBytes::Mapped(mmap) => &mmap[..],
            MappedBytes::Owned(buf) => &buf[..],
        }
    }
}

impl From<Vec<u8>> for MappedBytes {
    fn from(buf: Vec<u8>) -> MappedBytes {
        MappedBytes::Owned(Arc::from(buf))
    }
}

/// A readable cursor over [`MappedBytes`].
#[derive(Debug)]
pub struct MapIo {
    bytes: MappedBytes,
    pos: usize,
}

impl MapIo {
    /// Creates a view positioned at `pos`, clamped to the mapped length.
    pub fn new(bytes: MappedBytes, pos: u64) -> MapIo {
        let pos = std::cmp::min(pos, bytes.len() as u64) as usize;
        MapIo { bytes, pos }
    }

    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let src = &self.bytes[self.pos..];
        let n = std::cmp::min(src.len(), buf.len());
        buf[..n].copy_from_slice(&src[..n]);
        self.pos += n;
        n
    }

    pub fn seek(&mut self, offset: i64, mode: SeekMode) -> std::io::Result<u64> {
        let target = seek_target(self.pos as u64, self.size(), offset, mode)?;
        self.pos = target as usize;
        Ok(target)
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Advises the kernel about `len` bytes at `offset`; `len == 0` covers
    /// everything from `offset` to the end.
    pub fn advise(&self, offset: u64, len: u64, advice: Advice) -> std::io::Result<()> {
        let size = self.size();
        let offset = std::cmp::min(offset, size);
        let avail = size - offset;
        let len = if len == 0 { avail } else { std::cmp::min(len, avail) };
        if len == 0 {
            return Ok(());
        }
        self.bytes.advise_range(advice, offset as usize, len as usize)
    }
}
