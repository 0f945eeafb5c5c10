use std::fs::File;
use std::io::{self, Error, ErrorKind, Read, Result, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::read::DeflateDecoder;
use memmap2::MmapOptions;

use crate::mapped::MappedBytes;
use crate::types::{OpenMode, SeekMode};
use crate::util::seek_target;
use crate::vfs::AssetHandle;

/// An uncompressed entry, read in place from the package file.
#[derive(Debug)]
pub struct StoredEntry {
    file: File,
    start: u64,
    len: u64,
    pos: u64,
    mode: OpenMode,
    allow_mmap: bool,
}

impl StoredEntry {
    pub(crate) fn new(file: File, start: u64, len: u64, mode: OpenMode, allow_mmap: bool) -> StoredEntry {
        StoredEntry {
            file,
            start,
            len,
            pos: 0,
            mode,
            allow_mmap,
        }
    }

    #[cfg(unix)]
    #[inline(always)]
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> Result<usize> {
        std::os::unix::fs::FileExt::read_at(&self.file, buf, offset)
    }

    #[cfg(not(unix))]
    #[inline(always)]
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> Result<usize> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read(buf)
    }
}

impl AssetHandle for StoredEntry {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let max = std::cmp::min(buf.len() as u64, self.remaining()) as usize;
        if max == 0 {
            return Ok(0);
        }
        let n = match self.read_at(&mut buf[..max], self.start + self.pos)? {
            0 => return Err(Error::new(ErrorKind::UnexpectedEof, "package ended inside entry")),
            n => n,
        };
        self.pos += n as u64;
        Ok(n)
    }

    fn seek(&mut self, offset: i64, mode: SeekMode) -> Result<u64> {
        self.pos = seek_target(self.pos, self.len, offset, mode)?;
        Ok(self.pos)
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

        // SAFETY: the package is opened read-only and never modified while
        // assets are mapped.
        let mmap = unsafe {
            MmapOptions::new()
                .offset(self.start)
                .len(self.len as usize)
                .map(&self.file)
        };

        match mmap {
            Ok(v) => Some(MappedBytes::Mapped(Arc::new(v))),
            Err(e) => {
                log::debug!("mmap of stored entry failed: {}", e);
                None
            }
        }
    }

    fn is_allocated(&self) -> bool {
        false
    }
}

type Decoder = DeflateDecoder<io::Take<File>>;

fn open_decoder(path: &Path, start: u64, compressed_len: u64) -> Result<Decoder> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(start))?;
    Ok(DeflateDecoder::new(file.take(compressed_len)))
}

fn truncated() -> Error {
    Error::new(ErrorKind::UnexpectedEof, "deflate stream ended early")
}

/// Discards `n` bytes from `reader`. `pos` advances by every byte consumed,
/// including those read before an error.
fn skip<R: Read>(reader: &mut R, n: u64, pos: &mut u64) -> Result<()> {
    let mut scratch = [0u8; 8192];
    let mut left = n;

    while left > 0 {
        let want = std::cmp::min(left, scratch.len() as u64) as usize;
        match reader.read(&mut scratch[..want]) {
            Ok(0) => return Err(truncated()),
            Ok(k) => {
                *pos += k as u64;
                left -= k as u64;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

/// A deflated entry. Streams through a decoder until the whole entry is
/// requested in memory, then serves reads from the inflated copy.
pub struct DeflatedEntry {
    path: PathBuf,
    start: u64,
    compressed_len: u64,
    len: u64,
    pos: u64,
    mode: OpenMode,
    decoder: Decoder,
    inflated: Option<Arc<[u8]>>,
}

impl std::fmt::Debug for DeflatedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeflatedEntry")
            .field("path", &self.path)
            .field("start", &self.start)
            .field("compressed_len", &self.compressed_len)
            .field("len", &self.len)
            .field("pos", &self.pos)
            .field("inflated", &self.inflated.is_some())
            .finish()
    }
}

impl DeflatedEntry {
    pub(crate) fn new(
        path: &Path,
        start: u64,
        compressed_len: u64,
        len: u64,
        mode: OpenMode,
    ) -> Result<DeflatedEntry> {
        Ok(DeflatedEntry {
            path: path.to_path_buf(),
            start,
            compressed_len,
            len,
            pos: 0,
            mode,
            decoder: open_decoder(path, start, compressed_len)?,
            inflated: None,
        })
    }

    fn inflate(&self) -> Result<Arc<[u8]>> {
        let mut decoder = open_decoder(&self.path, self.start, self.compressed_len)?;
        let mut out = Vec::with_capacity(self.len as usize);
        decoder.read_to_end(&mut out)?;

        if out.len() as u64 != self.len {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("inflated {} bytes, expected {}", out.len(), self.len),
            ));
        }

        Ok(Arc::from(out))
    }
}

impl AssetHandle for DeflatedEntry {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let max = std::cmp::min(buf.len() as u64, self.remaining()) as usize;
        if max == 0 {
            return Ok(0);
        }

        let n = match &self.inflated {
            Some(data) => {
                let start = self.pos as usize;
                buf[..max].copy_from_slice(&data[start..start + max]);
                max
            }
            None => match self.decoder.read(&mut buf[..max])? {
                0 => return Err(truncated()),
                n => n,
            },
        };

        self.pos += n as u64;
        Ok(n)
    }

    fn seek(&mut self, offset: i64, mode: SeekMode) -> Result<u64> {
        let target = seek_target(self.pos, self.len, offset, mode)?;

        if self.inflated.is_none() {
            if target < self.pos {
                self.decoder = open_decoder(&self.path, self.start, self.compressed_len)?;
                self.pos = 0;
            }

            skip(&mut self.decoder, target - self.pos, &mut self.pos)?;
        }

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
        if !self.mode.allows_buffer() {
            return None;
        }

        if self.inflated.is_none() {
            match self.inflate() {
                Ok(v) => self.inflated = Some(v),
                Err(e) => {
                    log::debug!("inflating {} bytes failed: {}", self.len, e);
                    return None;
                }
            }
        }

        self.inflated.clone().map(MappedBytes::Owned)
    }

    fn is_allocated(&self) -> bool {
        self.inflated.is_some()
    }
}
