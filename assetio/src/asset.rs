//! The dual-mode readable asset.
//!
//! An [`Asset`] reads through its provider handle until the handle can hand
//! over the complete contents in memory. From then on a [`MapIo`] serves
//! every read, seek and size query until the asset is closed.
use std::io::{Read, Seek, SeekFrom};

use crate::error::AssetError;
use crate::mapped::MapIo;
use crate::types::{AccessHint, Advice, SeekMode};
use crate::vfs::{AssetHandle, AssetProvider};

#[derive(Debug)]
pub struct Asset<H: AssetHandle> {
    // Dropped in this order by `close`.
    map_io: Option<MapIo>,
    handle: Option<H>,
    map_failed: bool,
}

impl<H: AssetHandle> Default for Asset<H> {
    fn default() -> Self {
        Asset::new()
    }
}

impl<H: AssetHandle> Asset<H> {
    /// An empty asset. Use [`Asset::open`] or [`AssetProvider::open_asset`].
    pub fn new() -> Asset<H> {
        Asset {
            map_io: None,
            handle: None,
            map_failed: false,
        }
    }

    /// Opens `name` from `provider`, closing whatever this asset held.
    ///
    /// On failure the asset is left empty and may be opened again.
    pub fn open<P>(&mut self, provider: &P, name: &str, hint: AccessHint) -> Result<(), AssetError>
    where
        P: AssetProvider<Handle = H>,
    {
        self.close();

        log::debug!("opening asset {}", name);
        let handle = provider.open(name, hint.open_mode()).map_err(|e| {
            log::error!("error opening asset {}: {}", name, e);
            e
        })?;
        self.handle = Some(handle);

        if let Some(advice) = hint.advice() {
            self.advise(0, 0, advice);
        }

        Ok(())
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, AssetError> {
        if let Some(map_io) = self.map_io.as_mut() {
            return Ok(map_io.read(buf));
        }

        let handle = self.handle.as_mut().ok_or(AssetError::NotOpen)?;
        handle.read(buf).map_err(AssetError::Io)
    }

    pub fn seek(&mut self, offset: i64, mode: SeekMode) -> Result<u64, AssetError> {
        if let Some(map_io) = self.map_io.as_mut() {
            return map_io
                .seek(offset, mode)
                .map_err(AssetError::InvalidArgument);
        }

        let handle = self.handle.as_mut().ok_or(AssetError::NotOpen)?;
        handle
            .seek(offset, mode)
            .map_err(AssetError::InvalidArgument)
    }

    /// Length in bytes; `0` when nothing is open.
    pub fn size(&self) -> u64 {
        match (&self.map_io, &self.handle) {
            (Some(map_io), _) => map_io.size(),
            (None, Some(handle)) => handle.len(),
            (None, None) => 0,
        }
    }

    pub fn eof(&self) -> bool {
        match (&self.map_io, &self.handle) {
            (Some(map_io), _) => map_io.eof(),
            (None, Some(handle)) => handle.remaining() == 0,
            (None, None) => true,
        }
    }

    pub fn position(&self) -> u64 {
        match (&self.map_io, &self.handle) {
            (Some(map_io), _) => map_io.position(),
            (None, Some(handle)) => handle.len() - handle.remaining(),
            (None, None) => 0,
        }
    }

    /// Hints how `len` bytes at `offset` will be accessed; `len == 0` means
    /// up to the end. Maps the asset if possible. Never fails.
    pub fn advise(&mut self, offset: u64, len: u64, advice: Advice) {
        if !self.ensure_mapped() {
            return;
        }
        if self.handle.as_ref().map_or(true, |h| h.is_allocated()) {
            return;
        }

        if let Some(map_io) = &self.map_io {
            if let Err(e) = map_io.advise(offset, len, advice) {
                log::trace!("ignoring failed {:?} advice: {}", advice, e);
            }
        }
    }

    /// The whole contents, mapping the asset first if needed.
    pub fn as_bytes(&mut self) -> Option<&[u8]> {
        if !self.ensure_mapped() {
            return None;
        }
        self.map_io.as_ref().map(MapIo::as_slice)
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_mapped(&self) -> bool {
        self.map_io.is_some()
    }

    /// Allows another mapping attempt after an earlier one failed.
    pub fn retry_mapping(&mut self) {
        self.map_failed = false;
    }

    pub fn close(&mut self) {
        self.map_io = None;
        self.map_failed = false;
        if let Some(handle) = self.handle.take() {
            log::debug!("closing asset ({} bytes)", handle.len());
            drop(handle);
        }
    }

    fn ensure_mapped(&mut self) -> bool {
        if self.map_io.is_some() {
            return true;
        }
        if self.map_failed {
            return false;
        }

        let handle = match self.handle.as_mut() {
            Some(v) => v,
            None => return false,
        };

        let bytes = match handle.buffer() {
            Some(v) => v,
            None => {
                self.map_failed = true;
                return false;
            }
        };

        if bytes.len() as u64 != handle.len() {
            log::warn!(
                "buffer length {} does not match asset length {}",
                bytes.len(),
                handle.len()
            );
            self.map_failed = true;
            return false;
        }

        let pos = handle.len() - handle.remaining();
        self.map_io = Some(MapIo::new(bytes, pos));
        log::debug!("mapped into memory");
        true
    }
}

impl<H: AssetHandle> Drop for Asset<H> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<H: AssetHandle> Read for Asset<H> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        Asset::read(self, buf).map_err(AssetError::into_io_error)
    }
}

impl<H: AssetHandle> Seek for Asset<H> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let (offset, mode) = SeekMode::split(pos)?;
        Asset::seek(self, offset, mode).map_err(AssetError::into_io_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapped::MappedBytes;
    use crate::types::OpenMode;
    use std::cell::RefCell;
    use std::io::{Error, ErrorKind};
    use std::rc::Rc;

    type Calls = Rc<RefCell<Vec<&'static str>>>;

    #[derive(Default)]
    struct MockProvider {
        data: Vec<u8>,
        mappable: bool,
        allocated: bool,
        fail_reads: bool,
        calls: Calls,
    }

    struct MockHandle {
        data: Vec<u8>,
        pos: u64,
        mode: OpenMode,
        mappable: bool,
        allocated: bool,
        fail_reads: bool,
        calls: Calls,
    }

    impl MockProvider {
        fn new(data: &[u8]) -> MockProvider {
            MockProvider {
                data: data.to_vec(),
                mappable: true,
                ..MockProvider::default()
            }
        }

        fn count(&self, call: &str) -> usize {
            self.calls.borrow().iter().filter(|c| **c == call).count()
        }
    }

    impl AssetProvider for MockProvider {
        type Handle = MockHandle;

        fn open(&self, name: &str, mode: OpenMode) -> Result<MockHandle, AssetError> {
            self.calls.borrow_mut().push("open");
            if name != "data.bin" {
                return Err(AssetError::NotFound(name.to_string()));
            }
            Ok(MockHandle {
                data: self.data.clone(),
                pos: 0,
                mode,
                mappable: self.mappable,
                allocated: self.allocated,
                fail_reads: self.fail_reads,
                calls: self.calls.clone(),
            })
        }

        fn list(&self) -> Result<Vec<String>, AssetError> {
            Ok(vec!["data.bin".into()])
        }
    }

    impl AssetHandle for MockHandle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.calls.borrow_mut().push("read");
            if self.fail_reads {
                return Err(Error::new(ErrorKind::Other, "device error"));
            }
            let src = &self.data[self.pos as usize..];
            let n = std::cmp::min(src.len(), buf.len());
            buf[..n].copy_from_slice(&src[..n]);
            self.pos += n as u64;
            Ok(n)
        }

        fn seek(&mut self, offset: i64, mode: SeekMode) -> std::io::Result<u64> {
            self.calls.borrow_mut().push("seek");
            self.pos = crate::util::seek_target(self.pos, self.len(), offset, mode)?;
            Ok(self.pos)
        }

        fn len(&self) -> u64 {
            self.data.len() as u64
        }

        fn remaining(&self) -> u64 {
            self.len() - self.pos
        }

        fn buffer(&mut self) -> Option<MappedBytes> {
            self.calls.borrow_mut().push("buffer");
            if self.mappable && self.mode.allows_buffer() {
                Some(MappedBytes::from(self.data.clone()))
            } else {
                None
            }
        }

        fn is_allocated(&self) -> bool {
            self.allocated
        }
    }

    const DATA: &[u8] = b"The quick brown fox jumps over the lazy dog";

    fn read_all(asset: &mut Asset<MockHandle>, chunk: usize) -> Vec<u8> {
        let mut out = vec![];
        let mut buf = vec![0u8; chunk];
        loop {
            let n = asset.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        out
    }

    #[test]
    fn open_close_is_idempotent() {
        let provider = MockProvider::new(DATA);
        let mut asset = provider.open_asset("data.bin", AccessHint::Unspecified).unwrap();
        assert!(asset.is_open());

        asset.close();
        assert!(!asset.is_open());
        assert!(!asset.is_mapped());
        asset.close();
        assert!(!asset.is_open());
        assert_eq!(asset.size(), 0);
        assert!(asset.eof());
    }

    #[test]
    fn failed_open_leaves_asset_empty() {
        let provider = MockProvider::new(DATA);
        let mut asset = provider.open_asset("data.bin", AccessHint::Unspecified).unwrap();

        let err = asset
            .open(&provider, "missing.bin", AccessHint::Unspecified)
            .unwrap_err();
        assert!(matches!(err, AssetError::NotFound(_)));
        assert!(!asset.is_open());
        assert!(matches!(asset.read(&mut [0u8; 1]), Err(AssetError::NotOpen)));

        asset
            .open(&provider, "data.bin", AccessHint::Unspecified)
            .unwrap();
        assert!(asset.is_open());
        assert_eq!(asset.size(), DATA.len() as u64);
    }

    #[test]
    fn size_is_stable_across_seeks() {
        for hint in [AccessHint::Unspecified, AccessHint::All] {
            let provider = MockProvider::new(DATA);
            let mut asset = provider.open_asset("data.bin", hint).unwrap();
            let size = asset.size();

            assert_eq!(asset.seek(0, SeekMode::FromEnd).unwrap(), size);
            assert_eq!(asset.size(), size);
            assert_eq!(asset.seek(0, SeekMode::FromStart).unwrap(), 0);
            assert_eq!(asset.size(), size);
        }
    }

    #[test]
    fn seek_back_rereads_same_bytes() {
        for hint in [AccessHint::Unspecified, AccessHint::All] {
            let provider = MockProvider::new(DATA);
            let mut asset = provider.open_asset("data.bin", hint).unwrap();
            asset.seek(4, SeekMode::FromStart).unwrap();

            let mut first = [0u8; 5];
            assert_eq!(asset.read(&mut first).unwrap(), 5);
            assert_eq!(asset.seek(-5, SeekMode::FromCurrent).unwrap(), 4);
            assert_eq!(asset.position(), 4);

            let mut second = [0u8; 5];
            assert_eq!(asset.read(&mut second).unwrap(), 5);
            assert_eq!(first, second);
            assert_eq!(&first, b"quick");
        }
    }

    #[test]
    fn eof_and_reads_match_on_both_backings() {
        let provider = MockProvider::new(DATA);

        let mut handle_backed = provider.open_asset("data.bin", AccessHint::Unspecified).unwrap();
        let mut mapped = provider.open_asset("data.bin", AccessHint::All).unwrap();
        assert!(!handle_backed.is_mapped());
        assert!(mapped.is_mapped());

        for asset in [&mut handle_backed, &mut mapped] {
            assert!(!asset.eof());
            asset.seek(-1, SeekMode::FromEnd).unwrap();
            assert!(!asset.eof());
            asset.seek(0, SeekMode::FromEnd).unwrap();
            assert!(asset.eof());
            asset.seek(0, SeekMode::FromStart).unwrap();
        }

        assert_eq!(read_all(&mut handle_backed, 7), DATA);
        assert_eq!(read_all(&mut mapped, 7), DATA);
        assert!(handle_backed.eof());
        assert!(mapped.eof());
    }

    #[test]
    fn promotion_is_transparent() {
        let provider = MockProvider::new(DATA);

        let mut plain = provider.open_asset("data.bin", AccessHint::Unspecified).unwrap();
        let mut promoted = provider.open_asset("data.bin", AccessHint::Unspecified).unwrap();

        let mut a = [0u8; 10];
        let mut b = [0u8; 10];
        plain.read(&mut a).unwrap();
        promoted.read(&mut b).unwrap();
        assert_eq!(a, b);

        promoted.advise(0, 0, Advice::Sequential);
        assert!(promoted.is_mapped());
        assert!(!plain.is_mapped());
        assert_eq!(promoted.position(), plain.position());

        plain.seek(-3, SeekMode::FromCurrent).unwrap();
        promoted.seek(-3, SeekMode::FromCurrent).unwrap();
        assert_eq!(read_all(&mut plain, 4), read_all(&mut promoted, 4));
        assert_eq!(plain.position(), promoted.position());
        assert_eq!(promoted.position(), DATA.len() as u64);
    }

    #[test]
    fn mapped_view_serves_reads_without_handle_calls() {
        let provider = MockProvider::new(DATA);
        let mut asset = provider.open_asset("data.bin", AccessHint::Random).unwrap();
        assert!(asset.is_mapped());

        asset.seek(10, SeekMode::FromStart).unwrap();
        asset.read(&mut [0u8; 8]).unwrap();
        assert_eq!(provider.count("read"), 0);
        assert_eq!(provider.count("seek"), 0);
    }

    #[test]
    fn invalid_whence_never_reaches_provider() {
        let provider = MockProvider::new(DATA);
        let mut asset = provider.open_asset("data.bin", AccessHint::Unspecified).unwrap();

        let res = SeekMode::from_whence(5).and_then(|mode| asset.seek(1, mode));
        assert!(matches!(res, Err(AssetError::InvalidArgument(_))));
        assert_eq!(provider.count("seek"), 0);
        assert_eq!(asset.position(), 0);
    }

    #[test]
    fn rejected_seek_is_invalid_argument() {
        for hint in [AccessHint::Unspecified, AccessHint::All] {
            let provider = MockProvider::new(DATA);
            let mut asset = provider.open_asset("data.bin", hint).unwrap();
            assert!(matches!(
                asset.seek(-1, SeekMode::FromStart),
                Err(AssetError::InvalidArgument(_))
            ));
            assert!(matches!(
                asset.seek(1, SeekMode::FromEnd),
                Err(AssetError::InvalidArgument(_))
            ));
            assert_eq!(asset.position(), 0);
        }
    }

    #[test]
    fn long_read_returns_remainder() {
        for hint in [AccessHint::Unspecified, AccessHint::All] {
            let provider = MockProvider::new(DATA);
            let mut asset = provider.open_asset("data.bin", hint).unwrap();
            asset.seek(-4, SeekMode::FromEnd).unwrap();

            let mut buf = [0u8; 64];
            assert_eq!(asset.read(&mut buf).unwrap(), 4);
            assert_eq!(&buf[..4], b" dog");
            assert!(asset.eof());
            assert_eq!(asset.read(&mut buf).unwrap(), 0);
        }
    }

    #[test]
    fn read_failure_is_io_error() {
        let provider = MockProvider {
            fail_reads: true,
            ..MockProvider::new(DATA)
        };
        let mut asset = provider.open_asset("data.bin", AccessHint::Unspecified).unwrap();
        assert!(matches!(asset.read(&mut [0u8; 4]), Err(AssetError::Io(_))));
    }

    #[test]
    fn mem_take_moves_everything() {
        let provider = MockProvider::new(DATA);
        let mut a1 = provider.open_asset("data.bin", AccessHint::All).unwrap();
        a1.seek(10, SeekMode::FromStart).unwrap();

        let mut a2 = std::mem::take(&mut a1);
        assert!(!a1.is_open());
        assert!(!a1.is_mapped());
        assert_eq!(a1.size(), 0);

        assert!(a2.is_open());
        assert!(a2.is_mapped());
        assert_eq!(a2.position(), 10);
        assert_eq!(a2.size(), DATA.len() as u64);
        let mut buf = [0u8; 5];
        a2.read(&mut buf).unwrap();
        assert_eq!(&buf, b"brown");

        let mut h1 = provider.open_asset("data.bin", AccessHint::Unspecified).unwrap();
        h1.seek(4, SeekMode::FromStart).unwrap();
        let h2 = std::mem::take(&mut h1);
        assert!(!h1.is_open());
        assert!(!h2.is_mapped());
        assert_eq!(h2.position(), 4);
    }

    #[test]
    fn streaming_hint_never_maps() {
        let provider = MockProvider::new(DATA);
        let mut asset = provider.open_asset("data.bin", AccessHint::Sequential).unwrap();
        assert!(!asset.is_mapped());

        asset.advise(0, 0, Advice::WillNeed);
        assert!(!asset.is_mapped());
        assert!(asset.as_bytes().is_none());
        assert_eq!(read_all(&mut asset, 16), DATA);
    }

    #[test]
    fn failed_mapping_is_not_retried_until_asked() {
        let provider = MockProvider {
            mappable: false,
            ..MockProvider::new(DATA)
        };
        let mut asset = provider.open_asset("data.bin", AccessHint::Random).unwrap();
        assert_eq!(provider.count("buffer"), 1);

        asset.advise(0, 0, Advice::Random);
        asset.advise(0, 0, Advice::WillNeed);
        assert!(asset.as_bytes().is_none());
        assert_eq!(provider.count("buffer"), 1);

        asset.retry_mapping();
        asset.advise(0, 0, Advice::Random);
        assert_eq!(provider.count("buffer"), 2);
        assert!(!asset.is_mapped());
    }

    #[test]
    fn resident_handle_still_maps() {
        let provider = MockProvider {
            allocated: true,
            ..MockProvider::new(DATA)
        };
        let mut asset = provider.open_asset("data.bin", AccessHint::Unspecified).unwrap();
        asset.advise(0, 0, Advice::DontNeed);
        assert!(asset.is_mapped());
        assert_eq!(asset.as_bytes().unwrap(), DATA);
    }

    #[test]
    fn mapping_happens_once() {
        let provider = MockProvider::new(DATA);
        let mut asset = provider.open_asset("data.bin", AccessHint::All).unwrap();
        asset.advise(0, 0, Advice::Random);
        asset.as_bytes().unwrap();
        assert_eq!(provider.count("buffer"), 1);
    }

    #[test]
    fn std_io_traits() {
        let provider = MockProvider::new(DATA);
        let mut asset = provider.open_asset("data.bin", AccessHint::Unspecified).unwrap();

        assert_eq!(Seek::seek(&mut asset, SeekFrom::Start(35)).unwrap(), 35);
        let mut tail = String::new();
        asset.read_to_string(&mut tail).unwrap();
        assert_eq!(tail, "lazy dog");

        let err = Seek::seek(&mut asset, SeekFrom::Current(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let mut empty = Asset::<MockHandle>::new();
        let err = Read::read(&mut empty, &mut [0u8; 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
