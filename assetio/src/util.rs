use std::io::{Error, ErrorKind, Result};

use crate::types::SeekMode;

/// Resolves a seek request against a resource of `len` bytes.
///
/// Targets before the start or past the end are rejected.
pub(crate) fn seek_target(pos: u64, len: u64, offset: i64, mode: SeekMode) -> Result<u64> {
    let base = match mode {
        SeekMode::FromStart => 0,
        SeekMode::FromCurrent => pos as i128,
        SeekMode::FromEnd => len as i128,
    };
    let target = base + offset as i128;

    if target < 0 || target > len as i128 {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("seek target {} outside 0..={}", target, len),
        ));
    }

    Ok(target as u64)
}
