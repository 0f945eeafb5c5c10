use std::io::{Error, ErrorKind, SeekFrom};

use serde::{Deserialize, Serialize};

use crate::error::AssetError;

/// How the caller intends to read an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessHint {
    Sequential,
    Random,
    All,
    #[default]
    Unspecified,
}

impl AccessHint {
    pub fn open_mode(self) -> OpenMode {
        match self {
            AccessHint::Sequential => OpenMode::Streaming,
            AccessHint::Random => OpenMode::Random,
            AccessHint::All => OpenMode::Buffer,
            AccessHint::Unspecified => OpenMode::Unknown,
        }
    }

    /// Advice issued right after a successful open, if any.
    pub fn advice(self) -> Option<Advice> {
        match self {
            AccessHint::Sequential => Some(Advice::Sequential),
            AccessHint::Random => Some(Advice::Random),
            AccessHint::All => Some(Advice::WillNeed),
            AccessHint::Unspecified => None,
        }
    }
}

impl std::str::FromStr for AccessHint {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" => Ok(AccessHint::Sequential),
            "random" => Ok(AccessHint::Random),
            "all" => Ok(AccessHint::All),
            "unspecified" => Ok(AccessHint::Unspecified),
            _ => Err(()),
        }
    }
}

/// Mode requested from a provider when opening an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Unknown,
    Random,
    Streaming,
    Buffer,
}

impl OpenMode {
    /// Streaming opens never expose a backing buffer.
    pub fn allows_buffer(self) -> bool {
        self != OpenMode::Streaming
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Advice {
    Normal,
    Sequential,
    Random,
    WillNeed,
    DontNeed,
}

impl std::str::FromStr for Advice {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Advice::Normal),
            "sequential" => Ok(Advice::Sequential),
            "random" => Ok(Advice::Random),
            "willneed" => Ok(Advice::WillNeed),
            "dontneed" => Ok(Advice::DontNeed),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    FromStart,
    FromCurrent,
    FromEnd,
}

impl SeekMode {
    /// Converts a C-style `whence` value (`SEEK_SET`, `SEEK_CUR`, `SEEK_END`).
    pub fn from_whence(whence: i32) -> Result<SeekMode, AssetError> {
        match whence {
            0 => Ok(SeekMode::FromStart),
            1 => Ok(SeekMode::FromCurrent),
            2 => Ok(SeekMode::FromEnd),
            n => Err(AssetError::InvalidArgument(Error::new(
                ErrorKind::InvalidInput,
                format!("invalid seek mode {}", n),
            ))),
        }
    }

    /// Splits a `SeekFrom` into an offset and mode.
    pub fn split(pos: SeekFrom) -> Result<(i64, SeekMode), AssetError> {
        match pos {
            SeekFrom::Start(n) => i64::try_from(n)
                .map(|n| (n, SeekMode::FromStart))
                .map_err(|_| {
                    AssetError::InvalidArgument(Error::new(
                        ErrorKind::InvalidInput,
                        format!("seek offset {} out of range", n),
                    ))
                }),
            SeekFrom::Current(n) => Ok((n, SeekMode::FromCurrent)),
            SeekFrom::End(n) => Ok((n, SeekMode::FromEnd)),
        }
    }
}
