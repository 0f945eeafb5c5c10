//! Asset-related errors.
use std::io::{Error, ErrorKind};

/// Errors that can occur when opening or reading an asset.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AssetError {
    /// The provider has no asset with this name
    #[error("Asset not found: '{0}'")]
    NotFound(String),

    /// The provider failed to open the asset
    #[error("Failed to open asset '{0}'")]
    Open(String, #[source] Error),

    /// Reading from the asset failed
    #[error("I/O error reading asset")]
    Io(#[source] Error),

    /// A seek target, seek mode or asset name was rejected
    #[error("Invalid argument")]
    InvalidArgument(#[source] Error),

    /// The asset has no open handle
    #[error("Asset is not open")]
    NotOpen,

    /// Package entry is compressed with a method that cannot be read
    #[error("Unsupported compression for '{0}'")]
    UnsupportedCompression(String),

    /// The package file itself could not be opened
    #[error("Failed to open package file")]
    Package(#[source] Error),

    /// The package central directory could not be read
    #[error("Failed to read package archive: {0}")]
    Zip(#[from] ::zip::result::ZipError),
}

impl AssetError {
    pub fn into_io_error(self) -> Error {
        match self {
            AssetError::Io(e) | AssetError::Package(e) => e,
            AssetError::Open(_, e) => e,
            AssetError::InvalidArgument(e) => Error::new(ErrorKind::InvalidInput, e),
            AssetError::NotFound(_) => Error::new(ErrorKind::NotFound, self),
            AssetError::UnsupportedCompression(_) => Error::new(ErrorKind::Unsupported, self),
            AssetError::NotOpen | AssetError::Zip(_) => Error::new(ErrorKind::Other, self),
        }
    }
}

impl From<AssetError> for Error {
    fn from(err: AssetError) -> Error {
        err.into_io_error()
    }
}
