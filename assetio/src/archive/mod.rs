//! Assets packed inside a zip container.
mod entry;
pub mod zip;

pub use self::entry::{DeflatedEntry, StoredEntry};
pub use self::zip::{ZipAssetHandle, ZipAssets};
