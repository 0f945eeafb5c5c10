/*! Read-only application assets with two access strategies.

An [`Asset`] wraps a handle obtained from an [`AssetProvider`] and reads
through it until the handle can expose the complete contents in memory.
From then on a memory view serves reads, seeks and size queries. The switch
happens on [`Asset::advise`] (also issued by [`Asset::open`] for explicit
access hints) and is invisible to the read cursor.

Two providers are included: [`archive::ZipAssets`] for assets packed in a
zip container such as an APK, and [`vfs::Fs`] for a plain directory.

# Usage examples

```no_run
use std::io::Read;
use assetio::{AccessHint, AssetProvider, ProviderConfig};
use assetio::archive::ZipAssets;

let assets = ZipAssets::open("app.apk", ProviderConfig::default())?;
let mut font = assets.open_asset("fonts/small.fnt", AccessHint::All)?;
println!("{} bytes, mapped: {}", font.size(), font.is_mapped());

let mut bytes = vec![];
font.read_to_end(&mut bytes)?;
# Ok::<(), Box<dyn std::error::Error>>(())
```

Further examples can be found in `assetio-tools` in the same repository.
*/

pub mod archive;
pub mod asset;
pub mod config;
pub mod error;
pub mod mapped;
pub mod types;
pub mod vfs;

pub(crate) mod util;

pub use self::asset::Asset;
pub use self::config::ProviderConfig;
pub use self::error::AssetError;
pub use self::types::{AccessHint, Advice, OpenMode, SeekMode};
pub use self::vfs::{AssetHandle, AssetProvider};

/// Routes `log` output through `env_logger`, configured by `RUST_LOG`.
#[cfg(feature = "logging")]
pub fn enable_logging() {
    let _ = env_logger::try_init();
}
