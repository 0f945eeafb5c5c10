use serde::{Deserialize, Serialize};

pub const DEFAULT_ASSET_PREFIX: &str = "assets/";

/// Settings shared by the bundled asset providers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Entry-name prefix under which a package keeps its assets. Empty
    /// exposes every entry.
    pub asset_prefix: String,
    /// Whether handles may hand out memory mappings of their bytes.
    pub allow_mmap: bool,
}

impl Default for ProviderConfig {
    fn default() -> ProviderConfig {
        ProviderConfig {
            asset_prefix: DEFAULT_ASSET_PREFIX.to_string(),
            allow_mmap: true,
        }
    }
}

impl ProviderConfig {
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<ProviderConfig, serde_json::Error> {
        serde_json::from_reader(reader)
    }
}
