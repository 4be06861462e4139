use serde::{Deserialize, Serialize};

use crate::config::metadata::MetadataBlock;
use crate::config::{UnrecognizedKeys, UnrecognizedValues};

/// One served layer: a name, the source references backing it, and its
/// metadata block.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: String,
    pub title: Option<String>,
    /// References into `sources` or `caches`, each either `name` or
    /// `name:layer`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(default)]
    pub md: MetadataBlock,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

impl LayerConfig {
    /// Returns the unrecognized keys of this layer and its `md` block,
    /// prefixed with their paths.
    #[must_use]
    pub fn get_unrecognized_keys_with_prefix(&self, prefix: &str) -> UnrecognizedKeys {
        let mut keys: UnrecognizedKeys = self
            .unrecognized
            .keys()
            .map(|k| format!("{prefix}{k}"))
            .collect();
        keys.extend(
            self.md
                .get_unrecognized_keys_with_prefix(&format!("{prefix}md.")),
        );
        keys
    }
}

/// An intermediate cache re-exposing other sources.
///
/// Caches are non-terminal for metadata inheritance: resolving a layer that
/// references a cache recurses into the cache's own sources.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    /// Grid names the cache is built on. Not used for metadata resolution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grids: Vec<String>,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

impl CacheConfig {
    /// Returns the unrecognized keys of this cache, prefixed with its path.
    #[must_use]
    pub fn get_unrecognized_keys_with_prefix(&self, prefix: &str) -> UnrecognizedKeys {
        self.unrecognized
            .keys()
            .map(|k| format!("{prefix}{k}"))
            .collect()
    }
}

/// The `services` block. Only the WMS service carries metadata.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default)]
    pub wms: WmsServiceConfig,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

impl ServicesConfig {
    /// Returns the unrecognized keys of the services tree, prefixed with
    /// their paths.
    #[must_use]
    pub fn get_unrecognized_keys_with_prefix(&self, prefix: &str) -> UnrecognizedKeys {
        let mut keys: UnrecognizedKeys = self
            .unrecognized
            .keys()
            .map(|k| format!("{prefix}{k}"))
            .collect();
        keys.extend(
            self.wms
                .get_unrecognized_keys_with_prefix(&format!("{prefix}wms.")),
        );
        keys
    }
}

/// The `services.wms` block.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WmsServiceConfig {
    #[serde(default)]
    pub md: MetadataBlock,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

impl WmsServiceConfig {
    /// Returns the unrecognized keys of this block and its `md` block,
    /// prefixed with their paths.
    #[must_use]
    pub fn get_unrecognized_keys_with_prefix(&self, prefix: &str) -> UnrecognizedKeys {
        let mut keys: UnrecognizedKeys = self
            .unrecognized
            .keys()
            .map(|k| format!("{prefix}{k}"))
            .collect();
        keys.extend(
            self.md
                .get_unrecognized_keys_with_prefix(&format!("{prefix}md.")),
        );
        keys
    }
}
