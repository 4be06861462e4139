use std::collections::BTreeMap;
use std::time::Duration;

use cascade_core::capabilities::{DEFAULT_WMS_VERSION, HttpAuth};
use serde::{Deserialize, Serialize};

use crate::config::{UnrecognizedKeys, UnrecognizedValues};

/// A configured source declaration, dispatched on its `type` key.
///
/// Only WMS sources contribute metadata; every other source type is a
/// non-contributor for inheritance purposes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Wms(WmsSourceConfig),
    Tile(TileSourceConfig),
    /// Source types this crate does not model (file-based, debug, ...).
    #[serde(other)]
    Other,
}

impl SourceConfig {
    /// Returns the WMS declaration if this source is one.
    #[must_use]
    pub fn as_wms(&self) -> Option<&WmsSourceConfig> {
        match self {
            Self::Wms(wms) => Some(wms),
            Self::Tile(_) | Self::Other => None,
        }
    }

    /// Returns the unrecognized keys of this source, prefixed with its path.
    #[must_use]
    pub fn get_unrecognized_keys_with_prefix(&self, prefix: &str) -> UnrecognizedKeys {
        match self {
            Self::Wms(wms) => wms.get_unrecognized_keys_with_prefix(prefix),
            Self::Tile(tile) => tile
                .unrecognized
                .keys()
                .map(|k| format!("{prefix}{k}"))
                .collect(),
            Self::Other => UnrecognizedKeys::new(),
        }
    }
}

/// A terminal upstream WMS declaration.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WmsSourceConfig {
    pub req: WmsRequestConfig,
    pub wms_opts: Option<WmsOpts>,
    pub http: Option<HttpSourceConfig>,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

impl WmsSourceConfig {
    /// Returns the unrecognized keys of this source and its nested blocks,
    /// prefixed with their paths.
    #[must_use]
    pub fn get_unrecognized_keys_with_prefix(&self, prefix: &str) -> UnrecognizedKeys {
        let mut keys: UnrecognizedKeys = self
            .unrecognized
            .keys()
            .map(|k| format!("{prefix}{k}"))
            .collect();
        keys.extend(self.req.unrecognized.keys().map(|k| format!("{prefix}req.{k}")));
        if let Some(opts) = &self.wms_opts {
            keys.extend(
                opts.unrecognized
                    .keys()
                    .map(|k| format!("{prefix}wms_opts.{k}")),
            );
        }
        if let Some(http) = &self.http {
            keys.extend(http.unrecognized.keys().map(|k| format!("{prefix}http.{k}")));
        }
        keys
    }

    /// Protocol version for capability requests, defaulting to
    /// [`DEFAULT_WMS_VERSION`].
    #[must_use]
    pub fn version(&self) -> &str {
        self.wms_opts
            .as_ref()
            .and_then(|o| o.version.as_deref())
            .unwrap_or(DEFAULT_WMS_VERSION)
    }

    /// First entry of the declared (comma-separated) layer list, if any.
    #[must_use]
    pub fn first_layer(&self) -> Option<String> {
        self.req
            .layers
            .as_deref()?
            .split(',')
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(ToOwned::to_owned)
    }

    /// Credentials and headers for capability requests against this source.
    #[must_use]
    pub fn http_auth(&self) -> HttpAuth {
        self.http.as_ref().map_or_else(HttpAuth::default, |http| HttpAuth {
            username: http.username.clone(),
            password: http.password.clone(),
            headers: http.headers.clone(),
        })
    }

    /// Per-source capability fetch timeout, if configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.http.as_ref().and_then(|http| http.timeout)
    }
}

/// The `req` block of a WMS source: the upstream endpoint and what to ask of it.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WmsRequestConfig {
    /// Upstream endpoint URL, possibly with embedded `user:pass@` credentials.
    pub url: String,
    /// Comma-separated layer list requested upstream. Empty or absent means
    /// unspecified.
    pub layers: Option<String>,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

/// The `wms_opts` block of a WMS source.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WmsOpts {
    /// Protocol version spoken with the upstream.
    pub version: Option<String>,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

/// The `http` block of a source: credentials, headers and timeout.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpSourceConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Per-request timeout in human-readable form ("30s", "2m").
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

/// A terminal tile source. Never contributes metadata.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TileSourceConfig {
    /// Tile URL template.
    pub url: Option<String>,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}
