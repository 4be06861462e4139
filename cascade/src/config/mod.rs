use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::Read as _;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

mod error;
pub mod layer;
pub mod metadata;
pub mod source;

pub use error::{ConfigFileError, ConfigFileResult};
pub use layer::{CacheConfig, LayerConfig, ServicesConfig, WmsServiceConfig};
pub use metadata::MetadataBlock;
pub use source::{
    HttpSourceConfig, SourceConfig, TileSourceConfig, WmsOpts, WmsRequestConfig, WmsSourceConfig,
};

/// Any YAML keys a config block did not recognize, preserved for diagnostics.
pub type UnrecognizedValues = HashMap<String, serde_yaml::Value>;

/// The set of unrecognized key paths collected across the whole configuration.
pub type UnrecognizedKeys = HashSet<String>;

/// The root of a cascade configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub services: ServicesConfig,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sources: BTreeMap<String, SourceConfig>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub caches: BTreeMap<String, CacheConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<LayerConfig>,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

impl Config {
    /// Collects the key paths of every unrecognized YAML key in the file,
    /// nested blocks included.
    #[must_use]
    pub fn get_unrecognized_keys(&self) -> UnrecognizedKeys {
        let mut keys: UnrecognizedKeys = self.unrecognized.keys().cloned().collect();
        keys.extend(self.services.get_unrecognized_keys_with_prefix("services."));
        for (name, source) in &self.sources {
            keys.extend(source.get_unrecognized_keys_with_prefix(&format!("sources.{name}.")));
        }
        for (name, cache) in &self.caches {
            keys.extend(cache.get_unrecognized_keys_with_prefix(&format!("caches.{name}.")));
        }
        for layer in &self.layers {
            keys.extend(
                layer.get_unrecognized_keys_with_prefix(&format!("layers.{}.", layer.name)),
            );
        }
        keys
    }

    /// Runs post-parse validation, logging a warning for every key the
    /// configuration model does not understand.
    pub fn finalize(&self) {
        let mut keys: Vec<String> = self.get_unrecognized_keys().into_iter().collect();
        keys.sort();
        for key in keys {
            warn!("Unrecognized configuration key: {key}");
        }
    }
}

/// Reads and parses a configuration file.
pub fn read_config(path: &Path) -> ConfigFileResult<Config> {
    let mut contents = String::new();
    File::open(path)
        .and_then(|mut f| f.read_to_string(&mut contents))
        .map_err(|e| ConfigFileError::ConfigLoadError(e, path.to_path_buf()))?;
    parse_config(&contents, path)
}

/// Parses configuration YAML. `path` is only used in error messages.
pub fn parse_config(contents: &str, path: &Path) -> ConfigFileResult<Config> {
    serde_yaml::from_str(contents).map_err(|e| ConfigFileError::ConfigParseError(e, path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(yaml: &str) -> Config {
        parse_config(yaml, &PathBuf::from("test.yaml")).unwrap()
    }

    #[test]
    fn parses_a_full_configuration() {
        let config = parse(indoc! {"
            services:
              wms:
                md:
                  auto_metadata: true
                  title: Test Proxy
            sources:
              boundaries_wms:
                type: wms
                req:
                  url: https://maps.example.com/wms?map=/etc/mapserver/osm.map
                  layers: administrative_boundaries,countries
                wms_opts:
                  version: '1.3.0'
                http:
                  username: alice
                  password: secret
                  timeout: 45s
              osm_tiles:
                type: tile
                url: https://tiles.example.com/{z}/{x}/{y}.png
            caches:
              boundaries_cache:
                sources: [boundaries_wms]
                grids: [webmercator]
            layers:
              - name: boundaries
                title: Boundaries
                sources: [boundaries_cache]
                md:
                  auto_metadata: true
                  keywords: [boundaries]
        "});

        assert!(config.services.wms.md.auto_metadata());
        assert_eq!(config.services.wms.md.title.as_deref(), Some("Test Proxy"));

        let wms = config.sources["boundaries_wms"].as_wms().unwrap();
        assert_eq!(
            wms.req.url,
            "https://maps.example.com/wms?map=/etc/mapserver/osm.map"
        );
        assert_eq!(wms.version(), "1.3.0");
        assert_eq!(wms.first_layer().as_deref(), Some("administrative_boundaries"));
        assert_eq!(wms.http_auth().username.as_deref(), Some("alice"));
        assert_eq!(wms.timeout(), Some(Duration::from_secs(45)));

        assert!(config.sources["osm_tiles"].as_wms().is_none());

        assert_eq!(config.caches["boundaries_cache"].sources, vec!["boundaries_wms"]);

        assert_eq!(config.layers.len(), 1);
        let layer = &config.layers[0];
        assert_eq!(layer.name, "boundaries");
        assert_eq!(layer.sources, vec!["boundaries_cache"]);
        assert!(layer.md.auto_metadata());
        assert_eq!(layer.md.keywords, vec!["boundaries"]);
    }

    #[test]
    fn unknown_source_types_parse_as_other() {
        let config = parse(indoc! {"
            sources:
              debug_overlay:
                type: debug
        "});
        assert_eq!(config.sources["debug_overlay"], SourceConfig::Other);
    }

    #[test]
    fn auto_metadata_defaults_to_disabled() {
        let config = parse(indoc! {"
            layers:
              - name: plain
                sources: [missing]
        "});
        assert!(!config.layers[0].md.auto_metadata());
    }

    #[test]
    fn collects_unrecognized_keys_with_their_paths() {
        let config = parse(indoc! {"
            servies: {}
            services:
              wms:
                mdd: {}
            sources:
              upstream:
                type: wms
                req:
                  url: https://example.com/wms
                supported_srs: ['EPSG:4326']
            layers:
              - name: roads
                legendurl: https://example.com/legend.png
        "});

        let keys = config.get_unrecognized_keys();
        assert!(keys.contains("servies"));
        assert!(keys.contains("services.wms.mdd"));
        assert!(keys.contains("sources.upstream.supported_srs"));
        assert!(keys.contains("layers.roads.legendurl"));
    }

    #[test]
    fn collects_unrecognized_keys_from_nested_blocks() {
        let config = parse(indoc! {"
            services:
              wms:
                md:
                  abstrct: typo
            sources:
              upstream:
                type: wms
                req:
                  url: https://example.com/wms
                  transparent: true
                wms_opts:
                  featureinfo: true
                http:
                  ssl_no_cert_checks: true
              tiles:
                type: tile
                grid: webmercator
            caches:
              upstream_cache:
                sources: [upstream]
                cache_dir: /tmp/cache
            layers:
              - name: roads
                sources: [upstream_cache]
                md:
                  abstrct: typo
        "});

        let keys = config.get_unrecognized_keys();
        assert!(keys.contains("services.wms.md.abstrct"));
        assert!(keys.contains("sources.upstream.req.transparent"));
        assert!(keys.contains("sources.upstream.wms_opts.featureinfo"));
        assert!(keys.contains("sources.upstream.http.ssl_no_cert_checks"));
        assert!(keys.contains("sources.tiles.grid"));
        assert!(keys.contains("caches.upstream_cache.cache_dir"));
        assert!(keys.contains("layers.roads.md.abstrct"));
    }

    #[test]
    fn rejects_invalid_yaml() {
        let err = parse_config("layers: [", &PathBuf::from("bad.yaml")).unwrap_err();
        assert!(matches!(err, ConfigFileError::ConfigParseError(..)));
    }
}
